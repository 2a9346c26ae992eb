//! Runtime server configuration, deserialised from the TOML file and
//! `CANTEEN_*` environment variables.

use std::{collections::HashSet, fmt, path::PathBuf, str::FromStr, time::Duration};

use canteen_core::{
  clock::IST_OFFSET_MINUTES,
  deadline::DEFAULT_CUTOFF_HOUR,
  identity::{Identity, StaticIdentities},
  service::DEFAULT_LIST_LIMIT,
  sync::DEFAULT_PEER_TIMEOUT,
};
use serde::{Deserialize, Serialize};

/// Which side of the deployment this process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// Menu owner; receives pushed meal counts.
  Admin,
  /// Takes preference submissions; receives pushed menus.
  Employee,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Employee => "employee",
    }
  }

  pub fn default_port(&self) -> u16 {
    match self {
      Role::Admin => 5001,
      Role::Employee => 5002,
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "admin" => Ok(Role::Admin),
      "employee" => Ok(Role::Employee),
      other => Err(format!("unknown role {other:?}: expected admin or employee")),
    }
  }
}

/// One bearer token accepted by this instance.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEntry {
  pub token:        String,
  pub identity_id:  String,
  pub display_name: String,
  #[serde(default)]
  pub department:   String,
  /// May read every colleague's preferences.
  #[serde(default)]
  pub admin:        bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub role:                  Role,
  #[serde(default = "default_host")]
  pub host:                  String,
  /// Falls back to [`Role::default_port`].
  #[serde(default)]
  pub port:                  Option<u16>,
  #[serde(default = "default_store_path")]
  pub store_path:            PathBuf,
  #[serde(default)]
  pub peer_url:              Option<String>,
  #[serde(default)]
  pub peer_token:            Option<String>,
  #[serde(default = "default_peer_timeout_secs")]
  pub peer_timeout_secs:     u64,
  #[serde(default = "default_utc_offset_minutes")]
  pub utc_offset_minutes:    i32,
  #[serde(default = "default_cutoff_hour")]
  pub cutoff_hour:           u32,
  #[serde(default = "default_preference_list_limit")]
  pub preference_list_limit: usize,
  #[serde(default)]
  pub cors_origins:          Vec<String>,
  #[serde(default)]
  pub identities:            Vec<IdentityEntry>,
}

fn default_host() -> String { "0.0.0.0".to_owned() }

fn default_store_path() -> PathBuf { PathBuf::from("canteen.db") }

fn default_peer_timeout_secs() -> u64 { DEFAULT_PEER_TIMEOUT.as_secs() }

fn default_utc_offset_minutes() -> i32 { IST_OFFSET_MINUTES }

fn default_cutoff_hour() -> u32 { DEFAULT_CUTOFF_HOUR }

fn default_preference_list_limit() -> usize { DEFAULT_LIST_LIMIT }

impl ServerConfig {
  /// A configuration with every optional field at its default.
  pub fn for_role(role: Role) -> Self {
    Self {
      role,
      host: default_host(),
      port: None,
      store_path: default_store_path(),
      peer_url: None,
      peer_token: None,
      peer_timeout_secs: default_peer_timeout_secs(),
      utc_offset_minutes: default_utc_offset_minutes(),
      cutoff_hour: default_cutoff_hour(),
      preference_list_limit: default_preference_list_limit(),
      cors_origins: Vec::new(),
      identities: Vec::new(),
    }
  }

  pub fn port(&self) -> u16 { self.port.unwrap_or_else(|| self.role.default_port()) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port()) }

  pub fn peer_timeout(&self) -> Duration { Duration::from_secs(self.peer_timeout_secs) }

  /// Reject values that would make the deadline or paging meaningless.
  pub fn validate(&self) -> Result<(), String> {
    if self.cutoff_hour > 23 {
      return Err(format!("cutoff_hour must be 0..=23, got {}", self.cutoff_hour));
    }
    if self.peer_timeout_secs == 0 {
      return Err("peer_timeout_secs must be at least 1".to_owned());
    }
    if self.preference_list_limit == 0 {
      return Err("preference_list_limit must be at least 1".to_owned());
    }
    if self.peer_token.as_deref().is_some_and(|t| t.trim().is_empty()) {
      return Err("peer_token must not be empty".to_owned());
    }
    if self.identities.iter().any(|e| e.token.is_empty()) {
      return Err("identity tokens must not be empty".to_owned());
    }
    Ok(())
  }

  /// Identity ids allowed on admin-facing staff routes.
  pub fn admin_ids(&self) -> HashSet<String> {
    self
      .identities
      .iter()
      .filter(|e| e.admin)
      .map(|e| e.identity_id.clone())
      .collect()
  }

  pub fn identity_directory(&self) -> StaticIdentities {
    StaticIdentities::new(self.identities.iter().map(|e| {
      (e.token.clone(), Identity {
        identity_id:  e.identity_id.clone(),
        display_name: e.display_name.clone(),
        department:   e.department.clone(),
      })
    }))
  }
}
