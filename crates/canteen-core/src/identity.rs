//! Caller identity as supplied by the external identity collaborator.
//!
//! Authentication itself happens elsewhere; the core only needs a verified,
//! stable identifier plus the display fields recorded alongside preferences.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A verified staff member. Read-only from the core's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub identity_id:  String,
  pub display_name: String,
  #[serde(default)]
  pub department:   String,
}

/// Resolves an opaque bearer credential to a verified [`Identity`].
pub trait IdentityDirectory: Send + Sync {
  fn resolve(&self, credential: &str) -> Option<Identity>;
}

/// A fixed credential → identity table, typically loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentities {
  by_token: HashMap<String, Identity>,
}

impl StaticIdentities {
  pub fn new(entries: impl IntoIterator<Item = (String, Identity)>) -> Self {
    Self { by_token: entries.into_iter().collect() }
  }

  pub fn len(&self) -> usize { self.by_token.len() }

  pub fn is_empty(&self) -> bool { self.by_token.is_empty() }
}

impl IdentityDirectory for StaticIdentities {
  fn resolve(&self, credential: &str) -> Option<Identity> {
    self.by_token.get(credential).cloned()
  }
}
