//! canteen-server binary.
//!
//! Reads `canteen.toml` (or the path given with `--config`) layered under
//! `CANTEEN_*` environment variables, opens the SQLite store, and serves the
//! admin or employee API until Ctrl-C or SIGTERM.
//!
//! ```text
//! canteen-server --config employee.toml
//! CANTEEN_PEER_URL=http://admin:5001 canteen-server --role employee
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use canteen_api::{AppState, Role, ServerConfig};
use canteen_core::clock::SystemClock;
use canteen_peer::{HttpPeer, PeerConfig};
use canteen_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Canteen meal-preference server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "canteen.toml")]
  config: PathBuf,

  /// Serve this role, overriding the configuration file.
  #[arg(short, long)]
  role: Option<Role>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let mut builder = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("CANTEEN").try_parsing(true));
  if let Some(role) = cli.role {
    builder = builder
      .set_override("role", role.as_str())
      .context("failed to apply --role")?;
  }
  let settings = builder.build().context("failed to read configuration")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.store_path = expand_tilde(&server_cfg.store_path);

  if server_cfg.identities.is_empty() {
    warn!("no identities configured; every staff request will be rejected");
  }
  if server_cfg.peer_token.is_none() {
    warn!("no peer_token configured; peer endpoints will refuse every request");
  }
  if server_cfg.peer_url.is_none() {
    info!("no peer_url configured; pushes will be reported as sync_failed");
  }

  // Open SQLite store.
  let store_path = server_cfg.store_path.clone();
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create store directory {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let peer = HttpPeer::new(PeerConfig {
    base_url: server_cfg.peer_url.clone(),
    token:    server_cfg.peer_token.clone(),
    timeout:  server_cfg.peer_timeout(),
  })
  .context("failed to build peer client")?;

  let role = server_cfg.role;
  let address = server_cfg.address();

  // Build application state.
  let state = AppState::new(Arc::new(store), Arc::new(peer), server_cfg, Arc::new(SystemClock))
    .context("invalid configuration")?;
  let app = canteen_api::router(state);

  info!(%role, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  info!("server stopped");
  Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      error!(error = %e, "failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
    info!("received Ctrl-C, shutting down");
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
        info!("received SIGTERM, shutting down");
      }
      Err(e) => {
        error!(error = %e, "failed to install SIGTERM handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
