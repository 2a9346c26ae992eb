//! JSON REST API for the canteen services.
//!
//! Exposes an axum [`Router`] backed by any [`CanteenStore`] and any [`Peer`]
//! transport. The routes mounted depend on the configured [`Role`]; TLS and
//! process concerns are the binary's responsibility.

pub mod auth;
pub mod config;
pub mod counts;
pub mod error;
pub mod health;
pub mod menu;
pub mod preferences;

use std::{collections::HashSet, sync::Arc};

use axum::{
  Router,
  http::{HeaderName, HeaderValue, Method, header},
  routing::{get, post},
};
use canteen_core::{
  aggregate::CountAggregator,
  clock::{Calendar, Clock, parse_date},
  deadline::DeadlineEvaluator,
  identity::IdentityDirectory,
  menu::MenuDirectory,
  service::PreferenceService,
  store::CanteenStore,
  sync::{PEER_TOKEN_HEADER, Peer, SyncPublisher},
};
use chrono::NaiveDate;
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};
use tracing::warn;

pub use config::{Role, ServerConfig};
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, P> {
  pub store:       Arc<S>,
  pub preferences: PreferenceService<S, P>,
  pub menus:       MenuDirectory<S, P>,
  pub identities:  Arc<dyn IdentityDirectory>,
  pub admins:      Arc<HashSet<String>>,
  pub config:      Arc<ServerConfig>,
  pub calendar:    Calendar,
}

impl<S, P> Clone for AppState<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:       Arc::clone(&self.store),
      preferences: self.preferences.clone(),
      menus:       self.menus.clone(),
      identities:  Arc::clone(&self.identities),
      admins:      Arc::clone(&self.admins),
      config:      Arc::clone(&self.config),
      calendar:    self.calendar.clone(),
    }
  }
}

impl<S: CanteenStore, P: Peer> AppState<S, P> {
  /// Wire the services for `config.role` around one store and one peer.
  ///
  /// Menu reads fall back to the peer only on the employee side; the admin
  /// side owns menus.
  pub fn new(
    store: Arc<S>,
    peer: Arc<P>,
    config: ServerConfig,
    clock: Arc<dyn Clock>,
  ) -> canteen_core::Result<Self> {
    config.validate().map_err(canteen_core::Error::Validation)?;

    let calendar = Calendar::with_offset_minutes(clock, config.utc_offset_minutes)?;
    let deadline = DeadlineEvaluator::new(calendar.zone(), config.cutoff_hour);
    let publisher = SyncPublisher::new(peer, config.peer_timeout());
    let aggregator = CountAggregator::new(Arc::clone(&store), calendar.clone());
    let preferences = PreferenceService::new(
      Arc::clone(&store),
      aggregator,
      publisher.clone(),
      deadline,
      calendar.clone(),
    );
    let menus = MenuDirectory::new(
      Arc::clone(&store),
      publisher,
      calendar.clone(),
      config.role == Role::Employee,
    );
    let identities: Arc<dyn IdentityDirectory> = Arc::new(config.identity_directory());
    let admins = Arc::new(config.admin_ids());

    Ok(Self {
      store,
      preferences,
      menus,
      identities,
      admins,
      config: Arc::new(config),
      calendar,
    })
  }
}

/// Parse a `YYYY-MM-DD` path or body value.
pub(crate) fn parse_date_param(raw: &str) -> Result<NaiveDate, ApiError> {
  Ok(parse_date(raw)?)
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the router for the role in `state.config`.
pub fn router<S, P>(state: AppState<S, P>) -> Router
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  let common = Router::new()
    .route("/health", get(health::handler::<S, P>))
    .route("/me", get(health::me))
    .route("/meal-counts/range", get(counts::range::<S, P>))
    .route("/menu/sync", post(menu::sync::<S, P>))
    .route("/menu/{date}", get(menu::get_one::<S, P>));

  let routes = match state.config.role {
    Role::Employee => common
      .route("/preferences", post(preferences::submit::<S, P>))
      .route("/preferences/mine", get(preferences::list_mine::<S, P>))
      .route("/preferences/by-date/{date}", get(preferences::list_by_date::<S, P>))
      .route("/preferences/{date}", get(preferences::get_one::<S, P>))
      .route("/meal-counts/{date}", get(counts::get_one::<S, P>))
      .route("/menu/week", get(menu::week::<S, P>)),
    Role::Admin => common
      .route(
        "/meal-counts/{date}",
        get(counts::get_one::<S, P>).post(counts::ingest::<S, P>),
      )
      .route("/menu", get(menu::list::<S, P>).post(menu::publish::<S, P>)),
  };

  let cors = cors_layer(&state.config.cors_origins);
  routes
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
  let allowed: Vec<HeaderValue> = origins
    .iter()
    .filter_map(|o| match HeaderValue::from_str(o) {
      Ok(v) => Some(v),
      Err(_) => {
        warn!(origin = %o, "ignoring malformed CORS origin");
        None
      }
    })
    .collect();

  CorsLayer::new()
    .allow_origin(AllowOrigin::list(allowed))
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([
      header::AUTHORIZATION,
      header::CONTENT_TYPE,
      HeaderName::from_static(PEER_TOKEN_HEADER),
    ])
}
