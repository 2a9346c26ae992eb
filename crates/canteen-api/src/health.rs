//! `GET /health` and `GET /me`.

use axum::{Json, extract::State};
use canteen_core::{identity::Identity, store::CanteenStore, sync::Peer};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::warn;

use crate::{AppState, auth::Caller, config::Role};

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
  Connected,
  Disconnected,
}

#[derive(Debug, Serialize)]
pub struct Health {
  pub status:    &'static str,
  pub service:   String,
  pub role:      Role,
  pub timestamp: DateTime<FixedOffset>,
  pub database:  DatabaseStatus,
}

/// `GET /health`; always 200 so it also serves as liveness.
pub async fn handler<S, P>(State(state): State<AppState<S, P>>) -> Json<Health>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  let database = match state.store.ping().await {
    Ok(()) => DatabaseStatus::Connected,
    Err(e) => {
      warn!(error = %e, "health probe could not reach the store");
      DatabaseStatus::Disconnected
    }
  };
  let role = state.config.role;
  Json(Health {
    status: "healthy",
    service: format!("canteen-{role}"),
    role,
    timestamp: state.calendar.now(),
    database,
  })
}

/// `GET /me`
pub async fn me(Caller(identity): Caller) -> Json<Identity> { Json(identity) }
