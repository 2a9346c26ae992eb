//! Handlers for `/menu` endpoints.
//!
//! | Method | Path | Role | Notes |
//! |--------|------|------|-------|
//! | `GET`  | `/menu` | admin | Every stored menu, date descending |
//! | `POST` | `/menu` | admin | Publish; pushes to the employee peer |
//! | `GET`  | `/menu/week` | employee | Monday to Sunday of the current week |
//! | `GET`  | `/menu/{date}` | both | 404 `menu_not_published` when absent |
//! | `POST` | `/menu/sync` | both | Peer ingestion of a pushed menu |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use canteen_core::{
  menu::{MenuSnapshot, NewMenu},
  store::CanteenStore,
  sync::{Peer, SyncOutcome},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  AppState,
  auth::{Caller, PeerAuthenticated, Reader},
  error::ApiError,
  parse_date_param,
};

/// `GET /menu/{date}`
pub async fn get_one<S, P>(
  State(state): State<AppState<S, P>>,
  reader: Reader,
  Path(raw_date): Path<String>,
) -> Result<Json<MenuSnapshot>, ApiError>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  let date = parse_date_param(&raw_date)?;
  if matches!(reader, Reader::Peer) {
    debug!(%date, "menu requested by peer");
  }
  match state.menus.get(date).await? {
    Some(menu) => Ok(Json(menu)),
    None => Err(ApiError::MenuNotPublished(raw_date)),
  }
}

/// `GET /menu`
pub async fn list<S, P>(
  State(state): State<AppState<S, P>>,
  _caller: Caller,
) -> Result<Json<Vec<MenuSnapshot>>, ApiError>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  Ok(Json(state.menus.list_all().await?))
}

/// `GET /menu/week`
pub async fn week<S, P>(
  State(state): State<AppState<S, P>>,
  _caller: Caller,
) -> Result<Json<Vec<MenuSnapshot>>, ApiError>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  Ok(Json(state.menus.current_week().await?))
}

// ─── Publish ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PublishBody {
  #[serde(default)]
  pub date:      Option<String>,
  #[serde(default)]
  pub day:       Option<String>,
  #[serde(default)]
  pub breakfast: Vec<String>,
  #[serde(default)]
  pub lunch:     Vec<String>,
  #[serde(default)]
  pub snacks:    Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Published {
  pub success: bool,
  pub menu:    MenuSnapshot,
  pub sync:    SyncOutcome,
}

/// `POST /menu`
pub async fn publish<S, P>(
  State(state): State<AppState<S, P>>,
  Caller(identity): Caller,
  body: Result<Json<PublishBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  let Json(body) = body?;
  let date = body.date.as_deref().map(parse_date_param).transpose()?;
  let input = NewMenu {
    date,
    day: body.day,
    breakfast: body.breakfast,
    lunch: body.lunch,
    snacks: body.snacks,
  };
  let (menu, sync) = state.menus.publish(input, &identity.identity_id).await?;
  Ok((StatusCode::CREATED, Json(Published { success: true, menu, sync })))
}

// ─── Sync ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Synced {
  pub success: bool,
  pub date:    NaiveDate,
}

/// `POST /menu/sync`
pub async fn sync<S, P>(
  State(state): State<AppState<S, P>>,
  _peer: PeerAuthenticated,
  body: Result<Json<MenuSnapshot>, JsonRejection>,
) -> Result<Json<Synced>, ApiError>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  let Json(menu) = body?;
  let stored = state.menus.ingest(menu).await?;
  Ok(Json(Synced { success: true, date: stored.date }))
}
