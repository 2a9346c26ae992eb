//! Handlers for `/preferences` endpoints (employee role).
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/preferences` | Body: `{"date":"YYYY-MM-DD","breakfast":bool,"lunch":bool,"snacks":bool}` |
//! | `GET`  | `/preferences/{date}` | Zero-valued default if never submitted |
//! | `GET`  | `/preferences/mine` | Optional `?limit=N`, date descending |
//! | `GET`  | `/preferences/by-date/{date}` | Every identity's row for the date; admin or peer |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use canteen_core::{
  preference::{MealChoice, MealPreference, PreferenceState},
  service::Submission,
  store::CanteenStore,
  sync::Peer,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::{Caller, Supervisor},
  error::ApiError,
  parse_date_param,
};

// ─── Submit ───────────────────────────────────────────────────────────────────

/// Meal flags left out of the body are stored as `false`.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  #[serde(default)]
  pub date:      Option<String>,
  #[serde(default, alias = "wants_breakfast")]
  pub breakfast: bool,
  #[serde(default, alias = "wants_lunch")]
  pub lunch:     bool,
  #[serde(default, alias = "wants_snacks")]
  pub snacks:    bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
  pub success:    bool,
  #[serde(flatten)]
  pub submission: Submission,
}

/// `POST /preferences`
pub async fn submit<S, P>(
  State(state): State<AppState<S, P>>,
  Caller(identity): Caller,
  body: Result<Json<SubmitBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  let Json(body) = body?;
  let raw_date = body
    .date
    .ok_or_else(|| ApiError::Validation("date is required".to_owned()))?;
  let date = parse_date_param(&raw_date)?;
  let meals = MealChoice::new(body.breakfast, body.lunch, body.snacks);

  let submission = state.preferences.submit(&identity, date, meals).await?;
  Ok((StatusCode::CREATED, Json(SubmitResponse { success: true, submission })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PreferenceView {
  #[serde(flatten)]
  pub preference: MealPreference,
  pub state:      PreferenceState,
}

impl From<MealPreference> for PreferenceView {
  fn from(preference: MealPreference) -> Self {
    let state = preference.state();
    Self { preference, state }
  }
}

/// `GET /preferences/{date}`
pub async fn get_one<S, P>(
  State(state): State<AppState<S, P>>,
  Caller(identity): Caller,
  Path(raw_date): Path<String>,
) -> Result<Json<PreferenceView>, ApiError>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  let date = parse_date_param(&raw_date)?;
  let preference = state.preferences.get(&identity, date).await?;
  Ok(Json(preference.into()))
}

// ─── Mine ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MineParams {
  pub limit: Option<usize>,
}

/// `GET /preferences/mine[?limit=N]`
pub async fn list_mine<S, P>(
  State(state): State<AppState<S, P>>,
  Caller(identity): Caller,
  params: Result<Query<MineParams>, QueryRejection>,
) -> Result<Json<Vec<MealPreference>>, ApiError>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  let Query(params) = params?;
  let limit = params.limit.unwrap_or(state.config.preference_list_limit);
  let preferences = state.preferences.list_mine(&identity, Some(limit)).await?;
  Ok(Json(preferences))
}

// ─── By date ──────────────────────────────────────────────────────────────────

/// `GET /preferences/by-date/{date}`; admin identities or the peer only.
pub async fn list_by_date<S, P>(
  State(state): State<AppState<S, P>>,
  _supervisor: Supervisor,
  Path(raw_date): Path<String>,
) -> Result<Json<Vec<MealPreference>>, ApiError>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  let date = parse_date_param(&raw_date)?;
  Ok(Json(state.preferences.list_by_date(date).await?))
}
