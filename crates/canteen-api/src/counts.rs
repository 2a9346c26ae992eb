//! Handlers for `/meal-counts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/meal-counts/{date}` | Zero-valued snapshot if none is cached |
//! | `GET`  | `/meal-counts/range` | `?start=&end=` (or `start_date`/`end_date`), inclusive, date descending |
//! | `POST` | `/meal-counts/{date}` | Peer ingestion; body is a snapshot for the same date |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
};
use canteen_core::{
  counts::{DateRange, MealCountSnapshot},
  store::CanteenStore,
  sync::Peer,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::{Caller, PeerAuthenticated}, error::ApiError, parse_date_param};

/// `GET /meal-counts/{date}`
pub async fn get_one<S, P>(
  State(state): State<AppState<S, P>>,
  _caller: Caller,
  Path(raw_date): Path<String>,
) -> Result<Json<MealCountSnapshot>, ApiError>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  let date = parse_date_param(&raw_date)?;
  Ok(Json(state.preferences.aggregator().get(date).await?))
}

#[derive(Debug, Deserialize)]
pub struct RangeParams {
  #[serde(default, alias = "start_date")]
  pub start: Option<String>,
  #[serde(default, alias = "end_date")]
  pub end:   Option<String>,
}

fn optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
  raw.filter(|s| !s.is_empty()).map(parse_date_param).transpose()
}

/// `GET /meal-counts/range`
pub async fn range<S, P>(
  State(state): State<AppState<S, P>>,
  _caller: Caller,
  params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Vec<MealCountSnapshot>>, ApiError>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  let Query(params) = params?;
  let range = DateRange::new(
    optional_date(params.start.as_deref())?,
    optional_date(params.end.as_deref())?,
  )?;
  Ok(Json(state.preferences.aggregator().get_range(range).await?))
}

#[derive(Debug, Serialize)]
pub struct Ingested {
  pub success: bool,
  pub date:    NaiveDate,
}

/// `POST /meal-counts/{date}`
pub async fn ingest<S, P>(
  State(state): State<AppState<S, P>>,
  _peer: PeerAuthenticated,
  Path(raw_date): Path<String>,
  body: Result<Json<MealCountSnapshot>, JsonRejection>,
) -> Result<Json<Ingested>, ApiError>
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  let date = parse_date_param(&raw_date)?;
  let Json(snapshot) = body?;
  if snapshot.date != date {
    return Err(ApiError::Validation(format!(
      "snapshot is for {} but was posted to {date}",
      snapshot.date
    )));
  }
  state.preferences.aggregator().ingest(snapshot).await?;
  Ok(Json(Ingested { success: true, date }))
}
