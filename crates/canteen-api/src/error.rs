//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"success": false, "code": .., "error": ..}` so
//! clients can branch on `code` without parsing messages.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use canteen_core::deadline::DeadlineViolation;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Validation(String),

  #[error(transparent)]
  Deadline(DeadlineViolation),

  #[error("missing or unrecognised bearer token")]
  Unauthorized,

  #[error("not permitted for this caller")]
  Forbidden,

  #[error("menu for {0} has not been published")]
  MenuNotPublished(String),

  #[error("storage unavailable: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::Deadline(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::MenuNotPublished(_) => StatusCode::NOT_FOUND,
      ApiError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      ApiError::Validation(_) => "validation_error",
      ApiError::Deadline(v) => v.code(),
      ApiError::Unauthorized => "unauthorized",
      ApiError::Forbidden => "forbidden",
      ApiError::MenuNotPublished(_) => "menu_not_published",
      ApiError::Storage(_) => "storage_unavailable",
    }
  }
}

impl From<canteen_core::Error> for ApiError {
  fn from(e: canteen_core::Error) -> Self {
    use canteen_core::Error as E;
    match e {
      E::InvalidDate(_) | E::Validation(_) => ApiError::Validation(e.to_string()),
      E::DeadlineExceeded(v) => ApiError::Deadline(v),
      E::StorageUnavailable(source) => ApiError::Storage(source),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(e: JsonRejection) -> Self { ApiError::Validation(e.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(e: PathRejection) -> Self { ApiError::Validation(e.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(e: QueryRejection) -> Self { ApiError::Validation(e.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    if let ApiError::Storage(source) = &self {
      error!(error = %source, "storage failure while handling request");
    }
    let body = json!({
      "success": false,
      "code": self.code(),
      "error": self.to_string(),
    });
    (self.status(), Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deadline_violations_keep_their_codes() {
    let not_future = ApiError::from(canteen_core::Error::from(DeadlineViolation::NotInFuture));
    assert_eq!(not_future.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(not_future.code(), "date_not_in_future");

    let cutoff = ApiError::from(canteen_core::Error::from(DeadlineViolation::CutoffPassed {
      cutoff_hour: 21,
    }));
    assert_eq!(cutoff.code(), "cutoff_passed");
  }

  #[test]
  fn invalid_date_is_validation() {
    let e = ApiError::from(canteen_core::Error::InvalidDate("2025-13-01".into()));
    assert_eq!(e.status(), StatusCode::BAD_REQUEST);
    assert_eq!(e.code(), "validation_error");
  }

  #[test]
  fn storage_maps_to_503() {
    let e = ApiError::from(canteen_core::Error::storage(std::io::Error::other("disk gone")));
    assert_eq!(e.status(), StatusCode::SERVICE_UNAVAILABLE);
  }
}
