//! Error types for `canteen-core`.

use thiserror::Error;

use crate::deadline::DeadlineViolation;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid date {0:?}: expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("validation failed: {0}")]
  Validation(String),

  #[error(transparent)]
  DeadlineExceeded(#[from] DeadlineViolation),

  #[error("storage unavailable: {0}")]
  StorageUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error raised by a [`CanteenStore`](crate::store::CanteenStore).
  pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::StorageUnavailable(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
