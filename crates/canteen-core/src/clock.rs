//! Wall-clock access and the civil calendar every date decision is made in.
//!
//! The service assumes all staff share one civil timezone. That zone is an
//! explicit value carried by [`Calendar`] rather than a process-wide
//! constant, and the clock behind it is injectable so tests can pin "now".

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset as _, Utc};

use crate::{Error, Result};

/// Offset of India Standard Time from UTC, in minutes.
pub const IST_OFFSET_MINUTES: i32 = 5 * 60 + 30;

/// Wire and storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Clocks ──────────────────────────────────────────────────────────────────

/// A source of the current instant.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// The operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
  at: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
  pub fn new(at: DateTime<Utc>) -> Self { Self { at: Arc::new(Mutex::new(at)) } }

  pub fn set(&self, at: DateTime<Utc>) {
    *self.at.lock().unwrap_or_else(|p| p.into_inner()) = at;
  }

  pub fn advance(&self, by: Duration) {
    let mut at = self.at.lock().unwrap_or_else(|p| p.into_inner());
    *at += by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.at.lock().unwrap_or_else(|p| p.into_inner())
  }
}

// ─── Calendar ────────────────────────────────────────────────────────────────

/// A clock paired with the civil timezone used for dates and timestamps.
#[derive(Clone)]
pub struct Calendar {
  clock: Arc<dyn Clock>,
  zone:  FixedOffset,
}

impl Calendar {
  pub fn new(clock: Arc<dyn Clock>, zone: FixedOffset) -> Self { Self { clock, zone } }

  /// Build a calendar from an offset expressed in minutes east of UTC.
  pub fn with_offset_minutes(clock: Arc<dyn Clock>, minutes: i32) -> Result<Self> {
    Ok(Self::new(clock, zone_from_minutes(minutes)?))
  }

  /// The system clock in India Standard Time.
  pub fn system_ist() -> Self {
    Self::new(Arc::new(SystemClock), ist())
  }

  pub fn zone(&self) -> FixedOffset { self.zone }

  /// The current instant in UTC, for deadline evaluation.
  pub fn instant(&self) -> DateTime<Utc> { self.clock.now() }

  /// The current instant expressed in the civil zone.
  pub fn now(&self) -> DateTime<FixedOffset> {
    self.clock.now().with_timezone(&self.zone)
  }

  /// Today's date in the civil zone.
  pub fn today(&self) -> NaiveDate { self.now().date_naive() }
}

impl std::fmt::Debug for Calendar {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Calendar").field("zone", &self.zone).finish_non_exhaustive()
  }
}

/// India Standard Time, UTC+05:30.
pub fn ist() -> FixedOffset {
  zone_from_minutes(IST_OFFSET_MINUTES).unwrap_or(Utc.fix())
}

pub fn zone_from_minutes(minutes: i32) -> Result<FixedOffset> {
  minutes
    .checked_mul(60)
    .and_then(FixedOffset::east_opt)
    .ok_or_else(|| Error::Validation(format!("utc offset out of range: {minutes} minutes")))
}

/// Parse a `YYYY-MM-DD` calendar date. Unpadded months and days are
/// rejected.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  let trimmed = s.trim();
  let date = NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
    .map_err(|_| Error::InvalidDate(s.to_owned()))?;
  if date.format(DATE_FORMAT).to_string() != trimmed {
    return Err(Error::InvalidDate(s.to_owned()));
  }
  Ok(date)
}
