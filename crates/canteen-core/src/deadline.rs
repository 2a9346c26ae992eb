//! The submission window for a target date.
//!
//! A date is open while it lies strictly in the future. The day immediately
//! after today additionally closes at the cutoff hour (21:00 by default).
//! Dates two or more days ahead are open at any time of day. Every
//! comparison happens in the evaluator's civil zone.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Timelike};
use thiserror::Error;

use crate::clock::ist;

/// Hour of day (civil time) at which next-day submissions lock.
pub const DEFAULT_CUTOFF_HOUR: u32 = 21;

/// Why a target date is closed for submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeadlineViolation {
  #[error("can only submit preferences for future dates")]
  NotInFuture,

  #[error("deadline passed: selections for tomorrow close at {cutoff_hour:02}:00")]
  CutoffPassed { cutoff_hour: u32 },
}

impl DeadlineViolation {
  /// Stable machine-readable reason code.
  pub fn code(&self) -> &'static str {
    match self {
      Self::NotInFuture => "date_not_in_future",
      Self::CutoffPassed { .. } => "cutoff_passed",
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct DeadlineEvaluator {
  zone:        FixedOffset,
  cutoff_hour: u32,
}

impl Default for DeadlineEvaluator {
  fn default() -> Self { Self::new(ist(), DEFAULT_CUTOFF_HOUR) }
}

impl DeadlineEvaluator {
  pub fn new(zone: FixedOffset, cutoff_hour: u32) -> Self { Self { zone, cutoff_hour } }

  pub fn cutoff_hour(&self) -> u32 { self.cutoff_hour }

  /// Check whether `target` still accepts submissions at instant `now`.
  pub fn check<Tz: TimeZone>(
    &self,
    target: NaiveDate,
    now: &DateTime<Tz>,
  ) -> Result<(), DeadlineViolation> {
    let local = now.with_timezone(&self.zone);
    let today = local.date_naive();

    if target <= today {
      return Err(DeadlineViolation::NotInFuture);
    }
    if today.succ_opt() == Some(target) && local.hour() >= self.cutoff_hour {
      return Err(DeadlineViolation::CutoffPassed { cutoff_hour: self.cutoff_hour });
    }
    Ok(())
  }

  pub fn is_open<Tz: TimeZone>(&self, target: NaiveDate, now: &DateTime<Tz>) -> bool {
    self.check(target, now).is_ok()
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};

  use super::*;

  fn ist_at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<FixedOffset> {
    ist().with_ymd_and_hms(y, m, d, h, min, s).unwrap()
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  #[test]
  fn tomorrow_open_just_before_cutoff() {
    let eval = DeadlineEvaluator::default();
    let now = ist_at(2025, 6, 9, 20, 59, 59);
    assert!(eval.is_open(date(2025, 6, 10), &now));
  }

  #[test]
  fn tomorrow_closed_just_after_cutoff() {
    let eval = DeadlineEvaluator::default();
    let now = ist_at(2025, 6, 9, 21, 0, 1);
    assert_eq!(
      eval.check(date(2025, 6, 10), &now),
      Err(DeadlineViolation::CutoffPassed { cutoff_hour: 21 })
    );
  }

  #[test]
  fn cutoff_hour_itself_is_closed() {
    let eval = DeadlineEvaluator::default();
    let now = ist_at(2025, 6, 9, 21, 0, 0);
    assert!(!eval.is_open(date(2025, 6, 10), &now));
  }

  #[test]
  fn later_dates_ignore_time_of_day() {
    let eval = DeadlineEvaluator::default();
    for hour in [0, 9, 20, 21, 23] {
      let now = ist_at(2025, 6, 9, hour, 30, 0);
      for ahead in 2..10 {
        let target = date(2025, 6, 9) + Duration::days(ahead);
        assert!(eval.is_open(target, &now), "{target} at {hour}:30");
      }
    }
  }

  #[test]
  fn three_days_ahead_at_eleven_pm_is_open() {
    let eval = DeadlineEvaluator::default();
    let now = ist_at(2025, 6, 9, 23, 0, 0);
    assert!(eval.is_open(date(2025, 6, 12), &now));
  }

  #[test]
  fn today_and_past_are_never_open() {
    let eval = DeadlineEvaluator::default();
    for hour in [0, 8, 23] {
      let now = ist_at(2025, 6, 9, hour, 0, 0);
      assert_eq!(eval.check(date(2025, 6, 9), &now), Err(DeadlineViolation::NotInFuture));
      assert_eq!(eval.check(date(2025, 6, 1), &now), Err(DeadlineViolation::NotInFuture));
      assert_eq!(eval.check(date(2024, 12, 31), &now), Err(DeadlineViolation::NotInFuture));
    }
  }

  #[test]
  fn evaluation_uses_civil_zone_not_utc() {
    let eval = DeadlineEvaluator::default();
    // 15:45 UTC is 21:15 IST: tomorrow (IST) is already locked even though
    // the UTC hour is well before the cutoff.
    let now = Utc.with_ymd_and_hms(2025, 6, 9, 15, 45, 0).unwrap();
    assert_eq!(
      eval.check(date(2025, 6, 10), &now),
      Err(DeadlineViolation::CutoffPassed { cutoff_hour: 21 })
    );

    // 19:00 UTC on the 9th is 00:30 IST on the 10th, so the 10th is today.
    let now = Utc.with_ymd_and_hms(2025, 6, 9, 19, 0, 0).unwrap();
    assert_eq!(eval.check(date(2025, 6, 10), &now), Err(DeadlineViolation::NotInFuture));
    assert!(eval.is_open(date(2025, 6, 11), &now));
  }

  #[test]
  fn custom_cutoff_hour() {
    let eval = DeadlineEvaluator::new(ist(), 18);
    assert!(eval.is_open(date(2025, 6, 10), &ist_at(2025, 6, 9, 17, 59, 0)));
    assert!(!eval.is_open(date(2025, 6, 10), &ist_at(2025, 6, 9, 18, 0, 0)));
  }

  #[test]
  fn reason_codes_are_distinct() {
    assert_eq!(DeadlineViolation::NotInFuture.code(), "date_not_in_future");
    assert_eq!(DeadlineViolation::CutoffPassed { cutoff_hour: 21 }.code(), "cutoff_passed");
  }
}
