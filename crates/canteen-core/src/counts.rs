//! Per-date meal count snapshots.
//!
//! A snapshot is a derived cache. The preference rows for its date are the
//! source of truth, and [`MealCountSnapshot::tally`] reproduces it from them.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, preference::MealPreference};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealCountSnapshot {
  pub date:            NaiveDate,
  #[serde(default)]
  pub breakfast_count: u32,
  #[serde(default)]
  pub lunch_count:     u32,
  #[serde(default)]
  pub snacks_count:    u32,
  /// Number of preference rows for the date, including rows with no meals.
  #[serde(default)]
  pub total_employees: u32,
  /// `None` on the zero-valued default for a date with no snapshot.
  #[serde(default)]
  pub computed_at:     Option<DateTime<FixedOffset>>,
}

impl MealCountSnapshot {
  pub fn zero(date: NaiveDate) -> Self {
    Self {
      date,
      breakfast_count: 0,
      lunch_count: 0,
      snacks_count: 0,
      total_employees: 0,
      computed_at: None,
    }
  }

  /// Sum the meal flags of every preference for `date`.
  ///
  /// Rows for other dates are ignored.
  pub fn tally<'a>(
    date: NaiveDate,
    preferences: impl IntoIterator<Item = &'a MealPreference>,
    computed_at: DateTime<FixedOffset>,
  ) -> Self {
    let mut snapshot = Self::zero(date);
    for pref in preferences.into_iter().filter(|p| p.date == date) {
      snapshot.total_employees += 1;
      snapshot.breakfast_count += u32::from(pref.meals.breakfast);
      snapshot.lunch_count += u32::from(pref.meals.lunch);
      snapshot.snacks_count += u32::from(pref.meals.snacks);
    }
    snapshot.computed_at = Some(computed_at);
    snapshot
  }
}

// ─── Range query ─────────────────────────────────────────────────────────────

/// An inclusive date range; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
  pub start: Option<NaiveDate>,
  pub end:   Option<NaiveDate>,
}

impl DateRange {
  pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
    if let (Some(s), Some(e)) = (start, end)
      && s > e
    {
      return Err(Error::Validation(format!("range start {s} is after end {e}")));
    }
    Ok(Self { start, end })
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::{clock::ist, preference::MealChoice};

  fn date(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2025, 6, d).unwrap() }

  fn pref(id: &str, on: NaiveDate, b: bool, l: bool, s: bool) -> MealPreference {
    MealPreference {
      identity_id:  id.into(),
      date:         on,
      meals:        MealChoice::new(b, l, s),
      display_name: String::new(),
      department:   String::new(),
      last_updated: None,
    }
  }

  #[test]
  fn tally_counts_each_flag_and_every_row() {
    let at = ist().with_ymd_and_hms(2025, 6, 9, 12, 0, 0).unwrap();
    let prefs = [
      pref("a", date(10), true, true, false),
      pref("b", date(10), false, true, false),
      pref("c", date(10), false, false, false),
      pref("d", date(11), true, true, true),
    ];
    let snap = MealCountSnapshot::tally(date(10), &prefs, at);
    assert_eq!(snap.breakfast_count, 1);
    assert_eq!(snap.lunch_count, 2);
    assert_eq!(snap.snacks_count, 0);
    assert_eq!(snap.total_employees, 3);
    assert_eq!(snap.computed_at, Some(at));
  }

  #[test]
  fn tally_is_order_independent() {
    let at = ist().with_ymd_and_hms(2025, 6, 9, 12, 0, 0).unwrap();
    let mut prefs = vec![
      pref("a", date(10), true, false, true),
      pref("b", date(10), true, true, false),
      pref("c", date(10), false, true, true),
      pref("d", date(10), false, false, false),
    ];
    let forward = MealCountSnapshot::tally(date(10), &prefs, at);
    prefs.reverse();
    let backward = MealCountSnapshot::tally(date(10), &prefs, at);
    prefs.rotate_left(1);
    let rotated = MealCountSnapshot::tally(date(10), &prefs, at);
    assert_eq!(forward, backward);
    assert_eq!(forward, rotated);
  }

  #[test]
  fn zero_snapshot_serialises_all_counts() {
    let json = serde_json::to_value(MealCountSnapshot::zero(date(1))).unwrap();
    assert_eq!(json["breakfast_count"], 0);
    assert_eq!(json["lunch_count"], 0);
    assert_eq!(json["snacks_count"], 0);
    assert_eq!(json["total_employees"], 0);
  }

  #[test]
  fn range_bounds() {
    let r = DateRange::new(Some(date(5)), Some(date(7))).unwrap();
    assert!(r.contains(date(5)));
    assert!(r.contains(date(7)));
    assert!(!r.contains(date(8)));

    let open_end = DateRange::new(Some(date(5)), None).unwrap();
    assert!(open_end.contains(date(30)));
    assert!(!open_end.contains(date(4)));

    assert!(DateRange::new(Some(date(8)), Some(date(7))).is_err());
  }
}
