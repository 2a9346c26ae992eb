//! Meal preferences: one staff member's attendance intent for one date.
//!
//! At most one preference exists per `(identity_id, date)`. Every write is a
//! full replace of the three meal flags; a flag left out of a submission is
//! stored as `false`.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// The three independently chosen meals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealChoice {
  #[serde(default, alias = "wants_breakfast")]
  pub breakfast: bool,
  #[serde(default, alias = "wants_lunch")]
  pub lunch:     bool,
  #[serde(default, alias = "wants_snacks")]
  pub snacks:    bool,
}

impl MealChoice {
  pub const NONE: Self = Self { breakfast: false, lunch: false, snacks: false };

  pub fn new(breakfast: bool, lunch: bool, snacks: bool) -> Self {
    Self { breakfast, lunch, snacks }
  }
}

/// Observable lifecycle of an `(identity, date)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceState {
  Unsubmitted,
  Submitted,
}

/// A stored (or default) meal preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPreference {
  pub identity_id:  String,
  pub date:         NaiveDate,
  #[serde(flatten)]
  pub meals:        MealChoice,
  /// Display fields copied from the identity at write time.
  #[serde(default)]
  pub display_name: String,
  #[serde(default)]
  pub department:   String,
  /// `None` only on the zero-valued default for an unsubmitted pair.
  pub last_updated: Option<DateTime<FixedOffset>>,
}

impl MealPreference {
  /// A freshly written preference for `identity` on `date`.
  pub fn submitted(
    identity: &Identity,
    date: NaiveDate,
    meals: MealChoice,
    at: DateTime<FixedOffset>,
  ) -> Self {
    Self {
      identity_id:  identity.identity_id.clone(),
      date,
      meals,
      display_name: identity.display_name.clone(),
      department:   identity.department.clone(),
      last_updated: Some(at),
    }
  }

  /// The zero-valued stand-in returned when nothing has been submitted.
  pub fn unsubmitted(identity: &Identity, date: NaiveDate) -> Self {
    Self {
      identity_id:  identity.identity_id.clone(),
      date,
      meals:        MealChoice::NONE,
      display_name: identity.display_name.clone(),
      department:   identity.department.clone(),
      last_updated: None,
    }
  }

  pub fn state(&self) -> PreferenceState {
    if self.last_updated.is_some() {
      PreferenceState::Submitted
    } else {
      PreferenceState::Unsubmitted
    }
  }
}
