//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` so lexical order is chronological.
//! Timestamps are RFC 3339 strings that keep their civil offset. Menu item
//! lists are compact JSON arrays.

use chrono::{DateTime, FixedOffset, NaiveDate};
use canteen_core::{
  clock::DATE_FORMAT,
  counts::MealCountSnapshot,
  menu::MenuSnapshot,
  preference::{MealChoice, MealPreference},
};

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── DateTime<FixedOffset> ───────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<FixedOffset>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<FixedOffset>> {
  DateTime::parse_from_rfc3339(s).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Counts ──────────────────────────────────────────────────────────────────

fn decode_count(column: &str, n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Corrupt(format!("{column} out of range: {n}")))
}

// ─── Menu items ──────────────────────────────────────────────────────────────

pub fn encode_items(items: &[String]) -> Result<String> { Ok(serde_json::to_string(items)?) }

pub fn decode_items(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column order shared by every `meal_preferences` SELECT.
pub const PREFERENCE_COLUMNS: &str =
  "identity_id, date, breakfast, lunch, snacks, display_name, department, last_updated";

/// Raw values read directly from a `meal_preferences` row.
pub struct RawPreference {
  pub identity_id:  String,
  pub date:         String,
  pub breakfast:    bool,
  pub lunch:        bool,
  pub snacks:       bool,
  pub display_name: String,
  pub department:   String,
  pub last_updated: String,
}

impl RawPreference {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id:  row.get(0)?,
      date:         row.get(1)?,
      breakfast:    row.get(2)?,
      lunch:        row.get(3)?,
      snacks:       row.get(4)?,
      display_name: row.get(5)?,
      department:   row.get(6)?,
      last_updated: row.get(7)?,
    })
  }

  pub fn into_preference(self) -> Result<MealPreference> {
    Ok(MealPreference {
      identity_id:  self.identity_id,
      date:         decode_date(&self.date)?,
      meals:        MealChoice::new(self.breakfast, self.lunch, self.snacks),
      display_name: self.display_name,
      department:   self.department,
      last_updated: Some(decode_dt(&self.last_updated)?),
    })
  }
}

pub const COUNT_COLUMNS: &str =
  "date, breakfast_count, lunch_count, snacks_count, total_employees, computed_at";

/// Raw values read directly from a `meal_counts` row.
pub struct RawCounts {
  pub date:            String,
  pub breakfast_count: i64,
  pub lunch_count:     i64,
  pub snacks_count:    i64,
  pub total_employees: i64,
  pub computed_at:     Option<String>,
}

impl RawCounts {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      date:            row.get(0)?,
      breakfast_count: row.get(1)?,
      lunch_count:     row.get(2)?,
      snacks_count:    row.get(3)?,
      total_employees: row.get(4)?,
      computed_at:     row.get(5)?,
    })
  }

  pub fn into_snapshot(self) -> Result<MealCountSnapshot> {
    Ok(MealCountSnapshot {
      date:            decode_date(&self.date)?,
      breakfast_count: decode_count("breakfast_count", self.breakfast_count)?,
      lunch_count:     decode_count("lunch_count", self.lunch_count)?,
      snacks_count:    decode_count("snacks_count", self.snacks_count)?,
      total_employees: decode_count("total_employees", self.total_employees)?,
      computed_at:     self.computed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const MENU_COLUMNS: &str = "date, day, breakfast, lunch, snacks, updated_at, updated_by";

/// Raw values read directly from a `menus` row.
pub struct RawMenu {
  pub date:       String,
  pub day:        String,
  pub breakfast:  String,
  pub lunch:      String,
  pub snacks:     String,
  pub updated_at: String,
  pub updated_by: Option<String>,
}

impl RawMenu {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      date:       row.get(0)?,
      day:        row.get(1)?,
      breakfast:  row.get(2)?,
      lunch:      row.get(3)?,
      snacks:     row.get(4)?,
      updated_at: row.get(5)?,
      updated_by: row.get(6)?,
    })
  }

  pub fn into_menu(self) -> Result<MenuSnapshot> {
    Ok(MenuSnapshot {
      date:       decode_date(&self.date)?,
      day:        self.day,
      breakfast:  decode_items(&self.breakfast)?,
      lunch:      decode_items(&self.lunch)?,
      snacks:     decode_items(&self.snacks)?,
      updated_at: decode_dt(&self.updated_at)?,
      updated_by: self.updated_by,
    })
  }
}
