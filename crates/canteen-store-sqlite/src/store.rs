//! [`SqliteStore`], the SQLite implementation of [`CanteenStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;

use canteen_core::{
  counts::{DateRange, MealCountSnapshot},
  menu::MenuSnapshot,
  preference::MealPreference,
  store::CanteenStore,
};

use crate::{
  Error, Result,
  encode::{
    COUNT_COLUMNS, MENU_COLUMNS, PREFERENCE_COLUMNS, RawCounts, RawMenu, RawPreference,
    encode_date, encode_dt, encode_items,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A canteen store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn encode_bound(bound: Option<NaiveDate>) -> Option<String> { bound.map(encode_date) }

// ─── CanteenStore impl ───────────────────────────────────────────────────────

impl CanteenStore for SqliteStore {
  type Error = Error;

  // ── Preferences ───────────────────────────────────────────────────────────

  async fn upsert_preference(&self, preference: MealPreference) -> Result<MealPreference> {
    let Some(last_updated) = preference.last_updated else {
      return Err(Error::Invalid(format!(
        "preference for {} on {} has no last_updated",
        preference.identity_id, preference.date
      )));
    };

    let identity_id  = preference.identity_id.clone();
    let date_str     = encode_date(preference.date);
    let meals        = preference.meals;
    let display_name = preference.display_name.clone();
    let department   = preference.department.clone();
    let at_str       = encode_dt(last_updated);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO meal_preferences
             (identity_id, date, breakfast, lunch, snacks, display_name, department, last_updated)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT (identity_id, date) DO UPDATE SET
             breakfast    = excluded.breakfast,
             lunch        = excluded.lunch,
             snacks       = excluded.snacks,
             display_name = excluded.display_name,
             department   = excluded.department,
             last_updated = excluded.last_updated",
          rusqlite::params![
            identity_id,
            date_str,
            meals.breakfast,
            meals.lunch,
            meals.snacks,
            display_name,
            department,
            at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(preference)
  }

  async fn get_preference<'a>(
    &'a self,
    identity_id: &'a str,
    date: NaiveDate,
  ) -> Result<Option<MealPreference>> {
    let identity_id = identity_id.to_owned();
    let date_str = encode_date(date);

    let raw: Option<RawPreference> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {PREFERENCE_COLUMNS} FROM meal_preferences
               WHERE identity_id = ?1 AND date = ?2"
            ),
            rusqlite::params![identity_id, date_str],
            RawPreference::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPreference::into_preference).transpose()
  }

  async fn list_preferences_by_identity<'a>(
    &'a self,
    identity_id: &'a str,
    limit: usize,
  ) -> Result<Vec<MealPreference>> {
    let identity_id = identity_id.to_owned();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawPreference> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PREFERENCE_COLUMNS} FROM meal_preferences
           WHERE identity_id = ?1
           ORDER BY date DESC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![identity_id, limit], RawPreference::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPreference::into_preference).collect()
  }

  async fn list_preferences_by_date(&self, date: NaiveDate) -> Result<Vec<MealPreference>> {
    let date_str = encode_date(date);

    let raws: Vec<RawPreference> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PREFERENCE_COLUMNS} FROM meal_preferences
           WHERE date = ?1
           ORDER BY identity_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![date_str], RawPreference::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPreference::into_preference).collect()
  }

  // ── Meal count snapshots ──────────────────────────────────────────────────

  async fn upsert_counts(&self, snapshot: MealCountSnapshot) -> Result<MealCountSnapshot> {
    let date_str = encode_date(snapshot.date);
    let counts = [
      snapshot.breakfast_count,
      snapshot.lunch_count,
      snapshot.snacks_count,
      snapshot.total_employees,
    ];
    let at_str = snapshot.computed_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO meal_counts
             (date, breakfast_count, lunch_count, snacks_count, total_employees, computed_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (date) DO UPDATE SET
             breakfast_count = excluded.breakfast_count,
             lunch_count     = excluded.lunch_count,
             snacks_count    = excluded.snacks_count,
             total_employees = excluded.total_employees,
             computed_at     = excluded.computed_at",
          rusqlite::params![date_str, counts[0], counts[1], counts[2], counts[3], at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(snapshot)
  }

  async fn get_counts(&self, date: NaiveDate) -> Result<Option<MealCountSnapshot>> {
    let date_str = encode_date(date);

    let raw: Option<RawCounts> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COUNT_COLUMNS} FROM meal_counts WHERE date = ?1"),
            rusqlite::params![date_str],
            RawCounts::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCounts::into_snapshot).transpose()
  }

  async fn list_counts(&self, range: DateRange) -> Result<Vec<MealCountSnapshot>> {
    let start = encode_bound(range.start);
    let end = encode_bound(range.end);

    let raws: Vec<RawCounts> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COUNT_COLUMNS} FROM meal_counts
           WHERE (?1 IS NULL OR date >= ?1)
             AND (?2 IS NULL OR date <= ?2)
           ORDER BY date DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![start, end], RawCounts::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCounts::into_snapshot).collect()
  }

  // ── Menus ─────────────────────────────────────────────────────────────────

  async fn upsert_menu(&self, menu: MenuSnapshot) -> Result<MenuSnapshot> {
    let date_str   = encode_date(menu.date);
    let day        = menu.day.clone();
    let breakfast  = encode_items(&menu.breakfast)?;
    let lunch      = encode_items(&menu.lunch)?;
    let snacks     = encode_items(&menu.snacks)?;
    let at_str     = encode_dt(menu.updated_at);
    let updated_by = menu.updated_by.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO menus (date, day, breakfast, lunch, snacks, updated_at, updated_by)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (date) DO UPDATE SET
             day        = excluded.day,
             breakfast  = excluded.breakfast,
             lunch      = excluded.lunch,
             snacks     = excluded.snacks,
             updated_at = excluded.updated_at,
             updated_by = excluded.updated_by",
          rusqlite::params![date_str, day, breakfast, lunch, snacks, at_str, updated_by],
        )?;
        Ok(())
      })
      .await?;

    Ok(menu)
  }

  async fn get_menu(&self, date: NaiveDate) -> Result<Option<MenuSnapshot>> {
    let date_str = encode_date(date);

    let raw: Option<RawMenu> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {MENU_COLUMNS} FROM menus WHERE date = ?1"),
            rusqlite::params![date_str],
            RawMenu::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawMenu::into_menu).transpose()
  }

  async fn list_menus(&self, range: DateRange) -> Result<Vec<MenuSnapshot>> {
    let start = encode_bound(range.start);
    let end = encode_bound(range.end);

    let raws: Vec<RawMenu> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MENU_COLUMNS} FROM menus
           WHERE (?1 IS NULL OR date >= ?1)
             AND (?2 IS NULL OR date <= ?2)
           ORDER BY date DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![start, end], RawMenu::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMenu::into_menu).collect()
  }

  // ── Health ────────────────────────────────────────────────────────────────

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
