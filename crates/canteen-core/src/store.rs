//! The `CanteenStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `canteen-store-sqlite`).
//! Higher layers (`canteen-api`, the server binary) depend on this
//! abstraction, not on any concrete backend. There is no shared database
//! between the admin and employee deployments; each owns one store.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  counts::{DateRange, MealCountSnapshot},
  menu::MenuSnapshot,
  preference::MealPreference,
};

/// Abstraction over a canteen store backend.
///
/// Every write is an upsert keyed by the record's natural key, relying on the
/// backend's single-statement atomicity; no application-level locking is
/// layered on top.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CanteenStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Preferences ───────────────────────────────────────────────────────

  /// Insert or fully replace the preference keyed by
  /// `(identity_id, date)` and return what was stored.
  fn upsert_preference(
    &self,
    preference: MealPreference,
  ) -> impl Future<Output = Result<MealPreference, Self::Error>> + Send + '_;

  /// Retrieve one preference. Returns `None` if never submitted.
  fn get_preference<'a>(
    &'a self,
    identity_id: &'a str,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<MealPreference>, Self::Error>> + Send + 'a;

  /// The most recent `limit` preferences of one identity, date descending.
  fn list_preferences_by_identity<'a>(
    &'a self,
    identity_id: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<MealPreference>, Self::Error>> + Send + 'a;

  /// Every identity's preference for `date`.
  fn list_preferences_by_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<MealPreference>, Self::Error>> + Send + '_;

  // ── Meal count snapshots ──────────────────────────────────────────────

  /// Insert or replace the snapshot keyed by its date.
  fn upsert_counts(
    &self,
    snapshot: MealCountSnapshot,
  ) -> impl Future<Output = Result<MealCountSnapshot, Self::Error>> + Send + '_;

  fn get_counts(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<MealCountSnapshot>, Self::Error>> + Send + '_;

  /// Snapshots within `range` (inclusive), date descending.
  fn list_counts(
    &self,
    range: DateRange,
  ) -> impl Future<Output = Result<Vec<MealCountSnapshot>, Self::Error>> + Send + '_;

  // ── Menus ─────────────────────────────────────────────────────────────

  /// Insert or replace the menu keyed by its date.
  fn upsert_menu(
    &self,
    menu: MenuSnapshot,
  ) -> impl Future<Output = Result<MenuSnapshot, Self::Error>> + Send + '_;

  fn get_menu(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<MenuSnapshot>, Self::Error>> + Send + '_;

  /// Menus within `range` (inclusive), date descending.
  fn list_menus(
    &self,
    range: DateRange,
  ) -> impl Future<Output = Result<Vec<MenuSnapshot>, Self::Error>> + Send + '_;

  // ── Health ────────────────────────────────────────────────────────────

  /// Round-trip a trivial query to prove the backend is reachable.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
