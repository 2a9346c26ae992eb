//! Count aggregation over the preference rows of a date.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::{
  Error, Result,
  clock::Calendar,
  counts::{DateRange, MealCountSnapshot},
  store::CanteenStore,
};

/// Owns the meal count snapshot cache.
///
/// `recompute` is not serialised against concurrent preference writes; a
/// snapshot may miss an in-flight write, which the next submission for the
/// date will pick up.
pub struct CountAggregator<S> {
  store:    Arc<S>,
  calendar: Calendar,
}

impl<S> Clone for CountAggregator<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), calendar: self.calendar.clone() }
  }
}

impl<S: CanteenStore> CountAggregator<S> {
  pub fn new(store: Arc<S>, calendar: Calendar) -> Self { Self { store, calendar } }

  /// Rebuild and persist the snapshot for `date` from its preference rows.
  pub async fn recompute(&self, date: NaiveDate) -> Result<MealCountSnapshot> {
    let preferences = self
      .store
      .list_preferences_by_date(date)
      .await
      .map_err(Error::storage)?;

    let snapshot = MealCountSnapshot::tally(date, &preferences, self.calendar.now());
    let stored = self.store.upsert_counts(snapshot).await.map_err(Error::storage)?;

    info!(
      %date,
      breakfast = stored.breakfast_count,
      lunch = stored.lunch_count,
      snacks = stored.snacks_count,
      employees = stored.total_employees,
      "meal counts recomputed"
    );
    Ok(stored)
  }

  /// The cached snapshot, or a zero-valued one if none exists.
  pub async fn get(&self, date: NaiveDate) -> Result<MealCountSnapshot> {
    Ok(self.cached(date).await?.unwrap_or_else(|| MealCountSnapshot::zero(date)))
  }

  /// The cached snapshot exactly as stored.
  pub async fn cached(&self, date: NaiveDate) -> Result<Option<MealCountSnapshot>> {
    self.store.get_counts(date).await.map_err(Error::storage)
  }

  /// Cached snapshots within `range`, date descending.
  pub async fn get_range(&self, range: DateRange) -> Result<Vec<MealCountSnapshot>> {
    self.store.list_counts(range).await.map_err(Error::storage)
  }

  /// Store a snapshot pushed by the peer service, as received.
  pub async fn ingest(&self, snapshot: MealCountSnapshot) -> Result<MealCountSnapshot> {
    let date = snapshot.date;
    let stored = self.store.upsert_counts(snapshot).await.map_err(Error::storage)?;
    info!(%date, employees = stored.total_employees, "meal counts ingested from peer");
    Ok(stored)
  }
}
