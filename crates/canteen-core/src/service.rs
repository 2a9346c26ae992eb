//! `PreferenceService`, the submission pipeline.
//!
//! Per `(identity, date)` there are two observable states, unsubmitted and
//! submitted; resubmission stays submitted and overwrites. A submission is
//! guarded by the [`DeadlineEvaluator`] at its arrival time. Once the
//! preference row is written it is the durable result: recompute and push
//! both run afterwards, each regardless of the other's failure, and neither
//! can undo the write.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::{
  Error, Result,
  aggregate::CountAggregator,
  clock::Calendar,
  counts::MealCountSnapshot,
  deadline::DeadlineEvaluator,
  identity::Identity,
  preference::{MealChoice, MealPreference},
  store::CanteenStore,
  sync::{Peer, SyncOutcome, SyncPublisher},
};

/// Default page size for an identity's own preference history.
pub const DEFAULT_LIST_LIMIT: usize = 30;
pub const MAX_LIST_LIMIT: usize = 366;

/// The result of an accepted submission.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
  pub preference: MealPreference,
  /// The freshly recomputed snapshot, or the previously cached one if the
  /// recompute failed. `None` if neither was available.
  pub counts:     Option<MealCountSnapshot>,
  pub sync:       SyncOutcome,
}

pub struct PreferenceService<S, P> {
  store:      Arc<S>,
  aggregator: CountAggregator<S>,
  publisher:  SyncPublisher<P>,
  deadline:   DeadlineEvaluator,
  calendar:   Calendar,
}

impl<S, P> Clone for PreferenceService<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      aggregator: self.aggregator.clone(),
      publisher:  self.publisher.clone(),
      deadline:   self.deadline,
      calendar:   self.calendar.clone(),
    }
  }
}

impl<S: CanteenStore, P: Peer> PreferenceService<S, P> {
  pub fn new(
    store: Arc<S>,
    aggregator: CountAggregator<S>,
    publisher: SyncPublisher<P>,
    deadline: DeadlineEvaluator,
    calendar: Calendar,
  ) -> Self {
    Self { store, aggregator, publisher, deadline, calendar }
  }

  pub fn aggregator(&self) -> &CountAggregator<S> { &self.aggregator }

  /// Submit (or replace) `identity`'s preference for `date`.
  ///
  /// Fails with [`Error::DeadlineExceeded`] before any write if the date is
  /// closed, and with [`Error::StorageUnavailable`] if the preference row
  /// cannot be written. Failures after the write are logged and reflected
  /// only in the returned [`Submission`].
  pub async fn submit(
    &self,
    identity: &Identity,
    date: NaiveDate,
    meals: MealChoice,
  ) -> Result<Submission> {
    let arrived = self.calendar.now();
    self.deadline.check(date, &arrived)?;

    let preference = self
      .store
      .upsert_preference(MealPreference::submitted(identity, date, meals, arrived))
      .await
      .map_err(Error::storage)?;

    let counts = match self.aggregator.recompute(date).await {
      Ok(snapshot) => Some(snapshot),
      Err(e) => {
        warn!(%date, error = %e, "meal count recompute failed; falling back to cached snapshot");
        self.aggregator.cached(date).await.ok().flatten()
      }
    };

    let sync = match &counts {
      Some(snapshot) => self.publisher.push_counts(snapshot).await,
      None => {
        warn!(%date, "no meal count snapshot available to push");
        SyncOutcome::SyncFailed
      }
    };

    Ok(Submission { preference, counts, sync })
  }

  /// The caller's preference for `date`, or an all-false default.
  pub async fn get(&self, identity: &Identity, date: NaiveDate) -> Result<MealPreference> {
    let stored = self
      .store
      .get_preference(&identity.identity_id, date)
      .await
      .map_err(Error::storage)?;
    Ok(stored.unwrap_or_else(|| MealPreference::unsubmitted(identity, date)))
  }

  /// The caller's most recent preferences, date descending.
  ///
  /// A zero `limit` is rejected; larger values are capped at
  /// `MAX_LIST_LIMIT`.
  pub async fn list_mine(&self, identity: &Identity, limit: Option<usize>) -> Result<Vec<MealPreference>> {
    let limit = match limit.unwrap_or(DEFAULT_LIST_LIMIT) {
      0 => return Err(Error::Validation("limit must be at least 1".into())),
      n => n.min(MAX_LIST_LIMIT),
    };
    self
      .store
      .list_preferences_by_identity(&identity.identity_id, limit)
      .await
      .map_err(Error::storage)
  }

  /// Every identity's preference for `date`.
  pub async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<MealPreference>> {
    self.store.list_preferences_by_date(date).await.map_err(Error::storage)
  }
}
