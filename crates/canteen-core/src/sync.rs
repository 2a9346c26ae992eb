//! Best-effort replication to the sibling service.
//!
//! [`Peer`] is the injectable transport; [`SyncPublisher`] wraps it with a
//! hard timeout and turns every failure into a logged
//! [`SyncOutcome::SyncFailed`]. Nothing here is retried or queued: a missed
//! push leaves the peer's cached copy stale until the next successful push
//! for the same date.

use std::{future::Future, sync::Arc, time::Duration};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{counts::MealCountSnapshot, menu::MenuSnapshot};

/// Reference bound on a single peer call.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// Header carrying the shared secret on service-to-service calls.
pub const PEER_TOKEN_HEADER: &str = "x-peer-token";

// ─── Transport ───────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PeerError {
  #[error("no peer configured")]
  NotConfigured,

  #[error("peer did not answer within {0:?}")]
  Timeout(Duration),

  #[error("transport error: {0}")]
  Transport(String),

  #[error("peer answered with status {0}")]
  Status(u16),

  #[error("could not decode peer response: {0}")]
  Decode(String),
}

/// The network surface of the sibling service.
pub trait Peer: Send + Sync {
  /// Deliver a meal count snapshot to the peer's ingestion endpoint.
  fn push_counts<'a>(
    &'a self,
    snapshot: &'a MealCountSnapshot,
  ) -> impl Future<Output = Result<(), PeerError>> + Send + 'a;

  /// Deliver a menu snapshot to the peer's ingestion endpoint.
  fn push_menu<'a>(
    &'a self,
    menu: &'a MenuSnapshot,
  ) -> impl Future<Output = Result<(), PeerError>> + Send + 'a;

  /// Ask the peer for its menu on `date`. `Ok(None)` means the peer has none.
  fn fetch_menu(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<MenuSnapshot>, PeerError>> + Send + '_;
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What happened to a push, reported next to the authoritative result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
  Synced,
  SyncFailed,
}

impl SyncOutcome {
  pub fn is_synced(&self) -> bool { matches!(self, Self::Synced) }
}

// ─── Publisher ───────────────────────────────────────────────────────────────

pub struct SyncPublisher<P> {
  peer:    Arc<P>,
  timeout: Duration,
}

impl<P> Clone for SyncPublisher<P> {
  fn clone(&self) -> Self { Self { peer: Arc::clone(&self.peer), timeout: self.timeout } }
}

impl<P: Peer> SyncPublisher<P> {
  pub fn new(peer: Arc<P>, timeout: Duration) -> Self { Self { peer, timeout } }

  pub fn peer(&self) -> &P { &self.peer }

  /// Push `snapshot` to the peer. Never fails; the outcome is reported.
  pub async fn push_counts(&self, snapshot: &MealCountSnapshot) -> SyncOutcome {
    let result = self.bounded(self.peer.push_counts(snapshot)).await;
    report("meal counts", snapshot.date, result)
  }

  /// Push `menu` to the peer. Never fails; the outcome is reported.
  pub async fn push_menu(&self, menu: &MenuSnapshot) -> SyncOutcome {
    let result = self.bounded(self.peer.push_menu(menu)).await;
    report("menu", menu.date, result)
  }

  /// Single bounded attempt to read the peer's menu for `date`.
  ///
  /// Any failure is logged and collapses to `None`.
  pub async fn fetch_menu(&self, date: NaiveDate) -> Option<MenuSnapshot> {
    match self.bounded(self.peer.fetch_menu(date)).await {
      Ok(menu) => {
        debug!(%date, found = menu.is_some(), "fetched menu from peer");
        menu
      }
      Err(PeerError::NotConfigured) => None,
      Err(e) => {
        warn!(%date, error = %e, "menu fetch from peer failed");
        None
      }
    }
  }

  async fn bounded<T>(
    &self,
    call: impl Future<Output = Result<T, PeerError>>,
  ) -> Result<T, PeerError> {
    tokio::time::timeout(self.timeout, call)
      .await
      .unwrap_or_else(|_| Err(PeerError::Timeout(self.timeout)))
  }
}

fn report(what: &str, date: NaiveDate, result: Result<(), PeerError>) -> SyncOutcome {
  match result {
    Ok(()) => {
      debug!(%date, "{what} pushed to peer");
      SyncOutcome::Synced
    }
    Err(PeerError::NotConfigured) => {
      debug!(%date, "no peer configured; {what} not pushed");
      SyncOutcome::SyncFailed
    }
    Err(e) => {
      warn!(%date, error = %e, "{what} push to peer failed");
      SyncOutcome::SyncFailed
    }
  }
}
