//! Daily menus and the local menu cache with peer fallback.
//!
//! The admin deployment owns menus and pushes each published menu to the
//! employee deployment. The employee deployment answers reads from its own
//! copy and, on a miss, makes one bounded attempt to fetch from the admin
//! peer, caching whatever comes back.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
  Error, Result,
  clock::Calendar,
  counts::DateRange,
  store::CanteenStore,
  sync::{Peer, SyncOutcome, SyncPublisher},
};

/// The published menu for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSnapshot {
  pub date:       NaiveDate,
  /// Weekday label shown to staff, e.g. `"Tuesday"`.
  #[serde(default)]
  pub day:        String,
  #[serde(default)]
  pub breakfast:  Vec<String>,
  #[serde(default)]
  pub lunch:      Vec<String>,
  #[serde(default)]
  pub snacks:     Vec<String>,
  /// Last-modified marker, set by the publishing side.
  pub updated_at: DateTime<FixedOffset>,
  #[serde(default)]
  pub updated_by: Option<String>,
}

/// Input for publishing a menu.
#[derive(Debug, Clone, Default)]
pub struct NewMenu {
  pub date:      Option<NaiveDate>,
  pub day:       Option<String>,
  pub breakfast: Vec<String>,
  pub lunch:     Vec<String>,
  pub snacks:    Vec<String>,
}

fn clean(items: Vec<String>) -> Vec<String> {
  items
    .into_iter()
    .map(|item| item.trim().to_owned())
    .filter(|item| !item.is_empty())
    .collect()
}

// ─── Directory ───────────────────────────────────────────────────────────────

pub struct MenuDirectory<S, P> {
  store:         Arc<S>,
  publisher:     SyncPublisher<P>,
  calendar:      Calendar,
  peer_fallback: bool,
}

impl<S, P> Clone for MenuDirectory<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:         Arc::clone(&self.store),
      publisher:     self.publisher.clone(),
      calendar:      self.calendar.clone(),
      peer_fallback: self.peer_fallback,
    }
  }
}

impl<S: CanteenStore, P: Peer> MenuDirectory<S, P> {
  pub fn new(
    store: Arc<S>,
    publisher: SyncPublisher<P>,
    calendar: Calendar,
    peer_fallback: bool,
  ) -> Self {
    Self { store, publisher, calendar, peer_fallback }
  }

  /// The menu for `date`, falling back to the peer on a local miss when
  /// enabled. `None` means the menu has not been published.
  pub async fn get(&self, date: NaiveDate) -> Result<Option<MenuSnapshot>> {
    if let Some(menu) = self.store.get_menu(date).await.map_err(Error::storage)? {
      return Ok(Some(menu));
    }
    if !self.peer_fallback {
      return Ok(None);
    }

    let Some(menu) = self.publisher.fetch_menu(date).await else {
      return Ok(None);
    };
    if let Err(e) = self.store.upsert_menu(menu.clone()).await {
      warn!(%date, error = %e, "could not cache menu fetched from peer");
    }
    Ok(Some(menu))
  }

  /// Publish a menu locally, then push it to the peer.
  ///
  /// The local write is authoritative; the push outcome is only reported.
  pub async fn publish(&self, input: NewMenu, updated_by: &str) -> Result<(MenuSnapshot, SyncOutcome)> {
    let date = input.date.ok_or_else(|| Error::Validation("date is required".into()))?;
    let day = input
      .day
      .map(|d| d.trim().to_owned())
      .filter(|d| !d.is_empty())
      .unwrap_or_else(|| date.format("%A").to_string());

    let menu = MenuSnapshot {
      date,
      day,
      breakfast: clean(input.breakfast),
      lunch: clean(input.lunch),
      snacks: clean(input.snacks),
      updated_at: self.calendar.now(),
      updated_by: Some(updated_by.to_owned()),
    };

    let stored = self.store.upsert_menu(menu).await.map_err(Error::storage)?;
    info!(%date, by = updated_by, "menu published");
    let sync = self.publisher.push_menu(&stored).await;
    Ok((stored, sync))
  }

  /// Store a menu pushed by the peer, as received.
  pub async fn ingest(&self, menu: MenuSnapshot) -> Result<MenuSnapshot> {
    let date = menu.date;
    let stored = self.store.upsert_menu(menu).await.map_err(Error::storage)?;
    info!(%date, "menu ingested from peer");
    Ok(stored)
  }

  /// Every locally stored menu, date descending.
  pub async fn list_all(&self) -> Result<Vec<MenuSnapshot>> {
    self.store.list_menus(DateRange::default()).await.map_err(Error::storage)
  }

  /// Locally stored menus for the Monday–Sunday week containing today,
  /// date ascending.
  pub async fn current_week(&self) -> Result<Vec<MenuSnapshot>> {
    let today = self.calendar.today();
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let sunday = monday + Duration::days(6);

    let mut menus = self
      .store
      .list_menus(DateRange { start: Some(monday), end: Some(sunday) })
      .await
      .map_err(Error::storage)?;
    menus.reverse();
    Ok(menus)
  }
}
