//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, FixedOffset, NaiveDate};
use canteen_core::{
  counts::{DateRange, MealCountSnapshot},
  identity::Identity,
  menu::MenuSnapshot,
  preference::{MealChoice, MealPreference},
  store::CanteenStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2025, 6, d).unwrap() }

fn at(s: &str) -> DateTime<FixedOffset> { DateTime::parse_from_rfc3339(s).unwrap() }

fn person(id: &str) -> Identity {
  Identity {
    identity_id:  id.to_owned(),
    display_name: format!("Staff {id}"),
    department:   "Kitchen".to_owned(),
  }
}

fn pref(id: &str, date: NaiveDate, meals: MealChoice) -> MealPreference {
  MealPreference::submitted(&person(id), date, meals, at("2025-06-01T09:00:00+05:30"))
}

fn menu(date: NaiveDate, lunch: &[&str]) -> MenuSnapshot {
  MenuSnapshot {
    date,
    day: date.format("%A").to_string(),
    breakfast: vec!["Idli".into()],
    lunch: lunch.iter().map(|s| s.to_string()).collect(),
    snacks: Vec::new(),
    updated_at: at("2025-06-01T18:30:00+05:30"),
    updated_by: Some("admin-1".into()),
  }
}

// ─── Preferences ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_get_preference() {
  let s = store().await;
  let written = s
    .upsert_preference(pref("e1", day(10), MealChoice::new(true, false, true)))
    .await
    .unwrap();

  let fetched = s.get_preference("e1", day(10)).await.unwrap().unwrap();
  assert_eq!(fetched, written);
  assert_eq!(fetched.display_name, "Staff e1");
}

#[tokio::test]
async fn get_preference_missing_returns_none() {
  let s = store().await;
  assert!(s.get_preference("nobody", day(10)).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_fully_replaces_one_row() {
  let s = store().await;
  s.upsert_preference(pref("e1", day(10), MealChoice::new(true, true, true)))
    .await
    .unwrap();

  let mut second = pref("e1", day(10), MealChoice::new(false, true, false));
  second.last_updated = Some(at("2025-06-09T20:00:00+05:30"));
  s.upsert_preference(second.clone()).await.unwrap();

  let rows = s.list_preferences_by_date(day(10)).await.unwrap();
  assert_eq!(rows, vec![second]);
}

#[tokio::test]
async fn preference_without_timestamp_is_rejected() {
  let s = store().await;
  let unsubmitted = MealPreference::unsubmitted(&person("e1"), day(10));
  let err = s.upsert_preference(unsubmitted).await.unwrap_err();
  assert!(matches!(err, Error::Invalid(_)));
  assert!(s.get_preference("e1", day(10)).await.unwrap().is_none());
}

#[tokio::test]
async fn list_by_identity_is_date_descending_and_limited() {
  let s = store().await;
  for d in [3, 7, 5, 1] {
    s.upsert_preference(pref("e1", day(d), MealChoice::new(true, false, false)))
      .await
      .unwrap();
  }
  s.upsert_preference(pref("e2", day(9), MealChoice::NONE))
    .await
    .unwrap();

  let dates: Vec<_> = s
    .list_preferences_by_identity("e1", 3)
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.date)
    .collect();
  assert_eq!(dates, vec![day(7), day(5), day(3)]);
}

#[tokio::test]
async fn list_by_date_only_returns_that_date() {
  let s = store().await;
  s.upsert_preference(pref("e1", day(10), MealChoice::NONE)).await.unwrap();
  s.upsert_preference(pref("e2", day(10), MealChoice::NONE)).await.unwrap();
  s.upsert_preference(pref("e1", day(11), MealChoice::NONE)).await.unwrap();

  let rows = s.list_preferences_by_date(day(10)).await.unwrap();
  assert_eq!(rows.len(), 2);
  assert!(rows.iter().all(|p| p.date == day(10)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upserts_for_one_key_keep_one_row() {
  let s = store().await;

  let tasks: Vec<_> = (0..20)
    .map(|i| {
      let s = s.clone();
      tokio::spawn(async move {
        s.upsert_preference(pref("e1", day(11), MealChoice::new(i % 2 == 0, true, false)))
          .await
          .unwrap();
      })
    })
    .collect();
  for task in tasks {
    task.await.unwrap();
  }

  let rows = s.list_preferences_by_date(day(11)).await.unwrap();
  assert_eq!(rows.len(), 1);
  let tally = MealCountSnapshot::tally(day(11), &rows, at("2025-06-09T10:00:00+05:30"));
  assert_eq!(tally.total_employees, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upserts_for_distinct_keys_all_land() {
  let s = store().await;

  let tasks: Vec<_> = (0..20)
    .map(|i| {
      let s = s.clone();
      tokio::spawn(async move {
        s.upsert_preference(pref(&format!("e{i}"), day(11), MealChoice::new(true, false, false)))
          .await
          .unwrap();
      })
    })
    .collect();
  for task in tasks {
    task.await.unwrap();
  }

  let rows = s.list_preferences_by_date(day(11)).await.unwrap();
  assert_eq!(rows.len(), 20);
}

// ─── Meal counts ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn counts_missing_returns_none() {
  let s = store().await;
  assert!(s.get_counts(day(10)).await.unwrap().is_none());
}

#[tokio::test]
async fn counts_upsert_replaces() {
  let s = store().await;
  let prefs = [
    pref("e1", day(10), MealChoice::new(true, true, false)),
    pref("e2", day(10), MealChoice::new(false, true, false)),
  ];
  let first = MealCountSnapshot::tally(day(10), &prefs, at("2025-06-09T10:00:00+05:30"));
  s.upsert_counts(first).await.unwrap();

  let second = MealCountSnapshot::tally(day(10), &prefs[..1], at("2025-06-09T11:00:00+05:30"));
  s.upsert_counts(second.clone()).await.unwrap();

  let fetched = s.get_counts(day(10)).await.unwrap().unwrap();
  assert_eq!(fetched, second);
  assert_eq!(fetched.total_employees, 1);
}

#[tokio::test]
async fn zero_snapshot_keeps_null_computed_at() {
  let s = store().await;
  s.upsert_counts(MealCountSnapshot::zero(day(10))).await.unwrap();
  let fetched = s.get_counts(day(10)).await.unwrap().unwrap();
  assert!(fetched.computed_at.is_none());
}

#[tokio::test]
async fn counts_range_is_inclusive_and_descending() {
  let s = store().await;
  for d in 1..=6 {
    s.upsert_counts(MealCountSnapshot::zero(day(d))).await.unwrap();
  }

  let dates = |v: Vec<MealCountSnapshot>| v.into_iter().map(|c| c.date).collect::<Vec<_>>();

  let bounded = s
    .list_counts(DateRange::new(Some(day(2)), Some(day(4))).unwrap())
    .await
    .unwrap();
  assert_eq!(dates(bounded), vec![day(4), day(3), day(2)]);

  let open_start = s
    .list_counts(DateRange::new(None, Some(day(2))).unwrap())
    .await
    .unwrap();
  assert_eq!(dates(open_start), vec![day(2), day(1)]);

  let open_end = s
    .list_counts(DateRange::new(Some(day(5)), None).unwrap())
    .await
    .unwrap();
  assert_eq!(dates(open_end), vec![day(6), day(5)]);

  assert_eq!(s.list_counts(DateRange::default()).await.unwrap().len(), 6);
}

// ─── Menus ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn menu_round_trips_with_offset() {
  let s = store().await;
  let m = menu(day(10), &["Rice", "Dal"]);
  s.upsert_menu(m.clone()).await.unwrap();

  let fetched = s.get_menu(day(10)).await.unwrap().unwrap();
  assert_eq!(fetched, m);
  assert_eq!(fetched.updated_at.offset().local_minus_utc(), 19_800);
}

#[tokio::test]
async fn menu_upsert_replaces() {
  let s = store().await;
  s.upsert_menu(menu(day(10), &["Rice"])).await.unwrap();
  s.upsert_menu(menu(day(10), &["Biryani"])).await.unwrap();

  let all = s.list_menus(DateRange::default()).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].lunch, vec!["Biryani".to_owned()]);
}

#[tokio::test]
async fn menus_list_descending_within_range() {
  let s = store().await;
  for d in [9, 10, 11, 16] {
    s.upsert_menu(menu(day(d), &[])).await.unwrap();
  }
  let listed = s
    .list_menus(DateRange::new(Some(day(9)), Some(day(15))).unwrap())
    .await
    .unwrap();
  let dates: Vec<_> = listed.into_iter().map(|m| m.date).collect();
  assert_eq!(dates, vec![day(11), day(10), day(9)]);
}

#[tokio::test]
async fn get_menu_missing_returns_none() {
  let s = store().await;
  assert!(s.get_menu(day(10)).await.unwrap().is_none());
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_succeeds() {
  let s = store().await;
  s.ping().await.unwrap();
}

#[tokio::test]
async fn file_store_persists_across_reopen() {
  let path = std::env::temp_dir().join(format!("canteen-store-{}.db", std::process::id()));
  let _ = std::fs::remove_file(&path);

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.upsert_preference(pref("e1", day(10), MealChoice::new(true, false, false)))
      .await
      .unwrap();
  }

  let reopened = SqliteStore::open(&path).await.unwrap();
  let fetched = reopened.get_preference("e1", day(10)).await.unwrap().unwrap();
  assert!(fetched.meals.breakfast);

  drop(reopened);
  let _ = std::fs::remove_file(&path);
}
