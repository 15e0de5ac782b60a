//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Days, NaiveDate};
use outbreak_core::{
  record::{Country, CountryInfo, DayRecord, Reading},
  store::{HistoryStore, HistoryWindow},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn country(name: &str, iso2: &str, iso3: &str) -> Country {
  Country {
    name: name.into(),
    info: CountryInfo {
      iso2:      Some(iso2.into()),
      iso3:      Some(iso3.into()),
      latitude:  Some(42.8333),
      longitude: Some(12.8333),
      flag_url:  Some(format!("https://disease.sh/assets/img/flags/{}.png", iso2.to_lowercase())),
      continent: Some("Europe".into()),
    },
  }
}

fn italy() -> Country { country("Italy", "IT", "ITA") }

fn start() -> NaiveDate { NaiveDate::from_ymd_opt(2021, 1, 1).unwrap() }

fn day(offset: u64, cases: f64) -> DayRecord {
  let mut record = DayRecord::empty(start() + Days::new(offset));
  record.cases = Reading::Value(cases);
  record
}

// ─── Writes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_creates_country_and_day() {
  let s = store().await;
  s.insert_day(italy(), day(0, 10.0)).await.unwrap();

  assert_eq!(s.list_country_names().await.unwrap(), vec!["Italy".to_string()]);

  let on_day = s.days_on(start()).await.unwrap();
  assert_eq!(on_day.len(), 1);
  assert_eq!(on_day["Italy"], day(0, 10.0));
}

#[tokio::test]
async fn country_info_is_kept_from_first_sighting() {
  let s = store().await;
  s.insert_day(italy(), day(0, 10.0)).await.unwrap();

  let mut changed = italy();
  changed.info.continent = Some("Elsewhere".into());
  s.insert_day(changed, day(1, 11.0)).await.unwrap();

  let found = s.find_country("Italy").await.unwrap().unwrap();
  assert_eq!(found.info.continent.as_deref(), Some("Europe"));
  assert_eq!(s.history("Italy".into(), HistoryWindow::Full).await.unwrap().len(), 2);
}

#[tokio::test]
async fn one_record_per_country_and_date() {
  let s = store().await;
  s.insert_day(italy(), day(0, 10.0)).await.unwrap();
  s.insert_day(italy(), day(0, 12.0)).await.unwrap();

  let history = s.history("Italy".into(), HistoryWindow::Full).await.unwrap();
  assert_eq!(history, vec![day(0, 12.0)]);
}

#[tokio::test]
async fn differently_cased_name_lands_on_canonical_country() {
  let s = store().await;
  s.insert_day(italy(), day(0, 10.0)).await.unwrap();
  s.insert_day(country("ITALY", "IT", "ITA"), day(1, 11.0)).await.unwrap();

  assert_eq!(s.list_country_names().await.unwrap(), vec!["Italy".to_string()]);
  let on_day = s.days_on(start() + Days::new(1)).await.unwrap();
  assert!(on_day.contains_key("Italy"));
}

#[tokio::test]
async fn replace_overwrites_whole_record() {
  let s = store().await;
  let mut original = day(0, 10.0);
  original.deaths = Reading::Value(1.0);
  s.insert_day(italy(), original).await.unwrap();

  let replacement = day(0, 15.0);
  s.replace_day("Italy".into(), replacement.clone()).await.unwrap();

  let stored = s.days_on(start()).await.unwrap().remove("Italy").unwrap();
  assert_eq!(stored, replacement);
  assert_eq!(stored.deaths, Reading::Absent);
}

#[tokio::test]
async fn replace_missing_day_errors() {
  let s = store().await;
  s.insert_day(italy(), day(0, 10.0)).await.unwrap();

  let err = s.replace_day("Italy".into(), day(1, 11.0)).await.unwrap_err();
  assert!(matches!(err, Error::DayNotFound { ref country, .. } if country == "Italy"));
}

#[tokio::test]
async fn unknown_and_absent_survive_storage() {
  let s = store().await;
  let mut record = day(0, 10.0);
  record.daily_tests = Reading::Unknown;
  s.insert_day(italy(), record.clone()).await.unwrap();

  let stored = s.days_on(start()).await.unwrap().remove("Italy").unwrap();
  assert_eq!(stored.daily_tests, Reading::Unknown);
  assert_eq!(stored.tests, Reading::Absent);
  assert_eq!(stored, record);
}

// ─── Country resolution ──────────────────────────────────────────────────────

async fn seeded() -> SqliteStore {
  let s = store().await;
  s.insert_day(italy(), day(0, 10.0)).await.unwrap();
  s.insert_day(country("Germany", "DE", "DEU"), day(0, 20.0)).await.unwrap();
  s
}

#[tokio::test]
async fn find_by_name_any_case() {
  let s = seeded().await;
  for query in ["Italy", "italy", "ITALY", "iTaLy"] {
    let found = s.find_country(query).await.unwrap().unwrap();
    assert_eq!(found.name, "Italy", "{query}");
  }
}

#[tokio::test]
async fn find_by_iso_codes() {
  let s = seeded().await;
  assert_eq!(s.find_country("IT").await.unwrap().unwrap().name, "Italy");
  assert_eq!(s.find_country("deu").await.unwrap().unwrap().name, "Germany");
}

#[tokio::test]
async fn find_unknown_returns_none() {
  let s = seeded().await;
  assert!(s.find_country("ZZ").await.unwrap().is_none());
}

// ─── History windows ─────────────────────────────────────────────────────────

#[tokio::test]
async fn trailing_window_is_most_recent_ascending() {
  let s = store().await;
  for offset in (0..10).rev() {
    s.insert_day(italy(), day(offset, offset as f64)).await.unwrap();
  }

  let history = s
    .history("Italy".into(), HistoryWindow::Trailing(5))
    .await
    .unwrap();
  let dates: Vec<_> = history.iter().map(|d| d.date).collect();
  let expected: Vec<_> = (5..10).map(|offset| start() + Days::new(offset)).collect();
  assert_eq!(dates, expected);
}

#[tokio::test]
async fn all_histories_caps_each_country() {
  let s = store().await;
  for offset in 0..95 {
    s.insert_day(italy(), day(offset, offset as f64)).await.unwrap();
  }
  s.insert_day(country("Germany", "DE", "DEU"), day(94, 1.0)).await.unwrap();

  let all = s.all_histories(HistoryWindow::Trailing(90)).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].country, "Germany");
  assert_eq!(all[0].history.len(), 1);
  assert_eq!(all[1].country, "Italy");
  assert_eq!(all[1].history.len(), 90);
  assert_eq!(all[1].history.first().unwrap().date, start() + Days::new(5));
  assert_eq!(all[1].history.last().unwrap().date, start() + Days::new(94));
}

#[tokio::test]
async fn full_window_returns_everything() {
  let s = store().await;
  for offset in 0..95 {
    s.insert_day(italy(), day(offset, offset as f64)).await.unwrap();
  }
  let all = s.all_histories(HistoryWindow::Full).await.unwrap();
  assert_eq!(all[0].history.len(), 95);
}

#[tokio::test]
async fn close_releases_connection() {
  let s = seeded().await;
  s.close().await.unwrap();
}
