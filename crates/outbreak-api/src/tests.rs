//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode},
};
use chrono::{Days, NaiveDate};
use outbreak_core::{
  record::{Country, CountryInfo, DayRecord, Reading},
  store::HistoryStore,
};
use outbreak_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

fn start() -> NaiveDate { NaiveDate::from_ymd_opt(2021, 1, 1).unwrap() }

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

fn day(offset: u64) -> DayRecord {
  let mut record = DayRecord::empty(start() + Days::new(offset));
  record.cases = Reading::Value(offset as f64 * 10.0);
  record.daily_tests = match offset {
    0 => Reading::Absent,
    1 => Reading::Unknown,
    n => Reading::Value(n as f64),
  };
  record
}

/// Italy with 95 days of history, Germany with 3.
async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  for offset in 0..95 {
    store.insert_day(country("Italy", "IT", "ITA"), day(offset)).await.unwrap();
  }
  for offset in 0..3 {
    store.insert_day(country("Germany", "DE", "DEU"), day(offset)).await.unwrap();
  }
  api_router(Arc::new(store))
}

async fn get(uri: &str) -> (StatusCode, Value) {
  let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
  let resp = app().await.oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap())
}

fn dates(history: &Value) -> Vec<String> {
  history
    .as_array()
    .unwrap()
    .iter()
    .map(|day| day["date"].as_str().unwrap().to_owned())
    .collect()
}

fn date_str(offset: u64) -> String { (start() + Days::new(offset)).to_string() }

// ── Countries ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn lists_country_names() {
  let (status, body) = get("/countries").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!(["Germany", "Italy"]));
}

#[tokio::test]
async fn info_resolves_iso2_and_names_the_country() {
  let (status, body) = get("/countries/it/info").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["country"], "Italy");
  assert_eq!(body["iso2"], "IT");
  assert_eq!(body["iso3"], "ITA");
  assert_eq!(body["lat"], 42.8333);
  assert_eq!(body["flag"], "https://disease.sh/assets/img/flags/it.png");
  assert_eq!(body["continent"], "Europe");
}

#[tokio::test]
async fn info_for_unknown_country_is_404() {
  let (status, body) = get("/countries/ZZ/info").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "error": "Country ZZ not found" }));
}

// ── History ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn country_history_defaults_to_everything() {
  let (status, body) = get("/history/italy").await;
  assert_eq!(status, StatusCode::OK);
  let dates = dates(&body);
  assert_eq!(dates.len(), 95);
  assert_eq!(dates.first(), Some(&date_str(0)));
  assert_eq!(dates.last(), Some(&date_str(94)));
}

#[tokio::test]
async fn country_history_trailing_window() {
  let (status, body) = get("/history/ITA?lastDays=5").await;
  assert_eq!(status, StatusCode::OK);
  let expected: Vec<_> = (90..95).map(date_str).collect();
  assert_eq!(dates(&body), expected);
}

#[tokio::test]
async fn day_records_keep_tri_state_readings() {
  let (_, body) = get("/history/Germany").await;
  let days = body.as_array().unwrap();
  assert!(days[0].get("dailyTests").is_none());
  assert_eq!(days[1]["dailyTests"], Value::Null);
  assert_eq!(days[2]["dailyTests"], 2);
  assert_eq!(days[2]["cases"], 20);
  assert!(days[2].get("deaths").is_none());
}

#[tokio::test]
async fn out_of_range_last_days_is_400() {
  for uri in [
    "/history/Italy?lastDays=91",
    "/history/Italy?lastDays=0",
    "/history/Italy?lastDays=-3",
    "/history/Italy?lastDays=many",
    "/history/all?lastDays=91",
  ] {
    let (status, body) = get(uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    assert!(body["error"].as_str().unwrap().contains("lastDays"), "{uri}");
  }
}

#[tokio::test]
async fn history_for_unknown_country_is_404() {
  let (status, body) = get("/history/Atlantis").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "Country Atlantis not found");
}

#[tokio::test]
async fn all_histories_default_to_ninety_days() {
  let (status, body) = get("/history/all").await;
  assert_eq!(status, StatusCode::OK);
  let all = body.as_array().unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0]["country"], "Germany");
  assert_eq!(dates(&all[0]["history"]).len(), 3);
  assert_eq!(all[1]["country"], "Italy");
  let italy = dates(&all[1]["history"]);
  assert_eq!(italy.len(), 90);
  assert_eq!(italy.first(), Some(&date_str(5)));
}

#[tokio::test]
async fn empty_last_days_falls_back_to_default() {
  for uri in ["/history/all?lastDays=", "/history/all?lastDays=%20"] {
    let (status, body) = get(uri).await;
    assert_eq!(status, StatusCode::OK, "{uri}");
    assert_eq!(dates(&body[1]["history"]).len(), 90, "{uri}");
  }
  let (status, body) = get("/history/Italy?lastDays=").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(dates(&body).len(), 95);
}

#[tokio::test]
async fn all_histories_with_explicit_window() {
  let (_, body) = get("/history/all?lastDays=2").await;
  for entry in body.as_array().unwrap() {
    assert_eq!(dates(&entry["history"]).len(), 2);
  }
}

// ── Single statistic ─────────────────────────────────────────────────────────

#[tokio::test]
async fn single_key_series_has_one_point_per_day() {
  let (status, body) = get("/history/de/dailyTests").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body,
    json!([
      { "date": date_str(0) },
      { "date": date_str(1), "dailyTests": null },
      { "date": date_str(2), "dailyTests": 2 },
    ])
  );
}

#[tokio::test]
async fn single_key_series_respects_window() {
  let (_, body) = get("/history/Italy/cases?lastDays=2").await;
  assert_eq!(
    body,
    json!([
      { "date": date_str(93), "cases": 930 },
      { "date": date_str(94), "cases": 940 },
    ])
  );
}

#[tokio::test]
async fn keys_without_a_statistic_yield_dates_only() {
  for key in ["date", "favouriteColour"] {
    let (status, body) = get(&format!("/history/Germany/{key}")).await;
    assert_eq!(status, StatusCode::OK, "{key}");
    assert_eq!(
      body,
      json!([
        { "date": date_str(0) },
        { "date": date_str(1) },
        { "date": date_str(2) },
      ]),
      "{key}"
    );
  }
}

#[tokio::test]
async fn single_key_series_for_unknown_country_is_404() {
  let (status, body) = get("/history/Atlantis/cases").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "Country Atlantis not found");
}
