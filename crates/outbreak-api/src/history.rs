//! Handlers for `/history` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/history/all` | `?lastDays=<1..=90>`, default 90 |
//! | `GET`  | `/history/{country}` | `?lastDays=<1..=90>`, default full history |
//! | `GET`  | `/history/{country}/{key}` | One statistic as `[{date, <key>}]`, one entry per day |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use outbreak_core::{
  record::{CountryHistory, DayRecord, Reading, StatField},
  store::{HistoryStore, HistoryWindow, MAX_LAST_DAYS},
};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap as _};

use crate::{countries::resolve, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
  /// Kept as text so a malformed value gets the JSON 400 body.
  #[serde(rename = "lastDays")]
  pub last_days: Option<String>,
}

impl HistoryParams {
  fn window(&self, default: HistoryWindow) -> Result<HistoryWindow, ApiError> {
    // An empty `lastDays=` means "not given".
    let last_days = self
      .last_days
      .as_deref()
      .filter(|raw| !raw.trim().is_empty())
      .map(|raw| {
        raw.trim().parse::<usize>().map_err(|_| {
          ApiError::BadRequest(format!(
            "lastDays must be between 1 and {MAX_LAST_DAYS}, got {raw:?}"
          ))
        })
      })
      .transpose()?;
    Ok(HistoryWindow::from_last_days(last_days, default)?)
  }
}

// ─── All countries ────────────────────────────────────────────────────────────

/// `GET /history/all[?lastDays=<n>]`
pub async fn all<S: HistoryStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<CountryHistory>>, ApiError> {
  let window = params.window(HistoryWindow::Trailing(MAX_LAST_DAYS))?;
  let histories = store.all_histories(window).await.map_err(ApiError::store)?;
  Ok(Json(histories))
}

// ─── One country ──────────────────────────────────────────────────────────────

/// `GET /history/{country}[?lastDays=<n>]`
pub async fn one<S: HistoryStore>(
  State(store): State<Arc<S>>,
  Path(country): Path<String>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<DayRecord>>, ApiError> {
  let window = params.window(HistoryWindow::Full)?;
  let country = resolve(store.as_ref(), &country).await?;
  let history = store
    .history(country.name, window)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(history))
}

// ─── Single statistic ─────────────────────────────────────────────────────────

/// One entry of a single-statistic series, serialised as
/// `{"date": ..., "<key>": ...}`. The key is left out when the day does not
/// carry it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
  pub date:  NaiveDate,
  pub key:   String,
  pub value: Reading,
}

impl Serialize for SeriesPoint {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let with_value = !self.value.is_absent();
    let mut map = serializer.serialize_map(Some(1 + usize::from(with_value)))?;
    map.serialize_entry("date", &self.date)?;
    if with_value {
      map.serialize_entry(&self.key, &self.value)?;
    }
    map.end()
  }
}

/// One point per stored day. Keys that name no statistic (including `date`
/// itself) yield points carrying only the date.
pub fn series(history: &[DayRecord], key: &str) -> Vec<SeriesPoint> {
  let field = key.parse::<StatField>().ok();
  history
    .iter()
    .map(|day| SeriesPoint {
      date:  day.date,
      key:   key.to_owned(),
      value: field.map_or(Reading::Absent, |field| day.get(field)),
    })
    .collect()
}

/// `GET /history/{country}/{key}[?lastDays=<n>]`
pub async fn series_handler<S: HistoryStore>(
  State(store): State<Arc<S>>,
  Path((country, key)): Path<(String, String)>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<SeriesPoint>>, ApiError> {
  let window = params.window(HistoryWindow::Full)?;
  let country = resolve(store.as_ref(), &country).await?;
  let history = store
    .history(country.name, window)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(series(&history, &key)))
}
