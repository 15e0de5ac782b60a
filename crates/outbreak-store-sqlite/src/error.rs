//! Error type for `outbreak-store-sqlite`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// Attempted to replace a day record that was never inserted.
  #[error("no record for {country} on {date}")]
  DayNotFound { country: String, date: NaiveDate },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
