//! Error types for `outbreak-sync`.

use thiserror::Error;

/// Failure talking to the upstream source.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("http status {status} for {url}")]
  Status { status: u16, url: String },
}

/// Failure inside a reconciliation cycle.
#[derive(Debug, Error)]
pub enum Error {
  /// The bellwether could not be fetched, so the target dates are unknown.
  #[error("date-shift detection failed: {0}")]
  ShiftDetection(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("upstream fetch failed: {0}")]
  Fetch(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
