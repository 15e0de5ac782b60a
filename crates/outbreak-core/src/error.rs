//! Error types for `outbreak-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown statistic field: {0:?}")]
  UnknownField(String),

  #[error("lastDays must be between 1 and {max}, got {requested}")]
  LastDaysOutOfRange { requested: usize, max: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
