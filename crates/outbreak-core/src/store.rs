//! The `HistoryStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `outbreak-store-sqlite`). The reconciliation driver and the read API
//! depend on this abstraction, not on any concrete backend.

use std::{collections::HashMap, future::Future};

use chrono::NaiveDate;

use crate::{
  Error, Result,
  record::{Country, CountryHistory, DayRecord},
};

/// Upper bound for the `lastDays` trailing window.
pub const MAX_LAST_DAYS: usize = 90;

// ─── Query type ──────────────────────────────────────────────────────────────

/// How much of a country's history to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
  Full,
  /// The `n` most recent days, still in ascending date order.
  Trailing(usize),
}

impl HistoryWindow {
  /// Validate a caller-supplied `lastDays`, falling back to `default` when
  /// it is not given.
  pub fn from_last_days(last_days: Option<usize>, default: Self) -> Result<Self> {
    match last_days {
      None => Ok(default),
      Some(n) if (1..=MAX_LAST_DAYS).contains(&n) => Ok(Self::Trailing(n)),
      Some(n) => Err(Error::LastDaysOutOfRange {
        requested: n,
        max:       MAX_LAST_DAYS,
      }),
    }
  }

  pub fn limit(self) -> Option<usize> {
    match self {
      Self::Full => None,
      Self::Trailing(n) => Some(n),
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a per-country history backend.
///
/// Day records are keyed by (country, date). A record is only ever written
/// whole: inserted once, then replaced as a unit when its content changes.
///
/// All methods return `Send` futures so the trait can be used from spawned
/// tasks and axum handlers.
pub trait HistoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reconciliation ────────────────────────────────────────────────────

  /// Every country's record for `date`, keyed by country name.
  fn days_on(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<HashMap<String, DayRecord>, Self::Error>> + Send + '_;

  /// Add `day` to `country`'s history, creating the country (with its
  /// static info) if it is not known yet. Info of an existing country is
  /// left untouched.
  fn insert_day(
    &self,
    country: Country,
    day: DayRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the stored record for `country_name` on `day.date`. Returns an
  /// error if there is no such record.
  fn replace_day(
    &self,
    country_name: String,
    day: DayRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Names of all known countries, alphabetically.
  fn list_country_names(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Resolve a user-supplied country reference: display name
  /// (case-insensitive), then ISO2, then ISO3. Returns `None` if nothing
  /// matches.
  fn find_country<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<Option<Country>, Self::Error>> + Send + 'a;

  /// One country's history in ascending date order.
  fn history(
    &self,
    country_name: String,
    window: HistoryWindow,
  ) -> impl Future<Output = Result<Vec<DayRecord>, Self::Error>> + Send + '_;

  /// Every country's history, countries alphabetically.
  fn all_histories(
    &self,
    window: HistoryWindow,
  ) -> impl Future<Output = Result<Vec<CountryHistory>, Self::Error>> + Send + '_;
}
