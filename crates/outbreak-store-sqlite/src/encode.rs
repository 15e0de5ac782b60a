//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` so that they sort lexically. Day records
//! are stored as compact JSON, which keeps absent statistics absent.

use chrono::{DateTime, NaiveDate, Utc};
use outbreak_core::record::{Country, CountryInfo, DayRecord};

use crate::Result;

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

// ─── DayRecord ───────────────────────────────────────────────────────────────

pub fn encode_day(day: &DayRecord) -> Result<String> {
  Ok(serde_json::to_string(day)?)
}

pub fn decode_day(s: &str) -> Result<DayRecord> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`raw_country`].
pub const COUNTRY_COLUMNS: &str =
  "name, iso2, iso3, latitude, longitude, flag_url, continent";

/// Values read directly from a `countries` row.
pub struct RawCountry {
  pub name:      String,
  pub iso2:      Option<String>,
  pub iso3:      Option<String>,
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
  pub flag_url:  Option<String>,
  pub continent: Option<String>,
}

pub fn raw_country(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCountry> {
  Ok(RawCountry {
    name:      row.get(0)?,
    iso2:      row.get(1)?,
    iso3:      row.get(2)?,
    latitude:  row.get(3)?,
    longitude: row.get(4)?,
    flag_url:  row.get(5)?,
    continent: row.get(6)?,
  })
}

impl RawCountry {
  pub fn into_country(self) -> Country {
    Country {
      name: self.name,
      info: CountryInfo {
        iso2:      self.iso2,
        iso3:      self.iso3,
        latitude:  self.latitude,
        longitude: self.longitude,
        flag_url:  self.flag_url,
        continent: self.continent,
      },
    }
  }
}
