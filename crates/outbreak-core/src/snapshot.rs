//! Raw upstream country snapshots and their normalisation into
//! [`DayRecord`]s.
//!
//! The upstream payload mixes identity (`country`, `countryInfo`,
//! `continent`), a publication timestamp (`updated`) and the day's
//! statistics, with the day deltas named `today*`. Normalisation keeps only
//! the statistics, renames the deltas to `daily*` and stamps the target date.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::record::{Country, CountryInfo, DayRecord, Reading};

/// `countryInfo` as sent by the upstream source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCountryInfo {
  #[serde(default)]
  pub iso2: Option<String>,
  #[serde(default)]
  pub iso3: Option<String>,
  #[serde(default)]
  pub lat:  Option<f64>,
  #[serde(default)]
  pub long: Option<f64>,
  #[serde(default)]
  pub flag: Option<String>,
}

/// One element of the upstream `/countries` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCountrySnapshot {
  pub country:                   String,
  #[serde(default)]
  pub country_info:              RawCountryInfo,
  #[serde(default)]
  pub continent:                 Option<String>,
  /// Upstream publication time in epoch milliseconds.
  #[serde(default)]
  pub updated:                   Option<i64>,
  #[serde(default)]
  pub cases:                     Reading,
  #[serde(default)]
  pub today_cases:               Reading,
  #[serde(default)]
  pub deaths:                    Reading,
  #[serde(default)]
  pub today_deaths:              Reading,
  #[serde(default)]
  pub recovered:                 Reading,
  #[serde(default)]
  pub today_recovered:           Reading,
  #[serde(default)]
  pub active:                    Reading,
  #[serde(default)]
  pub critical:                  Reading,
  #[serde(default)]
  pub cases_per_one_million:     Reading,
  #[serde(default)]
  pub deaths_per_one_million:    Reading,
  #[serde(default)]
  pub tests:                     Reading,
  #[serde(default)]
  pub tests_per_one_million:     Reading,
  #[serde(default)]
  pub population:                Reading,
  #[serde(default)]
  pub one_case_per_people:       Reading,
  #[serde(default)]
  pub one_death_per_people:      Reading,
  #[serde(default)]
  pub one_test_per_people:       Reading,
  #[serde(default)]
  pub active_per_one_million:    Reading,
  #[serde(default)]
  pub recovered_per_one_million: Reading,
  #[serde(default)]
  pub critical_per_one_million:  Reading,
}

impl RawCountrySnapshot {
  /// The identity of the reporting country, stored once on its parent
  /// record rather than per day.
  pub fn country(&self) -> Country {
    let info = &self.country_info;
    Country {
      name: self.country.clone(),
      info: CountryInfo {
        iso2:      info.iso2.clone(),
        iso3:      info.iso3.clone(),
        latitude:  info.lat,
        longitude: info.long,
        flag_url:  info.flag.clone(),
        continent: self.continent.clone(),
      },
    }
  }

  /// Build the [`DayRecord`] for `date`. `dailyTests` is left absent; see
  /// [`crate::enrich::enrich`].
  pub fn normalize(&self, date: NaiveDate) -> DayRecord {
    DayRecord {
      date,
      cases: self.cases,
      daily_cases: self.today_cases,
      deaths: self.deaths,
      daily_deaths: self.today_deaths,
      recovered: self.recovered,
      daily_recovered: self.today_recovered,
      active: self.active,
      critical: self.critical,
      cases_per_one_million: self.cases_per_one_million,
      deaths_per_one_million: self.deaths_per_one_million,
      tests: self.tests,
      daily_tests: Reading::Absent,
      tests_per_one_million: self.tests_per_one_million,
      population: self.population,
      one_case_per_people: self.one_case_per_people,
      one_death_per_people: self.one_death_per_people,
      one_test_per_people: self.one_test_per_people,
      active_per_one_million: self.active_per_one_million,
      recovered_per_one_million: self.recovered_per_one_million,
      critical_per_one_million: self.critical_per_one_million,
    }
  }
}
