//! Day records and the country container that owns them.
//!
//! A [`DayRecord`] is one country's statistics for one calendar date. Each
//! statistic is a [`Reading`], which keeps "never sent" apart from "sent as
//! `null`" so that a change in the shape of a record is visible to the
//! differ.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::IgnoredAny};

use crate::{Error, Result};

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

// ─── Reading ─────────────────────────────────────────────────────────────────

/// A single reported statistic.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Reading {
  /// The key is not present at all.
  #[default]
  Absent,
  /// The key is present but its value is `null`.
  Unknown,
  Value(f64),
}

impl Reading {
  pub fn is_absent(&self) -> bool { matches!(self, Self::Absent) }

  pub fn value(&self) -> Option<f64> {
    match self {
      Self::Value(v) => Some(*v),
      Self::Absent | Self::Unknown => None,
    }
  }
}

impl From<Option<f64>> for Reading {
  fn from(value: Option<f64>) -> Self {
    value.map_or(Self::Unknown, Self::Value)
  }
}

impl From<f64> for Reading {
  fn from(value: f64) -> Self { Self::Value(value) }
}

impl Serialize for Reading {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match *self {
      // Counts are whole numbers; keep them integral on the wire.
      Self::Value(v) if v.fract() == 0.0 && v.abs() < MAX_EXACT_INTEGER => {
        serializer.serialize_i64(v as i64)
      }
      Self::Value(v) => serializer.serialize_f64(v),
      Self::Absent | Self::Unknown => serializer.serialize_none(),
    }
  }
}

/// Anything that is not a number (including `null`) reads as unknown.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireReading {
  Number(f64),
  Other(IgnoredAny),
}

impl<'de> Deserialize<'de> for Reading {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    Ok(match WireReading::deserialize(deserializer)? {
      WireReading::Number(v) => Self::Value(v),
      WireReading::Other(_) => Self::Unknown,
    })
  }
}

// ─── StatField ───────────────────────────────────────────────────────────────

/// The statically declared set of statistics carried by a [`DayRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatField {
  Cases,
  DailyCases,
  Deaths,
  DailyDeaths,
  Recovered,
  DailyRecovered,
  Active,
  Critical,
  CasesPerOneMillion,
  DeathsPerOneMillion,
  Tests,
  DailyTests,
  TestsPerOneMillion,
  Population,
  OneCasePerPeople,
  OneDeathPerPeople,
  OneTestPerPeople,
  ActivePerOneMillion,
  RecoveredPerOneMillion,
  CriticalPerOneMillion,
}

impl StatField {
  pub const ALL: [StatField; 20] = [
    Self::Cases,
    Self::DailyCases,
    Self::Deaths,
    Self::DailyDeaths,
    Self::Recovered,
    Self::DailyRecovered,
    Self::Active,
    Self::Critical,
    Self::CasesPerOneMillion,
    Self::DeathsPerOneMillion,
    Self::Tests,
    Self::DailyTests,
    Self::TestsPerOneMillion,
    Self::Population,
    Self::OneCasePerPeople,
    Self::OneDeathPerPeople,
    Self::OneTestPerPeople,
    Self::ActivePerOneMillion,
    Self::RecoveredPerOneMillion,
    Self::CriticalPerOneMillion,
  ];

  /// The JSON key. Must match the `rename_all = "camelCase"` names on
  /// [`DayRecord`].
  pub fn key(self) -> &'static str {
    match self {
      Self::Cases => "cases",
      Self::DailyCases => "dailyCases",
      Self::Deaths => "deaths",
      Self::DailyDeaths => "dailyDeaths",
      Self::Recovered => "recovered",
      Self::DailyRecovered => "dailyRecovered",
      Self::Active => "active",
      Self::Critical => "critical",
      Self::CasesPerOneMillion => "casesPerOneMillion",
      Self::DeathsPerOneMillion => "deathsPerOneMillion",
      Self::Tests => "tests",
      Self::DailyTests => "dailyTests",
      Self::TestsPerOneMillion => "testsPerOneMillion",
      Self::Population => "population",
      Self::OneCasePerPeople => "oneCasePerPeople",
      Self::OneDeathPerPeople => "oneDeathPerPeople",
      Self::OneTestPerPeople => "oneTestPerPeople",
      Self::ActivePerOneMillion => "activePerOneMillion",
      Self::RecoveredPerOneMillion => "recoveredPerOneMillion",
      Self::CriticalPerOneMillion => "criticalPerOneMillion",
    }
  }
}

impl fmt::Display for StatField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}

impl FromStr for StatField {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|field| field.key() == s)
      .ok_or_else(|| Error::UnknownField(s.to_owned()))
  }
}

// ─── DayRecord ───────────────────────────────────────────────────────────────

/// One country's statistics for one calendar date (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
  pub date: NaiveDate,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub cases: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub daily_cases: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub deaths: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub daily_deaths: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub recovered: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub daily_recovered: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub active: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub critical: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub cases_per_one_million: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub deaths_per_one_million: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub tests: Reading,
  /// Derived from the previous day's `tests`; absent until a previous day is
  /// known.
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub daily_tests: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub tests_per_one_million: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub population: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub one_case_per_people: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub one_death_per_people: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub one_test_per_people: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub active_per_one_million: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub recovered_per_one_million: Reading,
  #[serde(default, skip_serializing_if = "Reading::is_absent")]
  pub critical_per_one_million: Reading,
}

impl DayRecord {
  /// A record for `date` with every statistic absent.
  pub fn empty(date: NaiveDate) -> Self {
    Self {
      date,
      cases: Reading::Absent,
      daily_cases: Reading::Absent,
      deaths: Reading::Absent,
      daily_deaths: Reading::Absent,
      recovered: Reading::Absent,
      daily_recovered: Reading::Absent,
      active: Reading::Absent,
      critical: Reading::Absent,
      cases_per_one_million: Reading::Absent,
      deaths_per_one_million: Reading::Absent,
      tests: Reading::Absent,
      daily_tests: Reading::Absent,
      tests_per_one_million: Reading::Absent,
      population: Reading::Absent,
      one_case_per_people: Reading::Absent,
      one_death_per_people: Reading::Absent,
      one_test_per_people: Reading::Absent,
      active_per_one_million: Reading::Absent,
      recovered_per_one_million: Reading::Absent,
      critical_per_one_million: Reading::Absent,
    }
  }

  pub fn get(&self, field: StatField) -> Reading {
    match field {
      StatField::Cases => self.cases,
      StatField::DailyCases => self.daily_cases,
      StatField::Deaths => self.deaths,
      StatField::DailyDeaths => self.daily_deaths,
      StatField::Recovered => self.recovered,
      StatField::DailyRecovered => self.daily_recovered,
      StatField::Active => self.active,
      StatField::Critical => self.critical,
      StatField::CasesPerOneMillion => self.cases_per_one_million,
      StatField::DeathsPerOneMillion => self.deaths_per_one_million,
      StatField::Tests => self.tests,
      StatField::DailyTests => self.daily_tests,
      StatField::TestsPerOneMillion => self.tests_per_one_million,
      StatField::Population => self.population,
      StatField::OneCasePerPeople => self.one_case_per_people,
      StatField::OneDeathPerPeople => self.one_death_per_people,
      StatField::OneTestPerPeople => self.one_test_per_people,
      StatField::ActivePerOneMillion => self.active_per_one_million,
      StatField::RecoveredPerOneMillion => self.recovered_per_one_million,
      StatField::CriticalPerOneMillion => self.critical_per_one_million,
    }
  }

  pub fn set(&mut self, field: StatField, reading: Reading) {
    let slot = match field {
      StatField::Cases => &mut self.cases,
      StatField::DailyCases => &mut self.daily_cases,
      StatField::Deaths => &mut self.deaths,
      StatField::DailyDeaths => &mut self.daily_deaths,
      StatField::Recovered => &mut self.recovered,
      StatField::DailyRecovered => &mut self.daily_recovered,
      StatField::Active => &mut self.active,
      StatField::Critical => &mut self.critical,
      StatField::CasesPerOneMillion => &mut self.cases_per_one_million,
      StatField::DeathsPerOneMillion => &mut self.deaths_per_one_million,
      StatField::Tests => &mut self.tests,
      StatField::DailyTests => &mut self.daily_tests,
      StatField::TestsPerOneMillion => &mut self.tests_per_one_million,
      StatField::Population => &mut self.population,
      StatField::OneCasePerPeople => &mut self.one_case_per_people,
      StatField::OneDeathPerPeople => &mut self.one_death_per_people,
      StatField::OneTestPerPeople => &mut self.one_test_per_people,
      StatField::ActivePerOneMillion => &mut self.active_per_one_million,
      StatField::RecoveredPerOneMillion => &mut self.recovered_per_one_million,
      StatField::CriticalPerOneMillion => &mut self.critical_per_one_million,
    };
    *slot = reading;
  }

  /// Number of statistics present (known or unknown).
  pub fn present_fields(&self) -> usize {
    StatField::ALL
      .into_iter()
      .filter(|&field| !self.get(field).is_absent())
      .count()
  }
}

// ─── Country ─────────────────────────────────────────────────────────────────

/// Static information about a country, captured from its first snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryInfo {
  pub iso2:      Option<String>,
  pub iso3:      Option<String>,
  #[serde(rename = "lat")]
  pub latitude:  Option<f64>,
  #[serde(rename = "long")]
  pub longitude: Option<f64>,
  #[serde(rename = "flag")]
  pub flag_url:  Option<String>,
  pub continent: Option<String>,
}

/// The identity half of a country record. The name is the unique key and is
/// compared case-insensitively by storage backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
  #[serde(rename = "country")]
  pub name: String,
  #[serde(rename = "countryInfo")]
  pub info: CountryInfo,
}

/// A country's name together with (a window of) its history, ascending by
/// date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryHistory {
  pub country: String,
  pub history: Vec<DayRecord>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2021, 3, 14).unwrap() }

  #[test]
  fn stat_field_keys_match_serde_names() {
    let mut day = DayRecord::empty(date());
    for field in StatField::ALL {
      day.set(field, Reading::Value(1.0));
    }
    let json = serde_json::to_value(&day).unwrap();
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), StatField::ALL.len() + 1);
    for field in StatField::ALL {
      assert_eq!(object.get(field.key()), Some(&serde_json::json!(1)), "{field}");
    }
  }

  #[test]
  fn absent_is_omitted_and_unknown_is_null() {
    let mut day = DayRecord::empty(date());
    day.cases = Reading::Value(12.0);
    day.deaths = Reading::Unknown;
    day.cases_per_one_million = Reading::Value(0.5);

    let json = serde_json::to_value(&day).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "date": "2021-03-14",
        "cases": 12,
        "deaths": null,
        "casesPerOneMillion": 0.5,
      })
    );
  }

  #[test]
  fn deserialize_keeps_presence() {
    let day: DayRecord = serde_json::from_str(
      r#"{"date":"2021-03-14","cases":3,"dailyTests":null,"tests":"n/a"}"#,
    )
    .unwrap();
    assert_eq!(day.cases, Reading::Value(3.0));
    assert_eq!(day.daily_tests, Reading::Unknown);
    assert_eq!(day.tests, Reading::Unknown);
    assert_eq!(day.deaths, Reading::Absent);
    assert_eq!(day.present_fields(), 3);
  }

  #[test]
  fn parse_field_key() {
    assert_eq!("dailyTests".parse::<StatField>().unwrap(), StatField::DailyTests);
    assert!(matches!(
      "todayCases".parse::<StatField>(),
      Err(Error::UnknownField(k)) if k == "todayCases"
    ));
  }

  #[test]
  fn country_info_uses_upstream_names() {
    let info = CountryInfo {
      iso2:      Some("IT".into()),
      iso3:      Some("ITA".into()),
      latitude:  Some(42.8333),
      longitude: Some(12.8333),
      flag_url:  Some("https://disease.sh/assets/img/flags/it.png".into()),
      continent: Some("Europe".into()),
    };
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["lat"], serde_json::json!(42.8333));
    assert_eq!(json["flag"], serde_json::json!("https://disease.sh/assets/img/flags/it.png"));
  }
}
