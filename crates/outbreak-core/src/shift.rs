//! Date-shift detection and the three-day target window.
//!
//! The upstream source rolls its "today" over at midnight UTC, but countries
//! publish through the day. Until the bellwether country has published, the
//! numbers under "today" still describe yesterday. Once it has, and before
//! the cutoff hour, everything the source labels "today" actually belongs to
//! the previous calendar day.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Reading;

/// The country whose publication timing signals the upstream rollover.
pub const BELLWETHER: &str = "Italy";

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Tunables for [`ShiftPolicy::is_shifted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftPolicy {
  /// UTC hour (exclusive) before which a published bellwether means the
  /// window is shifted.
  pub cutoff_hour:   u32,
  /// Minutes after UTC midnight during which no shift is assumed, while the
  /// upstream cache still serves the previous day.
  pub grace_minutes: u32,
}

impl Default for ShiftPolicy {
  fn default() -> Self {
    Self {
      cutoff_hour:   15,
      grace_minutes: 10,
    }
  }
}

impl ShiftPolicy {
  /// Decide from the bellwether's `todayCases` and the wall clock.
  pub fn is_shifted(&self, bellwether_today_cases: Reading, now: DateTime<Utc>) -> bool {
    let published = matches!(bellwether_today_cases, Reading::Value(_));
    let minutes_since_midnight = now.hour() * 60 + now.minute();

    published
      && now.hour() < self.cutoff_hour
      && minutes_since_midnight >= self.grace_minutes
  }
}

// ─── Window ──────────────────────────────────────────────────────────────────

/// Which slice of the upstream data to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DaySelector {
  TwoDaysAgo,
  Yesterday,
  Today,
}

impl DaySelector {
  /// The boolean query flag requesting this slice, if any.
  pub fn query_flag(self) -> Option<&'static str> {
    match self {
      Self::TwoDaysAgo => Some("twoDaysAgo"),
      Self::Yesterday => Some("yesterday"),
      Self::Today => None,
    }
  }

  fn days_back(self) -> u64 {
    match self {
      Self::TwoDaysAgo => 2,
      Self::Yesterday => 1,
      Self::Today => 0,
    }
  }
}

impl fmt::Display for DaySelector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::TwoDaysAgo => "two-days-ago",
      Self::Yesterday => "yesterday",
      Self::Today => "today",
    })
  }
}

/// The three calendar days a reconciliation cycle writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetWindow {
  pub today:   NaiveDate,
  pub shifted: bool,
}

impl TargetWindow {
  pub fn new(now: DateTime<Utc>, shifted: bool) -> Self {
    Self {
      today: now.date_naive(),
      shifted,
    }
  }

  /// Upstream selectors paired with the calendar date their data belongs
  /// to, oldest first.
  pub fn days(&self) -> [(DaySelector, NaiveDate); 3] {
    let anchor = if self.shifted {
      self.today - Days::new(1)
    } else {
      self.today
    };
    [DaySelector::TwoDaysAgo, DaySelector::Yesterday, DaySelector::Today]
      .map(|selector| (selector, anchor - Days::new(selector.days_back())))
  }
}
