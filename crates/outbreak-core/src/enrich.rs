//! Fields that depend on the previous day's stored record.

use crate::record::{DayRecord, Reading};

/// Tests performed on `current.date`, from the cumulative `tests` counters.
///
/// A zero delta while cases are still moving (positive or unknown) means the
/// source did not refresh its test counter that day, so the result is
/// [`Reading::Unknown`] rather than a literal zero.
pub fn daily_tests(current: &DayRecord, previous: &DayRecord) -> Reading {
  let delta = match (current.tests, previous.tests) {
    (Reading::Value(today), Reading::Value(before)) => today - before,
    _ => return Reading::Unknown,
  };

  let cases_moving = match current.daily_cases {
    Reading::Value(cases) => cases > 0.0,
    Reading::Absent | Reading::Unknown => true,
  };

  if delta == 0.0 && cases_moving {
    Reading::Unknown
  } else {
    Reading::Value(delta)
  }
}

/// Attach derived fields to a freshly normalised record. Without a previous
/// day, `dailyTests` stays absent.
pub fn enrich(mut day: DayRecord, previous: Option<&DayRecord>) -> DayRecord {
  if let Some(previous) = previous {
    day.daily_tests = daily_tests(&day, previous);
  }
  day
}
