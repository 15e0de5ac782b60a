//! Deciding whether an incoming record should be written.

use crate::record::{DayRecord, StatField};

/// What to do with an incoming record for a country/date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
  /// Nothing is stored for this country/date yet.
  Insert,
  /// Something is stored and the incoming record differs from it.
  Replace,
  /// The stored record is identical; writing would only churn storage.
  Unchanged,
}

/// Declared fields whose presence or value differ between the two records.
pub fn changed_fields(stored: &DayRecord, incoming: &DayRecord) -> Vec<StatField> {
  StatField::ALL
    .into_iter()
    .filter(|&field| stored.get(field) != incoming.get(field))
    .collect()
}

/// Compare strictly: a field present on only one side, or any value that is
/// not exactly equal, means [`Change::Replace`].
pub fn diff(stored: Option<&DayRecord>, incoming: &DayRecord) -> Change {
  let Some(stored) = stored else {
    return Change::Insert;
  };

  if stored.date != incoming.date || !changed_fields(stored, incoming).is_empty() {
    Change::Replace
  } else {
    Change::Unchanged
  }
}
