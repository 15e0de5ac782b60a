//! The upstream data source seen by the reconciler.

use std::future::Future;

use outbreak_core::{shift::DaySelector, snapshot::RawCountrySnapshot};

/// Something that serves per-country snapshots.
///
/// Implemented by [`crate::DiseaseShClient`]; tests substitute an in-process
/// fake.
pub trait SnapshotSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every country's snapshot for the requested day slice.
  fn countries(
    &self,
    selector: DaySelector,
  ) -> impl Future<Output = Result<Vec<RawCountrySnapshot>, Self::Error>> + Send + '_;

  /// The current snapshot of a single country.
  fn country(
    &self,
    name: String,
  ) -> impl Future<Output = Result<RawCountrySnapshot, Self::Error>> + Send + '_;
}
