//! Upstream ingestion for the outbreak history service.
//!
//! [`Reconciler`] runs one reconciliation cycle: it works out which calendar
//! days the upstream data belongs to, then normalises, enriches and diffs
//! every country snapshot against a [`outbreak_core::store::HistoryStore`]
//! and writes only what changed. [`Poller`] runs cycles on a fixed interval
//! without letting two overlap.

pub mod client;
pub mod error;
pub mod poller;
pub mod reconcile;
pub mod source;

pub use client::{DiseaseShClient, UpstreamConfig};
pub use error::{Error, FetchError, Result};
pub use poller::{CycleGate, CyclePermit, CycleState, Poller};
pub use reconcile::{CycleReport, DayOutcome, DayReport, DayTally, Reconciler};
pub use source::SnapshotSource;
