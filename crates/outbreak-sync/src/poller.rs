//! Scheduled reconciliation with an overlap guard.

use std::{
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use chrono::{DateTime, Utc};
use outbreak_core::store::HistoryStore;
use tokio::{
  sync::watch,
  task::JoinHandle,
  time::{self, MissedTickBehavior},
};
use tracing::{error, info, warn};

use crate::{Reconciler, SnapshotSource};

// ─── Cycle guard ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
  Idle,
  Running { started_at: DateTime<Utc> },
}

/// Shared Idle/Running flag. At most one [`CyclePermit`] exists at a time.
#[derive(Debug, Clone)]
pub struct CycleGate {
  state: Arc<Mutex<CycleState>>,
}

impl Default for CycleGate {
  fn default() -> Self {
    Self {
      state: Arc::new(Mutex::new(CycleState::Idle)),
    }
  }
}

impl CycleGate {
  pub fn state(&self) -> CycleState {
    *self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Move to `Running` if currently `Idle`. The gate returns to `Idle` when
  /// the permit is dropped.
  pub fn try_begin(&self, now: DateTime<Utc>) -> Option<CyclePermit> {
    let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
    match *state {
      CycleState::Running { .. } => None,
      CycleState::Idle => {
        *state = CycleState::Running { started_at: now };
        Some(CyclePermit { gate: self.clone() })
      }
    }
  }
}

/// Proof that a cycle is running.
#[derive(Debug)]
pub struct CyclePermit {
  gate: CycleGate,
}

impl Drop for CyclePermit {
  fn drop(&mut self) {
    *self.gate.state.lock().unwrap_or_else(PoisonError::into_inner) = CycleState::Idle;
  }
}

// ─── Poller ──────────────────────────────────────────────────────────────────

/// Triggers a reconciliation cycle every `interval`.
pub struct Poller<S, U> {
  reconciler: Arc<Reconciler<S, U>>,
  interval:   Duration,
  gate:       CycleGate,
}

impl<S, U> Poller<S, U>
where
  S: HistoryStore + 'static,
  U: SnapshotSource + 'static,
{
  pub fn new(reconciler: Arc<Reconciler<S, U>>, interval: Duration) -> Self {
    Self {
      reconciler,
      interval,
      gate: CycleGate::default(),
    }
  }

  pub fn gate(&self) -> &CycleGate { &self.gate }

  /// Start a cycle in the background. Returns `None`, and starts nothing,
  /// while the previous cycle is still running.
  pub fn trigger(&self) -> Option<JoinHandle<()>> {
    let now = Utc::now();
    let Some(permit) = self.gate.try_begin(now) else {
      if let CycleState::Running { started_at } = self.gate.state() {
        warn!(%started_at, "previous cycle still running, skipping tick");
      }
      return None;
    };

    let reconciler = Arc::clone(&self.reconciler);
    let interval = self.interval;
    Some(tokio::spawn(async move {
      let _permit = permit;
      let next_run = now
        + chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::zero());
      match reconciler.run_cycle(now).await {
        Ok(report) => info!(
          cycle_id = %report.cycle_id,
          shifted = report.shifted,
          writes = report.writes(),
          failed_days = report.failed_days(),
          %next_run,
          "cycle finished"
        ),
        Err(e) => error!(error = %e, %next_run, "cycle aborted"),
      }
    }))
  }

  /// Tick until `shutdown` flips to `true` (or its sender is dropped), then
  /// wait for the in-flight cycle to finish.
  pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = time::interval(self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight: Option<JoinHandle<()>> = None;

    info!(interval_secs = self.interval.as_secs(), "poller started");
    loop {
      tokio::select! {
        _ = ticker.tick() => {
          if let Some(handle) = self.trigger() {
            in_flight = Some(handle);
          }
        }
        changed = shutdown.changed() => {
          if changed.is_err() || *shutdown.borrow() {
            break;
          }
        }
      }
    }

    if let Some(handle) = in_flight
      && let Err(e) = handle.await
    {
      error!(error = %e, "in-flight cycle panicked");
    }
    info!("poller stopped");
  }
}
