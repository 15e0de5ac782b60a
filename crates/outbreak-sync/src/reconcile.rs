//! One reconciliation cycle over the three-day target window.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Days, NaiveDate, Utc};
use outbreak_core::{
  diff::{Change, changed_fields, diff},
  enrich::enrich,
  record::DayRecord,
  shift::{BELLWETHER, DaySelector, ShiftPolicy, TargetWindow},
  store::HistoryStore,
};
use serde::Serialize;
use tracing::{Instrument as _, debug, info, info_span, warn};
use uuid::Uuid;

use crate::{Error, Result, SnapshotSource};

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Per-day write counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayTally {
  pub inserted:  usize,
  pub replaced:  usize,
  pub unchanged: usize,
  /// Countries whose write failed and were skipped.
  pub failed:    usize,
}

impl DayTally {
  pub fn writes(&self) -> usize { self.inserted + self.replaced }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DayOutcome {
  Completed(DayTally),
  /// The upstream fetch or the bulk store read failed; nothing was written
  /// for this day.
  Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
  pub date:     NaiveDate,
  pub selector: DaySelector,
  pub outcome:  DayOutcome,
}

/// Summary of one cycle, oldest day first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
  pub cycle_id:   Uuid,
  pub started_at: DateTime<Utc>,
  pub shifted:    bool,
  pub days:       Vec<DayReport>,
}

impl CycleReport {
  /// Inserts plus replaces across all days.
  pub fn writes(&self) -> usize {
    self
      .days
      .iter()
      .map(|day| match &day.outcome {
        DayOutcome::Completed(tally) => tally.writes(),
        DayOutcome::Failed { .. } => 0,
      })
      .sum()
  }

  pub fn failed_days(&self) -> usize {
    self
      .days
      .iter()
      .filter(|day| matches!(day.outcome, DayOutcome::Failed { .. }))
      .count()
  }
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

/// Pulls upstream snapshots into a [`HistoryStore`], writing only records
/// that are new or whose content changed.
pub struct Reconciler<S, U> {
  store:      Arc<S>,
  source:     Arc<U>,
  policy:     ShiftPolicy,
  bellwether: String,
}

impl<S, U> Reconciler<S, U>
where
  S: HistoryStore,
  U: SnapshotSource,
{
  pub fn new(store: Arc<S>, source: Arc<U>) -> Self {
    Self {
      store,
      source,
      policy: ShiftPolicy::default(),
      bellwether: BELLWETHER.to_owned(),
    }
  }

  pub fn with_policy(mut self, policy: ShiftPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn with_bellwether(mut self, bellwether: impl Into<String>) -> Self {
    self.bellwether = bellwether.into();
    self
  }

  /// Whether the upstream "today" currently belongs to the previous day.
  pub async fn detect_shift(&self, now: DateTime<Utc>) -> Result<bool> {
    let snapshot = self
      .source
      .country(self.bellwether.clone())
      .await
      .map_err(|e| Error::ShiftDetection(Box::new(e)))?;
    Ok(self.policy.is_shifted(snapshot.today_cases, now))
  }

  /// Run one cycle as of `now`.
  ///
  /// Fails only when the shift cannot be detected. Day-level and
  /// country-level failures are recorded in the report instead.
  pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
    let cycle_id = Uuid::new_v4();
    self
      .cycle(cycle_id, now)
      .instrument(info_span!("cycle", %cycle_id))
      .await
  }

  async fn cycle(&self, cycle_id: Uuid, now: DateTime<Utc>) -> Result<CycleReport> {
    let shifted = self.detect_shift(now).await?;
    let window = TargetWindow::new(now, shifted);
    debug!(shifted, "target window resolved");

    let mut days = Vec::with_capacity(3);
    // Oldest first, so each day's enrichment sees the day before it as
    // written by this same cycle.
    for (selector, date) in window.days() {
      let outcome = match self.reconcile_day(selector, date).await {
        Ok(tally) => DayOutcome::Completed(tally),
        Err(e) => {
          warn!(%date, %selector, error = %e, "day skipped");
          DayOutcome::Failed { error: e.to_string() }
        }
      };
      days.push(DayReport { date, selector, outcome });
    }

    Ok(CycleReport {
      cycle_id,
      started_at: now,
      shifted,
      days,
    })
  }

  /// Fetch, normalise, enrich, diff and write one target day.
  pub async fn reconcile_day(&self, selector: DaySelector, date: NaiveDate) -> Result<DayTally> {
    let snapshots = self
      .source
      .countries(selector)
      .await
      .map_err(|e| Error::Fetch(Box::new(e)))?;

    let stored = self.days_on(date).await?;
    let previous = match date.checked_sub_days(Days::new(1)) {
      Some(before) => self.days_on(before).await?,
      None => HashMap::new(),
    };

    let mut tally = DayTally::default();
    for snapshot in snapshots {
      let country = snapshot.country();
      let key = name_key(&country.name);
      let incoming = enrich(snapshot.normalize(date), previous.get(&key));
      let current = stored.get(&key);
      let name = country.name.clone();

      let written = match diff(current, &incoming) {
        Change::Unchanged => {
          tally.unchanged += 1;
          continue;
        }
        Change::Insert => self
          .store
          .insert_day(country, incoming)
          .await
          .map(|()| {
            info!(country = %name, %date, "inserted");
            tally.inserted += 1;
          }),
        Change::Replace => {
          let fields = current
            .map(|current| changed_fields(current, &incoming))
            .unwrap_or_default();
          self
            .store
            .replace_day(name.clone(), incoming)
            .await
            .map(|()| {
              info!(country = %name, %date, ?fields, "replaced");
              tally.replaced += 1;
            })
        }
      };

      if let Err(e) = written {
        warn!(country = %name, %date, error = %e, "write failed, skipping country");
        tally.failed += 1;
      }
    }

    Ok(tally)
  }

  /// Every stored record for `date`, keyed by [`name_key`].
  async fn days_on(&self, date: NaiveDate) -> Result<HashMap<String, DayRecord>> {
    let days = self
      .store
      .days_on(date)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    Ok(
      days
        .into_iter()
        .map(|(name, day)| (name_key(&name), day))
        .collect(),
    )
  }
}

/// Country names are compared the way the store collates them: ASCII
/// case-insensitively.
fn name_key(name: &str) -> String { name.to_ascii_lowercase() }
