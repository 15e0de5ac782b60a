//! Process assembly for the outbreak history service.
//!
//! Ties the read API, the SQLite store and the upstream poller together.

use std::{
  future::Future,
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::Router;
use outbreak_core::{
  shift::{BELLWETHER, ShiftPolicy},
  store::HistoryStore,
};
use outbreak_sync::{Poller, Reconciler, SnapshotSource, UpstreamConfig};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::watch};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `OUTBREAK_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub upstream_base_url:   String,
  pub http_timeout_secs:   u64,
  pub poll_interval_secs:  u64,
  /// Country whose publication signals the upstream day rollover.
  pub bellwether:          String,
  pub shift_cutoff_hour:   u32,
  pub shift_grace_minutes: u32,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let policy = ShiftPolicy::default();
    Self {
      host:                "0.0.0.0".to_string(),
      port:                3000,
      store_path:          PathBuf::from("outbreak.db"),
      upstream_base_url:   "https://disease.sh".to_string(),
      http_timeout_secs:   30,
      poll_interval_secs:  600,
      bellwether:          BELLWETHER.to_string(),
      shift_cutoff_hour:   policy.cutoff_hour,
      shift_grace_minutes: policy.grace_minutes,
    }
  }
}

impl ServerConfig {
  /// Layer `OUTBREAK_*` environment variables over the (optional) file at
  /// `path`.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("OUTBREAK").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn upstream(&self) -> UpstreamConfig {
    UpstreamConfig {
      base_url: self.upstream_base_url.clone(),
      timeout:  Duration::from_secs(self.http_timeout_secs),
    }
  }

  pub fn shift_policy(&self) -> ShiftPolicy {
    ShiftPolicy {
      cutoff_hour:   self.shift_cutoff_hour,
      grace_minutes: self.shift_grace_minutes,
    }
  }

  pub fn poll_interval(&self) -> Duration { Duration::from_secs(self.poll_interval_secs) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The HTTP surface: the read API under `/api`, with request tracing.
pub fn app<S>(store: Arc<S>) -> Router
where
  S: HistoryStore + 'static,
{
  Router::new()
    .nest("/api", outbreak_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

// ─── Serving ──────────────────────────────────────────────────────────────────

/// Serve [`app`] on an already bound `listener` while polling upstream every
/// `poll_interval`.
///
/// When `shutdown` resolves the server drains, the poller stops after its
/// in-flight cycle, and every handle on `store` held here is released.
pub async fn serve<S, U>(
  listener: TcpListener,
  store: Arc<S>,
  reconciler: Reconciler<S, U>,
  poll_interval: Duration,
  shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()>
where
  S: HistoryStore + 'static,
  U: SnapshotSource + 'static,
{
  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let poller = Poller::new(Arc::new(reconciler), poll_interval);
  let poller_task = tokio::spawn(poller.run(shutdown_rx));

  let served = axum::serve(listener, app(store))
    .with_graceful_shutdown(shutdown)
    .await
    .context("server error");

  // Stop polling even if the server failed.
  let _ = shutdown_tx.send(true);
  poller_task.await.context("poller task panicked")?;
  served
}
