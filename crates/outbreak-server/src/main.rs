//! outbreak server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, polls the upstream source on a fixed interval and serves the read
//! API over HTTP.
//!
//! # Seeding
//!
//! A single cycle against an empty store inserts every country:
//!
//! ```
//! cargo run -p outbreak-server --bin outbreak -- --once
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use outbreak_server::ServerConfig;
use outbreak_store_sqlite::SqliteStore;
use outbreak_sync::{DiseaseShClient, Reconciler};
use tokio::{net::TcpListener, signal};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Outbreak history server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Run one reconciliation cycle, print its report as JSON and exit.
  #[arg(long)]
  once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  let client = DiseaseShClient::new(server_cfg.upstream()).context("failed to build HTTP client")?;
  let reconciler = Reconciler::new(store.clone(), Arc::new(client))
    .with_policy(server_cfg.shift_policy())
    .with_bellwether(server_cfg.bellwether.clone());

  let outcome = if cli.once {
    run_once(reconciler).await
  } else {
    let address = server_cfg.address();
    match TcpListener::bind(&address).await {
      Ok(listener) => {
        tracing::info!("Listening on http://{address}");
        outbreak_server::serve(
          listener,
          store.clone(),
          reconciler,
          server_cfg.poll_interval(),
          shutdown_signal(),
        )
        .await
      }
      Err(e) => {
        drop(reconciler);
        Err(anyhow::Error::new(e).context(format!("failed to bind {address}")))
      }
    }
  };

  // Close the store whether or not serving succeeded.
  close(store).await?;
  outcome
}

/// Run one cycle and print its report.
async fn run_once(reconciler: Reconciler<SqliteStore, DiseaseShClient>) -> anyhow::Result<()> {
  let report = reconciler
    .run_cycle(Utc::now())
    .await
    .context("reconciliation cycle failed")?;
  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where there is one.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };
  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    () = ctrl_c => {}
    () = terminate => {}
  }
  tracing::info!("shutting down");
}

/// Close the store once every other handle is gone.
async fn close(store: Arc<SqliteStore>) -> anyhow::Result<()> {
  match Arc::try_unwrap(store) {
    Ok(store) => store.close().await.context("failed to close store")?,
    Err(_) => tracing::warn!("store still shared at exit, leaving it to drop"),
  }
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
