//! JSON read API over the outbreak history store.
//!
//! Exposes an axum [`Router`] backed by any
//! [`outbreak_core::store::HistoryStore`]. Reconciliation and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", outbreak_api::api_router(store.clone()))
//! ```

pub mod countries;
pub mod error;
pub mod history;

use std::sync::Arc;

use axum::{Router, routing::get};
use outbreak_core::store::HistoryStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: HistoryStore + 'static,
{
  Router::new()
    // Countries
    .route("/countries", get(countries::list::<S>))
    .route("/countries/{country}/info", get(countries::info::<S>))
    // History
    .route("/history/all", get(history::all::<S>))
    .route("/history/{country}", get(history::one::<S>))
    .route("/history/{country}/{key}", get(history::series_handler::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
