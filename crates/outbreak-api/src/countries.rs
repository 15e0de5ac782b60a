//! Handlers for `/countries` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/countries` | Names of all known countries |
//! | `GET`  | `/countries/{country}/info` | Name, ISO2 or ISO3; 404 if unresolved |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use outbreak_core::{
  record::{Country, CountryInfo},
  store::HistoryStore,
};
use serde::Serialize;

use crate::error::ApiError;

/// Resolve a path segment to a stored country or fail with 404.
pub(crate) async fn resolve<S: HistoryStore>(store: &S, query: &str) -> Result<Country, ApiError> {
  store
    .find_country(query)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::country_not_found(query))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /countries`
pub async fn list<S: HistoryStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<String>>, ApiError> {
  let names = store.list_country_names().await.map_err(ApiError::store)?;
  Ok(Json(names))
}

// ─── Info ─────────────────────────────────────────────────────────────────────

/// Static info with the canonical country name alongside.
#[derive(Debug, Serialize)]
pub struct InfoResponse {
  pub country: String,
  #[serde(flatten)]
  pub info:    CountryInfo,
}

/// `GET /countries/{country}/info`
pub async fn info<S: HistoryStore>(
  State(store): State<Arc<S>>,
  Path(country): Path<String>,
) -> Result<Json<InfoResponse>, ApiError> {
  let Country { name, info } = resolve(store.as_ref(), &country).await?;
  Ok(Json(InfoResponse { country: name, info }))
}
