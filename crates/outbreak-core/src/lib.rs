//! Core types and reconciliation logic for the outbreak history service.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend, the upstream client and the read API all depend on it.

pub mod diff;
pub mod enrich;
pub mod error;
pub mod record;
pub mod shift;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
