//! `SqliteStore`: the SQLite-backed `Store`.
//!
//! Each repository trait is implemented in its own module (`user`,
//! `product`, `cart`, `order`, `chat`) on this one struct. Shared row
//! conversion helpers live here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use clara_types::error::RepositoryError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of every clara-core repository trait.
#[derive(Clone)]
pub struct SqliteStore {
    pub(crate) pool: DatabasePool,
}

impl SqliteStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub(crate) fn parse_decimal(s: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(s).map_err(|e| RepositoryError::Query(format!("invalid decimal '{s}': {e}")))
}

pub(crate) fn parse_string_list(s: &str) -> Result<Vec<String>, RepositoryError> {
    serde_json::from_str(s).map_err(|e| RepositoryError::Query(format!("invalid list: {e}")))
}

pub(crate) fn format_string_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}
