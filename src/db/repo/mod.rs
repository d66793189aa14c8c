//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database
//! operations. Methods are organized across submodules by domain:
//! - `affiliates.rs` - affiliate, link, click, and conversion operations
//! - `catalog.rs` - coupon and store listing operations

mod affiliates;
mod catalog;

pub use affiliates::NewConversion;

use crate::domain::Money;
use sqlx::sqlite::SqlitePool;
use std::str::FromStr;
use tracing::warn;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }
}

/// Parse a canonical money string from a row, falling back to zero on a
/// corrupt value rather than failing the whole query.
pub(crate) fn parse_money(raw: &str, column: &str) -> Money {
    Money::from_str(raw).unwrap_or_else(|_| {
        warn!(column = %column, value = %raw, "corrupt money value, substituting 0");
        Money::zero()
    })
}
