//! # SQLite Database methods
//!
//! This module contains the "low-level" SQLite database interactions.
//!
//! All of these are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection` argument.
//! Callers can obtain a connection from a pool, or open a transaction as the need arises and pass `&mut *tx` through
//! without any other changes.
//!
//! Timestamps are always bound from Rust and never compared against `CURRENT_TIMESTAMP`, so that every comparison
//! uses the same text encoding.
use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

use crate::db_types::{MatchStatus, TrackingStatus};

pub mod matches;
pub mod orders;
pub mod transactions;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Renders a list of tracking statuses for an `IN (...)` clause. The values come from the enum, never from callers.
pub(crate) fn status_list(statuses: &[TrackingStatus]) -> String {
    statuses.iter().map(|s| format!("'{}'", s.as_str())).collect::<Vec<String>>().join(",")
}

/// Escapes `%`, `_` and the escape character itself so that `value` only ever matches literally inside a
/// `LIKE … ESCAPE '\\'` pattern.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn match_status_list(statuses: &[MatchStatus]) -> String {
    statuses.iter().map(|s| format!("'{}'", s.as_str())).collect::<Vec<String>>().join(",")
}
