use thiserror::Error;

use crate::db_types::{MatchId, OrderId};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Match {0} already has a linked order")]
    MatchAlreadyLinked(MatchId),
    #[error("A stored record could not be read: {0}")]
    CorruptRecord(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

impl StoreError {
    /// Maps a unique-constraint violation on insert to `on_conflict`, and anything else to a plain database error.
    pub fn on_unique_violation(e: sqlx::Error, on_conflict: StoreError) -> Self {
        match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => on_conflict,
            _ => StoreError::from(e),
        }
    }
}
