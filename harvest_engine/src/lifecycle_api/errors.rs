use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{FarmerId, MatchId, MatchStatus, OrderId, StatusTransitionError, TrackingStatus},
    traits::StoreError,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderLifecycleError {
    #[error("Order {0} does not exist")]
    NotFound(OrderId),
    #[error("Order {order_id} is already {status}")]
    AlreadyInStatus { order_id: OrderId, status: TrackingStatus },
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: TrackingStatus, to: TrackingStatus },
    #[error("Order {order_id} does not belong to farmer {farmer_id}")]
    Unauthorized { order_id: OrderId, farmer_id: FarmerId },
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl OrderLifecycleError {
    pub fn from_transition(order_id: &OrderId, e: StatusTransitionError) -> Self {
        match e {
            StatusTransitionError::AlreadyInStatus(status) => {
                Self::AlreadyInStatus { order_id: order_id.clone(), status }
            },
            StatusTransitionError::InvalidTransition { from, to } => {
                Self::InvalidTransition { order_id: order_id.clone(), from, to }
            },
        }
    }
}

impl From<StoreError> for OrderLifecycleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderAlreadyExists(id) => Self::OrderAlreadyExists(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchLifecycleError {
    #[error("Match {0} does not exist")]
    NotFound(MatchId),
    #[error("Match {match_id} is no longer pending. It is {status}")]
    NoLongerPending { match_id: MatchId, status: MatchStatus },
    #[error("Match {match_id} expired at {expires_at}")]
    Expired { match_id: MatchId, expires_at: DateTime<Utc> },
    #[error("Match {match_id} cannot be rejected because it is {status}")]
    NotRejectable { match_id: MatchId, status: MatchStatus },
    #[error("Match {match_id} does not belong to farmer {farmer_id}")]
    Unauthorized { match_id: MatchId, farmer_id: FarmerId },
    #[error("The order for match {0} already exists")]
    OrderConflict(MatchId),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for MatchLifecycleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MatchAlreadyLinked(id) => Self::OrderConflict(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionApiError {
    #[error("Transaction {0} does not exist")]
    NotFound(OrderId),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for TransactionApiError {
    fn from(e: StoreError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
