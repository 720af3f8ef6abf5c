use std::{collections::BTreeMap, fmt::Display};

use harvest_engine::{
    db_types::InvalidFarmerId,
    MatchLifecycleError,
    OrderLifecycleError,
    TransactionApiError,
};
use log::error;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
}

/// Transport-neutral error codes. Callers map these onto their own error representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    InvalidArgument,
    FailedPrecondition,
    PermissionDenied,
    Internal,
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::FailedPrecondition => "FAILED_PRECONDITION",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::Internal => "INTERNAL",
        };
        f.write_str(s)
    }
}

/// The only error type that leaves the service. It carries a stable code, a message that is safe to show to the
/// caller and the ids involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    pub code: ErrorCode,
    pub message: String,
    pub metadata: BTreeMap<String, String>,
}

const INTERNAL_MESSAGE: &str = "An internal error occurred. Please try again later.";

impl ServiceError {
    pub fn new<S: Into<String>>(code: ErrorCode, message: S) -> Self {
        Self { code, message: message.into(), metadata: BTreeMap::new() }
    }

    pub fn with<K: Into<String>, V: Display>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }

    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    /// Logs `detail` and returns a generic internal error. Store messages never reach the caller.
    pub fn internal(detail: &str) -> Self {
        error!("💥️ Internal error: {detail}");
        Self::new(ErrorCode::Internal, INTERNAL_MESSAGE)
    }
}

impl From<InvalidFarmerId> for ServiceError {
    fn from(e: InvalidFarmerId) -> Self {
        let err = Self::invalid_argument(format!("Invalid farmer id. {e}"));
        match e {
            InvalidFarmerId::NotPositive(id) => err.with("farmerId", id),
            InvalidFarmerId::Missing => err,
        }
    }
}

impl From<OrderLifecycleError> for ServiceError {
    fn from(e: OrderLifecycleError) -> Self {
        let message = e.to_string();
        match e {
            OrderLifecycleError::NotFound(id) => Self::new(ErrorCode::NotFound, message).with("orderId", id),
            OrderLifecycleError::AlreadyInStatus { order_id, status } => {
                Self::new(ErrorCode::FailedPrecondition, message).with("orderId", order_id).with("status", status)
            },
            OrderLifecycleError::InvalidTransition { order_id, from, to } => {
                Self::new(ErrorCode::FailedPrecondition, message)
                    .with("orderId", order_id)
                    .with("from", from)
                    .with("to", to)
            },
            OrderLifecycleError::Unauthorized { order_id, farmer_id } => {
                Self::new(ErrorCode::PermissionDenied, "You do not have access to this order")
                    .with("orderId", order_id)
                    .with("farmerId", farmer_id)
            },
            OrderLifecycleError::OrderAlreadyExists(id) => {
                Self::new(ErrorCode::FailedPrecondition, message).with("orderId", id)
            },
            OrderLifecycleError::InvalidArgument(_) => Self::invalid_argument(message),
            OrderLifecycleError::DatabaseError(detail) => Self::internal(&detail),
        }
    }
}

impl From<MatchLifecycleError> for ServiceError {
    fn from(e: MatchLifecycleError) -> Self {
        let message = e.to_string();
        match e {
            MatchLifecycleError::NotFound(id) => Self::new(ErrorCode::NotFound, message).with("matchId", id.value()),
            MatchLifecycleError::NoLongerPending { match_id, status } => {
                Self::new(ErrorCode::FailedPrecondition, message)
                    .with("matchId", match_id.value())
                    .with("status", status)
            },
            MatchLifecycleError::Expired { match_id, expires_at } => {
                Self::new(ErrorCode::FailedPrecondition, message)
                    .with("matchId", match_id.value())
                    .with("expiresAt", expires_at.to_rfc3339())
            },
            MatchLifecycleError::NotRejectable { match_id, status } => {
                Self::new(ErrorCode::FailedPrecondition, message)
                    .with("matchId", match_id.value())
                    .with("status", status)
            },
            MatchLifecycleError::Unauthorized { match_id, farmer_id } => {
                Self::new(ErrorCode::PermissionDenied, "You do not have access to this match")
                    .with("matchId", match_id.value())
                    .with("farmerId", farmer_id)
            },
            MatchLifecycleError::OrderConflict(match_id) => {
                Self::new(ErrorCode::FailedPrecondition, message).with("matchId", match_id.value())
            },
            MatchLifecycleError::InvalidArgument(_) => Self::invalid_argument(message),
            MatchLifecycleError::DatabaseError(detail) => Self::internal(&detail),
        }
    }
}

impl From<TransactionApiError> for ServiceError {
    fn from(e: TransactionApiError) -> Self {
        let message = e.to_string();
        match e {
            TransactionApiError::NotFound(id) => Self::new(ErrorCode::NotFound, message).with("orderId", id),
            TransactionApiError::InvalidArgument(_) => Self::invalid_argument(message),
            TransactionApiError::DatabaseError(detail) => Self::internal(&detail),
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use harvest_engine::db_types::{FarmerId, MatchId, MatchStatus, OrderId, TrackingStatus};

    use super::*;

    #[test]
    fn order_errors() {
        let id = OrderId::from("ORD-000001");
        let e = ServiceError::from(OrderLifecycleError::NotFound(id.clone()));
        assert_eq!(e.code, ErrorCode::NotFound);
        assert_eq!(e.metadata.get("orderId").map(String::as_str), Some("ORD-000001"));

        let e = ServiceError::from(OrderLifecycleError::InvalidTransition {
            order_id: id.clone(),
            from: TrackingStatus::Listed,
            to: TrackingStatus::Delivered,
        });
        assert_eq!(e.code, ErrorCode::FailedPrecondition);
        assert_eq!(e.metadata.get("to").map(String::as_str), Some("DELIVERED"));

        let farmer = FarmerId::try_from(2).unwrap();
        let e = ServiceError::from(OrderLifecycleError::Unauthorized { order_id: id, farmer_id: farmer });
        assert_eq!(e.code, ErrorCode::PermissionDenied);
    }

    #[test]
    fn match_errors() {
        let match_id = MatchId(9);
        let cases = [
            (MatchLifecycleError::NotFound(match_id), ErrorCode::NotFound),
            (
                MatchLifecycleError::NoLongerPending { match_id, status: MatchStatus::Accepted },
                ErrorCode::FailedPrecondition,
            ),
            (MatchLifecycleError::Expired { match_id, expires_at: Utc::now() }, ErrorCode::FailedPrecondition),
            (
                MatchLifecycleError::NotRejectable { match_id, status: MatchStatus::Rejected },
                ErrorCode::FailedPrecondition,
            ),
            (MatchLifecycleError::OrderConflict(match_id), ErrorCode::FailedPrecondition),
            (MatchLifecycleError::InvalidArgument("bad".into()), ErrorCode::InvalidArgument),
        ];
        for (err, code) in cases {
            let e = ServiceError::from(err);
            assert_eq!(e.code, code);
            assert_eq!(e.metadata.get("matchId").map(String::as_str), (code != ErrorCode::InvalidArgument).then_some("9"));
        }
    }

    #[test]
    fn internal_errors_are_not_leaked() {
        let e = ServiceError::from(TransactionApiError::DatabaseError("disk I/O error at /var/db".into()));
        assert_eq!(e.code, ErrorCode::Internal);
        assert!(!e.message.contains("/var/db"));
        assert!(e.metadata.is_empty());
    }

    #[test]
    fn farmer_ids() {
        let e = ServiceError::from(InvalidFarmerId::NotPositive(0));
        assert_eq!(e.code, ErrorCode::InvalidArgument);
        assert_eq!(e.metadata.get("farmerId").map(String::as_str), Some("0"));
        assert_eq!(ServiceError::from(InvalidFarmerId::Missing).code, ErrorCode::InvalidArgument);
        assert_eq!(ErrorCode::FailedPrecondition.to_string(), "FAILED_PRECONDITION");
    }
}
