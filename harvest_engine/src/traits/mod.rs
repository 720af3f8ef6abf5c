//! # Storage contracts
//!
//! This module defines the behaviour a storage backend must expose in order to drive the Harvest lifecycle engine.
//! The lifecycle APIs never talk to a database directly; they only depend on these traits, so any store (or a test
//! double) can be plugged in.
//!
//! * [`OrderManagement`] covers order lookup and every order mutation. Status changes are conditional on the status
//!   the caller expects the order to be in.
//! * [`MatchManagement`] covers match offers. Every status change out of `PENDING_ACCEPTANCE` is conditional, which
//!   is what guarantees that at most one of a concurrent accept, reject or expiry wins.
//! * [`TransactionManagement`] provides the read-only aggregate queries behind the earnings and transaction views.
mod data_objects;
mod errors;
mod match_management;
mod order_management;
mod transaction_management;

pub use data_objects::{
    DelayUpdate,
    EarningsAggregate,
    EarningsRow,
    MatchStatusUpdate,
    OrderListFilter,
    Pagination,
    SortOrder,
    StatusUpdate,
    TransactionFilter,
    TransactionSortKey,
    TransactionStatusFilter,
    DEFAULT_PAGE_LIMIT,
    MAX_PAGE_LIMIT,
};
pub use errors::StoreError;
pub use match_management::MatchManagement;
pub use order_management::OrderManagement;
pub use transaction_management::TransactionManagement;
