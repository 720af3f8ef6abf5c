//! Harvest Lifecycle Engine
//!
//! The Harvest engine tracks farm-produce orders from listing through to payment, and the buyer match offers that
//! give rise to those orders. It is transport-agnostic: callers supply a storage backend and talk to the lifecycle
//! APIs directly.
//!
//! The library is divided into three main sections:
//! 1. Storage contracts ([`mod@traits`]) and the SQLite backend that implements them ([`SqliteDatabase`]). You should
//!    never need to run queries against the database directly. The data types used by the backends are defined in
//!    [`mod@db_types`] and are public.
//! 2. The lifecycle APIs ([`OrderLifecycleApi`], [`MatchLifecycleApi`] and [`TransactionApi`]). These enforce the
//!    order tracking state machine, the match offer state machine and provide the read-only earnings and transaction
//!    views.
//! 3. Events. Status changes and delay updates are published to any subscribed hooks. Publishing never blocks the
//!    operation that raised the event.
pub mod db_types;
pub mod events;
pub mod helpers;
mod lifecycle_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use lifecycle_api::{
    errors::{MatchLifecycleError, OrderLifecycleError, TransactionApiError},
    match_lifecycle_api::{MatchLifecycleApi, DEFAULT_MATCH_VALIDITY_HOURS, EXPIRY_BATCH_SIZE},
    order_lifecycle_api::OrderLifecycleApi,
    order_objects,
    transaction_api::TransactionApi,
    transaction_objects,
};
pub use traits::{MatchManagement, OrderManagement, StoreError, TransactionManagement};
