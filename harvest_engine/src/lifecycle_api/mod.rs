//! The lifecycle APIs.
//!
//! Each API wraps a storage backend and owns the rules for one part of the system. The backends themselves only
//! guarantee atomic, conditional writes; every decision about what is allowed lives here.
pub mod errors;
pub mod match_lifecycle_api;
pub mod order_lifecycle_api;
pub mod order_objects;
pub mod transaction_api;
pub mod transaction_objects;
