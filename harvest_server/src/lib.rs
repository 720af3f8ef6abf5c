//! # Harvest server
//!
//! This crate hosts the farmer-facing service layer on top of the Harvest engine. It is responsible for:
//! * Validating caller input (farmer ids, status strings and paging parameters) before it reaches the engine.
//! * Mapping engine errors onto transport-neutral [`errors::ErrorCode`]s without leaking store details.
//! * Running the periodic match expiry sweep.
//! * Wiring the order event handlers at start-up.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod server;
pub mod service;

#[cfg(test)]
mod test;
