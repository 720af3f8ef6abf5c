//! SQLite storage backend for the Harvest engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
