//! Database adapters
//!
//! This module contains the SQL backends the registry can open:
//! - SQLite (embedded, single connection)
//! - PostgreSQL (pooled)
//!
//! Stores never talk to a backend directly. They hold a [`Database`]
//! handle, which dispatches to whichever backend the configuration selected.

pub mod database;
pub mod postgresql;
pub mod sqlite;

pub use database::{open_database, open_with_options, Database, DatabaseError, DatabaseOptions, Driver, Row, SqlValue};
