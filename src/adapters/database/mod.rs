//! Database gateway
//!
//! Translates [`crate::config::DatabaseConfig`] into backend options, opens
//! the selected backend and exposes a small portable SQL surface shared by
//! every store.

pub mod factory;
pub mod options;
pub mod traits;
pub mod value;

pub use factory::{open_database, open_with_options, Database};
pub use options::{DatabaseOptions, Driver};
pub use traits::DatabaseClient;
pub use value::{Row, SqlValue};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("unsupported database driver '{0}'")]
    UnsupportedDriver(String),

    #[error("invalid database options: {0}")]
    InvalidOptions(String),

    #[error("failed to open database: {0}")]
    Open(String),

    #[error("database pool error: {0}")]
    Pool(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("database is closed")]
    Closed,
}
