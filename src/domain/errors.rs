//! Application error type
//!
//! Every module keeps its own error enum; [`AppError`] wraps them so callers
//! that cross module boundaries can use a single `?`-friendly type.

use crate::adapters::DatabaseError;
use crate::cache::CacheError;
use crate::config::{ConfigError, ValidationError};
use crate::logging::LoggingError;
use crate::registry::RegistryError;
use crate::stores::StoreError;
use crate::vault::VaultError;
use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Aggregated configuration validation failure
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A single configuration problem
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Process exit code for this failure
    ///
    /// 2 for configuration, 3 for database open, 4 for store boot and 5 for
    /// anything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Validation(_) | AppError::Configuration(_) | AppError::Vault(_) => 2,
            AppError::Database(_) | AppError::Registry(RegistryError::DatabaseOpen(_)) => 3,
            AppError::Store(_)
            | AppError::Registry(
                RegistryError::StoreInitialize { .. }
                | RegistryError::StoreMigrate { .. }
                | RegistryError::StoreMissing { .. },
            ) => 4,
            _ => 5,
        }
    }
}
