//! Logging and observability
//!
//! Two loggers exist during a process lifetime:
//! - the **console** logger, built before anything else and always
//!   available (see [`structured`])
//! - the **database** logger, installed by the registry once the log store
//!   has been migrated (see [`database`])
//!
//! Both are plain [`tracing::Dispatch`] values. The registry swaps its
//! active logger from console to database exactly once.
//!
//! # Example
//!
//! ```no_run
//! use webscaffold::logging::{console_dispatch, ConsoleOptions};
//!
//! let console = console_dispatch(&ConsoleOptions::default()).expect("valid log level");
//! tracing::dispatcher::with_default(&console, || {
//!     tracing::info!("Application started");
//! });
//! ```

pub mod database;
pub mod structured;

pub use database::{database_dispatch, DatabaseLogLayer};
pub use structured::{console_dispatch, parse_log_level, ConsoleOptions};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLevel(String),

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
}
