// Webscaffold - Application registry and configuration lifecycle
// Copyright (c) 2025 Webscaffold Contributors
// Licensed under the MIT License

//! # Webscaffold - Application registry and configuration lifecycle
//!
//! Webscaffold is the boot core of a monolithic web application. It turns
//! the process environment into a validated configuration, opens the
//! database and wires up the optional persistence stores the configuration
//! switches on.
//!
//! ## Overview
//!
//! This library provides:
//! - **Configuration** loaded from environment variables, with every problem
//!   reported at once
//! - **Environment vaults** that ship encrypted variables next to the binary
//! - **A database gateway** over SQLite and PostgreSQL
//! - **Twenty-odd optional stores** built and migrated in a fixed order
//! - **A registry** owning all of the above plus two caches and two loggers
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Environment-driven configuration
//! - [`vault`] - Encrypted environment vaults
//! - [`adapters`] - Database drivers
//! - [`stores`] - Optional persistence subsystems
//! - [`registry`] - Composition root and store lifecycle
//! - [`cache`] - In-memory and filesystem caches
//! - [`logging`] - Console and database loggers
//! - [`core`] - Background maintenance loops
//! - [`domain`] - Crate-wide error type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use webscaffold::config::load_config;
//! use webscaffold::registry::Registry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config()?;
//!     let registry = Registry::new(config).await?;
//!
//!     if let Some(settings) = registry.setting_store() {
//!         settings.set("site.title", "Hello").await?;
//!     }
//!
//!     registry.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Each module has its own error enum; [`domain::AppError`] wraps them all:
//!
//! ```rust,no_run
//! use webscaffold::domain::AppError;
//!
//! fn example() -> Result<(), AppError> {
//!     let config = webscaffold::config::load_config()?;
//!     println!("{}", config.app.address());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod registry;
pub mod stores;
pub mod vault;
