//! PostgreSQL database integration
//!
//! Pooled server backend used in staging and production deployments.

pub mod client;

pub use client::PostgreSQLClient;
