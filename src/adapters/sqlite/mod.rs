//! SQLite adapter
//!
//! Embedded single-connection backend. Used for local development, tests
//! and small deployments.

pub mod client;

pub use client::SqliteClient;
