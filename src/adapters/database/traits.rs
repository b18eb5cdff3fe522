//! Database abstraction traits
//!
//! Every backend implements [`DatabaseClient`]. The SQL passed in uses
//! `$1..$n` placeholders, which both SQLite and PostgreSQL accept.

use super::{DatabaseError, Driver, Row, SqlValue};
use async_trait::async_trait;
use std::any::Any;

#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Downcast to the concrete client
    fn as_any(&self) -> &dyn Any;

    fn driver(&self) -> Driver;

    /// Round-trip a trivial query
    async fn test_connection(&self) -> Result<(), DatabaseError>;

    /// Run one or more statements without parameters
    async fn execute_batch(&self, sql: &str) -> Result<(), DatabaseError>;

    /// Run a single statement and return the number of affected rows
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, DatabaseError>;

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, DatabaseError>;

    /// Whether a table with this exact name exists in the current schema
    async fn table_exists(&self, table: &str) -> Result<bool, DatabaseError>;

    /// Release the connection(s). Calling it again is a no-op.
    async fn close(&self) -> Result<(), DatabaseError>;

    fn is_closed(&self) -> bool;
}
