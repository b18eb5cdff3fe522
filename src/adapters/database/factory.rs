//! Database client factory
//!
//! Opens the backend selected by the configuration and wraps it in a
//! cloneable [`Database`] handle.

use super::{DatabaseClient, DatabaseError, DatabaseOptions, Driver, Row, SqlValue};
use crate::adapters::postgresql::PostgreSQLClient;
use crate::adapters::sqlite::SqliteClient;
use crate::config::DatabaseConfig;
use std::fmt;
use std::sync::Arc;

/// Shared handle to the opened database
///
/// Clones share the same underlying connection or pool. The handle that
/// opened the database is expected to close it on shutdown.
#[derive(Clone)]
pub struct Database {
    client: Arc<dyn DatabaseClient>,
}

impl Database {
    pub fn from_client(client: Arc<dyn DatabaseClient>) -> Self {
        Self { client }
    }

    /// Open an in-memory SQLite database
    pub async fn sqlite_memory() -> Result<Self, DatabaseError> {
        open_with_options(&DatabaseOptions::sqlite_memory()).await
    }

    pub fn driver(&self) -> Driver {
        self.client.driver()
    }

    /// Borrow the concrete client, e.g. to reach a PostgreSQL pool
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.client.as_any().downcast_ref::<T>()
    }

    pub async fn test_connection(&self) -> Result<(), DatabaseError> {
        self.client.test_connection().await
    }

    pub async fn execute_batch(&self, sql: &str) -> Result<(), DatabaseError> {
        self.client.execute_batch(sql).await
    }

    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, DatabaseError> {
        self.client.execute(sql, params).await
    }

    pub async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, DatabaseError> {
        self.client.query(sql, params).await
    }

    /// First row of a query, if any
    pub async fn query_one(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<Row>, DatabaseError> {
        Ok(self.client.query(sql, params).await?.into_iter().next())
    }

    /// First column of the first row as an integer, zero when absent
    pub async fn query_count(&self, sql: &str, params: &[SqlValue]) -> Result<i64, DatabaseError> {
        Ok(self
            .query_one(sql, params)
            .await?
            .and_then(|row| row.get_index(0).and_then(SqlValue::as_i64))
            .unwrap_or(0))
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool, DatabaseError> {
        self.client.table_exists(table).await
    }

    pub async fn close(&self) -> Result<(), DatabaseError> {
        self.client.close().await
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("driver", &self.driver())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Open the database described by the configuration
///
/// SQLite is tuned for a single writer. Server databases get a bounded
/// pool.
///
/// # Errors
///
/// Returns [`DatabaseError::UnsupportedDriver`] for MySQL or any unknown
/// driver, and [`DatabaseError::Open`] when the connection fails.
pub async fn open_database(config: &DatabaseConfig) -> Result<Database, DatabaseError> {
    let options = DatabaseOptions::from_config(config)?;
    open_with_options(&options).await
}

pub async fn open_with_options(options: &DatabaseOptions) -> Result<Database, DatabaseError> {
    match options.driver {
        Driver::Sqlite => {
            tracing::info!(database = %options.describe(), "Opening SQLite database");
            let client = SqliteClient::open(options).await?;
            Ok(Database::from_client(Arc::new(client)))
        }
        Driver::Postgres => {
            tracing::info!(database = %options.describe(), "Creating PostgreSQL client");
            let client = PostgreSQLClient::new(options).await?;
            client.test_connection().await?;
            Ok(Database::from_client(Arc::new(client)))
        }
        Driver::Mysql => Err(DatabaseError::UnsupportedDriver(
            options.driver.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_sqlite_from_config() {
        let config = DatabaseConfig {
            driver: "sqlite".into(),
            database: ":memory:".into(),
            ..DatabaseConfig::default()
        };

        let db = open_database(&config).await.unwrap();
        assert_eq!(db.driver(), Driver::Sqlite);
        assert!(db.downcast_ref::<SqliteClient>().is_some());
        db.test_connection().await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_mysql_is_unsupported() {
        let config = DatabaseConfig {
            driver: "mysql".into(),
            host: "localhost".into(),
            port: "3306".into(),
            database: "app".into(),
            ..DatabaseConfig::default()
        };

        let err = open_database(&config).await.unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedDriver(ref d) if d == "mysql"));
    }

    #[tokio::test]
    async fn test_query_count_helper() {
        let db = Database::sqlite_memory().await.unwrap();
        db.execute_batch("CREATE TABLE t (id TEXT);").await.unwrap();
        assert_eq!(db.query_count("SELECT COUNT(*) FROM t", &[]).await.unwrap(), 0);

        db.execute("INSERT INTO t (id) VALUES ($1)", &["x".into()])
            .await
            .unwrap();
        assert_eq!(db.query_count("SELECT COUNT(*) FROM t", &[]).await.unwrap(), 1);
    }
}
