//! SQLite client implementation
//!
//! One connection behind a mutex. Every call runs on the blocking pool, so
//! writes are serialized and the effective pool size is one open and one
//! idle connection.

use crate::adapters::database::{DatabaseClient, DatabaseError, DatabaseOptions, Driver, Row, SqlValue};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

/// Milliseconds a writer waits on a locked database before failing
pub const BUSY_TIMEOUT_MS: u64 = 5_000;

const PRAGMAS: [&str; 3] = [
    "PRAGMA journal_mode = WAL;",
    "PRAGMA synchronous = NORMAL;",
    "PRAGMA foreign_keys = ON;",
];

pub struct SqliteClient {
    conn: Arc<Mutex<Option<Connection>>>,
    path: String,
}

impl SqliteClient {
    /// Open the database file (or `:memory:`) and apply the tuning pragmas
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Open`] if the file cannot be opened.
    pub async fn open(options: &DatabaseOptions) -> Result<Self, DatabaseError> {
        let path = options.database.trim().to_string();
        if path.is_empty() {
            return Err(DatabaseError::InvalidOptions(
                "sqlite database path is empty".to_string(),
            ));
        }

        let target = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, DatabaseError> {
            let conn = if target == ":memory:" {
                Connection::open_in_memory()
            } else {
                Connection::open(&target)
            }
            .map_err(|e| DatabaseError::Open(format!("{target}: {e}")))?;
            apply_pragmas(&conn);
            Ok(conn)
        })
        .await
        .map_err(|e| DatabaseError::Open(e.to_string()))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            path,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            match guard.as_ref() {
                Some(conn) => f(conn).map_err(|e| DatabaseError::Query(e.to_string())),
                None => Err(DatabaseError::Closed),
            }
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("blocking task failed: {e}")))?
    }
}

/// Tuning is best-effort; a failed pragma is logged and skipped
fn apply_pragmas(conn: &Connection) {
    for pragma in PRAGMAS {
        if let Err(e) = conn.execute_batch(pragma) {
            tracing::warn!(pragma, error = %e, "SQLite pragma failed");
        }
    }
    if let Err(e) = conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS)) {
        tracing::warn!(error = %e, "SQLite busy_timeout failed");
    }
}

fn to_values(params: &[SqlValue]) -> Vec<Value> {
    params
        .iter()
        .map(|p| match p {
            SqlValue::Null => Value::Null,
            SqlValue::Integer(n) => Value::Integer(*n),
            SqlValue::Real(f) => Value::Real(*f),
            SqlValue::Text(s) => Value::Text(s.clone()),
        })
        .collect()
}

fn from_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(n) => SqlValue::Integer(n),
        Value::Real(f) => SqlValue::Real(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Text(String::from_utf8_lossy(&b).into_owned()),
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn driver(&self) -> Driver {
        Driver::Sqlite
    }

    async fn test_connection(&self) -> Result<(), DatabaseError> {
        self.with_connection(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await?;
        Ok(())
    }

    async fn execute_batch(&self, sql: &str) -> Result<(), DatabaseError> {
        let sql = sql.to_string();
        self.with_connection(move |conn| conn.execute_batch(&sql)).await
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, DatabaseError> {
        let sql = sql.to_string();
        let values = to_values(params);
        let affected = self
            .with_connection(move |conn| conn.execute(&sql, params_from_iter(values.iter())))
            .await?;
        Ok(affected as u64)
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, DatabaseError> {
        let sql = sql.to_string();
        let values = to_values(params);
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query(params_from_iter(values.iter()))?;

            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut decoded = Vec::with_capacity(columns.len());
                for idx in 0..columns.len() {
                    decoded.push(from_value(row.get::<_, Value>(idx)?));
                }
                out.push(Row::new(columns.clone(), decoded));
            }
            Ok(out)
        })
        .await
    }

    async fn table_exists(&self, table: &str) -> Result<bool, DatabaseError> {
        let table = table.to_string();
        let count = self
            .with_connection(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get::<_, i64>(0),
                )
            })
            .await?;
        Ok(count > 0)
    }

    async fn close(&self) -> Result<(), DatabaseError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || match conn.lock().take() {
            Some(conn) => conn.close().map_err(|(_, e)| DatabaseError::Query(e.to_string())),
            None => Ok(()),
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("blocking task failed: {e}")))?
    }

    fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }
}
