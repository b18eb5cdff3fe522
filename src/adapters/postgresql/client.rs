//! PostgreSQL client implementation
//!
//! This module provides the pooled client for PostgreSQL.

use crate::adapters::database::{DatabaseClient, DatabaseError, DatabaseOptions, Driver, Row, SqlValue};
use async_trait::async_trait;
use bytes::BytesMut;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::any::Any;
use std::cell::Cell;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::NoTls;

/// Upper bound on open connections
pub const MAX_OPEN_CONNECTIONS: usize = 25;

/// Idle connections kept by the maintenance task
pub const MAX_IDLE_CONNECTIONS: usize = 5;

/// Connections older than this are dropped when idle
pub const CONNECTION_MAX_LIFETIME: Duration = Duration::from_secs(5 * 60);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(30);

type BoxedParam = Box<dyn ToSql + Sync + Send>;

/// PostgreSQL client backed by a deadpool connection pool
pub struct PostgreSQLClient {
    pool: Pool,
    description: String,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// The pool is lazy; no connection is made until first use. A
    /// background task keeps idle connections within the configured caps.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or the pool or TLS
    /// connector cannot be built.
    pub async fn new(options: &DatabaseOptions) -> Result<Self, DatabaseError> {
        let pg_config = pg_config(options)?;
        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = if pg_config.get_ssl_mode() == SslMode::Disable {
            Manager::from_config(pg_config, NoTls, manager_config)
        } else {
            let connector = native_tls::TlsConnector::new()
                .map_err(|e| DatabaseError::Open(format!("Failed to build TLS connector: {e}")))?;
            Manager::from_config(pg_config, MakeTlsConnector::new(connector), manager_config)
        };

        let pool = Pool::builder(manager)
            .max_size(MAX_OPEN_CONNECTIONS)
            .runtime(Runtime::Tokio1)
            .wait_timeout(Some(Duration::from_secs(30)))
            .create_timeout(Some(CONNECT_TIMEOUT))
            .recycle_timeout(Some(Duration::from_secs(5)))
            .build()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection pool: {e}")))?;

        spawn_maintenance(pool.clone());

        Ok(Self {
            pool,
            description: options.describe(),
        })
    }

    /// Get a connection from the pool
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object, DatabaseError> {
        if self.pool.is_closed() {
            return Err(DatabaseError::Closed);
        }
        self.pool
            .get()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to get connection from pool: {e}")))
    }

    /// Connection summary without the password
    pub fn connection_string_safe(&self) -> &str {
        &self.description
    }

    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}

fn pg_config(options: &DatabaseOptions) -> Result<tokio_postgres::Config, DatabaseError> {
    let mut config = tokio_postgres::Config::new();
    config
        .host(&options.host)
        .dbname(&options.database)
        .user(&options.username)
        .password(options.password.expose_secret().as_str())
        .options(&format!("-c TimeZone={}", options.timezone))
        .application_name("webscaffold")
        .connect_timeout(CONNECT_TIMEOUT)
        .ssl_mode(ssl_mode(options.ssl_mode.as_deref().unwrap_or("require")));

    let port = options.port.trim();
    if !port.is_empty() {
        let port: u16 = port.parse().map_err(|_| {
            DatabaseError::InvalidOptions(format!("invalid PostgreSQL port '{port}'"))
        })?;
        config.port(port);
    }

    Ok(config)
}

/// libpq-style mode names; the verify-* modes still require TLS
fn ssl_mode(mode: &str) -> SslMode {
    match mode.trim().to_ascii_lowercase().as_str() {
        "disable" => SslMode::Disable,
        "allow" | "prefer" => SslMode::Prefer,
        _ => SslMode::Require,
    }
}

fn spawn_maintenance(pool: Pool) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            ticker.tick().await;
            if pool.is_closed() {
                break;
            }
            let removed = trim_idle(&pool);
            if removed > 0 {
                tracing::debug!(removed, "Trimmed idle PostgreSQL connections");
            }
        }
    });
}

/// Drop idle connections past their lifetime or beyond the idle cap
fn trim_idle(pool: &Pool) -> usize {
    let kept = Cell::new(0usize);
    let removed = Cell::new(0usize);
    pool.retain(|_, metrics| {
        let keep = metrics.age() < CONNECTION_MAX_LIFETIME && kept.get() < MAX_IDLE_CONNECTIONS;
        if keep {
            kept.set(kept.get() + 1);
        } else {
            removed.set(removed.get() + 1);
        }
        keep
    });
    removed.get()
}

/// NULL that binds to whatever type the server inferred for the parameter
#[derive(Debug)]
struct UntypedNull;

impl ToSql for UntypedNull {
    fn to_sql(
        &self,
        _ty: &Type,
        _out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn to_params(params: &[SqlValue]) -> Vec<BoxedParam> {
    params
        .iter()
        .map(|p| -> BoxedParam {
            match p {
                SqlValue::Null => Box::new(UntypedNull),
                SqlValue::Integer(n) => Box::new(*n),
                SqlValue::Real(f) => Box::new(*f),
                SqlValue::Text(s) => Box::new(s.clone()),
            }
        })
        .collect()
}

fn param_refs(params: &[BoxedParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

fn decode_row(row: &tokio_postgres::Row) -> Result<Row, DatabaseError> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());

    for (idx, column) in row.columns().iter().enumerate() {
        let ty = column.type_();
        let decoded = if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(idx).map(|v| v.map(SqlValue::Integer))
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(idx).map(|v| v.map(|n| SqlValue::Integer(i64::from(n))))
        } else if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(idx).map(|v| v.map(|n| SqlValue::Integer(i64::from(n))))
        } else if *ty == Type::FLOAT8 {
            row.try_get::<_, Option<f64>>(idx).map(|v| v.map(SqlValue::Real))
        } else if *ty == Type::FLOAT4 {
            row.try_get::<_, Option<f32>>(idx).map(|v| v.map(|f| SqlValue::Real(f64::from(f))))
        } else if *ty == Type::BOOL {
            row.try_get::<_, Option<bool>>(idx).map(|v| v.map(SqlValue::from))
        } else {
            row.try_get::<_, Option<String>>(idx).map(|v| v.map(SqlValue::Text))
        };
        let value = decoded.map_err(|e| DatabaseError::Query(format!("column '{}': {e}", column.name())))?;

        columns.push(column.name().to_string());
        values.push(value.unwrap_or(SqlValue::Null));
    }

    Ok(Row::new(columns, values))
}

#[async_trait]
impl DatabaseClient for PostgreSQLClient {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    async fn test_connection(&self) -> Result<(), DatabaseError> {
        let client = self.get_connection().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| DatabaseError::Open(format!("Connection test failed: {e}")))?;

        tracing::info!("PostgreSQL connection test successful");
        Ok(())
    }

    async fn execute_batch(&self, sql: &str) -> Result<(), DatabaseError> {
        let client = self.get_connection().await?;
        client
            .batch_execute(sql)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, DatabaseError> {
        let client = self.get_connection().await?;
        let boxed = to_params(params);
        client
            .execute(sql, &param_refs(&boxed))
            .await
            .map_err(|e| DatabaseError::Query(format!("Statement execution failed: {e}")))
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, DatabaseError> {
        let client = self.get_connection().await?;
        let boxed = to_params(params);
        let rows = client
            .query(sql, &param_refs(&boxed))
            .await
            .map_err(|e| DatabaseError::Query(format!("Query failed: {e}")))?;

        rows.iter().map(decode_row).collect()
    }

    async fn table_exists(&self, table: &str) -> Result<bool, DatabaseError> {
        let rows = self
            .query(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name::text = $1",
                &[SqlValue::from(table)],
            )
            .await?;
        Ok(rows
            .first()
            .and_then(|row| row.get_index(0))
            .and_then(SqlValue::as_i64)
            .unwrap_or(0)
            > 0)
    }

    async fn close(&self) -> Result<(), DatabaseError> {
        self.pool.close();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use test_case::test_case;

    fn options(ssl: &str) -> DatabaseOptions {
        DatabaseOptions {
            driver: Driver::Postgres,
            host: "localhost".into(),
            port: "5432".into(),
            database: "app".into(),
            charset: "utf8mb4".into(),
            timezone: "UTC".into(),
            username: "app".into(),
            password: secret_string("password".to_string()),
            ssl_mode: Some(ssl.into()),
        }
    }

    #[test_case("disable", SslMode::Disable)]
    #[test_case("prefer", SslMode::Prefer)]
    #[test_case("allow", SslMode::Prefer)]
    #[test_case("require", SslMode::Require)]
    #[test_case("verify-full", SslMode::Require)]
    fn test_ssl_mode_mapping(input: &str, expected: SslMode) {
        assert_eq!(ssl_mode(input), expected);
    }

    #[test]
    fn test_pg_config_sets_timezone_and_port() {
        let config = pg_config(&options("disable")).unwrap();
        assert_eq!(config.get_ports(), &[5432]);
        assert_eq!(config.get_options(), Some("-c TimeZone=UTC"));
        assert_eq!(config.get_dbname(), Some("app"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut opts = options("disable");
        opts.port = "fifty".into();
        assert!(matches!(pg_config(&opts), Err(DatabaseError::InvalidOptions(_))));
    }

    #[tokio::test]
    async fn test_pool_is_lazy_and_close_is_idempotent() {
        let client = PostgreSQLClient::new(&options("disable")).await.unwrap();
        assert_eq!(client.pool_status().max_size, MAX_OPEN_CONNECTIONS);
        assert!(!client.connection_string_safe().contains("password"));

        client.close().await.unwrap();
        client.close().await.unwrap();
        assert!(client.is_closed());
        assert!(matches!(client.get_connection().await, Err(DatabaseError::Closed)));
    }

    #[test_case(Type::INT8)]
    #[test_case(Type::FLOAT8)]
    #[test_case(Type::TEXT)]
    #[test_case(Type::BOOL)]
    fn test_null_binds_to_any_column_type(ty: Type) {
        let mut out = BytesMut::new();
        let null = UntypedNull;
        assert!(matches!(null.to_sql_checked(&ty, &mut out), Ok(IsNull::Yes)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_null_and_scalars_convert() {
        let boxed = to_params(&[SqlValue::Null, 1i64.into(), 2.0.into(), "x".into()]);
        assert_eq!(param_refs(&boxed).len(), 4);
    }
}
