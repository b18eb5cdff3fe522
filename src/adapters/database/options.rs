//! Connection options derived from configuration

use super::DatabaseError;
use crate::config::{DatabaseConfig, SecretString};
use std::fmt;
use std::str::FromStr;

/// Character set requested from server databases
pub const DEFAULT_CHARSET: &str = "utf8mb4";

/// Session timezone for every connection
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// SSL mode used when the configuration leaves it blank
pub const DEFAULT_SSL_MODE: &str = "require";

/// Supported and recognised SQL drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Sqlite,
    Postgres,
    Mysql,
}

impl Driver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Sqlite => "sqlite",
            Driver::Postgres => "postgres",
            Driver::Mysql => "mysql",
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Driver {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "postgres" | "postgresql" | "pgsql" => Ok(Driver::Postgres),
            "mysql" => Ok(Driver::Mysql),
            other => Err(DatabaseError::UnsupportedDriver(other.to_string())),
        }
    }
}

/// Backend-neutral connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub driver: Driver,
    pub host: String,
    pub port: String,
    /// Database name, or the file path for SQLite
    pub database: String,
    pub charset: String,
    pub timezone: String,
    pub username: String,
    pub password: SecretString,
    /// Only set for server databases
    pub ssl_mode: Option<String>,
}

impl DatabaseOptions {
    /// Build options from the loaded database configuration
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::UnsupportedDriver`] for an unknown driver
    /// name.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let driver: Driver = config.driver.parse()?;

        let ssl_mode = match driver {
            Driver::Sqlite => None,
            _ => {
                let mode = config.ssl_mode.trim();
                Some(if mode.is_empty() {
                    DEFAULT_SSL_MODE.to_string()
                } else {
                    mode.to_ascii_lowercase()
                })
            }
        };

        Ok(Self {
            driver,
            host: config.host.clone(),
            port: config.port.clone(),
            database: config.database.clone(),
            charset: DEFAULT_CHARSET.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            ssl_mode,
        })
    }

    /// In-memory SQLite options, used by tests and tooling
    pub fn sqlite_memory() -> Self {
        Self::sqlite(":memory:")
    }

    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            driver: Driver::Sqlite,
            host: String::new(),
            port: String::new(),
            database: path.into(),
            charset: DEFAULT_CHARSET.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            username: String::new(),
            password: crate::config::empty_secret(),
            ssl_mode: None,
        }
    }

    /// Connection summary safe for logs
    pub fn describe(&self) -> String {
        match self.driver {
            Driver::Sqlite => format!("sqlite://{}", self.database),
            _ => format!(
                "{}://{}@{}:{}/{}",
                self.driver, self.username, self.host, self.port, self.database
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use test_case::test_case;

    #[test_case("sqlite", Driver::Sqlite)]
    #[test_case("SQLite3", Driver::Sqlite)]
    #[test_case("postgres", Driver::Postgres)]
    #[test_case("postgresql", Driver::Postgres)]
    #[test_case("mysql", Driver::Mysql)]
    fn test_driver_parse(input: &str, expected: Driver) {
        assert_eq!(input.parse::<Driver>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_driver_rejected() {
        let err = "oracle".parse::<Driver>().unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedDriver(ref d) if d == "oracle"));
    }

    #[test]
    fn test_server_options_default_ssl_mode() {
        let config = DatabaseConfig {
            driver: "postgres".into(),
            host: "db.internal".into(),
            port: "5432".into(),
            database: "app".into(),
            username: "app".into(),
            password: secret_string("hunter2".to_string()),
            ssl_mode: "  ".into(),
        };

        let options = DatabaseOptions::from_config(&config).unwrap();
        assert_eq!(options.ssl_mode.as_deref(), Some("require"));
        assert_eq!(options.charset, "utf8mb4");
        assert_eq!(options.timezone, "UTC");
        assert_eq!(options.describe(), "postgres://app@db.internal:5432/app");
        assert!(!options.describe().contains("hunter2"));
    }

    #[test]
    fn test_sqlite_options_have_no_ssl_mode() {
        let config = DatabaseConfig {
            driver: "sqlite".into(),
            database: "app.db".into(),
            ssl_mode: "disable".into(),
            ..DatabaseConfig::default()
        };

        let options = DatabaseOptions::from_config(&config).unwrap();
        assert_eq!(options.driver, Driver::Sqlite);
        assert!(options.ssl_mode.is_none());
    }
}
