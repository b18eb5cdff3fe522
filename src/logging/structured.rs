//! Console logging using tracing
//!
//! The console logger writes tinted, human-readable lines to stdout, or
//! JSON lines when requested. `RUST_LOG` always wins over the configured
//! level.

use super::LoggingError;
use crate::config::Config;
use tracing::{Dispatch, Level};
use tracing_subscriber::EnvFilter;

/// Console logger settings
#[derive(Debug, Clone, Default)]
pub struct ConsoleOptions {
    /// Explicit level; `None` picks `debug` or `info` from `debug`
    pub level: Option<String>,
    pub debug: bool,
    /// Emit JSON lines instead of tinted text
    pub json: bool,
}

impl ConsoleOptions {
    /// Settings derived from the loaded configuration
    ///
    /// Production emits JSON so log shippers can parse it.
    pub fn from_config(config: &Config) -> Self {
        Self {
            level: None,
            debug: config.app.debug,
            json: config.is_production(),
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Level selected by these options
    pub fn effective_level(&self) -> Result<Level, LoggingError> {
        match self.level.as_deref() {
            Some(level) if !level.trim().is_empty() => parse_log_level(level),
            _ if self.debug => Ok(Level::DEBUG),
            _ => Ok(Level::INFO),
        }
    }
}

/// Build the console logger without installing it globally
///
/// # Errors
///
/// Returns [`LoggingError::InvalidLevel`] for an unknown level name.
pub fn console_dispatch(options: &ConsoleOptions) -> Result<Dispatch, LoggingError> {
    let level = options.effective_level()?;
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| LoggingError::InvalidFilter(e.to_string()))?,
        _ => EnvFilter::new(level.as_str().to_lowercase()),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stdout);

    let dispatch = if options.json {
        Dispatch::new(builder.json().finish())
    } else {
        Dispatch::new(builder.with_ansi(true).finish())
    };
    Ok(dispatch)
}

/// Parse log level from string
pub fn parse_log_level(level_str: &str) -> Result<Level, LoggingError> {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(LoggingError::InvalidLevel(level_str.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level_valid() {
        assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("warn").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("error").unwrap(), Level::ERROR);
    }

    #[test]
    fn test_parse_log_level_case_insensitive() {
        assert_eq!(parse_log_level("TRACE").unwrap(), Level::TRACE);
        assert_eq!(parse_log_level("Debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level(" Warning ").unwrap(), Level::WARN);
    }

    #[test]
    fn test_parse_log_level_invalid() {
        assert!(parse_log_level("invalid").is_err());
        assert!(parse_log_level("").is_err());
    }

    #[test]
    fn test_effective_level() {
        assert_eq!(ConsoleOptions::default().effective_level().unwrap(), Level::INFO);

        let debug = ConsoleOptions {
            debug: true,
            ..ConsoleOptions::default()
        };
        assert_eq!(debug.effective_level().unwrap(), Level::DEBUG);
        assert_eq!(debug.with_level("error").effective_level().unwrap(), Level::ERROR);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let options = ConsoleOptions::default().with_level("loud");
        assert!(matches!(
            console_dispatch(&options),
            Err(LoggingError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_console_dispatch_is_scoped() {
        let console = console_dispatch(&ConsoleOptions::default()).unwrap();
        tracing::dispatcher::with_default(&console, || {
            tracing::info!("scoped console line");
        });
    }
}
