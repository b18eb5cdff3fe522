//! Configuration management
//!
//! The environment is the only authoritative configuration source. A `.env`
//! file is loaded first when present, and an encrypted environment vault can
//! contribute further variables (see [`crate::vault`]).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use webscaffold::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config()?;
//! println!("Environment: {}", config.app.env);
//! println!("Database driver: {}", config.database.driver);
//! # Ok(())
//! # }
//! ```
//!
//! # Structure
//!
//! - [`Config`] - the loaded settings, grouped by concern
//! - [`variables`] - the declarative table of recognised variables
//! - [`LoadAccumulator`] - collects every problem found during a load
//! - [`ValidationError`] - the aggregated error returned on failure
//! - [`EnvSource`] - process or in-memory environment access
//!
//! # Validation
//!
//! A load never stops at the first problem. When it fails, the error lists
//! one line per missing or invalid variable:
//!
//! ```text
//! config: validation failed:
//!  - config: required env "DB_HOST" is missing: required when `DB_DRIVER` is not sqlite
//!  - config: required env "DB_PORT" is missing: required when `DB_DRIVER` is not sqlite
//! ```

pub mod accumulator;
pub mod env;
pub mod keys;
pub mod loader;
pub mod schema;
pub mod secret;
pub mod variables;

pub use accumulator::{ConfigError, LoadAccumulator, MissingEnv, ValidationError};
pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use loader::{load_config, load_config_from, load_dotenv, load_dotenv_from, ConfigLoader};
pub use schema::{
    AppConfig, AuthConfig, Config, DatabaseConfig, EnvEncryptionConfig, Environment, LlmConfig,
    LlmProviderConfig, MailConfig, StoresConfig, StripeConfig, TranslationConfig, VertexConfig,
};
pub use secret::{empty_secret, secret_string, SecretString, SecretValue};
