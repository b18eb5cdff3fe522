//! Validate config command implementation
//!
//! Loads the configuration from the environment and prints a redacted
//! summary. Secrets are never printed.

use super::{load_config_or_report, EXIT_OK};
use crate::adapters::DatabaseOptions;
use crate::config::Config;
use crate::registry::StoreId;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!("Validating configuration");

        let config = match load_config_or_report() {
            Ok(config) => config,
            Err(code) => {
                println!("❌ Configuration is invalid");
                return Ok(code);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        for line in summary(&config) {
            println!("  {line}");
        }
        Ok(EXIT_OK)
    }
}

/// Human-readable, secret-free description of `config`
pub fn summary(config: &Config) -> Vec<String> {
    let database = DatabaseOptions::from_config(&config.database)
        .map(|options| options.describe())
        .unwrap_or_else(|e| format!("unusable ({e})"));

    let enabled: Vec<&str> = StoreId::ALL
        .iter()
        .filter(|id| id.is_enabled(&config.stores))
        .map(StoreId::as_str)
        .collect();

    let name = if config.app.name.is_empty() {
        "(unnamed)"
    } else {
        config.app.name.as_str()
    };
    let encryption = if config.env_encryption.used {
        "enabled"
    } else {
        "disabled"
    };
    let stores = if enabled.is_empty() {
        "none".to_string()
    } else {
        enabled.join(", ")
    };

    vec![
        format!("Application: {name}"),
        format!("Environment: {}", config.app.env),
        format!("Address: {}", config.app.address()),
        format!("Debug: {}", config.app.debug),
        format!("Database: {database}"),
        format!("Env encryption: {encryption}"),
        format!("Stores: {stores}"),
    ]
}
