//! Migrate command implementation
//!
//! Booting the registry runs both store phases, so migrating is a boot
//! followed by an orderly close.

use super::{boot_or_report, load_config_or_report, EXIT_OK};
use clap::Args;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {}

impl MigrateArgs {
    /// Execute the migrate command
    pub async fn execute(&self, log_level: Option<&str>) -> anyhow::Result<i32> {
        let config = match load_config_or_report() {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };

        let registry = match boot_or_report(config, log_level).await {
            Ok(registry) => registry,
            Err(code) => return Ok(code),
        };

        let migrated = registry.store_ids();
        println!("✅ Migrated {} store(s)", migrated.len());
        for id in &migrated {
            println!("  - {id}");
        }

        registry.close().await?;
        Ok(EXIT_OK)
    }
}
