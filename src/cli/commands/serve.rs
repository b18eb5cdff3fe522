//! Serve command implementation
//!
//! Boots the registry, installs the active logger process-wide and runs the
//! background loops until a shutdown signal arrives. Shutdown stops the
//! loops first, then closes the database.

use super::{boot_or_report, load_config_or_report, EXIT_OK};
use crate::core::background::BackgroundGroup;
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::instrument::WithSubscriber;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        log_level: Option<&str>,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = match load_config_or_report() {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        let address = config.app.address();

        let registry = match boot_or_report(config, log_level).await {
            Ok(registry) => Arc::new(registry),
            Err(code) => return Ok(code),
        };

        let logger = registry.logger();
        if tracing::dispatcher::set_global_default(logger.clone()).is_err() {
            tracing::warn!("A global logger was already installed");
        }

        async move {
            tracing::info!(address = %address, "Webscaffold running");
            let loops = BackgroundGroup::start(registry.clone());

            while !*shutdown_signal.borrow() {
                if shutdown_signal.changed().await.is_err() {
                    break;
                }
            }

            tracing::info!("Shutting down");
            loops.shutdown().await;
            registry.close().await?;
            tracing::info!("Shutdown complete");
            Ok::<_, anyhow::Error>(())
        }
        .with_subscriber(logger)
        .await?;

        Ok(EXIT_OK)
    }
}
