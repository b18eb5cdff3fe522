// Webscaffold - Application registry and configuration lifecycle
// Copyright (c) 2025 Webscaffold Contributors
// Licensed under the MIT License

use clap::Parser;
use std::process;
use tokio::sync::watch;
use tracing::instrument::WithSubscriber;
use webscaffold::cli::{Cli, Commands};
use webscaffold::config::load_dotenv_from;
use webscaffold::domain::AppError;
use webscaffold::logging::{console_dispatch, ConsoleOptions};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Pre-boot logging goes to the console only; `serve` installs the
    // registry's active logger globally once the registry is up
    let console_options = ConsoleOptions {
        level: cli.log_level.clone(),
        ..ConsoleOptions::default()
    };
    let console = match console_dispatch(&console_options) {
        Ok(console) => console,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    // A missing env file is silently ignored
    tracing::dispatcher::with_default(&console, || load_dotenv_from(&cli.env_file));

    // Create shutdown signal channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler task
    tokio::spawn(
        async move {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = match signal(SignalKind::terminate()) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to create SIGTERM handler");
                        return;
                    }
                };

                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                    }
                }
                let _ = shutdown_tx.send(true);
            }

            #[cfg(not(unix))]
            {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                } else {
                    tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                    let _ = shutdown_tx.send(true);
                }
            }
        }
        .with_subscriber(console.clone()),
    );

    // Execute command and get exit code
    let exit_code = match execute_command(&cli, shutdown_rx)
        .with_subscriber(console.clone())
        .await
    {
        Ok(code) => code,
        Err(e) => {
            tracing::dispatcher::with_default(&console, || {
                tracing::error!(error = %e, "Command execution failed");
            });
            eprintln!("Error: {e}");
            e.downcast_ref::<AppError>().map_or(5, AppError::exit_code)
        }
    };

    // Exit with appropriate code
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Webscaffold starting");

    let log_level = cli.log_level.as_deref();
    match &cli.command {
        Commands::Serve(args) => args.execute(log_level, shutdown_signal).await,
        Commands::ValidateConfig(args) => args.execute().await,
        Commands::Migrate(args) => args.execute(log_level).await,
        Commands::Vault(args) => args.execute().await,
    }
}
