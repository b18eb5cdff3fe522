//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Webscaffold using clap.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Webscaffold - Application registry and configuration lifecycle
#[derive(Parser, Debug)]
#[command(name = "webscaffold")]
#[command(version, about, long_about = None)]
#[command(author = "Webscaffold Contributors")]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "WEBSCAFFOLD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Dotenv file loaded before the configuration is read
    #[arg(short, long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Boot the registry and run background maintenance until interrupted
    Serve(commands::serve::ServeArgs),

    /// Validate the environment configuration
    ValidateConfig(commands::validate::ValidateArgs),

    /// Create or update every enabled store's tables
    Migrate(commands::migrate::MigrateArgs),

    /// Seal or inspect encrypted environment vaults
    Vault(commands::vault::VaultArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use commands::vault::VaultCommand;

    #[test]
    fn test_cli_parse_serve() {
        let cli = Cli::parse_from(["webscaffold", "serve"]);
        assert_eq!(cli.env_file, PathBuf::from(".env"));
        assert!(matches!(cli.command, Commands::Serve(_)));
    }

    #[test]
    fn test_cli_parse_with_env_file() {
        let cli = Cli::parse_from(["webscaffold", "--env-file", "staging.env", "migrate"]);
        assert_eq!(cli.env_file, PathBuf::from("staging.env"));
        assert!(matches!(cli.command, Commands::Migrate(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["webscaffold", "--log-level", "debug", "serve"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["webscaffold", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_vault_seal() {
        let cli = Cli::parse_from([
            "webscaffold",
            "vault",
            "seal",
            "--env",
            "production",
            "--input",
            ".env.production",
        ]);
        match cli.command {
            Commands::Vault(args) => match args.command {
                VaultCommand::Seal(seal) => {
                    assert_eq!(seal.env, "production");
                    assert_eq!(seal.input, PathBuf::from(".env.production"));
                    assert!(seal.output.is_none());
                }
                other => panic!("unexpected vault command {other:?}"),
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_vault_open_requires_env() {
        assert!(Cli::try_parse_from(["webscaffold", "vault", "open"]).is_err());
    }
}
