//! Vault command implementation
//!
//! `vault seal` encrypts a dotenv file into `.env.<env>.vault`; `vault open`
//! decrypts one and lists its variable names. Values are never printed.

use super::{EXIT_CONFIG, EXIT_OK};
use crate::config::keys::ENVENC_KEY_PRIVATE;
use crate::config::secret_string;
use crate::vault::VaultEnv;
use anyhow::Context;
use clap::{Args, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Arguments for the vault command
#[derive(Args, Debug)]
pub struct VaultArgs {
    #[command(subcommand)]
    pub command: VaultCommand,
}

#[derive(Subcommand, Debug)]
pub enum VaultCommand {
    /// Encrypt a dotenv file into an environment vault
    Seal(SealArgs),

    /// Decrypt an environment vault and list its variable names
    Open(OpenArgs),
}

#[derive(Args, Debug)]
pub struct SealArgs {
    /// Environment tag, e.g. production
    #[arg(long)]
    pub env: String,

    /// Dotenv file holding the variables to seal
    #[arg(long)]
    pub input: PathBuf,

    /// Directory the vault file is written to
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Environment tag, e.g. production
    #[arg(long)]
    pub env: String,

    /// Directory holding the vault file
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

impl VaultArgs {
    /// Execute the vault command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let Some(vault) = vault_from_env() else {
            eprintln!("Error: {ENVENC_KEY_PRIVATE} must be set to use the vault");
            return Ok(EXIT_CONFIG);
        };

        match &self.command {
            VaultCommand::Seal(args) => {
                let vault = match &args.output {
                    Some(dir) => vault.with_base_dir(dir),
                    None => vault,
                };
                let vars = read_dotenv(&args.input)?;
                let path = vault.seal_file(&args.env, &vars)?;
                tracing::info!(path = %path.display(), variables = vars.len(), "Vault sealed");
                println!("✅ Sealed {} variable(s) into {}", vars.len(), path.display());
            }
            VaultCommand::Open(args) => {
                let vault = match &args.dir {
                    Some(dir) => vault.with_base_dir(dir),
                    None => vault,
                };
                let vars = vault.open_file(&args.env)?;
                println!("✅ Vault for '{}' holds {} variable(s)", args.env, vars.len());
                for key in vars.keys() {
                    println!("  - {key}");
                }
            }
        }
        Ok(EXIT_OK)
    }
}

fn vault_from_env() -> Option<VaultEnv> {
    let private_key = std::env::var(ENVENC_KEY_PRIVATE).ok()?;
    if private_key.trim().is_empty() {
        return None;
    }
    Some(VaultEnv::new(secret_string(private_key)))
}

/// Parse a dotenv file without touching the process environment
pub fn read_dotenv(path: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    let entries = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut vars = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry.with_context(|| format!("failed to parse {}", path.display()))?;
        vars.insert(key, value);
    }
    Ok(vars)
}
