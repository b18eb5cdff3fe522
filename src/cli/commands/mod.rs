//! CLI command implementations
//!
//! Every command returns the process exit code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | success |
//! | 2 | configuration invalid |
//! | 3 | database open failure |
//! | 4 | store initialize or migrate failure |
//! | 5 | any other fatal error |

pub mod migrate;
pub mod serve;
pub mod validate;
pub mod vault;

use crate::config::{Config, ConfigLoader, ProcessEnv};
use crate::domain::{AppError, Result as AppResult};
use crate::logging::ConsoleOptions;
use crate::registry::Registry;

pub const EXIT_OK: i32 = 0;
pub const EXIT_CONFIG: i32 = 2;

/// Load the configuration, printing the aggregated error on failure
pub(crate) fn load_config_or_report() -> Result<Config, i32> {
    match ConfigLoader::default().load(&mut ProcessEnv) {
        Ok(config) => Ok(config),
        Err(e) => {
            tracing::error!(problems = e.len(), "Configuration is invalid");
            eprintln!("{e}");
            Err(EXIT_CONFIG)
        }
    }
}

/// Boot the registry, printing the failure and its exit code on error
pub(crate) async fn boot_or_report(config: Config, log_level: Option<&str>) -> Result<Registry, i32> {
    let debug = config.app.debug;
    boot(config, log_level)
        .await
        .map_err(|e| report_boot_failure(e, debug))
}

async fn boot(config: Config, log_level: Option<&str>) -> AppResult<Registry> {
    let mut console = ConsoleOptions::from_config(&config);
    console.level = log_level.map(str::to_string);
    Ok(Registry::builder(config).console(console).build().await?)
}

fn report_boot_failure(error: AppError, debug: bool) -> i32 {
    tracing::error!(error = %error, "Registry boot failed");
    if debug {
        eprintln!("Error: {error:?}");
    } else {
        eprintln!("Error: {error}");
    }
    error.exit_code()
}
