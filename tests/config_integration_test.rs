//! Integration tests for configuration loading and validation
//!
//! These tests drive the loader through the real process environment.

use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::{NamedTempFile, TempDir};
use webscaffold::cache::FileCache;
use webscaffold::config::variables::variables;
use webscaffold::config::{load_config, load_dotenv_from, Environment};
use webscaffold::registry::Registry;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Remove every variable the loader knows about
fn cleanup_env_vars() {
    for variable in variables() {
        std::env::remove_var(variable.key);
    }
    std::env::remove_var("ENVENC_USED");
    std::env::remove_var("ENVENC_KEY_PRIVATE");
}

fn set_minimal_sqlite() {
    std::env::set_var("APP_HOST", "localhost");
    std::env::set_var("APP_PORT", "8080");
    std::env::set_var("APP_ENV", "testing");
    std::env::set_var("DB_DRIVER", "sqlite");
    std::env::set_var("DB_DATABASE", ":memory:");
}

#[test]
fn test_empty_environment_lists_core_keys() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let err = load_config().unwrap_err();
    let missing = err.missing_keys();
    for key in ["APP_HOST", "APP_PORT", "APP_ENV", "DB_DRIVER", "DB_DATABASE"] {
        assert!(missing.contains(&key), "{key} not reported in {missing:?}");
    }

    let rendered = err.to_string();
    assert!(rendered.starts_with("config: validation failed:"));
    assert!(rendered.contains("config: required env \"APP_HOST\" is missing"));
}

#[test]
fn test_minimal_sqlite_from_process_env() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    set_minimal_sqlite();

    let config = load_config().unwrap();
    assert_eq!(config.app.host, "localhost");
    assert_eq!(config.app.port, "8080");
    assert_eq!(config.app.env, Environment::Testing);
    assert_eq!(config.database.driver, "sqlite");
    assert_eq!(config.database.database, ":memory:");

    cleanup_env_vars();
}

#[test]
fn test_postgres_missing_connection_details() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    set_minimal_sqlite();
    std::env::set_var("DB_DRIVER", "postgres");
    std::env::set_var("DB_DATABASE", "testdb");

    let err = load_config().unwrap_err();
    let missing = err.missing_keys();
    for key in ["DB_HOST", "DB_PORT", "DB_USERNAME", "DB_PASSWORD"] {
        assert!(missing.contains(&key), "{key} not reported in {missing:?}");
    }

    cleanup_env_vars();
}

#[test]
fn test_user_vault_requires_vault_store() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    set_minimal_sqlite();
    std::env::set_var("USER_STORE_USE_VAULT", "true");
    std::env::set_var("VAULT_STORE_USED", "false");

    let err = load_config().unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("USER_STORE_USE_VAULT"));
    assert!(rendered.contains("VAULT_STORE_USED"));

    cleanup_env_vars();
}

#[test]
fn test_dotenv_file_feeds_the_loader() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "APP_HOST=127.0.0.1").unwrap();
    writeln!(file, "APP_PORT=9000").unwrap();
    writeln!(file, "APP_ENV=Development").unwrap();
    writeln!(file, "DB_DRIVER=sqlite").unwrap();
    writeln!(file, "DB_DATABASE=:memory:").unwrap();
    writeln!(file, "SETTING_STORE_USED=yes").unwrap();
    file.flush().unwrap();

    load_dotenv_from(file.path());
    let config = load_config().unwrap();
    assert_eq!(config.app.address(), "127.0.0.1:9000");
    assert_eq!(config.app.env, Environment::Development);
    assert!(config.stores.setting);

    cleanup_env_vars();
}

#[tokio::test]
async fn test_minimal_sqlite_boots_registry_without_stores() {
    let config = {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        cleanup_env_vars();
        set_minimal_sqlite();
        let config = load_config().unwrap();
        cleanup_env_vars();
        config
    };

    let dir = TempDir::new().unwrap();
    let cache_root = dir.path().join(".cache");
    let registry = Registry::builder(config)
        .file_cache(Arc::new(FileCache::new(&cache_root).unwrap()))
        .build()
        .await
        .unwrap();
    assert!(registry.store_ids().is_empty());
    assert_eq!(registry.file_cache().root(), cache_root.as_path());
    assert!(cache_root.is_dir());
    registry.close().await.unwrap();
}
