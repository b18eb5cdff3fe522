//! Integration tests for graceful shutdown
//!
//! These tests verify that:
//! - Background loops observe the shutdown signal and return
//! - The database is closed only after the loops have stopped
//! - Loops keep running through failing iterations

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;
use webscaffold::cache::FileCache;
use webscaffold::config::{Config, DatabaseConfig, StoresConfig};
use webscaffold::core::background::{BackgroundGroup, BackgroundIntervals};
use webscaffold::registry::Registry;

async fn registry(stores: StoresConfig) -> (Arc<Registry>, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.database = DatabaseConfig {
        driver: "sqlite".into(),
        database: ":memory:".into(),
        ..DatabaseConfig::default()
    };
    config.stores = stores;

    let registry = Registry::builder(config)
        .file_cache(Arc::new(FileCache::new(dir.path()).unwrap()))
        .build()
        .await
        .unwrap();
    (Arc::new(registry), dir)
}

fn fast_intervals() -> BackgroundIntervals {
    BackgroundIntervals {
        memory_cache_purge: Duration::from_millis(10),
        cache_store_expire: Duration::from_millis(10),
        session_expire: Duration::from_millis(10),
        task_queue_cleanup: Duration::from_millis(10),
        blind_index_rebuild: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_shutdown_signal_propagation() {
    // Test that shutdown signal propagates to multiple receivers
    let (shutdown_tx, shutdown_rx1) = watch::channel(false);
    let shutdown_rx2 = shutdown_rx1.clone();

    assert!(!*shutdown_rx1.borrow());
    assert!(!*shutdown_rx2.borrow());

    shutdown_tx.send(true).unwrap();

    assert!(*shutdown_rx1.borrow());
    assert!(*shutdown_rx2.borrow());
}

#[tokio::test]
async fn test_shutdown_completes_promptly() {
    let stores = StoresConfig {
        cache: true,
        session: true,
        task: true,
        ..StoresConfig::default()
    };
    let (registry, _dir) = registry(stores).await;
    let group = BackgroundGroup::start(registry.clone());

    // Default intervals are minutes long; shutdown must not wait for a tick
    tokio::time::timeout(Duration::from_secs(5), group.shutdown())
        .await
        .expect("loops should stop on the shutdown signal");

    registry.close().await.unwrap();
}

#[tokio::test]
async fn test_expired_sessions_are_removed_while_running() {
    let stores = StoresConfig {
        session: true,
        ..StoresConfig::default()
    };
    let (registry, _dir) = registry(stores).await;
    let sessions = registry.session_store().unwrap();
    sessions
        .put("stale", "user-1", "{}", Duration::from_millis(1))
        .await
        .unwrap();
    sessions
        .put("fresh", "user-1", "{}", Duration::from_secs(3600))
        .await
        .unwrap();

    let group = BackgroundGroup::with_intervals(registry.clone(), fast_intervals());
    tokio::time::sleep(Duration::from_millis(150)).await;
    group.shutdown().await;

    let db = registry.database().unwrap();
    let remaining = db
        .query_count("SELECT COUNT(*) FROM snv_sessions_session", &[])
        .await
        .unwrap();
    assert_eq!(remaining, 1);
    assert!(sessions.get("fresh").await.unwrap().is_some());

    registry.close().await.unwrap();
}

#[tokio::test]
async fn test_loops_survive_a_closed_database() {
    let stores = StoresConfig {
        cache: true,
        ..StoresConfig::default()
    };
    let (registry, _dir) = registry(stores).await;
    let group = BackgroundGroup::with_intervals(registry.clone(), fast_intervals());

    // Every iteration now fails; the loop logs and keeps going
    registry.close().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(group.loop_names().len(), 2);
    group.shutdown().await;
}
