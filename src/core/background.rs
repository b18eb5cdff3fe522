//! Periodic maintenance loops
//!
//! Every loop shares one `watch` shutdown channel. [`BackgroundGroup::shutdown`]
//! flips the channel and waits for each loop to return; callers close the
//! registry afterwards.

use super::blind_index::rebuild_blind_indexes;
use crate::registry::Registry;
use chrono::Utc;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::instrument::WithSubscriber;

/// Finished task queue rows older than this are removed
pub const TASK_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Tick periods of the maintenance loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundIntervals {
    pub memory_cache_purge: Duration,
    pub cache_store_expire: Duration,
    pub session_expire: Duration,
    pub task_queue_cleanup: Duration,
    pub blind_index_rebuild: Duration,
}

impl Default for BackgroundIntervals {
    fn default() -> Self {
        Self {
            memory_cache_purge: Duration::from_secs(60),
            cache_store_expire: Duration::from_secs(60),
            session_expire: Duration::from_secs(5 * 60),
            task_queue_cleanup: Duration::from_secs(2 * 60),
            blind_index_rebuild: Duration::from_secs(60 * 60),
        }
    }
}

/// Running maintenance loops
pub struct BackgroundGroup {
    shutdown: watch::Sender<bool>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl BackgroundGroup {
    /// Start the loops for every enabled store with default intervals
    pub fn start(registry: Arc<Registry>) -> Self {
        Self::with_intervals(registry, BackgroundIntervals::default())
    }

    pub fn with_intervals(registry: Arc<Registry>, intervals: BackgroundIntervals) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let mut handles = Vec::new();

        let cache = registry.memory_cache();
        handles.push(spawn_loop(
            "memory_cache_purge",
            intervals.memory_cache_purge,
            shutdown_rx.clone(),
            move || {
                let cache = cache.clone();
                async move {
                    let purged = cache.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, "Purged expired memory cache entries");
                    }
                    Ok::<_, anyhow::Error>(())
                }
            },
        ));

        if let Some(store) = registry.cache_store() {
            handles.push(spawn_loop(
                "cache_store_expire",
                intervals.cache_store_expire,
                shutdown_rx.clone(),
                move || {
                    let store = store.clone();
                    async move {
                        let removed = store.expire().await?;
                        tracing::debug!(removed, "Expired cache store entries");
                        Ok::<_, anyhow::Error>(())
                    }
                },
            ));
        }

        if let Some(store) = registry.session_store() {
            handles.push(spawn_loop(
                "session_expire",
                intervals.session_expire,
                shutdown_rx.clone(),
                move || {
                    let store = store.clone();
                    async move {
                        let removed = store.expire().await?;
                        tracing::debug!(removed, "Expired sessions");
                        Ok::<_, anyhow::Error>(())
                    }
                },
            ));
        }

        if let Some(store) = registry.task_store() {
            handles.push(spawn_loop(
                "task_queue_cleanup",
                intervals.task_queue_cleanup,
                shutdown_rx.clone(),
                move || {
                    let store = store.clone();
                    async move {
                        let cutoff = Utc::now().timestamp_millis() - TASK_RETENTION.as_millis() as i64;
                        let removed = store.clear_finished_before(cutoff).await?;
                        tracing::debug!(removed, "Cleared finished task queue items");
                        Ok::<_, anyhow::Error>(())
                    }
                },
            ));
        }

        if registry.blind_index_email_store().is_some() {
            let registry = registry.clone();
            handles.push(spawn_loop(
                "blind_index_rebuild",
                intervals.blind_index_rebuild,
                shutdown_rx,
                move || {
                    let registry = registry.clone();
                    async move {
                        rebuild_blind_indexes(&registry).await?;
                        Ok::<_, anyhow::Error>(())
                    }
                },
            ));
        }

        tracing::info!(loops = handles.len(), "Background loops started");
        Self { shutdown, handles }
    }

    /// Names of the running loops
    pub fn loop_names(&self) -> Vec<&'static str> {
        self.handles.iter().map(|(name, _)| *name).collect()
    }

    /// Signal every loop and wait until all have returned
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);

        let (names, handles): (Vec<_>, Vec<_>) = self.handles.into_iter().unzip();
        for (name, result) in names.into_iter().zip(join_all(handles).await) {
            if let Err(e) = result {
                tracing::warn!(task = name, error = %e, "Background loop ended abnormally");
            }
        }
        tracing::info!("Background loops stopped");
    }
}

fn spawn_loop<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) -> (&'static str, JoinHandle<()>)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let handle = tokio::spawn(
        async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = tick().await {
                            tracing::warn!(task = name, error = %e, "Background loop iteration failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            tracing::debug!(task = name, "Background loop stopping");
                            break;
                        }
                    }
                }
            }
        }
        .with_current_subscriber(),
    );
    (name, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileCache;
    use crate::config::{Config, DatabaseConfig};

    async fn registry(enable: impl FnOnce(&mut Config)) -> (Arc<Registry>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database = DatabaseConfig {
            driver: "sqlite".into(),
            database: ":memory:".into(),
            ..DatabaseConfig::default()
        };
        enable(&mut config);

        let registry = Registry::builder(config)
            .file_cache(Arc::new(FileCache::new(dir.path()).unwrap()))
            .build()
            .await
            .unwrap();
        (Arc::new(registry), dir)
    }

    #[tokio::test]
    async fn test_only_memory_cache_loop_without_stores() {
        let (registry, _dir) = registry(|_| {}).await;
        let group = BackgroundGroup::start(registry);
        assert_eq!(group.loop_names(), vec!["memory_cache_purge"]);
        group.shutdown().await;
    }

    #[tokio::test]
    async fn test_loops_follow_enabled_stores() {
        let (registry, _dir) = registry(|config| {
            config.stores.cache = true;
            config.stores.session = true;
            config.stores.task = true;
        })
        .await;
        let group = BackgroundGroup::start(registry.clone());
        assert_eq!(group.loop_names().len(), 4);
        group.shutdown().await;
        registry.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_blind_index_loop_follows_user_and_vault() {
        let (registry, _dir) = registry(|config| {
            config.stores.user = true;
            config.stores.vault = true;
        })
        .await;
        let group = BackgroundGroup::start(registry.clone());
        assert!(group.loop_names().contains(&"blind_index_rebuild"));
        group.shutdown().await;
        registry.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_cache_is_purged() {
        let (registry, _dir) = registry(|_| {}).await;
        registry
            .memory_cache()
            .set("flash", "saved".to_string(), Some(Duration::from_millis(1)));

        let intervals = BackgroundIntervals {
            memory_cache_purge: Duration::from_millis(10),
            ..BackgroundIntervals::default()
        };
        let group = BackgroundGroup::with_intervals(registry.clone(), intervals);
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Nothing left for a manual purge once the loop has run
        assert_eq!(registry.memory_cache().purge_expired(), 0);
        group.shutdown().await;
    }
}
