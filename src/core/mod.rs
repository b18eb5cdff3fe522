//! Process-level orchestration
//!
//! - [`background`] - maintenance loops rooted in a shared shutdown channel
//! - [`blind_index`] - rebuilding the user blind indexes
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use webscaffold::config::load_config;
//! use webscaffold::core::background::BackgroundGroup;
//! use webscaffold::registry::Registry;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = Arc::new(Registry::new(load_config()?).await?);
//! let loops = BackgroundGroup::start(registry.clone());
//!
//! tokio::signal::ctrl_c().await?;
//!
//! loops.shutdown().await;
//! registry.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod background;
pub mod blind_index;
