//! uptime-monitor - HTTP uptime monitoring
//!
//! Periodically probes registered HTTP endpoints, records every outcome in
//! SQLite and exposes the history through a JSON API, an HTML status page and
//! Prometheus metrics.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Targets, check results and validation
//! - [`storage`] - Target store trait with SQLite and in-memory backends
//! - [`prober`] - Single HTTP probe with a deadline
//! - [`scheduler`] - Scan loop deciding which targets are due
//! - [`recorder`] - Persists outcomes and updates metrics
//! - [`metrics`] - Prometheus registry
//! - [`server`] - HTTP API and status page
//! - [`error`] - Unified error type
//! - [`utils`] - Retry and formatting helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use uptime_monitor::prelude::*;
//! use uptime_monitor::utils::retry::RetryConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = open_sqlite_store(&config.storage.db_path)?;
//!     let metrics = Arc::new(MonitorMetrics::new().map_err(|e| anyhow::anyhow!("{e}"))?);
//!     let prober = HttpProber::new(config.http_timeout(), &config.scheduler.user_agent)?;
//!     let recorder = ResultRecorder::new(store.clone(), metrics.clone(), RetryConfig::default());
//!
//!     let handle = Scheduler::from_config(
//!         &config.scheduler,
//!         store,
//!         Arc::new(prober),
//!         recorder,
//!         metrics,
//!     )
//!     .start();
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod prober;
pub mod recorder;
pub mod scheduler;
pub mod server;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, MonitorErrorTrait, Result};
    pub use crate::metrics::MonitorMetrics;
    pub use crate::models::{CheckResult, NewTarget, Target, TargetId, TargetStatus};
    pub use crate::prober::{HttpProber, Outcome, Probe};
    pub use crate::recorder::{RecordStatus, ResultRecorder};
    pub use crate::scheduler::{Scheduler, SchedulerHandle, TickReport};
    pub use crate::storage::{open_sqlite_store, SharedTargetStore, TargetStore};
}

// Direct re-exports for convenience
pub use models::{CheckResult, Target, TargetId};
