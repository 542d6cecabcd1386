//! Durable storage for targets and their check history
//!
//! The [`TargetStore`] trait decouples the scheduler, recorder and API from the
//! storage backend:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │     Scheduler · ResultRecorder · HTTP API    │
//! └──────────────────────────────────────────────┘
//!                        │
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │              TargetStore trait               │
//! └──────────────────────────────────────────────┘
//!              │                     │
//!              ▼                     ▼
//!   ┌─────────────────────┐ ┌─────────────────────┐
//!   │  SqliteTargetStore  │ │  MemoryTargetStore  │
//!   └─────────────────────┘ └─────────────────────┘
//! ```
//!
//! Every operation is a single-row (or single-statement) unit, so concurrent
//! API mutations interleave safely with scheduler reads.

pub mod error;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use crate::models::{CheckResult, NewCheck, NewTarget, Target, TargetId, TargetStatus};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryTargetStore;
pub use sqlite::SqliteTargetStore;

/// Repository for targets and their append-only check history
pub trait TargetStore: Send + Sync {
    /// All targets with `enabled = true`
    fn list_enabled_targets(&self) -> StoreResult<Vec<Target>>;

    /// All targets, ordered by id
    fn list_all_targets(&self) -> StoreResult<Vec<Target>>;

    /// Look up a single target
    fn get_target(&self, id: TargetId) -> StoreResult<Option<Target>>;

    /// Insert a validated target and return its id
    fn insert_target(&self, target: &NewTarget) -> StoreResult<TargetId>;

    /// Delete a target; returns `false` when no such target existed
    fn delete_target(&self, id: TargetId) -> StoreResult<bool>;

    /// Append one check row and return its id
    fn append_check(&self, check: &NewCheck) -> StoreResult<i64>;

    /// Every live target paired with its newest check
    fn latest_check_per_target(&self) -> StoreResult<Vec<TargetStatus>>;

    /// Newest-first history for one target
    fn recent_checks(&self, target_id: TargetId, limit: usize) -> StoreResult<Vec<CheckResult>>;
}

/// Thread-safe shared store handle
pub type SharedTargetStore = Arc<dyn TargetStore>;

/// Open (or create) the SQLite store at `path`
pub fn open_sqlite_store(path: impl AsRef<std::path::Path>) -> StoreResult<SharedTargetStore> {
    let store = SqliteTargetStore::new(path)?;
    Ok(Arc::new(store))
}

/// Run a store operation on tokio's blocking pool
///
/// SQLite calls block the calling thread, so async callers go through here
/// instead of touching the store from a runtime worker.
pub async fn blocking<T, F>(store: &SharedTargetStore, op: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn TargetStore) -> StoreResult<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}
