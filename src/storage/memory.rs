//! In-memory implementation of [`TargetStore`]
//!
//! Useful for tests and dry runs without a database file. Besides the trait
//! operations it can toggle a target's `enabled` flag and simulate an outage,
//! which the scheduler tests rely on.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error::{StoreError, StoreResult};
use super::TargetStore;
use crate::models::{CheckResult, NewCheck, NewTarget, Target, TargetId, TargetStatus};

#[derive(Default)]
struct Tables {
    targets: BTreeMap<TargetId, Target>,
    checks: Vec<CheckResult>,
    next_target_id: TargetId,
    next_check_id: i64,
}

/// In-memory target store
#[derive(Default)]
pub struct MemoryTargetStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryTargetStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a target's enabled flag; returns `false` for unknown ids
    pub fn set_enabled(&self, id: TargetId, enabled: bool) -> StoreResult<bool> {
        let mut tables = self.write()?;
        Ok(match tables.targets.get_mut(&id) {
            Some(target) => {
                target.enabled = enabled;
                true
            }
            None => false,
        })
    }

    /// Make every operation fail with [`StoreError::Unavailable`] while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// All checks recorded so far, oldest first
    pub fn all_checks(&self) -> StoreResult<Vec<CheckResult>> {
        Ok(self.read()?.checks.clone())
    }

    /// Number of checks recorded for one target
    pub fn check_count(&self, target_id: TargetId) -> StoreResult<usize> {
        Ok(self
            .read()?
            .checks
            .iter()
            .filter(|c| c.target_id == target_id)
            .count())
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.ensure_available()?;
        self.tables.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.ensure_available()?;
        self.tables.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl TargetStore for MemoryTargetStore {
    fn list_enabled_targets(&self) -> StoreResult<Vec<Target>> {
        Ok(self
            .read()?
            .targets
            .values()
            .filter(|t| t.enabled)
            .cloned()
            .collect())
    }

    fn list_all_targets(&self) -> StoreResult<Vec<Target>> {
        Ok(self.read()?.targets.values().cloned().collect())
    }

    fn get_target(&self, id: TargetId) -> StoreResult<Option<Target>> {
        Ok(self.read()?.targets.get(&id).cloned())
    }

    fn insert_target(&self, target: &NewTarget) -> StoreResult<TargetId> {
        let mut tables = self.write()?;
        tables.next_target_id += 1;
        let id = tables.next_target_id;
        tables.targets.insert(id, target.clone().into_target(id));
        Ok(id)
    }

    fn delete_target(&self, id: TargetId) -> StoreResult<bool> {
        Ok(self.write()?.targets.remove(&id).is_some())
    }

    fn append_check(&self, check: &NewCheck) -> StoreResult<i64> {
        let mut tables = self.write()?;
        tables.next_check_id += 1;
        let id = tables.next_check_id;
        tables.checks.push(check.clone().into_result(id));
        Ok(id)
    }

    fn latest_check_per_target(&self) -> StoreResult<Vec<TargetStatus>> {
        let tables = self.read()?;
        Ok(tables
            .targets
            .values()
            .map(|target| TargetStatus {
                target: target.clone(),
                last_check: tables
                    .checks
                    .iter()
                    .rev()
                    .find(|c| c.target_id == target.id)
                    .cloned(),
            })
            .collect())
    }

    fn recent_checks(&self, target_id: TargetId, limit: usize) -> StoreResult<Vec<CheckResult>> {
        Ok(self
            .read()?
            .checks
            .iter()
            .rev()
            .filter(|c| c.target_id == target_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteTargetStore;
    use chrono::Utc;

    // Both backends must behave identically
    fn create_test_stores() -> Vec<Box<dyn TargetStore>> {
        vec![
            Box::new(SqliteTargetStore::in_memory().unwrap()),
            Box::new(MemoryTargetStore::new()),
        ]
    }

    fn new_target(url: &str, enabled: bool) -> NewTarget {
        NewTarget::new(url, 30, enabled).unwrap()
    }

    fn new_check(target_id: TargetId, ok: bool) -> NewCheck {
        NewCheck {
            target_id,
            timestamp: Utc::now(),
            status_code: if ok { Some(200) } else { None },
            latency_ms: Some(5.0),
            ok,
            error: if ok { None } else { Some("timeout".to_string()) },
        }
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        for store in create_test_stores() {
            let a = store.insert_target(&new_target("http://a.example", true)).unwrap();
            let b = store.insert_target(&new_target("http://b.example", true)).unwrap();
            assert!(b > a);

            let target = store.get_target(a).unwrap().unwrap();
            assert_eq!(target.url, "http://a.example/");
            assert_eq!(target.interval_seconds, 30);
        }
    }

    #[test]
    fn test_list_enabled_excludes_disabled() {
        for store in create_test_stores() {
            store.insert_target(&new_target("http://a.example", true)).unwrap();
            store.insert_target(&new_target("http://b.example", false)).unwrap();

            let enabled = store.list_enabled_targets().unwrap();
            assert_eq!(enabled.len(), 1);
            assert!(enabled.iter().all(|t| t.enabled));
            assert_eq!(store.list_all_targets().unwrap().len(), 2);
        }
    }

    #[test]
    fn test_latest_check_per_target() {
        for store in create_test_stores() {
            let a = store.insert_target(&new_target("http://a.example", true)).unwrap();
            let b = store.insert_target(&new_target("http://b.example", true)).unwrap();

            store.append_check(&new_check(a, true)).unwrap();
            let last = store.append_check(&new_check(a, false)).unwrap();

            let statuses = store.latest_check_per_target().unwrap();
            assert_eq!(statuses.len(), 2);

            let status_a = statuses.iter().find(|s| s.target.id == a).unwrap();
            let check_a = status_a.last_check.as_ref().unwrap();
            assert_eq!(check_a.id, last);
            assert!(!check_a.ok);

            // Never-checked targets are still reported
            let status_b = statuses.iter().find(|s| s.target.id == b).unwrap();
            assert!(status_b.last_check.is_none());
        }
    }

    #[test]
    fn test_recent_checks_newest_first_with_limit() {
        for store in create_test_stores() {
            let a = store.insert_target(&new_target("http://a.example", true)).unwrap();
            let ids: Vec<i64> = (0..5)
                .map(|_| store.append_check(&new_check(a, true)).unwrap())
                .collect();

            let recent = store.recent_checks(a, 3).unwrap();
            assert_eq!(recent.len(), 3);
            assert_eq!(recent[0].id, ids[4]);
            assert_eq!(recent[2].id, ids[2]);
        }
    }

    #[test]
    fn test_delete_target() {
        for store in create_test_stores() {
            let a = store.insert_target(&new_target("http://a.example", true)).unwrap();
            assert!(store.delete_target(a).unwrap());
            assert!(!store.delete_target(a).unwrap());
            assert!(store.list_enabled_targets().unwrap().is_empty());
        }
    }

    #[test]
    fn test_set_enabled_and_outage() {
        let store = MemoryTargetStore::new();
        let a = store.insert_target(&new_target("http://a.example", true)).unwrap();

        assert!(store.set_enabled(a, false).unwrap());
        assert!(store.list_enabled_targets().unwrap().is_empty());
        assert!(!store.set_enabled(999, true).unwrap());

        store.set_unavailable(true);
        assert!(matches!(
            store.list_all_targets(),
            Err(StoreError::Unavailable(_))
        ));
        store.set_unavailable(false);
        assert_eq!(store.list_all_targets().unwrap().len(), 1);
    }
}
