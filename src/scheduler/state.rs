//! Per-target scheduling state
//!
//! The table maps a target id to its next due instant and whether a probe for
//! it is currently running. It is owned by one [`Scheduler`](super::Scheduler)
//! and shared only with that scheduler's probe tasks, which clear their
//! in-flight flag through [`InFlightGuard`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use crate::models::{Target, TargetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    next_due: Instant,
    in_flight: bool,
}

/// Targets selected by one scan
#[derive(Debug, Default)]
pub struct Claim {
    /// Targets to probe now; each is marked in flight
    pub due: Vec<Target>,
    /// Due targets skipped because their previous probe is still running
    pub in_flight_skipped: usize,
}

/// Mutex-guarded map of per-target state
#[derive(Debug, Default)]
pub struct ScheduleTable {
    entries: Mutex<HashMap<TargetId, Entry>>,
}

impl ScheduleTable {
    pub fn new() -> Self {
        Self::default()
    }

    // The map holds plain data, so a panic mid-update cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, HashMap<TargetId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Select the due targets from `snapshot` and stamp them
    ///
    /// A target is due when it has no entry yet or `now >= next_due`. Each due
    /// target gets `next_due = now + interval` and `in_flight = true` under
    /// the same lock. Entries for ids missing from `snapshot` are dropped
    /// unless a probe for them is still running.
    pub fn claim_due(&self, snapshot: &[Target], now: Instant) -> Claim {
        let mut entries = self.lock();
        let mut claim = Claim::default();

        entries.retain(|id, entry| entry.in_flight || snapshot.iter().any(|t| t.id == *id));

        for target in snapshot {
            let due = entries.get(&target.id).map_or(true, |e| now >= e.next_due);
            if !due {
                continue;
            }

            let entry = entries.entry(target.id).or_insert(Entry {
                next_due: now,
                in_flight: false,
            });
            if entry.in_flight {
                claim.in_flight_skipped += 1;
                continue;
            }

            entry.next_due = now + target.interval();
            entry.in_flight = true;
            claim.due.push(target.clone());
        }

        claim
    }

    /// Clear the in-flight flag for `id`
    pub fn complete(&self, id: TargetId) {
        if let Some(entry) = self.lock().get_mut(&id) {
            entry.in_flight = false;
        }
    }

    pub fn next_due(&self, id: TargetId) -> Option<Instant> {
        self.lock().get(&id).map(|e| e.next_due)
    }

    pub fn is_in_flight(&self, id: TargetId) -> bool {
        self.lock().get(&id).is_some_and(|e| e.in_flight)
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().values().filter(|e| e.in_flight).count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Releases a target's in-flight flag when the probe task ends
///
/// Dropped on normal completion, on panic unwinding and on abort alike.
pub struct InFlightGuard {
    table: Arc<ScheduleTable>,
    id: TargetId,
}

impl InFlightGuard {
    pub fn new(table: Arc<ScheduleTable>, id: TargetId) -> Self {
        Self { table, id }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.table.complete(self.id);
    }
}
