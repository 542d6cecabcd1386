//! Probe scheduling
//!
//! The scheduler runs one long-lived task that scans the enabled targets on a
//! fixed cadence and dispatches every due target to the prober as an
//! independent task.
//!
//! # Architecture
//!
//! ```text
//!   scan tick ──▶ TargetStore::list_enabled_targets (fresh snapshot)
//!                        │
//!                        ▼
//!                 ScheduleTable::claim_due ──▶ next_due = now + interval
//!                        │                     in_flight = true
//!                        ▼
//!        ┌───────────────┼───────────────┐
//!        ▼               ▼               ▼
//!   probe task      probe task      probe task     (JoinSet, Semaphore-bounded)
//!        │               │               │
//!        └──▶ Probe::probe ──▶ ResultRecorder::record ──▶ InFlightGuard drop
//! ```
//!
//! # Dispatch policy
//!
//! Dispatch is tick-bounded: `next_due` is computed from the tick instant, and
//! a target is probed at most once per scan tick. When the scan cadence is
//! longer than a target's interval the target is under-sampled (once per
//! tick) rather than probed in bursts, and missed ticks are delayed rather
//! than replayed.
//!
//! # Failure handling
//!
//! A failed store read skips that tick; a panicking probe task releases its
//! in-flight flag through its guard and is reported when reaped. Nothing in
//! the loop is fatal.

pub mod state;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::config::SchedulerConfig;
use crate::metrics::MonitorMetrics;
use crate::prober::Probe;
use crate::recorder::ResultRecorder;
use crate::storage::{self, SharedTargetStore, StoreResult};

pub use state::{Claim, InFlightGuard, ScheduleTable};

/// Summary of one scan tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Enabled targets in the snapshot
    pub scanned: usize,
    /// Probes dispatched this tick
    pub dispatched: usize,
    /// Due targets skipped because their previous probe is still running
    pub in_flight_skipped: usize,
}

/// Scans targets and dispatches due probes
pub struct Scheduler {
    store: SharedTargetStore,
    prober: Arc<dyn Probe>,
    recorder: ResultRecorder,
    metrics: Arc<MonitorMetrics>,
    table: Arc<ScheduleTable>,
    permits: Arc<Semaphore>,
    scan_interval: Duration,
}

impl Scheduler {
    /// Default number of probes allowed to run at once
    pub const DEFAULT_MAX_CONCURRENT: usize = 64;

    pub fn new(
        store: SharedTargetStore,
        prober: Arc<dyn Probe>,
        recorder: ResultRecorder,
        metrics: Arc<MonitorMetrics>,
        scan_interval: Duration,
    ) -> Self {
        Self {
            store,
            prober,
            recorder,
            metrics,
            table: Arc::new(ScheduleTable::new()),
            permits: Arc::new(Semaphore::new(Self::DEFAULT_MAX_CONCURRENT)),
            scan_interval,
        }
    }

    /// Build a scheduler from configuration
    pub fn from_config(
        config: &SchedulerConfig,
        store: SharedTargetStore,
        prober: Arc<dyn Probe>,
        recorder: ResultRecorder,
        metrics: Arc<MonitorMetrics>,
    ) -> Self {
        Self::new(
            store,
            prober,
            recorder,
            metrics,
            Duration::from_secs(config.scan_interval_secs),
        )
        .with_max_concurrent(config.max_concurrent_probes)
    }

    /// Bound the number of concurrently running probes
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    /// Scheduling state, shared with in-flight probe tasks
    pub fn table(&self) -> &Arc<ScheduleTable> {
        &self.table
    }

    /// Run one scan at the current instant
    pub async fn tick(&self, tasks: &mut JoinSet<()>) -> StoreResult<TickReport> {
        self.tick_at(Instant::now(), tasks).await
    }

    /// Run one scan as if the current instant were `now`
    ///
    /// Reads a fresh snapshot of enabled targets, claims the due ones and
    /// spawns one probe task per claimed target into `tasks`.
    pub async fn tick_at(
        &self,
        now: Instant,
        tasks: &mut JoinSet<()>,
    ) -> StoreResult<TickReport> {
        self.metrics.record_tick();

        let snapshot = match storage::blocking(&self.store, |s| s.list_enabled_targets()).await {
            Ok(targets) => targets,
            Err(e) => {
                self.metrics.record_tick_error();
                return Err(e);
            }
        };

        let Claim {
            due,
            in_flight_skipped,
        } = self.table.claim_due(&snapshot, now);

        let report = TickReport {
            scanned: snapshot.len(),
            dispatched: due.len(),
            in_flight_skipped,
        };

        for target in due {
            let guard = InFlightGuard::new(Arc::clone(&self.table), target.id);
            let permits = Arc::clone(&self.permits);
            let metrics = Arc::clone(&self.metrics);
            let prober = Arc::clone(&self.prober);
            let recorder = self.recorder.clone();

            tasks.spawn(async move {
                let _guard = guard;
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                let _running = metrics.probe_running();

                let timestamp = Utc::now();
                let outcome = prober.probe(&target.url).await;
                recorder
                    .record(target.id, &target.url, timestamp, &outcome)
                    .await;
            });
        }

        tracing::debug!(
            scanned = report.scanned,
            dispatched = report.dispatched,
            in_flight_skipped = report.in_flight_skipped,
            "Scheduler tick"
        );

        Ok(report)
    }

    /// Spawn the scan loop
    ///
    /// The loop stops when [`SchedulerHandle::shutdown`] is called or the
    /// handle is dropped; probes still running at that point are aborted.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(self.scan_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tasks = JoinSet::new();

            tracing::info!(
                scan_interval_secs = self.scan_interval.as_secs_f64(),
                "Scheduler started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        reap_finished(&mut tasks);
                        if let Err(e) = self.tick(&mut tasks).await {
                            tracing::warn!(error = %e, "Scheduler tick failed, retrying next tick");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("Scheduler shutting down");
                        break;
                    }
                }
            }

            let abandoned = tasks.len();
            tasks.shutdown().await;
            if abandoned > 0 {
                tracing::info!(abandoned, "Aborted in-flight probes");
            }
        });

        SchedulerHandle { handle, shutdown }
    }
}

/// Collect finished probe tasks and report panics
fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        if let Err(e) = result {
            if e.is_panic() {
                tracing::error!(error = %e, "Probe task panicked");
            }
        }
    }
}

/// Handle to a running scheduler loop
pub struct SchedulerHandle {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl SchedulerHandle {
    /// Wait for the loop to finish
    pub async fn wait(self) {
        let _ = self.handle.await;
    }

    /// Signal shutdown and wait for the loop to stop
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        self.wait().await;
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
