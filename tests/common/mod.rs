//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use uptime_monitor::metrics::MonitorMetrics;
use uptime_monitor::models::{NewTarget, TargetId};
use uptime_monitor::prober::{Outcome, Probe};
use uptime_monitor::recorder::ResultRecorder;
use uptime_monitor::scheduler::{Scheduler, TickReport};
use uptime_monitor::storage::{MemoryTargetStore, SharedTargetStore, TargetStore};
use uptime_monitor::utils::retry::RetryConfig;

/// Prober that answers instantly with a fixed status and records every URL
pub struct FakeProber {
    status: u16,
    calls: Mutex<Vec<String>>,
}

impl FakeProber {
    pub fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Probe for FakeProber {
    async fn probe(&self, url: &str) -> Outcome {
        self.calls.lock().unwrap().push(url.to_string());
        Outcome::from_status(self.status, Duration::from_millis(3))
    }
}

/// Prober that blocks until the test releases it
pub struct GatedProber {
    gate: Semaphore,
    started: Mutex<Vec<String>>,
}

impl GatedProber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            started: Mutex::new(Vec::new()),
        })
    }

    /// Let `n` pending probes finish
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn started(&self) -> usize {
        self.started.lock().unwrap().len()
    }
}

#[async_trait]
impl Probe for GatedProber {
    async fn probe(&self, url: &str) -> Outcome {
        self.started.lock().unwrap().push(url.to_string());
        match self.gate.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => {
                return Outcome::Failure {
                    error: "gate closed".to_string(),
                    latency: Duration::ZERO,
                }
            }
        }
        Outcome::from_status(200, Duration::from_millis(1))
    }
}

/// Scheduler wired to an in-memory store
pub struct Harness {
    pub memory: Arc<MemoryTargetStore>,
    pub metrics: Arc<MonitorMetrics>,
    pub scheduler: Scheduler,
    pub tasks: JoinSet<()>,
    pub base: Instant,
}

impl Harness {
    pub fn new(prober: Arc<dyn Probe>) -> Self {
        let memory = Arc::new(MemoryTargetStore::new());
        let store: SharedTargetStore = memory.clone();
        let metrics = Arc::new(MonitorMetrics::new().unwrap());
        let recorder = ResultRecorder::new(
            Arc::clone(&store),
            Arc::clone(&metrics),
            RetryConfig::with_delays(1, 1, 5),
        );
        let scheduler = Scheduler::new(
            store,
            prober,
            recorder,
            Arc::clone(&metrics),
            Duration::from_secs(5),
        );

        Self {
            memory,
            metrics,
            scheduler,
            tasks: JoinSet::new(),
            base: Instant::now(),
        }
    }

    pub fn add_target(&self, url: &str, interval_seconds: u64, enabled: bool) -> TargetId {
        self.memory
            .insert_target(&NewTarget::new(url, interval_seconds, enabled).unwrap())
            .unwrap()
    }

    /// Run a tick `secs` after the base instant without waiting for probes
    pub async fn tick(&mut self, secs: u64) -> TickReport {
        let now = self.base + Duration::from_secs(secs);
        self.scheduler.tick_at(now, &mut self.tasks).await.unwrap()
    }

    /// Wait for every dispatched probe to finish
    pub async fn drain(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            result.unwrap();
        }
    }

    /// Run a tick and wait for its probes
    pub async fn tick_and_drain(&mut self, secs: u64) -> TickReport {
        let report = self.tick(secs).await;
        self.drain().await;
        report
    }
}
