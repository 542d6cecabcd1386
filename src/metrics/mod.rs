//! Prometheus metrics for the uptime monitor
//!
//! This module tracks:
//! - Probes: request counts by outcome and latency distribution per target
//! - Scheduler: scan ticks, failed scans, probes currently in flight
//! - Recorder: checks that could not be persisted
//!
//! # Usage
//!
//! Create one [`MonitorMetrics`] at startup and share it behind an `Arc`. It
//! owns a private registry, so several instances (one per test) never collide.

use std::time::Duration;

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, HistogramVec,
    IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder,
};

/// `result` label for successful probes
pub const RESULT_OK: &str = "ok";

/// `result` label for failed probes
pub const RESULT_FAIL: &str = "fail";

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

// ============================================================================
// Registry
// ============================================================================

/// Live counters and histograms for the monitor
///
/// Resets on restart; history lives in the target store.
pub struct MonitorMetrics {
    registry: Registry,
    requests: IntCounterVec,
    latency: HistogramVec,
    scheduler_ticks: IntCounter,
    scheduler_tick_errors: IntCounter,
    probes_in_flight: IntGauge,
    persist_failures: IntCounter,
}

impl MonitorMetrics {
    /// Register all metrics in a fresh registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests = register_int_counter_vec_with_registry!(
            "uptime_requests_total",
            "Total probes by target and result",
            &["target_id", "url", "result"],
            registry
        )?;
        let latency = register_histogram_vec_with_registry!(
            "uptime_latency_seconds",
            "Probe latency in seconds",
            &["target_id", "url"],
            LATENCY_BUCKETS.to_vec(),
            registry
        )?;
        let scheduler_ticks = register_int_counter_with_registry!(
            "uptime_scheduler_ticks_total",
            "Total scheduler scan ticks",
            registry
        )?;
        let scheduler_tick_errors = register_int_counter_with_registry!(
            "uptime_scheduler_tick_errors_total",
            "Scan ticks skipped because the target store could not be read",
            registry
        )?;
        let probes_in_flight = register_int_gauge_with_registry!(
            "uptime_probes_in_flight",
            "Probes currently running",
            registry
        )?;
        let persist_failures = register_int_counter_with_registry!(
            "uptime_persist_failures_total",
            "Probe results that could not be written to the target store",
            registry
        )?;

        Ok(Self {
            registry,
            requests,
            latency,
            scheduler_ticks,
            scheduler_tick_errors,
            probes_in_flight,
            persist_failures,
        })
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Count one completed probe and add its latency to the distribution
    pub fn observe_probe(&self, target_id: i64, url: &str, ok: bool, latency: Duration) {
        let id = target_id.to_string();
        let result = if ok { RESULT_OK } else { RESULT_FAIL };

        self.requests
            .with_label_values(&[id.as_str(), url, result])
            .inc();
        self.latency
            .with_label_values(&[id.as_str(), url])
            .observe(latency.as_secs_f64());
    }

    pub fn record_tick(&self) {
        self.scheduler_ticks.inc();
    }

    pub fn record_tick_error(&self) {
        self.scheduler_tick_errors.inc();
    }

    /// Count a probe as running until the returned guard drops
    pub fn probe_running(&self) -> RunningProbe {
        self.probes_in_flight.inc();
        RunningProbe {
            gauge: self.probes_in_flight.clone(),
        }
    }

    pub fn record_persist_failure(&self) {
        self.persist_failures.inc();
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Current value of `uptime_requests_total` for one label set
    pub fn requests_total(&self, target_id: i64, url: &str, ok: bool) -> u64 {
        let id = target_id.to_string();
        let result = if ok { RESULT_OK } else { RESULT_FAIL };
        self.requests
            .get_metric_with_label_values(&[id.as_str(), url, result])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    /// Number of latency observations for one target
    pub fn latency_sample_count(&self, target_id: i64, url: &str) -> u64 {
        let id = target_id.to_string();
        self.latency
            .get_metric_with_label_values(&[id.as_str(), url])
            .map(|h| h.get_sample_count())
            .unwrap_or(0)
    }

    pub fn ticks_total(&self) -> u64 {
        self.scheduler_ticks.get()
    }

    pub fn tick_errors_total(&self) -> u64 {
        self.scheduler_tick_errors.get()
    }

    pub fn in_flight(&self) -> i64 {
        self.probes_in_flight.get()
    }

    pub fn persist_failures_total(&self) -> u64 {
        self.persist_failures.get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn encode(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

/// Decrements `uptime_probes_in_flight` on drop
#[derive(Debug)]
pub struct RunningProbe {
    gauge: IntGauge,
}

impl Drop for RunningProbe {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}
