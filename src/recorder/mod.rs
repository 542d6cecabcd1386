//! Result recording
//!
//! Every completed probe passes through [`ResultRecorder::record`] exactly
//! once. It appends one check row, updates the metrics and emits one
//! structured `check_done` event. A store failure is logged and counted but
//! never propagated, so the calling probe task always finishes cleanly.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::metrics::MonitorMetrics;
use crate::models::{NewCheck, TargetId};
use crate::prober::Outcome;
use crate::storage::{self, SharedTargetStore, StoreError};
use crate::utils::retry::{with_retry_if, RetryConfig};
use crate::utils::{round_ms, truncate_text};

/// Longest error text stored with a check
pub const MAX_ERROR_CHARS: usize = 500;

/// What happened to the check row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    /// Row appended with this id
    Persisted(i64),
    /// Every attempt to append failed; the result is lost
    PersistFailed,
}

impl RecordStatus {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }
}

/// Writes probe outcomes to the store and metrics
#[derive(Clone)]
pub struct ResultRecorder {
    store: SharedTargetStore,
    metrics: Arc<MonitorMetrics>,
    retry: RetryConfig,
}

impl ResultRecorder {
    pub fn new(store: SharedTargetStore, metrics: Arc<MonitorMetrics>, retry: RetryConfig) -> Self {
        Self {
            store,
            metrics,
            retry,
        }
    }

    /// Persist one outcome, then update metrics and log it
    pub async fn record(
        &self,
        target_id: TargetId,
        url: &str,
        timestamp: DateTime<Utc>,
        outcome: &Outcome,
    ) -> RecordStatus {
        let check = NewCheck {
            target_id,
            timestamp,
            status_code: outcome.status_code(),
            latency_ms: Some(round_ms(outcome.latency_ms())),
            ok: outcome.is_ok(),
            error: outcome.error().map(|e| truncate_text(&e, MAX_ERROR_CHARS)),
        };

        let status = match self.persist(&check).await {
            Ok(id) => RecordStatus::Persisted(id),
            Err(e) => {
                self.metrics.record_persist_failure();
                tracing::error!(
                    target_id,
                    url,
                    error = %e,
                    "Failed to persist check result"
                );
                RecordStatus::PersistFailed
            }
        };

        self.metrics
            .observe_probe(target_id, url, check.ok, outcome.latency());

        tracing::info!(
            target_id,
            url,
            ok = check.ok,
            status_code = check.status_code,
            latency_ms = check.latency_ms,
            error = check.error.as_deref(),
            persisted = status.is_persisted(),
            "check_done"
        );

        status
    }

    async fn persist(&self, check: &NewCheck) -> Result<i64, StoreError> {
        with_retry_if(
            &self.retry,
            || {
                let store = Arc::clone(&self.store);
                let check = check.clone();
                async move { storage::blocking(&store, move |s| s.append_check(&check)).await }
            },
            StoreError::is_recoverable,
        )
        .await
    }
}
