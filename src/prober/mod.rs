//! HTTP probing
//!
//! A probe is a single GET against a target URL under a fixed deadline. The
//! result is normalized into an [`Outcome`]; nothing here retries, logs
//! outcomes, or touches the store.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

/// Normalized result of one probe attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Response received with a status in `[200, 400)`
    Success { status: u16, latency: Duration },

    /// Response received with any other status
    Rejected { status: u16, latency: Duration },

    /// No response: timeout, DNS, connect, TLS or protocol failure
    Failure { error: String, latency: Duration },
}

impl Outcome {
    /// Classify a received status code
    pub fn from_status(status: u16, latency: Duration) -> Self {
        if (200..400).contains(&status) {
            Self::Success { status, latency }
        } else {
            Self::Rejected { status, latency }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Status code, when a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } | Self::Rejected { status, .. } => Some(*status),
            Self::Failure { .. } => None,
        }
    }

    /// Elapsed time from request start to response or failure
    pub fn latency(&self) -> Duration {
        match self {
            Self::Success { latency, .. }
            | Self::Rejected { latency, .. }
            | Self::Failure { latency, .. } => *latency,
        }
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency().as_nanos() as f64 / 1_000_000.0
    }

    /// Human-readable error, absent for successful probes
    pub fn error(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::Rejected { status, .. } => Some(describe_status(*status)),
            Self::Failure { error, .. } => Some(error.clone()),
        }
    }
}

fn describe_status(status: u16) -> String {
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason());

    match reason {
        Some(reason) => format!("unexpected status code {status} {reason}"),
        None => format!("unexpected status code {status}"),
    }
}

/// Something that can probe a URL
///
/// The scheduler only depends on this trait, so tests can substitute a fake.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> Outcome;
}

/// reqwest-backed prober sharing one connection pool across all probes
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    /// Build a prober with the given per-request deadline and user agent
    pub fn new(timeout: Duration, user_agent: &str) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .gzip(true)
            .build()?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn describe_error(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("request timed out after {}s", self.timeout.as_secs_f64())
        } else if err.is_connect() {
            format!("connection failed: {}", error_chain(err))
        } else {
            error_chain(err)
        }
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, url: &str) -> Outcome {
        let start = Instant::now();

        match self.client.get(url).send().await {
            Ok(response) => Outcome::from_status(response.status().as_u16(), start.elapsed()),
            Err(e) => Outcome::Failure {
                error: self.describe_error(&e),
                latency: start.elapsed(),
            },
        }
    }
}

/// Join an error with all of its sources, outermost first
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }

    message
}
