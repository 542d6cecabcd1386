// Core data structures for the uptime monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Store-assigned target identifier
pub type TargetId = i64;

/// Smallest accepted probe interval
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Interval applied when a create request omits one
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// A URL registered for periodic probing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub url: String,
    pub interval_seconds: u64,
    pub enabled: bool,
}

impl Target {
    /// Probe interval as a `Duration`
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(MIN_INTERVAL_SECS))
    }
}

/// Validation failures for new targets
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// URL could not be parsed as an absolute URL
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Only http and https targets can be probed
    #[error("Unsupported URL scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { scheme: String },

    /// Interval below the one second floor
    #[error("Interval must be at least {MIN_INTERVAL_SECS} second(s), got {0}")]
    IntervalTooShort(u64),
}

/// A validated target ready for insertion
///
/// Construction goes through [`NewTarget::new`], so a value of this type always
/// carries an absolute http(s) URL and an interval of at least one second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTarget {
    url: String,
    interval_seconds: u64,
    enabled: bool,
}

impl NewTarget {
    /// Validate and build a new target
    pub fn new(
        url: &str,
        interval_seconds: u64,
        enabled: bool,
    ) -> Result<Self, ValidationError> {
        let url = validate_url(url)?;

        if interval_seconds < MIN_INTERVAL_SECS {
            return Err(ValidationError::IntervalTooShort(interval_seconds));
        }

        Ok(Self {
            url,
            interval_seconds,
            enabled,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn interval_seconds(&self) -> u64 {
        self.interval_seconds
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Attach the store-assigned id
    pub fn into_target(self, id: TargetId) -> Target {
        Target {
            id,
            url: self.url,
            interval_seconds: self.interval_seconds,
            enabled: self.enabled,
        }
    }
}

/// Parse and normalize a target URL
pub fn validate_url(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|e| ValidationError::InvalidUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidationError::UnsupportedScheme {
                scheme: other.to_string(),
            })
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidUrl {
            url: trimmed.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(parsed.to_string())
}

/// One persisted probe result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub id: i64,
    pub target_id: TargetId,
    pub timestamp: DateTime<Utc>,
    pub status_code: Option<u16>,
    pub latency_ms: Option<f64>,
    pub ok: bool,
    pub error: Option<String>,
}

/// A probe result about to be appended to the history
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheck {
    pub target_id: TargetId,
    pub timestamp: DateTime<Utc>,
    pub status_code: Option<u16>,
    pub latency_ms: Option<f64>,
    pub ok: bool,
    pub error: Option<String>,
}

impl NewCheck {
    /// Attach the store-assigned id
    pub fn into_result(self, id: i64) -> CheckResult {
        CheckResult {
            id,
            target_id: self.target_id,
            timestamp: self.timestamp,
            status_code: self.status_code,
            latency_ms: self.latency_ms,
            ok: self.ok,
            error: self.error,
        }
    }
}

/// A live target with its most recent check, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetStatus {
    pub target: Target,
    pub last_check: Option<CheckResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_target_accepts_http_and_https() {
        let target = NewTarget::new("http://example.com", 60, true).unwrap();
        assert_eq!(target.url(), "http://example.com/");
        assert_eq!(target.interval_seconds(), 60);
        assert!(target.enabled());

        assert!(NewTarget::new("https://example.com/health?x=1", 1, false).is_ok());
    }

    #[test]
    fn test_new_target_rejects_bad_urls() {
        assert!(matches!(
            NewTarget::new("not a url", 60, true),
            Err(ValidationError::InvalidUrl { .. })
        ));
        assert!(matches!(
            NewTarget::new("/relative/path", 60, true),
            Err(ValidationError::InvalidUrl { .. })
        ));
        assert!(matches!(
            NewTarget::new("ftp://example.com", 60, true),
            Err(ValidationError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn test_new_target_rejects_zero_interval() {
        assert_eq!(
            NewTarget::new("http://example.com", 0, true),
            Err(ValidationError::IntervalTooShort(0))
        );
    }

    #[test]
    fn test_into_target_keeps_fields() {
        let target = NewTarget::new("https://example.com/", 30, false)
            .unwrap()
            .into_target(7);
        assert_eq!(target.id, 7);
        assert_eq!(target.interval(), Duration::from_secs(30));
        assert!(!target.enabled);
    }
}
