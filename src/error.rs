//! Unified error handling for the uptime monitor
//!
//! Domain errors stay close to the code that produces them
//! ([`StoreError`], [`ValidationError`]); this module folds them into one
//! [`Error`] enum for code that crosses module boundaries.
//!
//! # Architecture
//!
//! - [`MonitorErrorTrait`] - Common interface implemented by the error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping the domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use uptime_monitor::error::{Error, MonitorErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = ?err.category(), "retrying: {err}");
//!     } else {
//!         tracing::error!("fatal: {err}");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::models::ValidationError;
pub use crate::storage::error::StoreError;

/// Common trait for the monitor's error types
pub trait MonitorErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP client, DNS, timeouts)
    Network,
    /// Rejected user input
    Validation,
    /// Storage and I/O errors
    Storage,
    /// Serialization errors
    Parsing,
    /// Configuration errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short lowercase label, used as a log field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Validation => "validation",
            Self::Storage => "storage",
            Self::Parsing => "parsing",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the uptime monitor
#[derive(Error, Debug)]
pub enum Error {
    /// Target store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid target definition
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MonitorErrorTrait for StoreError {
    fn is_recoverable(&self) -> bool {
        StoreError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Storage
    }
}

impl MonitorErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_recoverable(),
            Self::Validation(_) => false,
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Store(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Http(_) => ErrorCategory::Network,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(StoreError::Database(err))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let store_err = Error::Store(StoreError::LockPoisoned);
        assert_eq!(store_err.category(), ErrorCategory::Storage);

        let validation_err = Error::Validation(ValidationError::IntervalTooShort(0));
        assert_eq!(validation_err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_is_recoverable() {
        let busy = Error::Store(StoreError::Unavailable("restarting".into()));
        assert!(busy.is_recoverable());

        let poisoned = Error::Store(StoreError::LockPoisoned);
        assert!(!poisoned.is_recoverable());

        let invalid = Error::Validation(ValidationError::UnsupportedScheme {
            scheme: "ftp".into(),
        });
        assert!(!invalid.is_recoverable());
    }

    #[test]
    fn test_error_conversion() {
        let unified: Error = StoreError::Task("cancelled".into()).into();
        assert!(matches!(unified, Error::Store(_)));

        let unified: Error = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(unified, Error::Store(StoreError::Database(_))));
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("scan interval must be positive");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Config error: scan interval must be positive"
        );
    }

    #[test]
    fn test_other_error() {
        let err = Error::with_source("loading template", io::Error::other("missing"));
        assert_eq!(err.category(), ErrorCategory::Other);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(ErrorCategory::Network.to_string(), "network");
        assert_eq!(ErrorCategory::Storage.as_str(), "storage");
    }
}
