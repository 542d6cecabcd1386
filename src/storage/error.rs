//! Error types for the target store

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a [`TargetStore`](super::TargetStore)
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem error while preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the connection lock
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// The blocking task running a store operation failed
    #[error("Store task failed: {0}")]
    Task(String),

    /// Store intentionally unavailable (used to simulate outages)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether retrying the same operation may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Database(e) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            Self::Io(_) | Self::Task(_) | Self::Unavailable(_) => true,
            Self::LockPoisoned => false,
        }
    }
}
