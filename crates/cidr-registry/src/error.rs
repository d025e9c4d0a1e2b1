//! Error types for the CIDR registry

use std::time::Duration;
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Registry errors
#[derive(Debug, Clone, Error)]
pub enum Error {
    // Input errors
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid CIDR: {0}")]
    InvalidBlock(String),

    // Uniqueness errors
    #[error("Key '{0}' already exists")]
    DuplicateName(String),

    #[error("CIDR '{0}' already exists")]
    DuplicateBlock(String),

    // Pool errors
    #[error("No available {0} CIDRs remaining")]
    PoolExhausted(String),

    // Store errors
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Record store call timed out after {0:?}")]
    Timeout(Duration),

    // General errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error was caused by caller input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidName(_)
                | Error::InvalidBlock(_)
                | Error::DuplicateName(_)
                | Error::DuplicateBlock(_)
        )
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::StoreUnavailable(e.to_string())
    }
}
