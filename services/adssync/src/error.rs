//! Error handling for the ADS synchronization service
//!
//! Configuration errors are fatal at startup. Symbol errors are per-entry and
//! normally only logged. Validation and transport errors end the current
//! engine run without propagating past the engine boundary.

use thiserror::Error;

/// ADS synchronization error type
#[derive(Error, Debug, Clone)]
pub enum AdsSyncError {
    /// Unreadable or malformed configuration / symbol specification
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A symbol is unknown to the table or malformed
    #[error("Symbol error: {0}")]
    SymbolError(String),

    /// Expected symbols missing on the live target
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Session could not be established
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Batch read/write failed on an open session
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Invalid engine lifecycle operation
    #[error("State error: {0}")]
    StateError(String),

    /// Input/Output operation errors
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type alias for the ADS synchronization service
pub type Result<T> = std::result::Result<T, AdsSyncError>;

impl AdsSyncError {
    pub fn config(msg: impl Into<String>) -> Self {
        AdsSyncError::ConfigError(msg.into())
    }

    pub fn symbol(msg: impl Into<String>) -> Self {
        AdsSyncError::SymbolError(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AdsSyncError::ValidationError(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        AdsSyncError::ConnectionError(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        AdsSyncError::TransportError(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        AdsSyncError::StateError(msg.into())
    }

    pub fn not_connected() -> Self {
        AdsSyncError::ConnectionError("Not connected".to_string())
    }
}

// ============================================================================
// From implementations for external error types
// ============================================================================

impl From<std::io::Error> for AdsSyncError {
    fn from(err: std::io::Error) -> Self {
        AdsSyncError::IoError(err.to_string())
    }
}

impl From<serde_yaml::Error> for AdsSyncError {
    fn from(err: serde_yaml::Error) -> Self {
        AdsSyncError::ConfigError(format!("YAML: {}", err))
    }
}

impl From<figment::Error> for AdsSyncError {
    fn from(err: figment::Error) -> Self {
        AdsSyncError::ConfigError(err.to_string())
    }
}
