//! Core error types for mindguard-core.
//!
//! Permission and storage errors propagate to the caller of the control
//! surface. Network and service-availability errors are mostly absorbed by
//! the unattended components (reporter ticks, usage queries) and only
//! logged there.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for mindguard-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A required OS permission is not granted
    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    /// Usage stats or event source missing on this device
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(#[from] ServiceUnavailableError),

    /// Persisted state could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Report delivery failed
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A platform primitive (home action, prompt, settings screen) failed
    #[error("Platform error: {0}")]
    Platform(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Permission errors. Never retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("app blocking permission has not been granted")]
    BlockingNotGranted,

    #[error("usage access permission has not been granted")]
    UsageAccessNotGranted,
}

/// Platform services that may be missing on a device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceUnavailableError {
    #[error("usage statistics service is not available")]
    UsageStats,

    #[error("foreground event source is not available")]
    EventSource,

    /// Background tasks need a running tokio runtime
    #[error("no async runtime available to run {task}")]
    NoRuntime { task: &'static str },
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored value could not be encoded or decoded
    #[error("Malformed value for key '{key}': {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A writer panicked while holding the store lock
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Errors raised while delivering a usage report.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Connection, TLS or timeout failure
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Endpoint URL could not be built
    #[error("Invalid endpoint URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Application identifier is empty or whitespace
    #[error("Application identifier must not be empty")]
    EmptyAppId,

    /// Base URL is not an absolute http(s) URL
    #[error("Invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_error_converts_into_core_error() {
        let err: CoreError = PermissionError::BlockingNotGranted.into();
        assert!(matches!(
            err,
            CoreError::Permission(PermissionError::BlockingNotGranted)
        ));
        assert_eq!(
            err.to_string(),
            "Permission error: app blocking permission has not been granted"
        );
    }

    #[test]
    fn status_error_mentions_code_and_body() {
        let err = NetworkError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected HTTP status 401: unauthorized");
    }

    #[test]
    fn generic_sqlite_error_maps_to_query_failed() {
        let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StorageError::QueryFailed(_)));
    }
}
