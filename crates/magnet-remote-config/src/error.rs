//! Error types for configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Protocol identifier did not match a supported daemon.
    #[error("invalid protocol kind")]
    InvalidProtocol {
        /// Protocol payload provided by the caller.
        value: String,
    },
    /// No daemon endpoint has been configured yet.
    #[error("server endpoint not configured")]
    NotConfigured,
    /// Host and port did not form a valid URL.
    #[error("invalid server endpoint")]
    InvalidEndpoint {
        /// URL that failed to parse.
        value: String,
        /// Underlying URL parse error.
        source: url::ParseError,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// No configuration directory could be determined for this platform.
    #[error("configuration directory unavailable")]
    ConfigDirUnavailable,
    /// File system operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// Settings document could not be encoded or decoded.
    #[error("settings serialization failed")]
    Serialization {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source serde error.
        source: serde_json::Error,
    },
    /// Secret store refused or failed the operation.
    #[error("secret store operation failed")]
    SecretStore {
        /// Operation identifier.
        operation: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
