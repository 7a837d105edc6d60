//! # Design
//!
//! - Constant-message errors for history persistence.
//! - Context (operation, key, path) travels in fields, never in the message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors produced while persisting the history list.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Filesystem failures in a file-backed store.
    #[error("history io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The list could not be encoded for storage.
    #[error("history serialization failure")]
    Serialization {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Store key being written.
        key: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// A store key cannot be mapped onto the backing medium.
    #[error("history invalid key")]
    InvalidKey {
        /// Offending key.
        key: String,
    },
    /// A shared lock was poisoned by a panicking writer.
    #[error("history lock poisoned")]
    LockPoisoned,
}
