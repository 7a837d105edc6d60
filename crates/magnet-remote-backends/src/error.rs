//! Error taxonomy shared by every daemon adapter.
//!
//! # Design
//! - Adapters raise the most specific category available; untyped transport
//!   failures keep their message and a coarse kind so retry eligibility and
//!   user-facing wording can be derived later.
//! - Display strings are user-facing and stable.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use thiserror::Error;

/// Convenience alias for adapter results.
pub type BackendResult<T> = Result<T, BackendError>;

/// Failure raised while talking to a torrent daemon.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Endpoint could not be turned into a request URL.
    #[error("Invalid server URL")]
    InvalidUrl,
    /// Daemon rejected the supplied credentials.
    #[error("Authentication failed")]
    AuthenticationFailed,
    /// Daemon could not be reached or did not answer.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Daemon answered with an error.
    #[error("Server error: {0}")]
    ServerError(String),
    /// Daemon did not answer in time.
    #[error("Connection timed out")]
    Timeout,
    /// Transport is not secure enough for the protocol.
    #[error("Insecure connection: {0}")]
    InsecureConnection(String),
    /// Request payload could not be encoded.
    #[error("Failed to encode magnet URL")]
    EncodingFailed,
    /// Transport failure not mapped onto a typed category.
    #[error("{0}")]
    Transport(TransportFailure),
    /// Caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,
}

/// Coarse classification of an untyped transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Request exceeded its timeout.
    TimedOut,
    /// Established connection dropped mid-exchange.
    ConnectionLost,
    /// Local network is down.
    NotConnected,
    /// Remote host refused or never accepted the connection.
    CannotConnect,
    /// Anything else (TLS, DNS, protocol errors).
    Other,
}

/// Untyped transport failure carrying the full error chain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    /// Coarse failure kind.
    pub kind: TransportKind,
    /// Flattened error chain.
    pub message: String,
}

impl Display for TransportFailure {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

/// Category tag attached to failed submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// See [`BackendError::InvalidUrl`].
    InvalidUrl,
    /// See [`BackendError::AuthenticationFailed`].
    AuthenticationFailed,
    /// See [`BackendError::ConnectionFailed`].
    ConnectionFailed,
    /// See [`BackendError::ServerError`].
    ServerError,
    /// See [`BackendError::Timeout`].
    Timeout,
    /// See [`BackendError::InsecureConnection`].
    InsecureConnection,
    /// See [`BackendError::EncodingFailed`].
    EncodingFailed,
    /// See [`BackendError::Transport`].
    Network,
    /// See [`BackendError::Cancelled`].
    Cancelled,
}

impl BackendError {
    /// Whether retrying the operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed(_) => true,
            Self::Transport(failure) => !matches!(failure.kind, TransportKind::Other),
            Self::InvalidUrl
            | Self::AuthenticationFailed
            | Self::ServerError(_)
            | Self::InsecureConnection(_)
            | Self::EncodingFailed
            | Self::Cancelled => false,
        }
    }

    /// Category tag for reporting.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUrl => ErrorCategory::InvalidUrl,
            Self::AuthenticationFailed => ErrorCategory::AuthenticationFailed,
            Self::ConnectionFailed(_) => ErrorCategory::ConnectionFailed,
            Self::ServerError(_) => ErrorCategory::ServerError,
            Self::Timeout => ErrorCategory::Timeout,
            Self::InsecureConnection(_) => ErrorCategory::InsecureConnection,
            Self::EncodingFailed => ErrorCategory::EncodingFailed,
            Self::Transport(_) => ErrorCategory::Network,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// Build an untyped transport failure.
    #[must_use]
    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        Self::Transport(TransportFailure {
            kind,
            message: message.into(),
        })
    }
}
