//! # Design
//!
//! - Infrastructure failures (settings, secrets, history wiring) surface as
//!   `AppError`; daemon failures are reported through submission outcomes.
//! - Messages stay constant while context travels in fields.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Settings or secret store operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: magnet_remote_config::ConfigError,
    },
    /// History persistence failed.
    #[error("history operation failed")]
    History {
        /// Operation identifier.
        operation: &'static str,
        /// Source history error.
        source: magnet_remote_history::HistoryError,
    },
    /// Shared HTTP session could not be built.
    #[error("http session setup failed")]
    Session {
        /// Source backend error.
        source: magnet_remote_backends::BackendError,
    },
    /// A background submission task did not complete.
    #[error("background task failed")]
    Task {
        /// Operation identifier.
        operation: &'static str,
        /// Source join error.
        source: tokio::task::JoinError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: magnet_remote_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn history(
        operation: &'static str,
        source: magnet_remote_history::HistoryError,
    ) -> Self {
        Self::History { operation, source }
    }
}
