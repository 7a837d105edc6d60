//! Process-wide dependency wiring.
//!
//! # Design
//! - Stores, the HTTP session, history, and the notifier are built once and
//!   shared through `Arc`s; nothing is reached through globals.
//! - `AppContext::from_config_dir` is the production wiring; tests assemble
//!   the struct directly from in-memory collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use magnet_remote_backends::{HttpSession, RetryPolicy};
use magnet_remote_config::{ConfigStore, JsonConfigStore, SecretStore};
use magnet_remote_history::{HistoryCache, JsonFileStore};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::notify::Notifier;
use crate::orchestrator::{ClientFactory, HttpClientFactory, Orchestrator};

/// Shared collaborators for one process.
#[derive(Clone)]
pub struct AppContext {
    /// Persisted settings.
    pub config: Arc<dyn ConfigStore>,
    /// Password source.
    pub secrets: Arc<dyn SecretStore>,
    /// Recent submissions.
    pub history: Arc<HistoryCache>,
    /// Notification sink.
    pub notifier: Arc<dyn Notifier>,
    /// Adapter factory.
    pub clients: Arc<dyn ClientFactory>,
    /// Retry policy applied to every daemon call.
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("history", &self.history)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// File-backed wiring rooted at `dir`.
    ///
    /// Settings live in `settings.json` and history in `recent_magnets.json`
    /// inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error when the shared HTTP client cannot be built.
    pub fn from_config_dir(
        dir: &Path,
        secrets: Arc<dyn SecretStore>,
        notifier: Arc<dyn Notifier>,
    ) -> AppResult<Self> {
        let session = HttpSession::new().map_err(|source| AppError::Session { source })?;
        let history = HistoryCache::load(Arc::new(JsonFileStore::in_dir(PathBuf::from(dir))));
        info!(config_dir = %dir.display(), history = history.len(), "application context ready");

        Ok(Self {
            config: Arc::new(JsonConfigStore::in_dir(dir)),
            secrets,
            history: Arc::new(history),
            notifier,
            clients: Arc::new(HttpClientFactory::new(session)),
            retry: RetryPolicy::default(),
        })
    }

    /// Orchestrator sharing this context's collaborators.
    #[must_use]
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            Arc::clone(&self.config),
            Arc::clone(&self.secrets),
            Arc::clone(&self.history),
            Arc::clone(&self.notifier),
            Arc::clone(&self.clients),
        )
        .with_retry_policy(self.retry)
    }

    /// Forget every recorded submission.
    ///
    /// # Errors
    ///
    /// Returns an error when the empty list cannot be persisted.
    pub fn clear_history(&self) -> AppResult<()> {
        self.history
            .clear()
            .map_err(|err| AppError::history("history.clear", err))
    }
}
