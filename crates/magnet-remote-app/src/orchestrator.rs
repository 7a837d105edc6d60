//! Drives one magnet submission from settings lookup to user notification.
//!
//! # Design
//! - Every call builds a fresh adapter through the injected [`ClientFactory`];
//!   nothing is cached between submissions.
//! - Daemon failures become [`SubmissionOutcome`]s; only settings failures
//!   are returned as errors. An unreadable secret falls back to an empty
//!   password.
//! - Cancellation is checked before each committed mutation and before any
//!   outcome is reported, so a cancelled submission emits no notification.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use magnet_remote_backends::{
    BackendError, Credentials, DaemonClient, ErrorCategory, HttpSession, RetryPolicy, client_for,
    user_message, with_retry,
};
use magnet_remote_config::{ConfigStore, ProtocolKind, SecretStore, ServerProfile};
use magnet_remote_history::HistoryCache;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::notify::{Notification, Notifier};

/// Builds the adapter for a protocol.
pub trait ClientFactory: Send + Sync {
    /// Adapter speaking `kind`.
    fn client_for(&self, kind: ProtocolKind) -> Box<dyn DaemonClient>;
}

/// Factory producing the HTTP adapters over a shared session.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    session: HttpSession,
}

impl HttpClientFactory {
    /// Wrap the shared session.
    #[must_use]
    pub const fn new(session: HttpSession) -> Self {
        Self { session }
    }
}

impl ClientFactory for HttpClientFactory {
    fn client_for(&self, kind: ProtocolKind) -> Box<dyn DaemonClient> {
        client_for(kind, &self.session)
    }
}

/// Lifecycle of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    /// Created, nothing done yet.
    Idle,
    /// Reading settings and picking the adapter.
    Resolving,
    /// Fetching the secret for the profile.
    Authenticating,
    /// Adapter call in flight (login plus submit).
    Submitting,
    /// Daemon accepted the request.
    Succeeded,
    /// Request failed or no daemon is configured.
    Failed,
    /// Caller cancelled before the result was committed.
    Cancelled,
}

impl SubmissionState {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl Display for SubmissionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Authenticating => "authenticating",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        })
    }
}

/// Final result of a submission or connection test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Daemon accepted the request.
    Succeeded {
        /// Protocol of the daemon that accepted it.
        protocol: ProtocolKind,
    },
    /// Daemon rejected the request or could not be reached.
    Failed {
        /// Error category.
        category: ErrorCategory,
        /// User-facing message.
        message: String,
    },
    /// No daemon has been configured.
    NotConfigured,
    /// Caller cancelled before the result was committed.
    Cancelled,
}

impl SubmissionOutcome {
    /// Whether the daemon accepted the request.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Line describing the outcome for the user.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Succeeded { protocol } => format!("Sent to {}", protocol.display_name()),
            Self::Failed { message, .. } => message.clone(),
            Self::NotConfigured => Notification::not_configured().body,
            Self::Cancelled => "Cancelled".to_string(),
        }
    }
}

/// Record of one pass through the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    /// Identifier used in log events.
    pub id: Uuid,
    /// Every state visited, starting at `Idle`.
    pub transitions: Vec<SubmissionState>,
    /// Final result.
    pub outcome: SubmissionOutcome,
}

impl SubmissionReport {
    /// Last state reached.
    #[must_use]
    pub fn state(&self) -> SubmissionState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(SubmissionState::Idle)
    }
}

struct Submission {
    id: Uuid,
    transitions: Vec<SubmissionState>,
}

impl Submission {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            transitions: vec![SubmissionState::Idle],
        }
    }

    fn advance(&mut self, next: SubmissionState) {
        debug!(submission = %self.id, state = %next, "submission transition");
        self.transitions.push(next);
    }

    fn finish(mut self, outcome: SubmissionOutcome) -> SubmissionReport {
        let terminal = match &outcome {
            SubmissionOutcome::Succeeded { .. } => SubmissionState::Succeeded,
            SubmissionOutcome::Failed { .. } | SubmissionOutcome::NotConfigured => {
                SubmissionState::Failed
            }
            SubmissionOutcome::Cancelled => SubmissionState::Cancelled,
        };
        self.advance(terminal);
        SubmissionReport {
            id: self.id,
            transitions: self.transitions,
            outcome,
        }
    }
}

enum Operation<'a> {
    Submit(&'a str),
    TestConnection,
}

/// Coordinates settings, secrets, adapters, history, and notifications.
pub struct Orchestrator {
    config: Arc<dyn ConfigStore>,
    secrets: Arc<dyn SecretStore>,
    history: Arc<HistoryCache>,
    notifier: Arc<dyn Notifier>,
    clients: Arc<dyn ClientFactory>,
    retry: RetryPolicy,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("history", &self.history)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Wire the orchestrator from injected collaborators.
    #[must_use]
    pub fn new(
        config: Arc<dyn ConfigStore>,
        secrets: Arc<dyn SecretStore>,
        history: Arc<HistoryCache>,
        notifier: Arc<dyn Notifier>,
        clients: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            config,
            secrets,
            history,
            notifier,
            clients,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Send `magnet` to the configured daemon.
    ///
    /// On success the magnet is added to history, the profile is marked
    /// verified, and a notification is emitted (when enabled).
    ///
    /// # Errors
    ///
    /// Returns an error when settings cannot be read.
    pub async fn submit(
        &self,
        magnet: &str,
        cancel: &CancellationToken,
    ) -> AppResult<SubmissionReport> {
        self.run(Operation::Submit(magnet), cancel).await
    }

    /// Check that the configured daemon accepts the stored credentials.
    ///
    /// On success the profile is marked verified and setup is completed. No
    /// notification is emitted.
    ///
    /// # Errors
    ///
    /// Returns an error when settings cannot be read.
    pub async fn verify(&self, cancel: &CancellationToken) -> AppResult<SubmissionReport> {
        self.run(Operation::TestConnection, cancel).await
    }

    /// Run [`Self::submit`] on a background task.
    ///
    /// Cancel the returned token to abandon the submission.
    #[must_use]
    pub fn spawn_submit(
        self: &Arc<Self>,
        magnet: String,
    ) -> (JoinHandle<AppResult<SubmissionReport>>, CancellationToken) {
        let cancel = CancellationToken::new();
        let orchestrator = Arc::clone(self);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { orchestrator.submit(&magnet, &token).await });
        (handle, cancel)
    }

    async fn run(
        &self,
        operation: Operation<'_>,
        cancel: &CancellationToken,
    ) -> AppResult<SubmissionReport> {
        let mut submission = Submission::new();
        let notify = matches!(operation, Operation::Submit(_));

        submission.advance(SubmissionState::Resolving);
        let settings = self
            .config
            .load()
            .await
            .map_err(|err| AppError::config("settings.load", err))?;
        let show_notifications = notify && settings.show_notifications;
        let profile = settings.profile;

        if cancel.is_cancelled() {
            return Ok(submission.finish(SubmissionOutcome::Cancelled));
        }
        if !profile.is_configured() {
            warn!(submission = %submission.id, "no daemon configured");
            self.emit(show_notifications, &Notification::not_configured());
            return Ok(submission.finish(SubmissionOutcome::NotConfigured));
        }

        let endpoint = match profile.base_url() {
            Ok(endpoint) => endpoint,
            Err(err) => {
                warn!(submission = %submission.id, error = %err, "profile endpoint is invalid");
                let outcome = failure(&BackendError::InvalidUrl);
                self.emit(show_notifications, &Notification::failed(outcome.summary()));
                return Ok(submission.finish(outcome));
            }
        };

        submission.advance(SubmissionState::Authenticating);
        let credentials = self.credentials(&submission, &profile).await;
        if cancel.is_cancelled() {
            return Ok(submission.finish(SubmissionOutcome::Cancelled));
        }

        submission.advance(SubmissionState::Submitting);
        let client = self.clients.client_for(profile.protocol);
        let result = self
            .call(client.as_ref(), &operation, &endpoint, &credentials, cancel)
            .await;

        match result {
            Ok(()) => Ok(self
                .commit(submission, &operation, &profile, show_notifications, cancel)
                .await),
            Err(_) if cancel.is_cancelled() => {
                debug!(submission = %submission.id, "cancelled while in flight");
                Ok(submission.finish(SubmissionOutcome::Cancelled))
            }
            Err(BackendError::Cancelled) => Ok(submission.finish(SubmissionOutcome::Cancelled)),
            Err(err) => {
                warn!(
                    submission = %submission.id,
                    protocol = profile.protocol.as_str(),
                    category = ?err.category(),
                    error = %err,
                    "daemon request failed"
                );
                let outcome = failure(&err);
                self.emit(show_notifications, &Notification::failed(outcome.summary()));
                Ok(submission.finish(outcome))
            }
        }
    }

    async fn credentials(&self, submission: &Submission, profile: &ServerProfile) -> Credentials {
        let password = match self.secrets.password(profile).await {
            Ok(password) => password.unwrap_or_default(),
            Err(err) => {
                warn!(
                    submission = %submission.id,
                    error = %err,
                    "secret store unavailable; using empty password"
                );
                String::new()
            }
        };
        Credentials::new(profile.username.clone(), password)
    }

    async fn call(
        &self,
        client: &dyn DaemonClient,
        operation: &Operation<'_>,
        endpoint: &Url,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        let attempt = with_retry(&self.retry, cancel, move || match operation {
            Operation::Submit(magnet) => client.submit(magnet, endpoint, credentials),
            Operation::TestConnection => client.test_connection(endpoint, credentials),
        });
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(BackendError::Cancelled),
            result = attempt => result,
        }
    }

    async fn commit(
        &self,
        submission: Submission,
        operation: &Operation<'_>,
        profile: &ServerProfile,
        show_notifications: bool,
        cancel: &CancellationToken,
    ) -> SubmissionReport {
        if cancel.is_cancelled() {
            debug!(submission = %submission.id, "cancelled before commit");
            return submission.finish(SubmissionOutcome::Cancelled);
        }

        if let Operation::Submit(magnet) = operation {
            if let Err(err) = self.history.add(magnet) {
                warn!(submission = %submission.id, error = %err, "history not persisted");
            }
            if cancel.is_cancelled() {
                return submission.finish(SubmissionOutcome::Cancelled);
            }
        }

        if let Err(err) = self.config.mark_verified().await {
            warn!(submission = %submission.id, error = %err, "verified flag not persisted");
        }

        if cancel.is_cancelled() {
            return submission.finish(SubmissionOutcome::Cancelled);
        }
        info!(
            submission = %submission.id,
            protocol = profile.protocol.as_str(),
            "daemon accepted request"
        );
        self.emit(show_notifications, &Notification::sent(profile.protocol));
        submission.finish(SubmissionOutcome::Succeeded {
            protocol: profile.protocol,
        })
    }

    fn emit(&self, enabled: bool, notification: &Notification) {
        if enabled {
            self.notifier.notify(notification);
        }
    }
}

fn failure(err: &BackendError) -> SubmissionOutcome {
    SubmissionOutcome::Failed {
        category: err.category(),
        message: user_message(err),
    }
}
