//! Shared context, password lookup, and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use magnet_remote_app::{AppContext, StderrNotifier};
use magnet_remote_config::{
    ConfigError, EnvSecretStore, MemorySecretStore, ProtocolKind, SecretStore, ServerProfile,
};

use crate::cli::OutputFormat;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Rewrite configuration validation failures as user-facing messages.
pub(crate) fn config_error(err: ConfigError) -> CliError {
    match err {
        ConfigError::InvalidField {
            field,
            reason,
            value,
        } => match value {
            Some(value) => CliError::validation(format!("invalid {field} '{value}': {reason}")),
            None => CliError::validation(format!("invalid {field}: {reason}")),
        },
        ConfigError::InvalidProtocol { value } => {
            CliError::validation(format!("unknown protocol '{value}'"))
        }
        other => CliError::failure(other),
    }
}

/// Collaborators shared by every command handler.
#[derive(Debug, Clone)]
pub(crate) struct CliContext {
    pub(crate) app: AppContext,
    pub(crate) secrets: Arc<MemorySecretStore>,
    pub(crate) output: OutputFormat,
}

impl CliContext {
    /// File-backed context rooted at `config_dir`.
    pub(crate) fn open(config_dir: &Path, output: OutputFormat) -> CliResult<Self> {
        let secrets = Arc::new(MemorySecretStore::new());
        let app = AppContext::from_config_dir(
            config_dir,
            Arc::clone(&secrets) as Arc<dyn SecretStore>,
            Arc::new(StderrNotifier),
        )
        .map_err(CliError::failure)?;
        Ok(Self {
            app,
            secrets,
            output,
        })
    }

    /// Make the profile's password available to the orchestrator for this run.
    ///
    /// The environment wins; otherwise the user is prompted when the daemon
    /// expects a password and stdin is a terminal. Without either the daemon is
    /// contacted with an empty password.
    pub(crate) async fn load_password(&self, profile: &ServerProfile) -> CliResult<()> {
        let password = match EnvSecretStore::default()
            .password(profile)
            .await
            .map_err(CliError::failure)?
        {
            Some(password) => Some(password),
            None => prompt_password(profile)?,
        };

        if let Some(password) = password {
            self.secrets
                .set_password(profile, &password)
                .await
                .map_err(CliError::failure)?;
        }
        Ok(())
    }
}

/// Deluge authenticates with a password alone, so it never needs a username.
fn wants_password(profile: &ServerProfile) -> bool {
    !profile.username.is_empty() || profile.protocol == ProtocolKind::Deluge
}

fn prompt_password(profile: &ServerProfile) -> CliResult<Option<String>> {
    if !wants_password(profile) || !io::stdin().is_terminal() {
        return Ok(None);
    }
    let prompt = if profile.username.is_empty() {
        format!("Password for {}: ", profile.host)
    } else {
        format!("Password for {}@{}: ", profile.username, profile.host)
    };
    rpassword::prompt_password(prompt)
        .map(Some)
        .map_err(|err| CliError::failure(anyhow!("failed to read password from stdin: {err}")))
}
