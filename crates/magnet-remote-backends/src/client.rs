//! Uniform contract implemented by every daemon adapter.

use std::fmt;

use async_trait::async_trait;
use magnet_remote_config::ProtocolKind;
use url::Url;

use crate::error::{BackendError, BackendResult};

/// Username and password presented to a daemon.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Account name; may be empty for daemons without accounts.
    pub username: String,
    /// Plaintext secret, fetched just before the call.
    pub password: String,
}

impl Credentials {
    /// Bundle a username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether a username was supplied.
    #[must_use]
    pub fn has_username(&self) -> bool {
        !self.username.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Operations every torrent daemon adapter supports.
///
/// Implementations authenticate on every call and keep no session state
/// between calls. Neither operation is guaranteed idempotent on the daemon.
#[async_trait]
pub trait DaemonClient: Send + Sync {
    /// Protocol spoken by this adapter.
    fn protocol(&self) -> ProtocolKind;

    /// Authenticate and query the daemon without side effects.
    async fn test_connection(&self, endpoint: &Url, credentials: &Credentials)
    -> BackendResult<()>;

    /// Authenticate and hand `magnet` to the daemon.
    async fn submit(
        &self,
        magnet: &str,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> BackendResult<()>;
}

/// Join an adapter path onto the endpoint base.
///
/// A base without a trailing slash is treated as a directory so that
/// `http://nas:8080/qbt` resolves `api/v2/auth/login` below `/qbt/`.
pub(crate) fn resolve(endpoint: &Url, path: &str) -> BackendResult<Url> {
    if endpoint.cannot_be_a_base() {
        return Err(BackendError::InvalidUrl);
    }
    let mut base = endpoint.clone();
    base.set_query(None);
    base.set_fragment(None);
    if !base.path().ends_with('/') {
        let directory = format!("{}/", base.path());
        base.set_path(&directory);
    }
    base.join(path).map_err(|_| BackendError::InvalidUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_password() {
        let credentials = Credentials::new("admin", "hunter2");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn resolve_appends_paths_below_the_base() -> anyhow::Result<()> {
        let root = Url::parse("http://nas.local:8080")?;
        assert_eq!(
            resolve(&root, "api/v2/auth/login")?.as_str(),
            "http://nas.local:8080/api/v2/auth/login"
        );

        let nested = Url::parse("https://nas.local/qbt?x=1")?;
        assert_eq!(
            resolve(&nested, "api/v2/torrents/add")?.as_str(),
            "https://nas.local/qbt/api/v2/torrents/add"
        );
        Ok(())
    }

    #[test]
    fn resolve_rejects_opaque_endpoints() -> anyhow::Result<()> {
        let opaque = Url::parse("mailto:someone@example.com")?;
        assert_eq!(resolve(&opaque, "RPC2"), Err(BackendError::InvalidUrl));
        Ok(())
    }
}
