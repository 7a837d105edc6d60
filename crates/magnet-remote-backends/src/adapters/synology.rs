//! Synology Download Station Web API adapter.
//!
//! The Web API takes credentials as GET query parameters, so the adapter
//! refuses anything but HTTPS before a request is built.

use async_trait::async_trait;
use magnet_remote_config::ProtocolKind;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::debug;
use url::Url;

use crate::client::{Credentials, DaemonClient, resolve};
use crate::error::{BackendError, BackendResult};
use crate::session::{DaemonReply, HttpSession};

const AUTH_PATH: &str = "webapi/auth.cgi";
const TASK_PATH: &str = "webapi/DownloadStation/task.cgi";
const SESSION_NAME: &str = "DownloadStation";

#[derive(Debug, Deserialize)]
struct ApiReply<T> {
    success: bool,
    data: Option<T>,
    error: Option<ApiFault>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ApiFault {
    #[serde(default)]
    code: i64,
}

/// Client for Synology Download Station.
#[derive(Debug, Clone)]
pub struct SynologyClient {
    session: HttpSession,
    require_tls: bool,
}

impl SynologyClient {
    /// Wrap the shared session.
    #[must_use]
    pub const fn new(session: HttpSession) -> Self {
        Self {
            session,
            require_tls: true,
        }
    }

    #[cfg(test)]
    const fn allowing_plain_http(session: HttpSession) -> Self {
        Self {
            session,
            require_tls: false,
        }
    }

    fn ensure_secure(&self, endpoint: &Url) -> BackendResult<()> {
        if self.require_tls && !endpoint.scheme().eq_ignore_ascii_case("https") {
            return Err(BackendError::InsecureConnection(
                "Synology requires HTTPS. Credentials would be visible in URL.".to_string(),
            ));
        }
        Ok(())
    }

    async fn get(&self, url: Url) -> BackendResult<DaemonReply> {
        let reply = self.session.exchange(self.session.client().get(url)).await?;
        if reply.status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::AuthenticationFailed);
        }
        if !reply.is_success() {
            return Err(reply.status_error());
        }
        Ok(reply)
    }

    async fn login(&self, endpoint: &Url, credentials: &Credentials) -> BackendResult<String> {
        let mut url = resolve(endpoint, AUTH_PATH)?;
        url.query_pairs_mut()
            .append_pair("api", "SYNO.API.Auth")
            .append_pair("version", "2")
            .append_pair("method", "login")
            .append_pair("account", &credentials.username)
            .append_pair("passwd", &credentials.password)
            .append_pair("session", SESSION_NAME)
            .append_pair("format", "sid");

        let reply = self.get(url).await?;
        match reply.json::<ApiReply<LoginData>>() {
            Some(ApiReply {
                success: true,
                data: Some(LoginData { sid }),
                ..
            }) if !sid.is_empty() => {
                debug!("synology session opened");
                Ok(sid)
            }
            _ => Err(BackendError::AuthenticationFailed),
        }
    }
}

fn check_task_reply(reply: &DaemonReply) -> BackendResult<()> {
    match reply.json::<ApiReply<IgnoredAny>>() {
        Some(ApiReply { success: true, .. }) => Ok(()),
        Some(ApiReply { error, .. }) => Err(BackendError::ServerError(format!(
            "Error code: {}",
            error.map_or(0, |fault| fault.code)
        ))),
        None => Err(BackendError::ServerError(
            "Unexpected response from Download Station".to_string(),
        )),
    }
}

#[async_trait]
impl DaemonClient for SynologyClient {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Synology
    }

    async fn test_connection(
        &self,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> BackendResult<()> {
        self.ensure_secure(endpoint)?;
        self.login(endpoint, credentials).await.map(|_| ())
    }

    async fn submit(
        &self,
        magnet: &str,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> BackendResult<()> {
        self.ensure_secure(endpoint)?;
        let sid = self.login(endpoint, credentials).await?;

        let mut url = resolve(endpoint, TASK_PATH)?;
        url.query_pairs_mut()
            .append_pair("api", "SYNO.DownloadStation.Task")
            .append_pair("version", "1")
            .append_pair("method", "create")
            .append_pair("_sid", &sid)
            .append_pair("uri", magnet);

        let reply = self.get(url).await?;
        check_task_reply(&reply)
    }
}
