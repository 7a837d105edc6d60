//! qBittorrent Web UI (API v2) adapter.

use async_trait::async_trait;
use magnet_remote_config::ProtocolKind;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, COOKIE, ORIGIN, REFERER};
use tracing::debug;
use url::Url;
use url::form_urlencoded;

use crate::client::{Credentials, DaemonClient, resolve};
use crate::error::{BackendError, BackendResult};
use crate::session::HttpSession;

const LOGIN_PATH: &str = "api/v2/auth/login";
const ADD_PATH: &str = "api/v2/torrents/add";
const OK_MARKER: &str = "Ok.";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug)]
struct LoginForm<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug)]
struct AddForm<'a> {
    urls: &'a str,
}

impl LoginForm<'_> {
    fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("username", self.username)
            .append_pair("password", self.password)
            .finish()
    }
}

impl AddForm<'_> {
    fn encode(&self) -> BackendResult<String> {
        if self.urls.is_empty() {
            return Err(BackendError::EncodingFailed);
        }
        Ok(form_urlencoded::Serializer::new(String::new())
            .append_pair("urls", self.urls)
            .finish())
    }
}

/// Client for the qBittorrent Web UI.
#[derive(Debug, Clone)]
pub struct QbittorrentClient {
    session: HttpSession,
}

impl QbittorrentClient {
    /// Wrap the shared session.
    #[must_use]
    pub const fn new(session: HttpSession) -> Self {
        Self { session }
    }

    /// Log in and return the session cookie, when the daemon issued one.
    async fn login(
        &self,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> BackendResult<Option<String>> {
        let url = resolve(endpoint, LOGIN_PATH)?;
        let form = LoginForm {
            username: &credentials.username,
            password: &credentials.password,
        };
        let request = self
            .session
            .client()
            .post(url)
            .header(REFERER, endpoint.as_str())
            .header(ORIGIN, origin(endpoint))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form.encode());
        let reply = self.session.exchange(request).await?;

        if matches!(reply.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(BackendError::AuthenticationFailed);
        }
        if !reply.is_success() {
            return Err(reply.status_error());
        }
        if reply.text().trim() != OK_MARKER {
            return Err(BackendError::AuthenticationFailed);
        }

        let cookie = reply.session_cookie();
        debug!(has_cookie = cookie.is_some(), "qBittorrent login accepted");
        Ok(cookie)
    }
}

fn origin(endpoint: &Url) -> String {
    endpoint.origin().ascii_serialization()
}

#[async_trait]
impl DaemonClient for QbittorrentClient {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Qbittorrent
    }

    async fn test_connection(
        &self,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> BackendResult<()> {
        self.login(endpoint, credentials).await.map(|_| ())
    }

    async fn submit(
        &self,
        magnet: &str,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> BackendResult<()> {
        let body = AddForm { urls: magnet }.encode()?;
        let cookie = self.login(endpoint, credentials).await?;
        let url = resolve(endpoint, ADD_PATH)?;

        let mut request = self
            .session
            .client()
            .post(url)
            .header(REFERER, endpoint.as_str())
            .header(ORIGIN, origin(endpoint))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        let reply = self.session.exchange(request).await?;

        if reply.status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::AuthenticationFailed);
        }
        if !reply.is_success() {
            return Err(reply.status_error());
        }
        let text = reply.text();
        let text = text.trim();
        if text != OK_MARKER {
            let reason = if text.is_empty() {
                "Failed to add torrent".to_string()
            } else {
                text.to_string()
            };
            return Err(BackendError::ServerError(reason));
        }
        Ok(())
    }
}
