//! Shared HTTP client configuration and response capture.
//!
//! # Design
//! - One `reqwest::Client` is built at process start and cloned into every
//!   adapter; the client itself is reference-counted.
//! - Transport errors are flattened into [`TransportFailure`]s so retry and
//!   messaging logic never sees `reqwest` types.
//! - Cookies are handled per adapter; the client keeps no cookie jar so no
//!   session state survives between calls.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::time::Duration;

use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{BackendError, BackendResult, TransportKind};

/// Per-request timeout (connect and individual reads).
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Upper bound for a whole exchange, body included.
pub const RESOURCE_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("magnet-remote/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client used by every adapter.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    /// Build the session with the default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ConnectionFailed`] when the TLS backend cannot
    /// be initialised.
    pub fn new() -> BackendResult<Self> {
        Self::with_timeouts(REQUEST_TIMEOUT, RESOURCE_TIMEOUT)
    }

    /// Build the session with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ConnectionFailed`] when the client cannot be built.
    pub fn with_timeouts(request: Duration, resource: Duration) -> BackendResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(request)
            .read_timeout(request)
            .timeout(resource)
            .build()
            .map_err(|err| {
                BackendError::ConnectionFailed(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self { client })
    }

    /// Underlying client for building requests.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Send a request and capture the whole reply.
    pub(crate) async fn exchange(&self, request: RequestBuilder) -> BackendResult<DaemonReply> {
        let response = request.send().await.map_err(|err| map_transport(&err))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|err| map_transport(&err))?
            .to_vec();
        debug!(status = status.as_u16(), bytes = body.len(), "daemon replied");
        Ok(DaemonReply {
            status,
            headers,
            body,
        })
    }
}

/// Fully buffered daemon reply.
#[derive(Debug, Clone)]
pub(crate) struct DaemonReply {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Vec<u8>,
}

impl DaemonReply {
    pub(crate) fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub(crate) fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// First `name=value` pair of the first `Set-Cookie` header.
    pub(crate) fn session_cookie(&self) -> Option<String> {
        self.headers
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub(crate) fn json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Server error carrying the raw status code.
    pub(crate) fn status_error(&self) -> BackendError {
        BackendError::ServerError(format!("HTTP {}", self.status.as_u16()))
    }
}

/// Flatten a `reqwest` error into a transport failure.
pub(crate) fn map_transport(err: &reqwest::Error) -> BackendError {
    let message = error_chain(err);
    let lowered = message.to_lowercase();

    let kind = if err.is_timeout() {
        TransportKind::TimedOut
    } else if lowered.contains("network is unreachable") || lowered.contains("network is down") {
        TransportKind::NotConnected
    } else if err.is_connect() {
        if ["dns", "lookup", "certificate", "tls", "ssl"]
            .iter()
            .any(|phrase| lowered.contains(phrase))
        {
            TransportKind::Other
        } else {
            TransportKind::CannotConnect
        }
    } else if ["connection reset", "connection closed", "broken pipe", "incomplete message"]
        .iter()
        .any(|phrase| lowered.contains(phrase))
    {
        TransportKind::ConnectionLost
    } else {
        TransportKind::Other
    };

    BackendError::transport(kind, message)
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn reply(headers: HeaderMap, body: &str) -> DaemonReply {
        DaemonReply {
            status: StatusCode::OK,
            headers,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn session_cookie_keeps_first_segment() {
        let mut headers = HeaderMap::new();
        headers.insert(
            SET_COOKIE,
            HeaderValue::from_static("SID=abc123; HttpOnly; path=/"),
        );
        let reply = reply(headers, "Ok.");
        assert_eq!(reply.session_cookie().as_deref(), Some("SID=abc123"));
        assert_eq!(reply.text(), "Ok.");
    }

    #[test]
    fn missing_headers_yield_none() {
        let reply = reply(HeaderMap::new(), "");
        assert!(reply.session_cookie().is_none());
        assert!(reply.header("x-transmission-session-id").is_none());
    }

    #[test]
    fn status_error_mentions_code() {
        let reply = DaemonReply {
            status: StatusCode::BAD_GATEWAY,
            headers: HeaderMap::new(),
            body: Vec::new(),
        };
        assert_eq!(
            reply.status_error(),
            BackendError::ServerError("HTTP 502".into())
        );
    }

    #[tokio::test]
    async fn refused_connections_are_transient() {
        let session = HttpSession::with_timeouts(Duration::from_secs(2), Duration::from_secs(4))
            .expect("client builds");
        // Port 9 (discard) is closed on loopback in test environments.
        let request = session.client().get("http://127.0.0.1:9/");
        let err = session
            .exchange(request)
            .await
            .expect_err("closed port must fail");
        assert!(err.is_transient(), "unexpected classification: {err:?}");
    }
}
