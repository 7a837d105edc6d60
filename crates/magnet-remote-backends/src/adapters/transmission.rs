//! Transmission RPC adapter.
//!
//! Transmission guards its RPC endpoint with an anti-CSRF session id: the
//! first request answers 409 with `X-Transmission-Session-Id`, which must be
//! echoed on the following request.

use async_trait::async_trait;
use magnet_remote_config::ProtocolKind;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::encode_json;
use crate::client::{Credentials, DaemonClient, resolve};
use crate::error::{BackendError, BackendResult};
use crate::session::{DaemonReply, HttpSession};

const RPC_PATH: &str = "transmission/rpc";
const SESSION_HEADER: &str = "X-Transmission-Session-Id";
const SUCCESS: &str = "success";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    method: &'static str,
    arguments: TorrentAddArguments<'a>,
}

#[derive(Debug, Serialize)]
struct TorrentAddArguments<'a> {
    filename: &'a str,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: String,
}

/// Client for the Transmission RPC interface.
#[derive(Debug, Clone)]
pub struct TransmissionClient {
    session: HttpSession,
}

impl TransmissionClient {
    /// Wrap the shared session.
    #[must_use]
    pub const fn new(session: HttpSession) -> Self {
        Self { session }
    }

    fn post(&self, url: Url, credentials: &Credentials) -> RequestBuilder {
        let request = self.session.client().post(url);
        if credentials.has_username() {
            request.basic_auth(&credentials.username, Some(&credentials.password))
        } else {
            request
        }
    }

    async fn session_id(&self, url: &Url, credentials: &Credentials) -> BackendResult<String> {
        let reply = self
            .session
            .exchange(self.post(url.clone(), credentials))
            .await?;

        if reply.status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::AuthenticationFailed);
        }
        if reply.status == StatusCode::CONFLICT || reply.status == StatusCode::OK {
            if let Some(id) = reply.header(SESSION_HEADER) {
                debug!(status = reply.status.as_u16(), "transmission session id acquired");
                return Ok(id.to_string());
            }
            return Err(BackendError::ServerError(format!(
                "HTTP {} without {SESSION_HEADER}",
                reply.status.as_u16()
            )));
        }
        Err(reply.status_error())
    }
}

fn check_add_reply(reply: &DaemonReply) -> BackendResult<()> {
    if reply.status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::AuthenticationFailed);
    }
    if !reply.is_success() {
        return Err(reply.status_error());
    }
    match reply.json::<RpcResponse>() {
        Some(response) if response.result == SUCCESS => Ok(()),
        Some(response) => Err(BackendError::ServerError(response.result)),
        None => Err(BackendError::ServerError(
            "Unexpected response from Transmission".to_string(),
        )),
    }
}

#[async_trait]
impl DaemonClient for TransmissionClient {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Transmission
    }

    async fn test_connection(
        &self,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> BackendResult<()> {
        let url = resolve(endpoint, RPC_PATH)?;
        self.session_id(&url, credentials).await.map(|_| ())
    }

    async fn submit(
        &self,
        magnet: &str,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> BackendResult<()> {
        let url = resolve(endpoint, RPC_PATH)?;
        let body = encode_json(&RpcRequest {
            method: "torrent-add",
            arguments: TorrentAddArguments { filename: magnet },
        })?;
        let session_id = self.session_id(&url, credentials).await?;

        let request = self
            .post(url, credentials)
            .header(SESSION_HEADER, session_id)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let reply = self.session.exchange(request).await?;
        check_add_reply(&reply)
    }
}
