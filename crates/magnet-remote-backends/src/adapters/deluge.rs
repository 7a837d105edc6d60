//! Deluge Web UI JSON-RPC adapter.
//!
//! Deluge authenticates with the Web UI password only; the username is
//! ignored.

use async_trait::async_trait;
use magnet_remote_config::ProtocolKind;
use rand::Rng;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::encode_json;
use crate::client::{Credentials, DaemonClient, resolve};
use crate::error::{BackendError, BackendResult};
use crate::session::{DaemonReply, HttpSession};

const RPC_PATH: &str = "json";

#[derive(Debug, Serialize)]
struct RpcCall<'a, P> {
    method: &'a str,
    params: P,
    id: u32,
}

/// Options accepted by `core.add_torrent_magnet`; always sent empty.
#[derive(Debug, Default, Serialize)]
struct MagnetOptions {}

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcFault>,
}

#[derive(Debug, Deserialize)]
struct RpcFault {
    #[serde(default)]
    message: Option<String>,
}

impl RpcFault {
    fn into_error(self) -> BackendError {
        BackendError::ServerError(
            self.message
                .unwrap_or_else(|| "Unknown Deluge error".to_string()),
        )
    }
}

fn request_id() -> u32 {
    rand::rng().random_range(1..=9999)
}

/// Client for the Deluge Web UI.
#[derive(Debug, Clone)]
pub struct DelugeClient {
    session: HttpSession,
}

impl DelugeClient {
    /// Wrap the shared session.
    #[must_use]
    pub const fn new(session: HttpSession) -> Self {
        Self { session }
    }

    async fn call(
        &self,
        url: Url,
        body: Vec<u8>,
        cookie: Option<&str>,
    ) -> BackendResult<DaemonReply> {
        let mut request = self
            .session
            .client()
            .post(url)
            .header(CONTENT_TYPE, "application/json")
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
        Ok(reply)
    }

    /// Log in and return the session cookie, when the daemon issued one.
    async fn login(&self, url: &Url, credentials: &Credentials) -> BackendResult<Option<String>> {
        let body = encode_json(&RpcCall {
            method: "auth.login",
            params: (credentials.password.as_str(),),
            id: request_id(),
        })?;
        let reply = self.call(url.clone(), body, None).await?;
        check_login(&reply)?;
        let cookie = reply.session_cookie();
        debug!(has_cookie = cookie.is_some(), "deluge login accepted");
        Ok(cookie)
    }
}

fn check_login(reply: &DaemonReply) -> BackendResult<()> {
    let parsed = reply.json::<RpcReply>().ok_or_else(|| {
        BackendError::ServerError("Unexpected response from Deluge".to_string())
    })?;
    if let Some(fault) = parsed.error {
        return Err(fault.into_error());
    }
    match parsed.result {
        Some(serde_json::Value::Bool(true)) => Ok(()),
        _ => Err(BackendError::AuthenticationFailed),
    }
}

fn check_add(reply: &DaemonReply) -> BackendResult<()> {
    match reply.json::<RpcReply>() {
        Some(RpcReply {
            error: Some(fault), ..
        }) => Err(fault.into_error()),
        _ => Ok(()),
    }
}

#[async_trait]
impl DaemonClient for DelugeClient {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Deluge
    }

    async fn test_connection(
        &self,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> BackendResult<()> {
        let url = resolve(endpoint, RPC_PATH)?;
        self.login(&url, credentials).await.map(|_| ())
    }

    async fn submit(
        &self,
        magnet: &str,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> BackendResult<()> {
        let url = resolve(endpoint, RPC_PATH)?;
        let body = encode_json(&RpcCall {
            method: "core.add_torrent_magnet",
            params: (magnet, MagnetOptions::default()),
            id: request_id(),
        })?;
        let cookie = self.login(&url, credentials).await?;
        let reply = self.call(url, body, cookie.as_deref()).await?;
        check_add(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;
    use serde_json::json;

    fn reply(body: &str) -> DaemonReply {
        DaemonReply {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn calls_serialize_positional_params() -> anyhow::Result<()> {
        let body = encode_json(&RpcCall {
            method: "core.add_torrent_magnet",
            params: ("magnet:?xt=urn:btih:abc", MagnetOptions::default()),
            id: 7,
        })?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(
            value,
            json!({"method": "core.add_torrent_magnet", "params": ["magnet:?xt=urn:btih:abc", {}], "id": 7})
        );
        Ok(())
    }

    #[test]
    fn request_ids_stay_in_range() {
        for _ in 0..256 {
            let id = request_id();
            assert!((1..=9999).contains(&id));
        }
    }

    #[test]
    fn login_requires_true_result() {
        assert_eq!(check_login(&reply(r#"{"result":true,"error":null,"id":1}"#)), Ok(()));
        assert_eq!(
            check_login(&reply(r#"{"result":false,"error":null,"id":1}"#)),
            Err(BackendError::AuthenticationFailed)
        );
        assert_eq!(
            check_login(&reply(r#"{"result":null,"error":{"message":"Not authenticated","code":1},"id":1}"#)),
            Err(BackendError::ServerError("Not authenticated".into()))
        );
    }

    #[test]
    fn add_fails_only_on_error_object() {
        assert_eq!(check_add(&reply(r#"{"result":"abc123","error":null,"id":2}"#)), Ok(()));
        assert_eq!(check_add(&reply("")), Ok(()));
        assert_eq!(
            check_add(&reply(r#"{"result":null,"error":{"message":"Torrent already in session","code":4},"id":2}"#)),
            Err(BackendError::ServerError("Torrent already in session".into()))
        );
    }
}
