//! rTorrent XML-RPC adapter.
//!
//! rTorrent has no login step of its own; when a username is configured the
//! fronting web server is expected to enforce HTTP Basic authentication.

use std::fmt::Write as _;

use async_trait::async_trait;
use magnet_remote_config::ProtocolKind;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::client::{Credentials, DaemonClient, resolve};
use crate::error::{BackendError, BackendResult};
use crate::session::{DaemonReply, HttpSession};

const RPC_PATH: &str = "RPC2";

/// Minimal XML-RPC `methodCall` with string parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
struct XmlRpcCall<'a> {
    method: &'a str,
    params: Vec<&'a str>,
}

impl<'a> XmlRpcCall<'a> {
    const fn new(method: &'a str) -> Self {
        Self {
            method,
            params: Vec::new(),
        }
    }

    fn param(mut self, value: &'a str) -> Self {
        self.params.push(value);
        self
    }

    fn render(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\"?>\n<methodCall>\n");
        let _ = writeln!(xml, "  <methodName>{}</methodName>", escape_xml(self.method));
        xml.push_str("  <params>\n");
        for value in &self.params {
            let _ = writeln!(
                xml,
                "    <param><value><string>{}</string></value></param>",
                escape_xml(value)
            );
        }
        xml.push_str("  </params>\n</methodCall>\n");
        xml
    }
}

/// Escape the characters that would break a text node.
fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Pull `faultString` out of an XML-RPC fault response, if present.
fn fault_message(body: &str) -> Option<String> {
    if !body.contains("<fault>") {
        return None;
    }
    let marker = "<name>faultString</name>";
    let after = &body[body.find(marker)? + marker.len()..];
    let start = after.find("<string>")? + "<string>".len();
    let end = after[start..].find("</string>")? + start;
    Some(
        after[start..end]
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&"),
    )
}

fn check_reply(reply: &DaemonReply) -> BackendResult<()> {
    if reply.status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::AuthenticationFailed);
    }
    if !reply.is_success() {
        return Err(reply.status_error());
    }
    match fault_message(&reply.text()) {
        Some(message) => Err(BackendError::ServerError(message)),
        None => Ok(()),
    }
}

/// Client for rTorrent's XML-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RtorrentClient {
    session: HttpSession,
}

impl RtorrentClient {
    /// Wrap the shared session.
    #[must_use]
    pub const fn new(session: HttpSession) -> Self {
        Self { session }
    }

    async fn call(
        &self,
        endpoint: &Url,
        credentials: &Credentials,
        call: &XmlRpcCall<'_>,
    ) -> BackendResult<()> {
        let url = resolve(endpoint, RPC_PATH)?;
        let mut request = self
            .session
            .client()
            .post(url)
            .header(CONTENT_TYPE, "text/xml")
            .body(call.render());
        if credentials.has_username() {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        let reply = self.session.exchange(request).await?;
        check_reply(&reply)
    }
}

#[async_trait]
impl DaemonClient for RtorrentClient {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Rtorrent
    }

    async fn test_connection(
        &self,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> BackendResult<()> {
        self.call(endpoint, credentials, &XmlRpcCall::new("system.listMethods"))
            .await
    }

    async fn submit(
        &self,
        magnet: &str,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> BackendResult<()> {
        let call = XmlRpcCall::new("load.start").param("").param(magnet);
        self.call(endpoint, credentials, &call).await
    }
}
