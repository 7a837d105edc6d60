//! Protocol adapters and the factory selecting one per [`ProtocolKind`].
//!
//! # Design
//! - Adapters are constructed per submission and only hold a clone of the
//!   shared [`HttpSession`]; session tokens live on the stack of one call.
//! - Each adapter owns typed request and response payloads for its wire
//!   format.

mod deluge;
mod qbittorrent;
mod rtorrent;
mod synology;
mod transmission;

pub use deluge::DelugeClient;
pub use qbittorrent::QbittorrentClient;
pub use rtorrent::RtorrentClient;
pub use synology::SynologyClient;
pub use transmission::TransmissionClient;

use magnet_remote_config::ProtocolKind;
use serde::Serialize;

use crate::client::DaemonClient;
use crate::error::{BackendError, BackendResult};
use crate::session::HttpSession;

/// Build the adapter for `kind`.
#[must_use]
pub fn client_for(kind: ProtocolKind, session: &HttpSession) -> Box<dyn DaemonClient> {
    let session = session.clone();
    match kind {
        ProtocolKind::Qbittorrent => Box::new(QbittorrentClient::new(session)),
        ProtocolKind::Transmission => Box::new(TransmissionClient::new(session)),
        ProtocolKind::Deluge => Box::new(DelugeClient::new(session)),
        ProtocolKind::Rtorrent => Box::new(RtorrentClient::new(session)),
        ProtocolKind::Synology => Box::new(SynologyClient::new(session)),
    }
}

/// Serialize a JSON request body, mapping failures onto the encoding category.
pub(crate) fn encode_json<T: Serialize>(payload: &T) -> BackendResult<Vec<u8>> {
    serde_json::to_vec(payload).map_err(|_| BackendError::EncodingFailed)
}
