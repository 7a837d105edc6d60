#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Torrent daemon adapters behind one client contract.
//!
//! Layout: `client.rs` (the `DaemonClient` contract and credentials),
//! `adapters/` (one module per daemon plus the `client_for` factory),
//! `session.rs` (shared HTTP client), `retry.rs` (transient-failure retry),
//! `error.rs` and `classify.rs` (error taxonomy and user-facing messages).

pub mod adapters;
pub mod classify;
pub mod client;
pub mod error;
pub mod retry;
pub mod session;

pub use adapters::{
    DelugeClient, QbittorrentClient, RtorrentClient, SynologyClient, TransmissionClient,
    client_for,
};
pub use classify::{classify_message, user_message};
pub use client::{Credentials, DaemonClient};
pub use error::{BackendError, BackendResult, ErrorCategory, TransportFailure, TransportKind};
pub use retry::{RetryPolicy, with_retry};
pub use session::HttpSession;
