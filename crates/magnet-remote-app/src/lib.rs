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

//! Magnet Remote application core.
//!
//! Layout: `bootstrap.rs` (dependency wiring), `orchestrator.rs` (submission
//! state machine), `notify.rs` (user notifications), `error.rs` (application
//! errors).

/// Dependency wiring.
pub mod bootstrap;
/// Application error types.
pub mod error;
/// Notification contract and sinks.
pub mod notify;
/// Submission orchestration.
pub mod orchestrator;

pub use bootstrap::AppContext;
pub use error::{AppError, AppResult};
pub use notify::{Notification, Notifier, Severity, StderrNotifier, TracingNotifier};
pub use orchestrator::{
    ClientFactory, HttpClientFactory, Orchestrator, SubmissionOutcome, SubmissionReport,
    SubmissionState,
};
