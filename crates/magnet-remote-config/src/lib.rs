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

//! File-backed configuration facade for Magnet Remote.
//!
//! Layout: `model.rs` (profile and settings models), `validate.rs` (field
//! validation), `service.rs` (`ConfigStore`/`SecretStore` contracts and
//! stores), `defaults.rs` (paths and environment variables).

pub mod defaults;
pub mod error;
pub mod model;
pub mod service;
pub mod validate;

pub use defaults::{CONFIG_DIR_ENV, PASSWORD_ENV, resolve_config_dir};
pub use error::{ConfigError, ConfigResult};
pub use model::{ProtocolKind, ServerProfile, Settings};
pub use service::{
    ConfigStore, EnvSecretStore, JsonConfigStore, MemoryConfigStore, MemorySecretStore,
    SecretStore, secret_key,
};
pub use validate::{validate_host, validate_port, validate_profile};
