//! Default locations and identifiers for persisted configuration.
//!
//! # Design
//! - Centralize file names and environment variables so the CLI, stores, and
//!   tests agree on them.

use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "MAGNET_REMOTE_CONFIG_DIR";
/// Environment variable consulted by [`crate::EnvSecretStore`].
pub const PASSWORD_ENV: &str = "MAGNET_REMOTE_PASSWORD";
/// Directory name created under the platform configuration root.
pub const APP_DIR_NAME: &str = "magnet-remote";
/// File holding the serialized [`crate::Settings`].
pub const SETTINGS_FILE: &str = "settings.json";

/// Resolve the configuration directory.
///
/// Precedence: explicit override, then [`CONFIG_DIR_ENV`], then the platform
/// configuration root joined with [`APP_DIR_NAME`].
///
/// # Errors
///
/// Returns [`ConfigError::ConfigDirUnavailable`] when no platform root exists.
pub fn resolve_config_dir(explicit: Option<PathBuf>) -> ConfigResult<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|root| root.join(APP_DIR_NAME))
        .ok_or(ConfigError::ConfigDirUnavailable)
}
