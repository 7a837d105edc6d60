//! Settings persistence and secret-store contracts.
//!
//! # Design
//! - `ConfigStore` and `SecretStore` are the seams the orchestrator consumes;
//!   callers inject concrete stores so tests can run against isolated instances.
//! - `JsonConfigStore` keeps the whole settings record in one JSON document and
//!   replaces it atomically (temp file + rename).
//! - Secrets are never written by this crate; the in-memory and environment
//!   stores only satisfy the get/set contract.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::defaults::{PASSWORD_ENV, SETTINGS_FILE};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ServerProfile, Settings};

#[async_trait]
/// Abstraction over the persisted settings record.
pub trait ConfigStore: Send + Sync {
    /// Retrieve the current settings.
    async fn load(&self) -> ConfigResult<Settings>;
    /// Replace the persisted settings.
    async fn save(&self, settings: &Settings) -> ConfigResult<()>;

    /// Record that the active profile's credentials were accepted by the daemon.
    async fn mark_verified(&self) -> ConfigResult<()> {
        let mut settings = self.load().await?;
        if settings.profile_verified && settings.setup_completed {
            return Ok(());
        }
        settings.profile_verified = true;
        settings.setup_completed = true;
        self.save(&settings).await
    }

    /// Replace the active profile, clearing the verified flag.
    async fn replace_profile(&self, profile: ServerProfile) -> ConfigResult<()> {
        let mut settings = self.load().await?;
        if settings.profile != profile {
            settings.profile_verified = false;
        }
        settings.profile = profile;
        self.save(&settings).await
    }
}

#[async_trait]
/// Get/set contract over the platform secret store.
pub trait SecretStore: Send + Sync {
    /// Fetch the password for a profile, if one is stored.
    async fn password(&self, profile: &ServerProfile) -> ConfigResult<Option<String>>;
    /// Store the password for a profile.
    async fn set_password(&self, profile: &ServerProfile, password: &str) -> ConfigResult<()>;
}

/// Settings store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    /// Store rooted at `<dir>/settings.json`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(SETTINGS_FILE),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn load(&self) -> ConfigResult<Settings> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "settings file missing; using defaults");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    operation: "settings.read",
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Serialization {
            operation: "settings.decode",
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, settings: &Settings) -> ConfigResult<()> {
        let bytes =
            serde_json::to_vec_pretty(settings).map_err(|source| ConfigError::Serialization {
                operation: "settings.encode",
                path: self.path.clone(),
                source,
            })?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    operation: "settings.create_dir",
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|source| ConfigError::Io {
                operation: "settings.write",
                path: staging.clone(),
                source,
            })?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|source| ConfigError::Io {
                operation: "settings.rename",
                path: self.path.clone(),
                source,
            })
    }
}

/// Settings store that never touches disk.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    settings: RwLock<Settings>,
}

impl MemoryConfigStore {
    /// Seed the store with an initial record.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> ConfigResult<Settings> {
        Ok(self.settings.read().await.clone())
    }

    async fn save(&self, settings: &Settings) -> ConfigResult<()> {
        *self.settings.write().await = settings.clone();
        Ok(())
    }
}

/// Secret store keyed by `protocol@host:port/username`, held in process memory.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn password(&self, profile: &ServerProfile) -> ConfigResult<Option<String>> {
        Ok(self.entries.read().await.get(&secret_key(profile)).cloned())
    }

    async fn set_password(&self, profile: &ServerProfile, password: &str) -> ConfigResult<()> {
        self.entries
            .write()
            .await
            .insert(secret_key(profile), password.to_string());
        Ok(())
    }
}

/// Read-only secret store sourcing the password from the environment.
#[derive(Debug, Clone)]
pub struct EnvSecretStore {
    variable: String,
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self {
            variable: PASSWORD_ENV.to_string(),
        }
    }
}

impl EnvSecretStore {
    /// Store reading a custom variable.
    #[must_use]
    pub fn with_variable(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn password(&self, _profile: &ServerProfile) -> ConfigResult<Option<String>> {
        Ok(std::env::var(&self.variable).ok())
    }

    async fn set_password(&self, _profile: &ServerProfile, _password: &str) -> ConfigResult<()> {
        warn!(variable = %self.variable, "environment secret store is read-only");
        Err(ConfigError::SecretStore {
            operation: "secret.set",
            reason: "environment secret store is read-only",
        })
    }
}

/// Key under which a profile's secret is stored.
#[must_use]
pub fn secret_key(profile: &ServerProfile) -> String {
    format!(
        "{}@{}:{}/{}",
        profile.protocol.as_str(),
        profile.host.trim(),
        profile.port,
        profile.username
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProtocolKind;

    fn profile() -> ServerProfile {
        ServerProfile {
            protocol: ProtocolKind::Qbittorrent,
            host: "nas".into(),
            port: 8080,
            use_tls: false,
            username: "admin".into(),
        }
    }

    #[tokio::test]
    async fn memory_secret_store_is_keyed_by_profile() -> ConfigResult<()> {
        let store = MemorySecretStore::new();
        store.set_password(&profile(), "hunter2").await?;
        assert_eq!(
            store.password(&profile()).await?.as_deref(),
            Some("hunter2")
        );

        let other = ServerProfile {
            username: "guest".into(),
            ..profile()
        };
        assert_eq!(store.password(&other).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn env_secret_store_rejects_writes() {
        let store = EnvSecretStore::with_variable("MAGNET_REMOTE_TEST_UNSET_VARIABLE");
        assert_eq!(store.password(&profile()).await.ok().flatten(), None);
        assert!(matches!(
            store.set_password(&profile(), "x").await,
            Err(ConfigError::SecretStore { .. })
        ));
    }

    #[tokio::test]
    async fn mark_verified_sets_both_flags() -> ConfigResult<()> {
        let store = MemoryConfigStore::default();
        store.mark_verified().await?;
        let settings = store.load().await?;
        assert!(settings.profile_verified);
        assert!(settings.setup_completed);
        Ok(())
    }

    #[tokio::test]
    async fn replacing_profile_clears_verification() -> ConfigResult<()> {
        let store = MemoryConfigStore::new(Settings {
            profile: profile(),
            profile_verified: true,
            setup_completed: true,
            show_notifications: true,
        });

        store.replace_profile(profile()).await?;
        assert!(store.load().await?.profile_verified);

        let moved = ServerProfile {
            port: 9090,
            ..profile()
        };
        store.replace_profile(moved.clone()).await?;
        let settings = store.load().await?;
        assert_eq!(settings.profile, moved);
        assert!(!settings.profile_verified);
        assert!(settings.setup_completed);
        Ok(())
    }

    #[test]
    fn secret_key_includes_identity_fields() {
        assert_eq!(secret_key(&profile()), "qbittorrent@nas:8080/admin");
    }
}
