//! Typed configuration models for the active daemon profile.
//!
//! # Design
//! - Pure data carriers shared by the orchestrator, adapters, and CLI.
//! - Keeps domain types separate from IO/wiring code in `service.rs`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Torrent daemon protocol spoken by the active profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    /// qBittorrent Web UI API (v2).
    #[default]
    Qbittorrent,
    /// Transmission JSON RPC.
    Transmission,
    /// Deluge Web UI JSON-RPC.
    Deluge,
    /// rTorrent XML-RPC.
    Rtorrent,
    /// Synology Download Station Web API.
    Synology,
}

impl ProtocolKind {
    /// Every supported protocol, in presentation order.
    pub const ALL: [Self; 5] = [
        Self::Qbittorrent,
        Self::Transmission,
        Self::Deluge,
        Self::Rtorrent,
        Self::Synology,
    ];

    /// Render the kind as its lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Qbittorrent => "qbittorrent",
            Self::Transmission => "transmission",
            Self::Deluge => "deluge",
            Self::Rtorrent => "rtorrent",
            Self::Synology => "synology",
        }
    }

    /// Human-readable product name used in notifications.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Qbittorrent => "qBittorrent",
            Self::Transmission => "Transmission",
            Self::Deluge => "Deluge",
            Self::Rtorrent => "rTorrent",
            Self::Synology => "Synology Download Station",
        }
    }

    /// Port the daemon listens on out of the box.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Qbittorrent | Self::Rtorrent => 8080,
            Self::Transmission => 9091,
            Self::Deluge => 8112,
            Self::Synology => 5001,
        }
    }
}

impl Display for ProtocolKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.display_name())
    }
}

impl FromStr for ProtocolKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or(ConfigError::InvalidProtocol {
                value: value.to_string(),
            })
    }
}

/// Connection details for the single active daemon.
///
/// The password is deliberately absent; it lives in a [`crate::SecretStore`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerProfile {
    /// Daemon protocol.
    pub protocol: ProtocolKind,
    /// Hostname or IP address, without scheme or path.
    pub host: String,
    /// TCP port of the daemon's web/RPC interface.
    pub port: u16,
    /// Whether to connect over HTTPS.
    pub use_tls: bool,
    /// Account name; some daemons ignore it.
    pub username: String,
}

impl Default for ServerProfile {
    fn default() -> Self {
        Self {
            protocol: ProtocolKind::default(),
            host: String::new(),
            port: ProtocolKind::default().default_port(),
            use_tls: false,
            username: String::new(),
        }
    }
}

impl ServerProfile {
    /// Whether a daemon endpoint has been configured at all.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty()
    }

    /// URL scheme implied by the TLS flag.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        if self.use_tls { "https" } else { "http" }
    }

    /// Join scheme, host, and port into the daemon's base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when the host is empty and
    /// [`ConfigError::InvalidEndpoint`] when the pieces do not form a URL.
    pub fn base_url(&self) -> ConfigResult<Url> {
        if !self.is_configured() {
            return Err(ConfigError::NotConfigured);
        }
        let host = self.host.trim();
        let raw = if host.contains(':') && !host.starts_with('[') {
            format!("{}://[{host}]:{}/", self.scheme(), self.port)
        } else {
            format!("{}://{host}:{}/", self.scheme(), self.port)
        };
        Url::parse(&raw).map_err(|source| ConfigError::InvalidEndpoint {
            value: raw,
            source,
        })
    }
}

/// Whole persisted settings record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// The active daemon profile.
    pub profile: ServerProfile,
    /// Set once the user finished the first-run flow.
    pub setup_completed: bool,
    /// Set after the daemon accepted the profile's credentials.
    pub profile_verified: bool,
    /// Whether result notifications should be shown.
    pub show_notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: ServerProfile::default(),
            setup_completed: false,
            profile_verified: false,
            show_notifications: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(host: &str, use_tls: bool) -> ServerProfile {
        ServerProfile {
            protocol: ProtocolKind::Transmission,
            host: host.to_string(),
            port: 9091,
            use_tls,
            username: "admin".to_string(),
        }
    }

    #[test]
    fn protocol_kind_round_trips_identifiers() {
        for kind in ProtocolKind::ALL {
            assert_eq!(kind.as_str().parse::<ProtocolKind>().ok(), Some(kind));
        }
        assert_eq!(
            " Deluge ".parse::<ProtocolKind>().ok(),
            Some(ProtocolKind::Deluge)
        );
        assert!(matches!(
            "utorrent".parse::<ProtocolKind>(),
            Err(ConfigError::InvalidProtocol { .. })
        ));
    }

    #[test]
    fn display_names_match_products() {
        assert_eq!(ProtocolKind::Qbittorrent.to_string(), "qBittorrent");
        assert_eq!(
            ProtocolKind::Synology.display_name(),
            "Synology Download Station"
        );
    }

    #[test]
    fn base_url_joins_scheme_host_and_port() {
        let url = profile("nas.local", true).base_url().expect("valid url");
        assert_eq!(url.as_str(), "https://nas.local:9091/");

        let url = profile("192.168.1.10", false).base_url().expect("valid url");
        assert_eq!(url.as_str(), "http://192.168.1.10:9091/");
    }

    #[test]
    fn base_url_brackets_ipv6_hosts() {
        let url = profile("::1", false).base_url().expect("valid url");
        assert_eq!(url.as_str(), "http://[::1]:9091/");
    }

    #[test]
    fn empty_host_is_not_configured() {
        let empty = profile("  ", false);
        assert!(!empty.is_configured());
        assert!(matches!(empty.base_url(), Err(ConfigError::NotConfigured)));
    }

    #[test]
    fn settings_default_enables_notifications() {
        let settings = Settings::default();
        assert!(settings.show_notifications);
        assert!(!settings.setup_completed);
        assert!(!settings.profile.is_configured());
    }

    #[test]
    fn settings_tolerate_missing_fields() {
        let parsed: Settings =
            serde_json::from_str(r#"{"profile":{"protocol":"deluge","host":"h","port":1,"use_tls":false,"username":""}}"#)
                .expect("partial settings parse");
        assert_eq!(parsed.profile.protocol, ProtocolKind::Deluge);
        assert!(parsed.show_notifications);
    }
}
