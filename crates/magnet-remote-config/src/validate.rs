//! Validation helpers for user-supplied profile fields.

use crate::error::{ConfigError, ConfigResult};
use crate::model::ServerProfile;

/// Validate a host entered by the user.
///
/// The host must be non-empty and carry neither a scheme nor a path; the
/// scheme comes from the TLS flag and paths are fixed per protocol.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] describing the first violation.
pub fn validate_host(value: &str) -> ConfigResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid("host", "must not be empty", value));
    }
    if trimmed.contains("://") {
        return Err(invalid("host", "must not include a scheme", value));
    }
    if trimmed.contains('/') || trimmed.contains('?') || trimmed.contains('#') {
        return Err(invalid("host", "must not include a path", value));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(invalid("host", "must not contain whitespace", value));
    }
    Ok(())
}

/// Validate a TCP port.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the port is zero.
pub fn validate_port(port: u16) -> ConfigResult<()> {
    if port == 0 {
        return Err(invalid("port", "must be between 1 and 65535", &port.to_string()));
    }
    Ok(())
}

/// Validate every user-editable field of a profile.
///
/// # Errors
///
/// Returns the first field validation failure.
pub fn validate_profile(profile: &ServerProfile) -> ConfigResult<()> {
    validate_host(&profile.host)?;
    validate_port(profile.port)?;
    profile.base_url().map(|_| ())
}

fn invalid(field: &'static str, reason: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidField {
        field,
        reason,
        value: Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProtocolKind;

    #[test]
    fn host_rejects_scheme_path_and_blank() {
        assert!(validate_host("nas.local").is_ok());
        assert!(validate_host("10.0.0.2").is_ok());
        for bad in ["", "   ", "http://nas", "nas/rpc", "nas name"] {
            assert!(
                matches!(
                    validate_host(bad),
                    Err(ConfigError::InvalidField { field: "host", .. })
                ),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn port_zero_is_rejected() {
        assert!(validate_port(1).is_ok());
        assert!(validate_port(65_535).is_ok());
        assert!(matches!(
            validate_port(0),
            Err(ConfigError::InvalidField { field: "port", .. })
        ));
    }

    #[test]
    fn profile_validation_checks_all_fields() {
        let profile = ServerProfile {
            protocol: ProtocolKind::Deluge,
            host: "seedbox".into(),
            port: 8112,
            use_tls: false,
            username: String::new(),
        };
        assert!(validate_profile(&profile).is_ok());

        let broken = ServerProfile {
            port: 0,
            ..profile
        };
        assert!(validate_profile(&broken).is_err());
    }
}
