//! Translate adapter failures into short user-facing messages.

use crate::error::BackendError;

/// Longest generic message shown before truncation kicks in.
const GENERIC_MESSAGE_LIMIT: usize = 40;

const REACHABILITY_MESSAGE: &str = "Cannot reach server. Check the host and port.";
const TIMEOUT_MESSAGE: &str = "Connection timed out. Is the server running?";
const CREDENTIALS_MESSAGE: &str = "Invalid username or password.";
const INSECURE_MESSAGE: &str = "Secure connection failed. Check the HTTPS setting.";
const HOSTNAME_MESSAGE: &str = "Cannot find server. Check the hostname.";
const ENDPOINT_MESSAGE: &str = "Wrong endpoint. Check the client type and port.";

/// Ordered phrase table; the first matching rule wins.
const RULES: &[(&[&str], &str)] = &[
    (&["connection refused", "unreachable", "host"], REACHABILITY_MESSAGE),
    (&["timed out", "timeout"], TIMEOUT_MESSAGE),
    (&["401", "403", "unauthorized"], CREDENTIALS_MESSAGE),
    (&["ssl", "tls", "certificate"], INSECURE_MESSAGE),
    (&["dns", "resolve", "lookup"], HOSTNAME_MESSAGE),
    (&["404", "not found"], ENDPOINT_MESSAGE),
];

/// Message shown to the user for a failed submission or connection test.
///
/// Typed categories already carry readable text; untyped transport failures
/// are classified by phrase.
#[must_use]
pub fn user_message(error: &BackendError) -> String {
    match error {
        BackendError::Transport(failure) => classify_message(&failure.message),
        other => other.to_string(),
    }
}

/// Map free-form error text onto a user-facing message.
#[must_use]
pub fn classify_message(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    RULES
        .iter()
        .find(|(phrases, _)| phrases.iter().any(|phrase| lowered.contains(phrase)))
        .map_or_else(|| truncate(raw.trim()), |(_, message)| (*message).to_string())
}

fn truncate(raw: &str) -> String {
    if raw.chars().count() <= GENERIC_MESSAGE_LIMIT {
        return raw.to_string();
    }
    let kept: String = raw.chars().take(GENERIC_MESSAGE_LIMIT - 3).collect();
    format!("{kept}...")
}
