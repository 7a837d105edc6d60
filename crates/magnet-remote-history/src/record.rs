//! History entries and display-name derivation.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest display name kept before truncation.
pub const DISPLAY_NAME_LIMIT: usize = 45;
const ELLIPSIS: &str = "...";
const HASH_PREFIX_CHARS: usize = 8;
const UNKNOWN: &str = "Unknown";

/// One successfully submitted magnet link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagnetRecord {
    /// Random identifier.
    pub id: Uuid,
    /// Exact URI as submitted; identity key for de-duplication.
    pub uri: String,
    /// Human-readable label derived from the URI.
    pub display_name: String,
    /// Submission time.
    pub added_at: DateTime<Utc>,
}

impl MagnetRecord {
    /// Build a record stamped now.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self::at(uri, Utc::now())
    }

    /// Build a record with an explicit timestamp.
    #[must_use]
    pub fn at(uri: impl Into<String>, added_at: DateTime<Utc>) -> Self {
        let uri = uri.into();
        let display_name = display_name(&uri);
        Self {
            id: Uuid::new_v4(),
            uri,
            display_name,
            added_at,
        }
    }
}

/// Derive a label for a magnet URI.
///
/// Prefers the `dn` parameter, then the first eight characters of the
/// `btih` hash followed by `...`, then `Unknown`. Labels longer than
/// [`DISPLAY_NAME_LIMIT`] characters are cut to fit, ending in `...`.
#[must_use]
pub fn display_name(uri: &str) -> String {
    let name = name_parameter(uri)
        .map(decode_component)
        .filter(|name| !name.is_empty())
        .or_else(|| hash_prefix(uri))
        .unwrap_or_else(|| UNKNOWN.to_string());
    truncate(name)
}

fn name_parameter(uri: &str) -> Option<&str> {
    ["?dn=", "&dn="]
        .iter()
        .filter_map(|key| uri.find(key).map(|at| at + key.len()))
        .min()
        .map(|start| {
            let rest = &uri[start..];
            rest.find('&').map_or(rest, |end| &rest[..end])
        })
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or_else(|_| raw.to_string(), Cow::into_owned)
}

fn hash_prefix(uri: &str) -> Option<String> {
    let marker = "btih:";
    let start = uri.find(marker)? + marker.len();
    let hash: String = uri[start..]
        .chars()
        .take_while(|ch| *ch != '&')
        .take(HASH_PREFIX_CHARS)
        .collect();
    if hash.is_empty() {
        None
    } else {
        Some(format!("{hash}{ELLIPSIS}"))
    }
}

fn truncate(name: String) -> String {
    if name.chars().count() <= DISPLAY_NAME_LIMIT {
        return name;
    }
    let kept: String = name
        .chars()
        .take(DISPLAY_NAME_LIMIT - ELLIPSIS.len())
        .collect();
    format!("{kept}{ELLIPSIS}")
}
