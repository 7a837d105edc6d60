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

//! Bounded, newest-first history of submitted magnet links.
//!
//! Layout: `record.rs` (entries and display names), `store.rs` (key-value
//! persistence), `error.rs` (history errors).

pub mod error;
pub mod record;
pub mod store;

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

pub use error::{HistoryError, HistoryResult};
pub use record::{DISPLAY_NAME_LIMIT, MagnetRecord, display_name};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};

/// Store key holding the serialized list.
pub const HISTORY_KEY: &str = "recent_magnets";
/// Most entries retained.
pub const MAX_ENTRIES: usize = 10;

/// Process-wide list of recently submitted magnets.
///
/// Mutations persist synchronously while holding the write lock, so readers
/// see either the previous or the updated list.
pub struct HistoryCache {
    store: Arc<dyn KeyValueStore>,
    records: RwLock<Vec<MagnetRecord>>,
}

impl std::fmt::Debug for HistoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl HistoryCache {
    /// Load the persisted list; missing or unreadable data yields an empty list.
    #[must_use]
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let records = match store.get(HISTORY_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<MagnetRecord>>(&bytes) {
                Ok(mut records) => {
                    records.truncate(MAX_ENTRIES);
                    records
                }
                Err(err) => {
                    warn!(error = %err, "discarding unreadable magnet history");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "magnet history unavailable; starting empty");
                Vec::new()
            }
        };
        debug!(entries = records.len(), "magnet history loaded");
        Self {
            store,
            records: RwLock::new(records),
        }
    }

    /// Record a submitted magnet at the head of the list.
    ///
    /// An existing entry with the same URI is replaced, and the list is cut
    /// to [`MAX_ENTRIES`].
    ///
    /// # Errors
    ///
    /// Returns an error when the updated list cannot be persisted; the
    /// in-memory list keeps the new entry.
    pub fn add(&self, uri: &str) -> HistoryResult<MagnetRecord> {
        let record = MagnetRecord::new(uri);
        let mut records = self
            .records
            .write()
            .map_err(|_| HistoryError::LockPoisoned)?;
        records.retain(|existing| existing.uri != uri);
        records.insert(0, record.clone());
        records.truncate(MAX_ENTRIES);
        self.persist(&records)?;
        Ok(record)
    }

    /// Remove every entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the empty list cannot be persisted.
    pub fn clear(&self) -> HistoryResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| HistoryError::LockPoisoned)?;
        records.clear();
        self.persist(&records)
    }

    /// Snapshot of the list, newest first.
    #[must_use]
    pub fn records(&self) -> Vec<MagnetRecord> {
        self.records
            .read()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().map_or(0, |records| records.len())
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, records: &[MagnetRecord]) -> HistoryResult<()> {
        let bytes = serde_json::to_vec(records).map_err(|source| HistoryError::Serialization {
            operation: "history.encode",
            key: HISTORY_KEY.to_string(),
            source,
        })?;
        self.store.put(HISTORY_KEY, &bytes).inspect_err(|err| {
            warn!(error = %err, "failed to persist magnet history");
        })
    }
}
