//! Key-value persistence backing the history cache.
//!
//! # Design
//! - Values are opaque bytes; the cache owns the JSON encoding.
//! - `JsonFileStore` maps each key onto `<dir>/<key>.json` and replaces the
//!   file atomically (temp file + rename).

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{HistoryError, HistoryResult};

/// Minimal synchronous key-value contract.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing medium cannot be read.
    fn get(&self, key: &str) -> HistoryResult<Option<Vec<u8>>>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing medium cannot be written.
    fn put(&self, key: &str, value: &[u8]) -> HistoryResult<()>;
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Store rooted at `dir`; the directory is created on first write.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::InvalidKey`] for keys that are empty or carry
    /// characters other than ASCII alphanumerics, `_`, and `-`.
    pub fn path_for(&self, key: &str) -> HistoryResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(HistoryError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> HistoryResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(HistoryError::Io {
                operation: "history.read",
                path,
                source,
            }),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> HistoryResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|source| HistoryError::Io {
            operation: "history.create_dir",
            path: self.dir.clone(),
            source,
        })?;

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).map_err(|source| HistoryError::Io {
            operation: "history.write",
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| HistoryError::Io {
            operation: "history.rename",
            path,
            source,
        })
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> HistoryResult<Option<Vec<u8>>> {
        let values = self.values.lock().map_err(|_| HistoryError::LockPoisoned)?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> HistoryResult<()> {
        let mut values = self.values.lock().map_err(|_| HistoryError::LockPoisoned)?;
        values.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
