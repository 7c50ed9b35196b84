//! Key/value storage backends for the parameter store.
//!
//! The durable side of the store is a flat string key/value map, the same
//! contract browser local storage offers. [`FileStorage`] keeps the map in a
//! single JSON object file written with the write-rename pattern, so an
//! interrupted write never corrupts the previous state. [`MemoryStorage`]
//! backs tests and ephemeral sessions.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Errors from storage writes.
///
/// Reads never error: an unreadable or corrupt value is reported as absent
/// and the caller falls back to its defaults.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the key/value map failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A durable string key/value collaborator.
///
/// `set` returns its outcome so the store can log a failed mirror, but no
/// caller treats it as fatal.
pub trait ParamStorage: Send + Sync {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the value could not be made durable.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// File-backed storage: one JSON object per state file.
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens (or starts) the state file at `path`.
    ///
    /// A missing or unparsable file yields an empty map and restoration
    /// falls back to defaults silently.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    log::debug!("Ignoring unparsable state file {}: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Serializes the current map and writes it with write-rename.
    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_vec_pretty(values)?;
        atomic_write(&self.path, &raw)?;
        Ok(())
    }
}

impl ParamStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }
}

/// In-memory storage for tests and sessions that should not persist.
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage pre-seeded with `entries`, for restore tests.
    #[must_use]
    pub fn seeded(entries: &[(&str, &str)]) -> Self {
        let values = entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }
}

impl ParamStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Writes `data` to `path` via a temp file and rename.
///
/// A crash mid-write leaves the previous file intact; the rename is atomic
/// on POSIX.
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
