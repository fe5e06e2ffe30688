//! Local durable cache for event lists.
//!
//! The cache is a string-keyed, string-valued store. Each patient's events
//! live under one key as a JSON array and are always read and written whole.
//! The file-backed store keeps one file per key and replaces it atomically,
//! so concurrent processes never see a torn value. A process that reads,
//! modifies and writes a key can hold that key's [`KeyLock`] to keep other
//! processes from interleaving.

use crate::{CareEvent, Error, PatientId, Result};
use fs2::FileExt;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Minimal key-value persistence
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Key-value store backed by one file per key in a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", escape_key(key)))
    }

    /// Path of the sidecar file locked by [`FileStore::lock`]
    pub fn lock_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", escape_key(key)))
    }

    /// Take an exclusive advisory lock on `key`, blocking until it is free
    ///
    /// Only other lock holders are kept out; plain `get`/`set` never wait.
    pub fn lock(&self, key: &str) -> Result<KeyLock> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.lock_path_for(key);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.lock_exclusive()?;
        tracing::debug!("Locked cache key {}", key);
        Ok(KeyLock { file, path })
    }
}

/// Exclusive hold on one cache key, released on drop
#[derive(Debug)]
pub struct KeyLock {
    file: File,
    path: PathBuf,
}

impl KeyLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to unlock {:?}: {}", self.path, e);
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let mut contents = String::new();
        File::open(&path)?.read_to_string(&mut contents)?;

        tracing::debug!("Read cache key {} from {:?}", key, path);
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        // Temp file in the same directory so the rename is atomic
        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(value.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Wrote cache key {} to {:?}", key, path);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Cache key for a patient's event list
pub fn cache_key(patient: &PatientId) -> String {
    format!("calendar-events-{}", patient)
}

/// Per-patient event lists on top of a [`KeyValueStore`]
pub struct EventCache<S> {
    store: S,
}

impl<S: KeyValueStore> EventCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load a patient's cached events
    ///
    /// Missing entries and malformed JSON both come back as an empty list.
    /// A store that cannot be read at all is logged and treated the same way.
    pub fn load(&self, patient: &PatientId) -> Vec<CareEvent> {
        let key = cache_key(patient);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("No cached events for patient {}", patient);
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(
                    "Unable to read cached events for patient {}: {}. Using empty list.",
                    patient,
                    e
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<CareEvent>>(&raw) {
            Ok(events) => {
                tracing::debug!("Loaded {} cached events for patient {}", events.len(), patient);
                events
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse cached events for patient {}: {}. Using empty list.",
                    patient,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Replace a patient's cached events
    pub fn save(&self, patient: &PatientId, events: &[CareEvent]) -> Result<()> {
        let contents = serde_json::to_string(events)?;
        self.store.set(&cache_key(patient), &contents)?;
        tracing::debug!("Cached {} events for patient {}", events.len(), patient);
        Ok(())
    }

    /// Drop everything cached for a patient
    pub fn clear(&self, patient: &PatientId) -> Result<()> {
        self.store.remove(&cache_key(patient))?;
        tracing::info!("Cleared cached events for patient {}", patient);
        Ok(())
    }
}

/// Escape a key into a file name: `[A-Za-z0-9_-]` pass through, other bytes become `%XX`
fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("%{:02X}", byte));
        }
    }
    escaped
}

/// Directory the file store uses under a data directory
pub fn cache_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("cache")
}
