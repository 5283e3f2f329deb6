//! Key-value persistence backing the preference store.

use crate::error::{QuicktransError, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// String key-value storage. Every change is written through before it
/// returns; the last writer wins. A change that fails to persist leaves
/// the stored values as they were.
pub trait Storage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Set several keys as one write: either all of them persist or none.
    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// A JSON object on disk, rewritten in full on every change.
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open the store file. A missing file starts empty; an unreadable one
    /// is logged and treated as empty rather than failing startup.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Store file {} is corrupt, starting empty: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened store {} ({} keys)", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    /// Write `entries` to disk and adopt them only once the write succeeded.
    fn commit(&mut self, entries: BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.path, json).map_err(|e| {
            QuicktransError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })?;
        self.entries = entries;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        let mut next = self.entries.clone();
        for (key, value) in entries {
            next.insert(key.to_string(), value.to_string());
        }
        self.commit(next)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.commit(next)
    }
}

#[derive(Default)]
struct MemoryInner {
    entries: BTreeMap<String, String>,
    writes: usize,
}

/// In-memory storage. Clones share the same map, so a test can keep a
/// handle while the store owns another.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set`/`remove` calls seen so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        // A poisoned map is still a valid map
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.entries.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        let mut inner = self.lock();
        for (key, value) in entries {
            inner.entries.insert(key.to_string(), value.to_string());
        }
        inner.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.entries.remove(key);
        inner.writes += 1;
        Ok(())
    }
}
