use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::schema::{StoreDocument, STORE_VERSION};

/// String key-value capability backing one credential or preference scope.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-lifetime scope. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(lock_unpoisoned(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        lock_unpoisoned(&self.entries).insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock_unpoisoned(&self.entries).remove(key);
        Ok(())
    }
}

/// Durable scope persisted as a single JSON document.
///
/// Writes replace the whole document through a synced temporary file and a
/// rename, so a crash never leaves a half-written store behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document. A missing or blank file is an empty store.
    pub fn load(&self) -> Result<StoreDocument, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Ok(StoreDocument::default());
            }
            Err(source) => return Err(StoreError::io("reading store", &self.path, source)),
        };
        if content.trim().is_empty() {
            return Ok(StoreDocument::default());
        }

        let document: StoreDocument = serde_json::from_str(&content)
            .map_err(|source| StoreError::parse(&self.path, source))?;
        if document.version != STORE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: self.path.clone(),
                found: document.version,
            });
        }
        Ok(document)
    }

    fn save(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .ok_or_else(|| StoreError::NoParentDirectory {
                path: self.path.clone(),
            })?;
        fs::create_dir_all(parent)
            .map_err(|source| StoreError::io("creating store directory", parent, source))?;

        let serialized = serde_json::to_vec_pretty(document)
            .map_err(|source| StoreError::serialize(&self.path, source))?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut tmp_file = File::create(&tmp_path)
            .map_err(|source| StoreError::io("creating temporary store", &tmp_path, source))?;
        tmp_file
            .write_all(&serialized)
            .map_err(|source| StoreError::io("writing temporary store", &tmp_path, source))?;
        tmp_file
            .sync_all()
            .map_err(|source| StoreError::io("syncing temporary store", &tmp_path, source))?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)
            .map_err(|source| StoreError::io("replacing store", &self.path, source))
    }

    fn update<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = lock_unpoisoned(&self.write_lock);
        let mut document = self.load()?;
        if apply(&mut document.entries) {
            self.save(&document)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.entries.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            let previous = entries.insert(key.to_owned(), value.to_owned());
            previous.as_deref() != Some(value)
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
