use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key `{0}` (expected lowercase letters, digits and dashes)")]
    InvalidKey(String),
    #[error("could not read draft storage `{path}`: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write draft storage `{path}`: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("draft storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable key/value storage for serialized drafts, in the manner of browser local storage.
pub trait DraftStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, payload: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T> DraftStorage for Arc<T>
where
    T: DraftStorage + ?Sized,
{
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), StorageError> {
        (**self).write(key, payload)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDraftStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl InMemoryDraftStorage {
    pub fn entries(&self) -> BTreeMap<String, String> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DraftStorage for InMemoryDraftStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), StorageError> {
        match self.entries.lock() {
            Ok(mut entries) => entries.insert(key.to_string(), payload.to_string()),
            Err(poisoned) => poisoned.into_inner().insert(key.to_string(), payload.to_string()),
        };
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.entries.lock() {
            Ok(mut entries) => entries.remove(key),
            Err(poisoned) => poisoned.into_inner().remove(key),
        };
        Ok(())
    }
}

/// One `<key>.json` file per entry under a directory. Writes go through a temp file and a
/// rename so a crash never leaves a half-written draft behind.
#[derive(Clone, Debug)]
pub struct FileDraftStorage {
    root: PathBuf,
}

impl FileDraftStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl DraftStorage for FileDraftStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(payload) => Ok(Some(payload)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)
            .map_err(|source| StorageError::Write { path: self.root.clone(), source })?;

        let temp = self.root.join(format!(".{key}.json.tmp"));
        fs::write(&temp, payload)
            .map_err(|source| StorageError::Write { path: temp.clone(), source })?;
        fs::rename(&temp, &path).map_err(|source| StorageError::Write { path, source })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Write { path, source }),
        }
    }
}
