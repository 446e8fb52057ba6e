use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use crate::errors::StateError;

/// Minimal key-value persistence surface the store writes through.
///
/// Mirrors the two-key layout the client has always used: values are opaque
/// strings, read at startup and rewritten whole on every persist. No schema
/// versioning.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StateError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StateError>;
    fn remove(&mut self, key: &str) -> Result<(), StateError>;
}

/// File-backed store: one file per key under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StateError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StateError> {
        // Write to a sibling temp file and rename over the key, so a failed
        // write can never truncate the previously stored value.
        let tmp = self.dir.join(format!("{key}.tmp"));
        std::fs::write(&tmp, value)?;
        Ok(std::fs::rename(&tmp, self.path_for(key))?)
    }

    fn remove(&mut self, key: &str) -> Result<(), StateError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StateError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StateError> {
        self.values.remove(key);
        Ok(())
    }
}
