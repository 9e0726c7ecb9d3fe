//! JSON file backend. The whole store is one JSON object keyed by
//! [`StoreKey::as_str`]; writes replace the file through a rename so a crash
//! never leaves a half-written store behind.

use super::{KeyValueStore, StoreError, StoreKey};
use serde_json::{Map, Value};
use std::{
    ffi::OsString,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // Sibling of the store file, distinct from it whatever its extension.
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn load(&self) -> Result<Map<String, Value>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(entries) => Ok(entries),
            _ => Err(StoreError::Corrupted {
                path: self.path.clone(),
            }),
        }
    }

    fn persist(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let payload = serde_json::to_vec_pretty(entries)?;
        let staging = self.staging_path();
        fs::write(&staging, payload)?;
        if let Err(err) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(err.into());
        }

        debug!("Persisted store to {}", self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
        Ok(self.load()?.remove(key.as_str()))
    }

    fn set(&mut self, key: StoreKey, value: &Value) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(key.as_str().to_string(), value.clone());
        self.persist(&entries)
    }

    fn remove(&mut self, key: StoreKey) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        if entries.remove(key.as_str()).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}
