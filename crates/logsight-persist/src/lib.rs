//! JSON file-backed persistence for Logsight console state.
//!
//! A [`JsonStore`] owns exactly one document, `<dir>/<name>.json`. Writes go
//! through a sibling temp file and a rename so a crash mid-write never leaves a
//! truncated document behind.

#![forbid(unsafe_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Result type alias for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Errors that can occur while reading or writing a store.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem failure.
    #[error("io error on {path}: {source}")]
    Io {
        /// File the operation touched.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The document could not be encoded or decoded.
    #[error("serialization error on {path}: {source}")]
    Serialization {
        /// File the operation touched.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// A single named JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Create a store for `<dir>/<name>.json`. Nothing is touched on disk yet.
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            path: dir.join(format!("{name}.json")),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the document, falling back to `T::default()` when it is missing or
    /// unreadable.
    pub fn load<T>(&self) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.try_load() {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable store");
                T::default()
            }
        }
    }

    /// Load the document, distinguishing "absent" from "corrupt".
    pub fn try_load<T>(&self) -> PersistResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| PersistError::Serialization {
                path: self.path.clone(),
                source,
            })
    }

    /// Atomically replace the document.
    pub fn save<T>(&self, value: &T) -> PersistResult<()>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_vec_pretty(value).map_err(|source| PersistError::Serialization {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| self.io_error(source))?;
        fs::rename(&tmp, &self.path).map_err(|source| self.io_error(source))?;

        debug!(path = %self.path.display(), "store saved");
        Ok(())
    }

    /// Delete the document. Removing a missing document is not an error.
    pub fn remove(&self) -> PersistResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "store removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_document_loads_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path(), "token");

        assert!(!store.exists());
        let value: Option<String> = store.load();
        assert!(value.is_none());
        assert!(store.try_load::<String>().expect("try_load").is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path(), "user");

        let mut data = HashMap::new();
        data.insert("username".to_string(), "analyst".to_string());
        store.save(&data).expect("save");

        assert!(store.exists());
        let loaded: HashMap<String, String> = store.load();
        assert_eq!(loaded.get("username").map(String::as_str), Some("analyst"));
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        let store = JsonStore::new(&nested, "token");

        store.save("t1").expect("save");
        assert_eq!(store.path(), nested.join("token.json"));
        assert_eq!(store.try_load::<String>().expect("load"), Some("t1".to_string()));
    }

    #[test]
    fn test_corrupt_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path(), "user");
        fs::write(store.path(), b"{not json").expect("write");

        assert!(matches!(
            store.try_load::<HashMap<String, String>>(),
            Err(PersistError::Serialization { .. })
        ));
        let fallback: HashMap<String, String> = store.load();
        assert!(fallback.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path(), "token");

        store.save("t1").expect("save");
        store.remove().expect("first remove");
        store.remove().expect("second remove");
        assert!(!store.exists());
    }
}
