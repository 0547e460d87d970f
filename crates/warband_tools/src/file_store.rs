//! JSON-file-backed key-value store.
//!
//! Stands in for browser storage when tracking a game from the command
//! line. The whole file is one JSON object of string values, rewritten on
//! every change.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use warband_core::store::KvStore;

use crate::{Result, ToolError};

/// A [`KvStore`] persisted to a JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open a store file, starting empty if it does not exist yet.
    ///
    /// An unreadable or unparseable file is an error, so saved state is
    /// never overwritten by accident.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|e| ToolError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            serde_json::from_str(&text).map_err(|e| ToolError::Store {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) {
        let result = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(&self.path, json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::error!("Failed to write store {}: {e}", self.path.display());
        }
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
        self.flush();
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warband_core::store::{load_json, StoreKey};

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("a-current-round", "3".to_string());
        store.set("gone", "x".to_string());
        store.remove("gone");

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("a-current-round").as_deref(), Some("3"));
        assert_eq!(reopened.get("gone"), None);
    }

    #[test]
    fn test_corrupted_file_is_refused_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{{{").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, ToolError::Store { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{{{");
    }

    #[test]
    fn test_corrupted_value_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"a-current-round":"not a number"}"#).unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        let round: Option<u32> = load_json(&store, StoreKey::CurrentRound("a"));
        assert_eq!(round, None);
    }
}
