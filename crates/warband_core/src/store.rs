//! Key-value persistence interface.
//!
//! The engine never owns storage. Every persisted value is a JSON string
//! written through a [`KvStore`] supplied by the embedding application
//! (browser storage, a JSON file, or the in-memory [`MemoryStore`]).

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Synchronous string key-value store.
pub trait KvStore {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: String);

    /// Delete the value stored under `key`.
    fn remove(&mut self, key: &str);
}

impl<T: KvStore + ?Sized> KvStore for &mut T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) {
        (**self).set(key, value);
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key);
    }
}

/// In-memory store backed by a `HashMap`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all stored keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Keys of every value the engine persists.
///
/// `Display` renders the exact key string used in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey<'a> {
    /// Status flags of one unit.
    UnitStatus {
        /// Army id.
        army: &'a str,
        /// Unit selection id.
        unit: &'a str,
    },
    /// Health of one unit.
    UnitHealth {
        /// Army id.
        army: &'a str,
        /// Unit selection id.
        unit: &'a str,
    },
    /// Spell tokens of one unit.
    UnitTokens {
        /// Army id.
        army: &'a str,
        /// Unit selection id.
        unit: &'a str,
    },
    /// Custom per-model names of one unit.
    ModelNames {
        /// Army id.
        army: &'a str,
        /// Unit selection id.
        unit: &'a str,
    },
    /// Selected doctrine ids.
    Doctrines(&'a str),
    /// Current round number.
    CurrentRound(&'a str),
    /// Available command points.
    CommandPoints(&'a str),
    /// Available underdog points.
    UnderdogPoints(&'a str),
}

impl fmt::Display for StoreKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnitStatus { army, unit } => write!(f, "unit-status-{army}-{unit}"),
            Self::UnitHealth { army, unit } => write!(f, "unit-health-{army}-{unit}"),
            Self::UnitTokens { army, unit } => write!(f, "unit-tokens-{army}-{unit}"),
            Self::ModelNames { army, unit } => write!(f, "model-names-{army}-{unit}"),
            Self::Doctrines(army) => write!(f, "{army}-doctrines"),
            Self::CurrentRound(army) => write!(f, "{army}-current-round"),
            Self::CommandPoints(army) => write!(f, "{army}-command-points"),
            Self::UnderdogPoints(army) => write!(f, "{army}-underdog-points"),
        }
    }
}

/// Load and decode a JSON value.
///
/// Missing keys and unparseable values both yield `None`; corruption is
/// logged and otherwise treated as absence.
pub fn load_json<T: DeserializeOwned>(store: &impl KvStore, key: StoreKey<'_>) -> Option<T> {
    let key = key.to_string();
    let raw = store.get(&key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Discarding corrupted value under {key}: {e}");
            None
        }
    }
}

/// Encode and store a JSON value.
pub fn save_json<T: Serialize>(store: &mut impl KvStore, key: StoreKey<'_>, value: &T) {
    let key = key.to_string();
    match serde_json::to_string(value) {
        Ok(json) => store.set(&key, json),
        // Plain data types never fail to serialize; keep the old value if one does.
        Err(e) => tracing::error!("Failed to encode value for {key}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let army = "abc";
        let unit = "u1";
        assert_eq!(
            StoreKey::UnitStatus { army, unit }.to_string(),
            "unit-status-abc-u1"
        );
        assert_eq!(
            StoreKey::UnitHealth { army, unit }.to_string(),
            "unit-health-abc-u1"
        );
        assert_eq!(
            StoreKey::UnitTokens { army, unit }.to_string(),
            "unit-tokens-abc-u1"
        );
        assert_eq!(
            StoreKey::ModelNames { army, unit }.to_string(),
            "model-names-abc-u1"
        );
        assert_eq!(StoreKey::Doctrines(army).to_string(), "abc-doctrines");
        assert_eq!(StoreKey::CurrentRound(army).to_string(), "abc-current-round");
        assert_eq!(StoreKey::CommandPoints(army).to_string(), "abc-command-points");
        assert_eq!(StoreKey::UnderdogPoints(army).to_string(), "abc-underdog-points");
    }

    #[test]
    fn test_memory_store_set_get_remove() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("k", "v".to_string());
        assert_eq!(store.get("k").as_deref(), Some("v"));
        assert_eq!(store.len(), 1);

        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_json_helpers() {
        let mut store = MemoryStore::new();
        save_json(&mut store, StoreKey::CurrentRound("a"), &3u32);
        let round: Option<u32> = load_json(&store, StoreKey::CurrentRound("a"));
        assert_eq!(round, Some(3));
    }

    #[test]
    fn test_corrupted_value_is_absent() {
        let mut store = MemoryStore::new();
        store.set("a-current-round", "{not json".to_string());
        let round: Option<u32> = load_json(&store, StoreKey::CurrentRound("a"));
        assert_eq!(round, None);
    }
}
