pub mod file;
pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::BoardId;

/// Abstract key-value store for board-scoped client state.
/// Implementations: MemoryStore (tests, embedding), FileStore (one JSON file per key).
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Drop `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub fn custom_columns_key(board_id: BoardId) -> String {
    format!("customColumns_{}", board_id)
}

pub fn tracker_key(board_id: BoardId) -> String {
    format!("customStoryTracker_{}", board_id)
}

/// Load and decode a JSON value. Unreadable or malformed entries read as
/// absent; callers fall back to an empty value.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!(target: "scrumboard.storage", "Failed to read {}: {}", key, e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!(target: "scrumboard.storage", "Ignoring malformed JSON under {}: {}", key, e);
            None
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;

    #[test]
    fn test_keys_are_board_scoped() {
        assert_eq!(custom_columns_key(12), "customColumns_12");
        assert_eq!(tracker_key(12), "customStoryTracker_12");
    }

    #[test]
    fn test_json_roundtrip() {
        let store = MemoryStore::new();
        save_json(&store, "numbers", &vec![1, 2, 3]).unwrap();
        let loaded: Option<Vec<i32>> = load_json(&store, "numbers");
        assert_eq!(loaded, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_malformed_json_reads_as_absent() {
        let store = MemoryStore::new();
        store.set("broken", "{not json").unwrap();
        let loaded: Option<Vec<i32>> = load_json(&store, "broken");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_missing_key_reads_as_absent() {
        let store = MemoryStore::new();
        let loaded: Option<Vec<i32>> = load_json(&store, "nothing");
        assert!(loaded.is_none());
    }
}
