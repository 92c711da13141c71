/// Custom-story tracker.
///
/// Board-scoped side index mapping a backend story id to the custom column
/// currently holding it. A tracked story is hidden from the standard column
/// matching its status; its backend status is left untouched.
///
/// Persisted as a JSON object under `customStoryTracker_<boardId>`,
/// e.g. `{"42": "custom_1"}`.
use std::collections::BTreeMap;

use crate::storage::{load_json, save_json, tracker_key, KeyValueStore, StorageError};
use crate::types::{BoardId, StoryId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomStoryTracker {
    entries: BTreeMap<StoryId, String>,
}

impl CustomStoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the board's tracker. Missing or malformed data reads as empty.
    pub fn load(store: &dyn KeyValueStore, board_id: BoardId) -> Self {
        let entries = load_json(store, &tracker_key(board_id)).unwrap_or_default();
        Self { entries }
    }

    pub fn save(&self, store: &dyn KeyValueStore, board_id: BoardId) -> Result<(), StorageError> {
        save_json(store, &tracker_key(board_id), &self.entries)
    }

    /// Point `story_id` at `column_id`, replacing any previous entry.
    pub fn track(&mut self, story_id: StoryId, column_id: impl Into<String>) {
        self.entries.insert(story_id, column_id.into());
    }

    pub fn untrack(&mut self, story_id: StoryId) -> Option<String> {
        self.entries.remove(&story_id)
    }

    pub fn column_of(&self, story_id: StoryId) -> Option<&str> {
        self.entries.get(&story_id).map(String::as_str)
    }

    pub fn contains(&self, story_id: StoryId) -> bool {
        self.entries.contains_key(&story_id)
    }

    /// Drop every entry pointing at `column_id`. Returns the released story ids.
    pub fn purge_column(&mut self, column_id: &str) -> Vec<StoryId> {
        let released: Vec<StoryId> = self
            .entries
            .iter()
            .filter(|(_, col)| col.as_str() == column_id)
            .map(|(id, _)| *id)
            .collect();
        for id in &released {
            self.entries.remove(id);
        }
        released
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;

    #[test]
    fn test_persisted_shape() {
        let store = MemoryStore::new();
        let mut tracker = CustomStoryTracker::new();
        tracker.track(42, "custom_1");
        tracker.save(&store, 5).unwrap();

        let raw = store.get("customStoryTracker_5").unwrap().unwrap();
        assert_eq!(raw, r#"{"42":"custom_1"}"#);

        let loaded = CustomStoryTracker::load(&store, 5);
        assert_eq!(loaded, tracker);
    }

    #[test]
    fn test_load_malformed_is_empty() {
        let store = MemoryStore::new();
        store.set("customStoryTracker_5", "[1, 2").unwrap();
        assert!(CustomStoryTracker::load(&store, 5).is_empty());
    }

    #[test]
    fn test_boards_do_not_share_entries() {
        let store = MemoryStore::new();
        let mut tracker = CustomStoryTracker::new();
        tracker.track(1, "custom_1");
        tracker.save(&store, 1).unwrap();
        assert!(CustomStoryTracker::load(&store, 2).is_empty());
    }

    #[test]
    fn test_track_replaces_previous_column() {
        let mut tracker = CustomStoryTracker::new();
        tracker.track(7, "custom_1");
        tracker.track(7, "custom_2");
        assert_eq!(tracker.column_of(7), Some("custom_2"));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_purge_column() {
        let mut tracker = CustomStoryTracker::new();
        tracker.track(1, "custom_a");
        tracker.track(2, "custom_b");
        tracker.track(3, "custom_a");

        let mut released = tracker.purge_column("custom_a");
        released.sort();
        assert_eq!(released, vec![1, 3]);
        assert!(!tracker.contains(1));
        assert!(tracker.contains(2));
    }
}
