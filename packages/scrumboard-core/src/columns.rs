/// Column model.
///
/// A board renders four fixed standard columns (one per status) followed by
/// the user's custom columns. Custom columns live only in the board-scoped
/// key-value entry `customColumns_<boardId>`.
use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::storage::{custom_columns_key, load_json, save_json, KeyValueStore, StorageError};
use crate::tracker::CustomStoryTracker;
use crate::types::{BoardId, Story, StoryId, StoryStatus};

pub const CUSTOM_COLUMN_PREFIX: &str = "custom_";

pub fn is_custom_column_id(column_id: &str) -> bool {
    column_id.starts_with(CUSTOM_COLUMN_PREFIX)
}

/// Fixed (id, title, status) triples. The id is the status wire name.
pub const STANDARD_COLUMNS: [(&str, &str, StoryStatus); 4] = [
    ("todo", "To Do", StoryStatus::Todo),
    ("in_progress", "In Progress", StoryStatus::InProgress),
    ("review", "Review", StoryStatus::Review),
    ("done", "Done", StoryStatus::Done),
];

/// Status of the standard column with this id, if it is one.
pub fn standard_column_status(column_id: &str) -> Option<StoryStatus> {
    STANDARD_COLUMNS
        .iter()
        .find(|(id, _, _)| *id == column_id)
        .map(|(_, _, status)| *status)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomColumn {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub stories: Vec<Story>,
}

impl CustomColumn {
    pub fn contains(&self, story_id: StoryId) -> bool {
        self.stories.iter().any(|s| s.id == story_id)
    }
}

/// The board's persisted custom column list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomColumns {
    columns: Vec<CustomColumn>,
}

impl CustomColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the board's custom columns. Missing or malformed data reads as none.
    pub fn load(store: &dyn KeyValueStore, board_id: BoardId) -> Self {
        let columns = load_json(store, &custom_columns_key(board_id)).unwrap_or_default();
        Self { columns }
    }

    pub fn save(&self, store: &dyn KeyValueStore, board_id: BoardId) -> Result<(), StorageError> {
        save_json(store, &custom_columns_key(board_id), &self.columns)
    }

    pub fn as_slice(&self) -> &[CustomColumn] {
        &self.columns
    }

    pub fn get(&self, column_id: &str) -> Option<&CustomColumn> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    fn get_mut(&mut self, column_id: &str) -> Result<&mut CustomColumn, BoardError> {
        self.columns
            .iter_mut()
            .find(|c| c.id == column_id)
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))
    }

    /// Append a new empty column. The name is trimmed and must not be blank.
    pub fn create(&mut self, name: &str) -> Result<&CustomColumn, BoardError> {
        let title = name.trim();
        if title.is_empty() {
            return Err(BoardError::EmptyColumnName);
        }

        let mut stamp = Utc::now().timestamp_millis();
        let mut id = format!("{}{}", CUSTOM_COLUMN_PREFIX, stamp);
        while self.get(&id).is_some() {
            stamp += 1;
            id = format!("{}{}", CUSTOM_COLUMN_PREFIX, stamp);
        }

        self.columns.push(CustomColumn {
            id,
            title: title.to_string(),
            stories: Vec::new(),
        });
        let last = self.columns.len() - 1;
        Ok(&self.columns[last])
    }

    pub fn rename(&mut self, column_id: &str, title: &str) -> Result<(), BoardError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BoardError::EmptyColumnName);
        }
        self.get_mut(column_id)?.title = title.to_string();
        Ok(())
    }

    /// Remove a column and its local story list.
    pub fn delete(&mut self, column_id: &str) -> Result<CustomColumn, BoardError> {
        let pos = self
            .columns
            .iter()
            .position(|c| c.id == column_id)
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))?;
        Ok(self.columns.remove(pos))
    }

    pub fn append_story(&mut self, column_id: &str, story: Story) -> Result<(), BoardError> {
        let column = self.get_mut(column_id)?;
        // A story appears at most once per column
        column.stories.retain(|s| s.id != story.id);
        column.stories.push(story);
        Ok(())
    }

    pub fn remove_story(&mut self, column_id: &str, story_id: StoryId) -> Option<Story> {
        let column = self.columns.iter_mut().find(|c| c.id == column_id)?;
        let pos = column.stories.iter().position(|s| s.id == story_id)?;
        Some(column.stories.remove(pos))
    }

    /// Remove the story from every column. Returns how many entries were dropped.
    pub fn remove_story_everywhere(&mut self, story_id: StoryId) -> usize {
        let mut removed = 0;
        for column in &mut self.columns {
            let before = column.stories.len();
            column.stories.retain(|s| s.id != story_id);
            removed += before - column.stories.len();
        }
        removed
    }

    /// Replace a stored story in place wherever it appears.
    pub fn replace_story(&mut self, story: &Story) -> bool {
        let mut replaced = false;
        for column in &mut self.columns {
            for entry in column.stories.iter_mut().filter(|s| s.id == story.id) {
                *entry = story.clone();
                replaced = true;
            }
        }
        replaced
    }

    /// Find a stored story and the custom column holding it.
    pub fn find_story(&self, story_id: StoryId) -> Option<(&CustomColumn, &Story)> {
        self.columns.iter().find_map(|c| {
            c.stories
                .iter()
                .find(|s| s.id == story_id)
                .map(|s| (c, s))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnKind {
    Standard { status: StoryStatus },
    Custom,
}

/// A rendered column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub kind: ColumnKind,
    pub stories: Vec<Story>,
}

impl Column {
    pub fn is_custom(&self) -> bool {
        matches!(self.kind, ColumnKind::Custom)
    }

    pub fn contains(&self, story_id: StoryId) -> bool {
        self.stories.iter().any(|s| s.id == story_id)
    }
}

/// Derive the ordered column list for a board.
///
/// Standard columns hold every story with a matching status that is not
/// tracked into an existing custom column. Custom columns hold their stored
/// list: client-only stories as stored, backend stories only while the
/// tracker still points at that column and only as their live version, so a
/// stale snapshot never shows up twice or with outdated content. A story the
/// tracker places in a column whose stored list lacks it is appended, so a
/// half-written move never hides a story from every column.
pub fn derive_columns(
    stories: &[Story],
    custom_columns: &CustomColumns,
    tracker: &CustomStoryTracker,
) -> Vec<Column> {
    let mut columns: Vec<Column> = STANDARD_COLUMNS
        .iter()
        .map(|(id, title, status)| Column {
            id: id.to_string(),
            title: title.to_string(),
            kind: ColumnKind::Standard { status: *status },
            stories: stories
                .iter()
                .filter(|s| s.status == *status && !parked(tracker, custom_columns, s.id))
                .cloned()
                .collect(),
        })
        .collect();

    for custom in custom_columns.as_slice() {
        let mut seen = HashSet::new();
        let mut held = Vec::with_capacity(custom.stories.len());
        for stored in &custom.stories {
            if !seen.insert(stored.id) {
                continue;
            }
            if stored.is_local() {
                held.push(stored.clone());
                continue;
            }
            if tracker.column_of(stored.id) != Some(custom.id.as_str()) {
                continue;
            }
            if let Some(live) = stories.iter().find(|s| s.id == stored.id) {
                held.push(live.clone());
            }
        }
        for live in stories {
            if tracker.column_of(live.id) == Some(custom.id.as_str()) && seen.insert(live.id) {
                held.push(live.clone());
            }
        }
        columns.push(Column {
            id: custom.id.clone(),
            title: custom.title.clone(),
            kind: ColumnKind::Custom,
            stories: held,
        });
    }

    columns
}

fn parked(tracker: &CustomStoryTracker, custom_columns: &CustomColumns, story_id: StoryId) -> bool {
    tracker
        .column_of(story_id)
        .is_some_and(|column_id| custom_columns.get(column_id).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use crate::types::NewStory;

    fn story(id: StoryId, status: StoryStatus) -> Story {
        let mut req = NewStory::titled(format!("Story {}", id));
        req.status = Some(status);
        req.into_story(id, 1, Utc::now())
    }

    fn column<'a>(columns: &'a [Column], id: &str) -> &'a Column {
        columns.iter().find(|c| c.id == id).unwrap()
    }

    #[test]
    fn test_standard_columns_in_order() {
        let columns = derive_columns(&[], &CustomColumns::new(), &CustomStoryTracker::new());
        let ids: Vec<&str> = columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["todo", "in_progress", "review", "done"]);
        assert!(columns.iter().all(|c| !c.is_custom()));
    }

    #[test]
    fn test_stories_grouped_by_status() {
        let stories = vec![
            story(1, StoryStatus::Todo),
            story(2, StoryStatus::Done),
            story(3, StoryStatus::Todo),
        ];
        let columns = derive_columns(&stories, &CustomColumns::new(), &CustomStoryTracker::new());
        assert_eq!(column(&columns, "todo").stories.len(), 2);
        assert_eq!(column(&columns, "done").stories.len(), 1);
        assert!(column(&columns, "review").stories.is_empty());
    }

    #[test]
    fn test_tracked_story_hidden_from_standard_column() {
        let stories = vec![story(42, StoryStatus::Todo)];
        let mut custom = CustomColumns::new();
        let id = custom.create("Blocked").unwrap().id.clone();
        custom.append_story(&id, stories[0].clone()).unwrap();
        let mut tracker = CustomStoryTracker::new();
        tracker.track(42, id.clone());

        let columns = derive_columns(&stories, &custom, &tracker);
        assert!(!column(&columns, "todo").contains(42));
        assert!(column(&columns, &id).contains(42));
    }

    #[test]
    fn test_tracked_story_rendered_with_live_content() {
        let mut live = story(42, StoryStatus::Todo);
        let mut custom = CustomColumns::new();
        let id = custom.create("Blocked").unwrap().id.clone();
        custom.append_story(&id, live.clone()).unwrap();
        let mut tracker = CustomStoryTracker::new();
        tracker.track(42, id.clone());

        live.title = "Renamed on the backend".to_string();
        let columns = derive_columns(&[live], &custom, &tracker);
        assert_eq!(column(&columns, &id).stories[0].title, "Renamed on the backend");
    }

    #[test]
    fn test_stale_snapshot_without_tracker_entry_skipped() {
        let stories = vec![story(42, StoryStatus::Todo)];
        let mut custom = CustomColumns::new();
        let id = custom.create("Blocked").unwrap().id.clone();
        custom.append_story(&id, stories[0].clone()).unwrap();

        let columns = derive_columns(&stories, &custom, &CustomStoryTracker::new());
        assert!(column(&columns, "todo").contains(42));
        assert!(!column(&columns, &id).contains(42));
    }

    #[test]
    fn test_tracked_story_without_stored_entry_still_shown() {
        let stories = vec![story(42, StoryStatus::Todo)];
        let mut custom = CustomColumns::new();
        let id = custom.create("Blocked").unwrap().id.clone();
        let mut tracker = CustomStoryTracker::new();
        tracker.track(42, id.clone());

        let columns = derive_columns(&stories, &custom, &tracker);
        assert!(column(&columns, &id).contains(42));
        assert_eq!(column(&columns, &id).stories.len(), 1);
        assert!(!column(&columns, "todo").contains(42));
    }

    #[test]
    fn test_tracked_into_missing_column_falls_back_to_status() {
        let stories = vec![story(42, StoryStatus::Review)];
        let mut tracker = CustomStoryTracker::new();
        tracker.track(42, "custom_gone");

        let columns = derive_columns(&stories, &CustomColumns::new(), &tracker);
        assert!(column(&columns, "review").contains(42));
    }

    #[test]
    fn test_local_story_only_in_custom_column() {
        let local = Story::local(1, NewStory::titled("Idea"));
        let mut custom = CustomColumns::new();
        let id = custom.create("Ideas").unwrap().id.clone();
        custom.append_story(&id, local.clone()).unwrap();

        let columns = derive_columns(&[], &custom, &CustomStoryTracker::new());
        assert!(column(&columns, &id).contains(local.id));
        assert!(!column(&columns, "todo").contains(local.id));
    }

    #[test]
    fn test_create_trims_and_rejects_blank() {
        let mut custom = CustomColumns::new();
        assert!(matches!(custom.create("   "), Err(BoardError::EmptyColumnName)));

        let created = custom.create("  Blocked  ").unwrap();
        assert_eq!(created.title, "Blocked");
        assert!(is_custom_column_id(&created.id));
        assert!(created.stories.is_empty());
    }

    #[test]
    fn test_create_ids_unique() {
        let mut custom = CustomColumns::new();
        let a = custom.create("A").unwrap().id.clone();
        let b = custom.create("B").unwrap().id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn test_persist_roundtrip_and_malformed() {
        let store = MemoryStore::new();
        let mut custom = CustomColumns::new();
        custom.create("Blocked").unwrap();
        custom.save(&store, 9).unwrap();
        assert_eq!(CustomColumns::load(&store, 9), custom);

        store.set("customColumns_9", "not json").unwrap();
        assert!(CustomColumns::load(&store, 9).as_slice().is_empty());
    }

    #[test]
    fn test_standard_column_lookup() {
        assert_eq!(standard_column_status("in_progress"), Some(StoryStatus::InProgress));
        assert_eq!(standard_column_status("custom_1"), None);
        assert!(!is_custom_column_id("done"));
    }
}
