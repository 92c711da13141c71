/// Story remote service seam.
///
/// The board logic only talks to stories through [`StoryService`]. The
/// backend binary serves [`InMemoryStoryService`] over HTTP; tests wrap it to
/// inject failures.
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::storage::{load_json, save_json, KeyValueStore, StorageError};
use crate::types::{BoardId, NewStory, Story, StoryId, StoryPatch, StoryStatus};

const STORIES_KEY: &str = "stories";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Story not found: {0}")]
    NotFound(StoryId),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Story service unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[async_trait]
pub trait StoryService: Send + Sync {
    async fn create(&self, story: NewStory, board_id: BoardId) -> Result<Story, ServiceError>;

    async fn list(&self, board_id: BoardId) -> Result<Vec<Story>, ServiceError>;

    async fn update_status(&self, id: StoryId, status: StoryStatus) -> Result<Story, ServiceError>;

    async fn update(&self, id: StoryId, patch: StoryPatch) -> Result<Story, ServiceError>;

    async fn delete(&self, id: StoryId) -> Result<(), ServiceError>;
}

#[async_trait]
impl<T: StoryService + ?Sized> StoryService for Arc<T> {
    async fn create(&self, story: NewStory, board_id: BoardId) -> Result<Story, ServiceError> {
        (**self).create(story, board_id).await
    }

    async fn list(&self, board_id: BoardId) -> Result<Vec<Story>, ServiceError> {
        (**self).list(board_id).await
    }

    async fn update_status(&self, id: StoryId, status: StoryStatus) -> Result<Story, ServiceError> {
        (**self).update_status(id, status).await
    }

    async fn update(&self, id: StoryId, patch: StoryPatch) -> Result<Story, ServiceError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: StoryId) -> Result<(), ServiceError> {
        (**self).delete(id).await
    }
}

/// Authoritative story repository with server-assigned sequential ids.
pub struct InMemoryStoryService {
    catalog: RwLock<Catalog>,
    /// Snapshot target, rewritten after every mutation
    store: Option<Arc<dyn KeyValueStore>>,
}

struct Catalog {
    /// story_id -> Story
    stories: BTreeMap<StoryId, Story>,
    /// Next id to hand out. Only moves forward, so a deleted id is never
    /// reissued to a story that could inherit its tracker entry.
    next_id: StoryId,
}

impl Catalog {
    fn restore(stories: Vec<Story>, saved_next_id: StoryId) -> Self {
        let stories: BTreeMap<StoryId, Story> = stories.into_iter().map(|s| (s.id, s)).collect();
        let after_last = stories.keys().next_back().map_or(1, |last| last + 1);
        Self {
            stories,
            next_id: saved_next_id.max(after_last),
        }
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    next_id: StoryId,
    stories: Vec<&'a Story>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSnapshot {
    Current { next_id: StoryId, stories: Vec<Story> },
    /// Plain story list written before the id counter was persisted
    Legacy(Vec<Story>),
}

impl InMemoryStoryService {
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(Catalog::restore(Vec::new(), 1)),
            store: None,
        }
    }

    /// Restore stories from `store` and keep it updated.
    pub fn persistent(store: Arc<dyn KeyValueStore>) -> Self {
        let catalog = match load_json::<StoredSnapshot>(store.as_ref(), STORIES_KEY) {
            Some(StoredSnapshot::Current { next_id, stories }) => Catalog::restore(stories, next_id),
            Some(StoredSnapshot::Legacy(stories)) => Catalog::restore(stories, 1),
            None => Catalog::restore(Vec::new(), 1),
        };
        log::info!(
            target: "scrumboard.service",
            "Restored {} stories from snapshot, next id {}",
            catalog.stories.len(),
            catalog.next_id
        );
        Self {
            catalog: RwLock::new(catalog),
            store: Some(store),
        }
    }

    pub fn get(&self, id: StoryId) -> Option<Story> {
        self.catalog.read().ok()?.stories.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.catalog.read().map(|c| c.stories.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write_snapshot(&self, catalog: &Catalog) -> Result<(), ServiceError> {
        if let Some(store) = &self.store {
            let snapshot = SnapshotRef {
                next_id: catalog.next_id,
                stories: catalog.stories.values().collect(),
            };
            save_json(store.as_ref(), STORIES_KEY, &snapshot)?;
        }
        Ok(())
    }

    /// Apply `f` to one story. The change is undone if the snapshot cannot
    /// be written.
    fn modify<F>(&self, id: StoryId, f: F) -> Result<Story, ServiceError>
    where
        F: FnOnce(&mut Story),
    {
        let mut catalog = self.lock_write()?;
        let story = catalog.stories.get_mut(&id).ok_or(ServiceError::NotFound(id))?;
        let previous = story.clone();
        f(story);
        let updated = story.clone();
        if let Err(e) = self.write_snapshot(&catalog) {
            catalog.stories.insert(id, previous);
            return Err(e);
        }
        Ok(updated)
    }

    fn lock_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Catalog>, ServiceError> {
        self.catalog
            .write()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))
    }
}

impl Default for InMemoryStoryService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoryService for InMemoryStoryService {
    async fn create(&self, story: NewStory, board_id: BoardId) -> Result<Story, ServiceError> {
        if story.title.trim().is_empty() {
            return Err(ServiceError::Rejected("title must not be empty".to_string()));
        }
        let mut catalog = self.lock_write()?;
        let id = catalog.next_id;
        let created = story.into_story(id, board_id, Utc::now());
        catalog.stories.insert(id, created.clone());
        catalog.next_id = id + 1;
        if let Err(e) = self.write_snapshot(&catalog) {
            catalog.stories.remove(&id);
            catalog.next_id = id;
            return Err(e);
        }
        log::debug!(target: "scrumboard.service", "Created story {} on board {}", id, board_id);
        Ok(created)
    }

    async fn list(&self, board_id: BoardId) -> Result<Vec<Story>, ServiceError> {
        let catalog = self
            .catalog
            .read()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
        Ok(catalog
            .stories
            .values()
            .filter(|s| s.board_id == board_id)
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: StoryId, status: StoryStatus) -> Result<Story, ServiceError> {
        self.modify(id, |story| {
            story.status = status;
            story.updated_at = Utc::now();
        })
    }

    async fn update(&self, id: StoryId, patch: StoryPatch) -> Result<Story, ServiceError> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ServiceError::Rejected("title must not be empty".to_string()));
        }
        self.modify(id, |story| patch.apply(story))
    }

    async fn delete(&self, id: StoryId) -> Result<(), ServiceError> {
        let mut catalog = self.lock_write()?;
        let removed = catalog.stories.remove(&id).ok_or(ServiceError::NotFound(id))?;
        if let Err(e) = self.write_snapshot(&catalog) {
            catalog.stories.insert(id, removed);
            return Err(e);
        }
        Ok(())
    }
}
