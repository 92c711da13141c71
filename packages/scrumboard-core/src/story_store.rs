/// Board-scoped story collection.
///
/// Every mutation calls the remote service first and only touches local
/// state once the call succeeded. Failures are logged and returned; nothing
/// is retried.
use std::sync::Arc;

use crate::service::{ServiceError, StoryService};
use crate::types::{BoardId, NewStory, Story, StoryId, StoryPatch, StoryStatus};

pub struct StoryStore<S: StoryService> {
    board_id: BoardId,
    service: Arc<S>,
    stories: Vec<Story>,
}

impl<S: StoryService> StoryStore<S> {
    pub fn new(board_id: BoardId, service: Arc<S>) -> Self {
        Self {
            board_id,
            service,
            stories: Vec::new(),
        }
    }

    /// Replace local state with the backend's story list.
    pub async fn load(&mut self) -> Result<(), ServiceError> {
        match self.service.list(self.board_id).await {
            Ok(stories) => {
                log::debug!(
                    target: "scrumboard.stories",
                    "Loaded {} stories for board {}",
                    stories.len(),
                    self.board_id
                );
                self.stories = stories;
                Ok(())
            }
            Err(e) => {
                log::error!(
                    target: "scrumboard.stories",
                    "Failed to load stories for board {}: {}",
                    self.board_id,
                    e
                );
                Err(e)
            }
        }
    }

    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn get(&self, id: StoryId) -> Option<&Story> {
        self.stories.iter().find(|s| s.id == id)
    }

    pub async fn create(&mut self, story: NewStory) -> Result<Story, ServiceError> {
        let created = self
            .service
            .create(story, self.board_id)
            .await
            .map_err(|e| log_failure("create", None, e))?;
        self.stories.push(created.clone());
        Ok(created)
    }

    pub async fn update(&mut self, id: StoryId, patch: StoryPatch) -> Result<Story, ServiceError> {
        let updated = self
            .service
            .update(id, patch)
            .await
            .map_err(|e| log_failure("update", Some(id), e))?;
        self.upsert(updated.clone());
        Ok(updated)
    }

    pub async fn move_status(&mut self, id: StoryId, status: StoryStatus) -> Result<Story, ServiceError> {
        let moved = self
            .service
            .update_status(id, status)
            .await
            .map_err(|e| log_failure("update_status", Some(id), e))?;
        self.upsert(moved.clone());
        Ok(moved)
    }

    pub async fn delete(&mut self, id: StoryId) -> Result<(), ServiceError> {
        self.service
            .delete(id)
            .await
            .map_err(|e| log_failure("delete", Some(id), e))?;
        self.stories.retain(|s| s.id != id);
        Ok(())
    }

    fn upsert(&mut self, story: Story) {
        match self.stories.iter_mut().find(|s| s.id == story.id) {
            Some(existing) => *existing = story,
            None => self.stories.push(story),
        }
    }
}

fn log_failure(op: &str, id: Option<StoryId>, e: ServiceError) -> ServiceError {
    match id {
        Some(id) => log::error!(target: "scrumboard.stories", "{} failed for story {}: {}", op, id, e),
        None => log::error!(target: "scrumboard.stories", "{} failed: {}", op, e),
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::InMemoryStoryService;

    async fn seeded() -> StoryStore<InMemoryStoryService> {
        let service = Arc::new(InMemoryStoryService::new());
        service.create(NewStory::titled("Existing"), 1).await.unwrap();
        service.create(NewStory::titled("Other board"), 2).await.unwrap();
        let mut store = StoryStore::new(1, service);
        store.load().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_load_only_board_stories() {
        let store = seeded().await;
        assert_eq!(store.stories().len(), 1);
        assert_eq!(store.stories()[0].title, "Existing");
    }

    #[tokio::test]
    async fn test_create_and_move() {
        let mut store = seeded().await;
        let created = store.create(NewStory::titled("New")).await.unwrap();
        assert_eq!(store.stories().len(), 2);

        store.move_status(created.id, StoryStatus::Review).await.unwrap();
        assert_eq!(store.get(created.id).unwrap().status, StoryStatus::Review);
    }

    #[tokio::test]
    async fn test_failed_call_leaves_state() {
        let mut store = seeded().await;
        let before = store.stories().to_vec();

        assert!(store.move_status(404, StoryStatus::Done).await.is_err());
        assert!(store.delete(404).await.is_err());
        assert_eq!(store.stories(), before.as_slice());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let mut store = seeded().await;
        let id = store.stories()[0].id;
        let patch = StoryPatch {
            title: Some("Renamed".to_string()),
            ..StoryPatch::default()
        };
        store.update(id, patch).await.unwrap();
        assert_eq!(store.get(id).unwrap().title, "Renamed");

        store.delete(id).await.unwrap();
        assert!(store.get(id).is_none());
    }
}
