/// Board reconciliation.
///
/// Ties the story store to the two client-side stores (custom columns and
/// the custom-story tracker) and reconciles drops between standard and
/// custom columns:
///
/// - custom -> custom: move the stored entry between column lists
/// - custom -> standard, client-only story: create it on the backend with
///   the target status, then drop it from the source list
/// - custom -> standard, tracked backend story: move its status on the
///   backend, then release the tracker entry
/// - standard -> custom: store the story in the target list and track it;
///   the backend status stays as it is
/// - standard -> standard: move the status on the backend
///
/// Remote calls always run before the local writes that depend on them, so a
/// failed call leaves custom columns and tracker untouched.
use std::sync::Arc;

use serde::Serialize;

use crate::columns::{
    derive_columns, is_custom_column_id, standard_column_status, Column, ColumnKind,
    CustomColumn, CustomColumns,
};
use crate::error::BoardError;
use crate::service::StoryService;
use crate::storage::KeyValueStore;
use crate::story_store::StoryStore;
use crate::tracker::CustomStoryTracker;
use crate::types::{BoardId, NewStory, Story, StoryId, StoryPatch, StoryStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    StoryNotFound,
    SameColumn,
}

/// What a drop did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MoveOutcome {
    Ignored { reason: IgnoreReason },
    /// Stored entry moved from one custom column to another.
    MovedBetweenCustom { story_id: StoryId },
    /// Client-only story now exists on the backend under a new id.
    Promoted { local_id: StoryId, story: Story },
    /// Tracked story left its custom column with a new backend status.
    Released { story: Story },
    /// Story parked in a custom column, backend status unchanged.
    Parked { story_id: StoryId },
    StatusChanged { story: Story },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Standard(StoryStatus),
    Custom,
}

pub struct Board<S: StoryService> {
    board_id: BoardId,
    stories: StoryStore<S>,
    kv: Arc<dyn KeyValueStore>,
}

impl<S: StoryService> Board<S> {
    pub fn new(board_id: BoardId, service: Arc<S>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            board_id,
            stories: StoryStore::new(board_id, service),
            kv,
        }
    }

    /// Build a board and load its stories.
    pub async fn open(
        board_id: BoardId,
        service: Arc<S>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Result<Self, BoardError> {
        let mut board = Self::new(board_id, service, kv);
        board.stories.load().await?;
        Ok(board)
    }

    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    pub fn stories(&self) -> &StoryStore<S> {
        &self.stories
    }

    pub async fn reload(&mut self) -> Result<(), BoardError> {
        self.stories.load().await?;
        Ok(())
    }

    pub fn custom_columns(&self) -> CustomColumns {
        CustomColumns::load(self.kv.as_ref(), self.board_id)
    }

    pub fn tracker(&self) -> CustomStoryTracker {
        CustomStoryTracker::load(self.kv.as_ref(), self.board_id)
    }

    /// Persist custom columns, then the tracker. Used when a story enters a
    /// custom column: until the tracker is written the new entry is ignored.
    fn save(
        &self,
        custom: Option<&CustomColumns>,
        tracker: Option<&CustomStoryTracker>,
    ) -> Result<(), BoardError> {
        if let Some(custom) = custom {
            custom.save(self.kv.as_ref(), self.board_id)?;
        }
        if let Some(tracker) = tracker {
            tracker.save(self.kv.as_ref(), self.board_id)?;
        }
        Ok(())
    }

    /// Persist the tracker, then custom columns. Used when stories leave
    /// custom columns: a leftover entry without a tracker entry is ignored.
    fn save_release(
        &self,
        tracker: Option<&CustomStoryTracker>,
        custom: Option<&CustomColumns>,
    ) -> Result<(), BoardError> {
        if let Some(tracker) = tracker {
            tracker.save(self.kv.as_ref(), self.board_id)?;
        }
        if let Some(custom) = custom {
            custom.save(self.kv.as_ref(), self.board_id)?;
        }
        Ok(())
    }

    /// Ordered columns as they should be rendered.
    pub fn columns(&self) -> Vec<Column> {
        derive_columns(self.stories.stories(), &self.custom_columns(), &self.tracker())
    }

    fn resolve_target(&self, custom: &CustomColumns, column_id: &str) -> Result<Target, BoardError> {
        if is_custom_column_id(column_id) {
            return custom
                .get(column_id)
                .map(|_| Target::Custom)
                .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()));
        }
        standard_column_status(column_id)
            .map(Target::Standard)
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))
    }

    /// Reconcile dropping `story_id` onto `target_column`.
    pub async fn drop_story(
        &mut self,
        story_id: StoryId,
        target_column: &str,
    ) -> Result<MoveOutcome, BoardError> {
        let mut custom = self.custom_columns();
        let mut tracker = self.tracker();
        let columns = derive_columns(self.stories.stories(), &custom, &tracker);

        // Standard columns come first in the derived order
        let Some((source, story)) = columns
            .iter()
            .find_map(|c| c.stories.iter().find(|s| s.id == story_id).map(|s| (c, s.clone())))
        else {
            log::debug!(target: "scrumboard.board", "Drop ignored: story {} not on board {}", story_id, self.board_id);
            return Ok(MoveOutcome::Ignored { reason: IgnoreReason::StoryNotFound });
        };
        if source.id == target_column {
            return Ok(MoveOutcome::Ignored { reason: IgnoreReason::SameColumn });
        }
        let source_id = source.id.clone();
        let source_is_custom = matches!(source.kind, ColumnKind::Custom);
        let target = self.resolve_target(&custom, target_column)?;

        log::info!(
            target: "scrumboard.board",
            "Drop story {} from {} to {} on board {}",
            story_id,
            source_id,
            target_column,
            self.board_id
        );

        match (source_is_custom, target) {
            (true, Target::Custom) => {
                let entry = custom.remove_story(&source_id, story_id).unwrap_or(story);
                custom.append_story(target_column, entry)?;
                if is_backend(story_id) {
                    tracker.track(story_id, target_column);
                    self.save(Some(&custom), Some(&tracker))?;
                } else {
                    self.save(Some(&custom), None)?;
                }
                Ok(MoveOutcome::MovedBetweenCustom { story_id })
            }
            (true, Target::Standard(status)) if story.is_local() => {
                let created = self.stories.create(story.to_new_story(status)).await?;
                custom.remove_story(&source_id, story_id);
                self.save(Some(&custom), None)?;
                Ok(MoveOutcome::Promoted {
                    local_id: story_id,
                    story: created,
                })
            }
            (true, Target::Standard(status)) => {
                let moved = self.stories.move_status(story_id, status).await?;
                tracker.untrack(story_id);
                custom.remove_story(&source_id, story_id);
                self.save_release(Some(&tracker), Some(&custom))?;
                Ok(MoveOutcome::Released { story: moved })
            }
            (false, Target::Custom) => {
                custom.append_story(target_column, story)?;
                tracker.track(story_id, target_column);
                self.save(Some(&custom), Some(&tracker))?;
                Ok(MoveOutcome::Parked { story_id })
            }
            (false, Target::Standard(status)) => {
                let moved = self.stories.move_status(story_id, status).await?;
                Ok(MoveOutcome::StatusChanged { story: moved })
            }
        }
    }

    pub fn create_column(&self, name: &str) -> Result<CustomColumn, BoardError> {
        let mut custom = self.custom_columns();
        let created = custom.create(name)?.clone();
        self.save(Some(&custom), None)?;
        log::info!(target: "scrumboard.board", "Created column {} ({}) on board {}", created.id, created.title, self.board_id);
        Ok(created)
    }

    pub fn rename_column(&self, column_id: &str, title: &str) -> Result<(), BoardError> {
        if !is_custom_column_id(column_id) {
            return Err(BoardError::StandardColumnReadOnly(column_id.to_string()));
        }
        let mut custom = self.custom_columns();
        custom.rename(column_id, title)?;
        self.save(Some(&custom), None)
    }

    /// Delete a custom column and release every story tracked into it.
    /// Released stories reappear in the standard column of their backend
    /// status; client-only stories stored in the column are discarded.
    pub fn delete_column(&self, column_id: &str) -> Result<Vec<StoryId>, BoardError> {
        if !is_custom_column_id(column_id) {
            return Err(BoardError::StandardColumnReadOnly(column_id.to_string()));
        }
        let mut custom = self.custom_columns();
        let mut tracker = self.tracker();
        custom.delete(column_id)?;
        let released = tracker.purge_column(column_id);
        self.save_release(Some(&tracker), Some(&custom))?;
        log::info!(
            target: "scrumboard.board",
            "Deleted column {} on board {}, released {} tracked stories",
            column_id,
            self.board_id,
            released.len()
        );
        Ok(released)
    }

    /// Create a story on the backend. Status defaults to the first standard column.
    pub async fn create_story(&mut self, story: NewStory) -> Result<Story, BoardError> {
        Ok(self.stories.create(story).await?)
    }

    /// Create a client-only story inside a custom column. It gets no backend
    /// record until it is dropped onto a standard column.
    pub fn create_local_story(&self, column_id: &str, fields: NewStory) -> Result<Story, BoardError> {
        if !is_custom_column_id(column_id) {
            return Err(BoardError::StandardColumnReadOnly(column_id.to_string()));
        }
        let mut custom = self.custom_columns();
        let mut story = Story::local(self.board_id, fields);
        while custom.find_story(story.id).is_some() {
            story.id += 1;
        }
        custom.append_story(column_id, story.clone())?;
        self.save(Some(&custom), None)?;
        Ok(story)
    }

    /// Update a story. Client-only stories are patched in place; backend
    /// stories go through the service and any stored snapshot is refreshed.
    pub async fn update_story(&mut self, story_id: StoryId, patch: StoryPatch) -> Result<Story, BoardError> {
        let mut custom = self.custom_columns();
        if !is_backend(story_id) {
            let mut story = custom
                .find_story(story_id)
                .map(|(_, s)| s.clone())
                .ok_or(BoardError::StoryNotFound(story_id))?;
            patch.apply(&mut story);
            custom.replace_story(&story);
            self.save(Some(&custom), None)?;
            return Ok(story);
        }

        if self.stories.get(story_id).is_none() {
            return Err(BoardError::StoryNotFound(story_id));
        }
        let updated = self.stories.update(story_id, patch).await?;
        if custom.replace_story(&updated) {
            self.save(Some(&custom), None)?;
        }
        Ok(updated)
    }

    /// Delete a story and every local reference to it.
    pub async fn delete_story(&mut self, story_id: StoryId) -> Result<(), BoardError> {
        if !is_backend(story_id) {
            let mut custom = self.custom_columns();
            if custom.remove_story_everywhere(story_id) == 0 {
                return Err(BoardError::StoryNotFound(story_id));
            }
            return self.save(Some(&custom), None);
        }

        if self.stories.get(story_id).is_none() {
            return Err(BoardError::StoryNotFound(story_id));
        }
        self.stories.delete(story_id).await?;
        self.forget_story(story_id)
    }

    /// Drop the tracker entry and every stored entry of a story that no
    /// longer exists on the backend.
    pub fn forget_story(&self, story_id: StoryId) -> Result<(), BoardError> {
        let mut custom = self.custom_columns();
        let mut tracker = self.tracker();
        let untracked = tracker.untrack(story_id).is_some();
        let removed = custom.remove_story_everywhere(story_id) > 0;
        if untracked || removed {
            log::debug!(target: "scrumboard.board", "Forgot story {} on board {}", story_id, self.board_id);
        }
        self.save_release(untracked.then_some(&tracker), removed.then_some(&custom))
    }
}

fn is_backend(story_id: StoryId) -> bool {
    !crate::types::is_local_story_id(story_id)
}
