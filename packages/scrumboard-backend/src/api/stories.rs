use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use scrumboard_core::events::BoardChangeEvent;
use scrumboard_core::service::{ServiceError, StoryService};
use scrumboard_core::types::{BoardId, NewStory, Story, StoryId, StoryPatch, StoryStatus};
use serde::Deserialize;

use super::{board_error, service_error, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StatusBody {
    status: StoryStatus,
}

pub async fn list_stories(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stories = state
        .stories
        .list(board_id)
        .await
        .map_err(|e| service_error("scrumboard.api.list_stories", e))?;
    Ok(Json(serde_json::json!({ "stories": stories })))
}

pub async fn create_story(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    Json(body): Json<NewStory>,
) -> Result<(StatusCode, Json<Story>), ApiError> {
    let story = state
        .stories
        .create(body, board_id)
        .await
        .map_err(|e| service_error("scrumboard.api.create_story", e))?;
    state.notify(BoardChangeEvent::StoryCreated {
        board_id,
        story_id: story.id,
    });
    Ok((StatusCode::CREATED, Json(story)))
}

pub async fn update_story(
    State(state): State<AppState>,
    Path(story_id): Path<StoryId>,
    Json(patch): Json<StoryPatch>,
) -> Result<Json<Story>, ApiError> {
    let story = state
        .stories
        .update(story_id, patch)
        .await
        .map_err(|e| service_error("scrumboard.api.update_story", e))?;
    state.notify(BoardChangeEvent::StoryUpdated {
        board_id: story.board_id,
        story_id,
    });
    Ok(Json(story))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(story_id): Path<StoryId>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Story>, ApiError> {
    let story = state
        .stories
        .update_status(story_id, body.status)
        .await
        .map_err(|e| service_error("scrumboard.api.update_status", e))?;
    state.notify(BoardChangeEvent::StoryUpdated {
        board_id: story.board_id,
        story_id,
    });
    Ok(Json(story))
}

pub async fn delete_story(
    State(state): State<AppState>,
    Path(story_id): Path<StoryId>,
) -> Result<StatusCode, ApiError> {
    let board_id = state
        .stories
        .get(story_id)
        .map(|s| s.board_id)
        .ok_or_else(|| service_error("scrumboard.api.delete_story", ServiceError::NotFound(story_id)))?;
    let _guard = state.board_locks.lock(board_id).await;
    state
        .stories
        .delete(story_id)
        .await
        .map_err(|e| service_error("scrumboard.api.delete_story", e))?;

    // The story is gone; drop what the board still keeps about it
    let board = state
        .open_board(board_id)
        .await
        .map_err(|e| board_error("scrumboard.api.delete_story", e))?;
    board
        .forget_story(story_id)
        .map_err(|e| board_error("scrumboard.api.delete_story", e))?;
    state.notify(BoardChangeEvent::StoryDeleted { board_id, story_id });
    Ok(StatusCode::NO_CONTENT)
}
