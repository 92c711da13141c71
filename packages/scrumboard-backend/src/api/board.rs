use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use scrumboard_core::board::{Board, MoveOutcome};
use scrumboard_core::columns::{Column, CustomColumn};
use scrumboard_core::events::BoardChangeEvent;
use scrumboard_core::service::InMemoryStoryService;
use scrumboard_core::stats::DashboardStats;
use scrumboard_core::types::{BoardId, NewStory, Story, StoryId, StoryPatch};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{board_error, insert_header_safe, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateColumnBody {
    name: String,
}

#[derive(Deserialize)]
pub struct RenameColumnBody {
    title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropBody {
    story_id: StoryId,
    target_column: String,
}

async fn open(
    state: &AppState,
    board_id: BoardId,
    target: &'static str,
) -> Result<Board<InMemoryStoryService>, ApiError> {
    state
        .open_board(board_id)
        .await
        .map_err(|e| board_error(target, e))
}

/// Strong ETag over the serialized column view.
fn columns_etag(columns: &[Column]) -> String {
    let json = serde_json::to_string(columns).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("\"{}\"", hex::encode(&hasher.finalize()[..8]))
}

pub async fn get_columns(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    headers: HeaderMap,
) -> Result<(StatusCode, HeaderMap, Json<serde_json::Value>), ApiError> {
    let board = open(&state, board_id, "scrumboard.api.get_columns").await?;
    let columns = board.columns();
    let etag = columns_etag(&columns);

    let mut resp_headers = HeaderMap::new();
    insert_header_safe(&mut resp_headers, "etag", &etag);

    // Check If-None-Match for conditional response
    if let Some(if_none_match) = headers.get("if-none-match") {
        if let Ok(value) = if_none_match.to_str() {
            if value == etag {
                return Ok((
                    StatusCode::NOT_MODIFIED,
                    resp_headers,
                    Json(serde_json::json!({})),
                ));
            }
        }
    }

    Ok((
        StatusCode::OK,
        resp_headers,
        Json(serde_json::json!({
            "boardId": board_id,
            "columns": columns,
        })),
    ))
}

pub async fn create_column(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    Json(body): Json<CreateColumnBody>,
) -> Result<(StatusCode, Json<CustomColumn>), ApiError> {
    let target = "scrumboard.api.create_column";
    let _guard = state.board_locks.lock(board_id).await;
    let board = open(&state, board_id, target).await?;
    let column = board
        .create_column(&body.name)
        .map_err(|e| board_error(target, e))?;
    state.notify(BoardChangeEvent::ColumnsChanged { board_id });
    Ok((StatusCode::CREATED, Json(column)))
}

pub async fn rename_column(
    State(state): State<AppState>,
    Path((board_id, column_id)): Path<(BoardId, String)>,
    Json(body): Json<RenameColumnBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "scrumboard.api.rename_column";
    let _guard = state.board_locks.lock(board_id).await;
    let board = open(&state, board_id, target).await?;
    board
        .rename_column(&column_id, &body.title)
        .map_err(|e| board_error(target, e))?;
    state.notify(BoardChangeEvent::ColumnsChanged { board_id });
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn delete_column(
    State(state): State<AppState>,
    Path((board_id, column_id)): Path<(BoardId, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "scrumboard.api.delete_column";
    let _guard = state.board_locks.lock(board_id).await;
    let board = open(&state, board_id, target).await?;
    let released = board
        .delete_column(&column_id)
        .map_err(|e| board_error(target, e))?;
    state.notify(BoardChangeEvent::ColumnsChanged { board_id });
    Ok(Json(serde_json::json!({ "released": released })))
}

pub async fn create_local_story(
    State(state): State<AppState>,
    Path((board_id, column_id)): Path<(BoardId, String)>,
    Json(body): Json<NewStory>,
) -> Result<(StatusCode, Json<Story>), ApiError> {
    let target = "scrumboard.api.create_local_story";
    let _guard = state.board_locks.lock(board_id).await;
    let board = open(&state, board_id, target).await?;
    let story = board
        .create_local_story(&column_id, body)
        .map_err(|e| board_error(target, e))?;
    state.notify(BoardChangeEvent::ColumnsChanged { board_id });
    Ok((StatusCode::CREATED, Json(story)))
}

pub async fn drop_story(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    Json(body): Json<DropBody>,
) -> Result<Json<MoveOutcome>, ApiError> {
    let target = "scrumboard.api.drop_story";
    let _guard = state.board_locks.lock(board_id).await;
    let mut board = open(&state, board_id, target).await?;
    let outcome = board
        .drop_story(body.story_id, &body.target_column)
        .await
        .map_err(|e| board_error(target, e))?;

    match &outcome {
        MoveOutcome::Ignored { .. } => {}
        MoveOutcome::Promoted { story, .. } => {
            state.notify(BoardChangeEvent::StoryCreated {
                board_id,
                story_id: story.id,
            });
            state.notify(BoardChangeEvent::ColumnsChanged { board_id });
        }
        MoveOutcome::StatusChanged { story } => {
            state.notify(BoardChangeEvent::StoryUpdated {
                board_id,
                story_id: story.id,
            });
        }
        MoveOutcome::Released { story } => {
            state.notify(BoardChangeEvent::StoryUpdated {
                board_id,
                story_id: story.id,
            });
            state.notify(BoardChangeEvent::ColumnsChanged { board_id });
        }
        MoveOutcome::MovedBetweenCustom { .. } | MoveOutcome::Parked { .. } => {
            state.notify(BoardChangeEvent::ColumnsChanged { board_id });
        }
    }
    Ok(Json(outcome))
}

pub async fn update_board_story(
    State(state): State<AppState>,
    Path((board_id, story_id)): Path<(BoardId, StoryId)>,
    Json(patch): Json<StoryPatch>,
) -> Result<Json<Story>, ApiError> {
    let target = "scrumboard.api.update_board_story";
    let _guard = state.board_locks.lock(board_id).await;
    let mut board = open(&state, board_id, target).await?;
    let story = board
        .update_story(story_id, patch)
        .await
        .map_err(|e| board_error(target, e))?;
    state.notify(BoardChangeEvent::StoryUpdated { board_id, story_id });
    Ok(Json(story))
}

pub async fn delete_board_story(
    State(state): State<AppState>,
    Path((board_id, story_id)): Path<(BoardId, StoryId)>,
) -> Result<StatusCode, ApiError> {
    let target = "scrumboard.api.delete_board_story";
    let _guard = state.board_locks.lock(board_id).await;
    let mut board = open(&state, board_id, target).await?;
    board
        .delete_story(story_id)
        .await
        .map_err(|e| board_error(target, e))?;
    state.notify(BoardChangeEvent::StoryDeleted { board_id, story_id });
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stats(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
) -> Result<Json<DashboardStats>, ApiError> {
    let board = open(&state, board_id, "scrumboard.api.stats").await?;
    Ok(Json(DashboardStats::compute(board.stories().stories())))
}
