use axum::{
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post, put},
    Router,
};
use scrumboard_core::error::BoardError;
use scrumboard_core::service::ServiceError;
use serde::Serialize;

mod board;
mod events;
mod stories;

use crate::state::AppState;

/// Axum REST API routes.
///
///   GET    /boards/:boardId/stories                      -> list stories
///   POST   /boards/:boardId/stories                      -> create story
///   PATCH  /stories/:storyId                             -> update story fields
///   PUT    /stories/:storyId/status                      -> move story status
///   DELETE /stories/:storyId                             -> delete story and its board references
///   PATCH  /boards/:boardId/stories/:storyId             -> update story (incl. client-only, snapshots)
///   DELETE /boards/:boardId/stories/:storyId             -> delete story and its column references
///   GET    /boards/:boardId/columns                      -> derived columns (+ ETag)
///   POST   /boards/:boardId/columns                      -> create custom column
///   PUT    /boards/:boardId/columns/:columnId/title      -> rename custom column
///   DELETE /boards/:boardId/columns/:columnId            -> delete custom column
///   POST   /boards/:boardId/columns/:columnId/stories    -> create client-only story in custom column
///   POST   /boards/:boardId/drop                         -> reconcile a drag-and-drop
///   GET    /boards/:boardId/stats                        -> dashboard statistics
///   GET    /events                                       -> SSE stream of board changes
///   GET    /status                                       -> health check
///   GET    /logs                                         -> recent log entries
///   GET    /logs/stream                                  -> SSE stream of log entries
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/boards/{board_id}/stories",
            get(stories::list_stories).post(stories::create_story),
        )
        .route(
            "/stories/{story_id}",
            axum::routing::patch(stories::update_story).delete(stories::delete_story),
        )
        .route("/stories/{story_id}/status", put(stories::update_status))
        .route(
            "/boards/{board_id}/stories/{story_id}",
            axum::routing::patch(board::update_board_story).delete(board::delete_board_story),
        )
        .route(
            "/boards/{board_id}/columns",
            get(board::get_columns).post(board::create_column),
        )
        .route(
            "/boards/{board_id}/columns/{column_id}",
            axum::routing::delete(board::delete_column),
        )
        .route(
            "/boards/{board_id}/columns/{column_id}/title",
            put(board::rename_column),
        )
        .route(
            "/boards/{board_id}/columns/{column_id}/stories",
            post(board::create_local_story),
        )
        .route("/boards/{board_id}/drop", post(board::drop_story))
        .route("/boards/{board_id}/stats", get(board::stats))
        .route("/events", get(events::sse_events))
        .route("/status", get(events::status))
        .route("/logs", get(events::list_logs))
        .route("/logs/stream", get(events::stream_logs))
}

// ── Shared types and helpers used across sub-modules ────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

fn insert_header_safe(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match value.parse() {
        Ok(parsed) => {
            headers.insert(name, parsed);
        }
        Err(e) => {
            log::warn!("Failed to set header {}={} ({})", name, value, e);
        }
    }
}

fn log_api_issue(status: StatusCode, target: &'static str, message: impl AsRef<str>) {
    let message = message.as_ref();
    if status.is_server_error() {
        log::error!(target: target, "{}", message);
    } else {
        log::warn!(target: target, "{}", message);
    }
}

fn api_error(status: StatusCode, target: &'static str, message: String) -> ApiError {
    log_api_issue(status, target, &message);
    (status, Json(ErrorResponse { error: message }))
}

fn service_status(e: &ServiceError) -> StatusCode {
    match e {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Rejected(_) => StatusCode::BAD_REQUEST,
        ServiceError::Unavailable(_) | ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn service_error(target: &'static str, e: ServiceError) -> ApiError {
    api_error(service_status(&e), target, e.to_string())
}

fn board_error(target: &'static str, e: BoardError) -> ApiError {
    let status = match &e {
        BoardError::ColumnNotFound(_) | BoardError::StoryNotFound(_) => StatusCode::NOT_FOUND,
        BoardError::StandardColumnReadOnly(_) => StatusCode::CONFLICT,
        BoardError::EmptyColumnName => StatusCode::BAD_REQUEST,
        BoardError::Service(inner) => service_status(inner),
        BoardError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, target, e.to_string())
}
