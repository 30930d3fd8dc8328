//! Chat session HTTP handlers.
//!
//! Endpoint:
//! - GET /sessions/{id}/messages - The last `limit` messages, oldest first

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use clara_core::chat::repository::ChatRepository;
use clara_types::chat::ChatMessage;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

const MAX_MESSAGE_LIMIT: u32 = 500;

/// Query parameters for message listing.
#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    #[serde(default = "default_message_limit")]
    pub limit: u32,
}

fn default_message_limit() -> u32 {
    100
}

/// GET /sessions/{id}/messages
pub async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if state.store.get_session(&session_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Session {session_id} not found")));
    }

    let limit = query.limit.min(MAX_MESSAGE_LIMIT);
    let messages = state.orchestrator.sessions().history(&session_id, limit).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(messages, request_id, elapsed)
            .with_link("self", &format!("/sessions/{session_id}/messages")),
    ))
}
