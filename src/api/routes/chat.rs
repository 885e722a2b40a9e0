use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{error::ApiError, state::AppState};
use crate::domain::Message;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub answer: String,
    /// Messages in the conversation after this turn.
    pub turns: usize,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub document: Option<String>,
    pub messages: Vec<Message>,
    pub answered: usize,
    /// Last question when its answer failed.
    pub unanswered: Option<String>,
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;

    let answer = state
        .orchestrator
        .handle_turn(&mut session, &request.message)
        .await?;

    Ok(Json(ChatResponse {
        session_id: id,
        answer,
        turns: session.messages().len(),
    }))
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = state.session(id).await?;
    let session = session.lock().await;

    Ok(Json(HistoryResponse {
        session_id: id,
        document: session.document().map(|d| d.source.clone()),
        messages: session.messages().to_vec(),
        answered: session.history().answered(),
        unanswered: session.history().unanswered().map(str::to_string),
    }))
}

pub async fn clear_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    state.orchestrator.new_chat(&mut session);
    Ok(StatusCode::NO_CONTENT)
}
