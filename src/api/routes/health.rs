use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub llm_provider: String,
    pub embedding_provider: String,
    pub sessions: usize,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn readiness_check(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let config = &state.config.config;
    Json(ReadinessResponse {
        status: "ready".into(),
        llm_provider: config.llm.provider.clone(),
        embedding_provider: config.embedding.provider.clone(),
        sessions: state.session_count().await,
    })
}
