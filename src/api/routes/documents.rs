use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{error::ApiError, state::AppState};
use crate::application::IngestReport;
use crate::infrastructure::{decode_base64, load_pdf, load_text, SessionSnapshot};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UploadDocumentRequest {
    Text { source: String, content: String },
    /// PDF file, base64 encoded.
    Pdf { source: String, pdf_base64: String },
    Url { url: String },
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultResponse {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub content: String,
    pub score: f32,
}

pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UploadDocumentRequest>,
) -> Result<Json<IngestReport>, ApiError> {
    let session = state.session(id).await?;

    let document = match request {
        UploadDocumentRequest::Text { source, content } => load_text(&source, &content)?,
        UploadDocumentRequest::Pdf { source, pdf_base64 } => {
            load_pdf(&source, decode_base64(&pdf_base64)?).await?
        }
        UploadDocumentRequest::Url { url } => state.web_loader.fetch(&url).await?,
    };

    let mut session = session.lock().await;
    let report = state
        .orchestrator
        .ingest_document(&mut session, document)
        .await?;

    Ok(Json(report))
}

pub async fn clear_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    state.orchestrator.clear_document(&mut session)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResultResponse>>, ApiError> {
    let session = state.session(id).await?;
    let session = session.lock().await;

    let results = state
        .orchestrator
        .search(&session, &request.query, request.limit)
        .await?;

    Ok(Json(
        results
            .into_iter()
            .map(|r| SearchResultResponse {
                index: r.chunk.index,
                start: r.chunk.start,
                end: r.chunk.end,
                content: r.chunk.text,
                score: r.score,
            })
            .collect(),
    ))
}

pub async fn export_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = state.session(id).await?;
    let session = session.lock().await;
    Ok(Json(state.orchestrator.export_session(&session)?))
}

pub async fn import_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(snapshot): Json<SessionSnapshot>,
) -> Result<Json<IngestReport>, ApiError> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    Ok(Json(state.orchestrator.import_session(&mut session, snapshot)?))
}
