//! JSON API mirroring the page actions

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::format_answer;
use crate::server::state::AppState;
use crate::storage::IndexStats;
use crate::types::{QueryResponse, StoredFile};

use super::{read_uploads, save_uploads};

#[derive(Debug, Serialize)]
pub struct DocumentList {
    pub folder: String,
    pub documents: Vec<StoredFile>,
}

/// GET /api/documents - PDFs in the documents folder
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<DocumentList>> {
    let folder = state.folder().clone();
    let documents = tokio::task::spawn_blocking(move || folder.list())
        .await
        .map_err(|e| Error::internal(format!("List task failed: {}", e)))??;

    Ok(Json(DocumentList {
        folder: state.folder().path().display().to_string(),
        documents,
    }))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub saved: Vec<String>,
    pub rejected: Vec<String>,
}

/// POST /api/documents - save uploaded PDFs
pub async fn upload_documents(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let uploads = read_uploads(multipart).await?;
    if uploads.is_empty() {
        return Err(Error::InvalidUpload {
            filename: String::new(),
            reason: "Please select at least one PDF.".to_string(),
        });
    }

    let (saved, rejected) = save_uploads(&state, uploads).await?;
    Ok(Json(UploadResponse {
        saved,
        rejected: rejected.iter().map(ToString::to_string).collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct BuildResponse {
    pub index: String,
    pub stats: Option<IndexStats>,
}

/// POST /api/index - build or rebuild the index
pub async fn build_index(State(state): State<AppState>) -> Result<Json<BuildResponse>> {
    let path = state.build_index().await?;
    let stats = state.index_stats().await?;

    Ok(Json(BuildResponse {
        index: path.display().to_string(),
        stats,
    }))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub docs_dir: String,
    pub db_path: String,
    pub index_exists: bool,
    pub index: Option<IndexStats>,
    pub sparse_model: String,
    pub extractor: String,
    pub top_k: usize,
}

/// GET /api/status - paths, index state and active models
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>> {
    let config = state.config();
    let index = state.index_stats().await?;

    Ok(Json(StatusResponse {
        docs_dir: state.folder().path().display().to_string(),
        db_path: state.db_path().display().to_string(),
        index_exists: index.is_some(),
        index,
        sparse_model: config.index.sparse_model.clone(),
        extractor: config
            .extractor
            .model
            .clone()
            .unwrap_or_else(|| "lexical".to_string()),
        top_k: config.query.top_k,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// Plain-text rendering of the response
    pub answer: String,
    pub response: QueryResponse,
}

/// POST /api/ask - answer a question
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let response = state.ask(&request.question, request.k).await?;

    Ok(Json(AskResponse {
        answer: format_answer(Some(&response), state.format_options()),
        response,
    }))
}
