//! Routes for the front-end page and the JSON API

pub mod api;
pub mod ui;

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    routing::{get, post},
    Router,
};
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// Page routes (form posts redirect back to `/`)
pub fn ui_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(ui::index_page))
        .route(
            "/upload",
            post(ui::upload).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/build", post(ui::build))
        .route("/ask", post(ui::ask))
        .route("/clear", post(ui::clear_history))
}

/// JSON API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/documents",
            get(api::list_documents)
                .post(api::upload_documents)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/index", post(api::build_index))
        .route("/status", get(api::status))
        .route("/ask", post(api::ask))
}

/// An uploaded file
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
}

/// Collect file parts; empty parts (no file chosen) are skipped
pub async fn read_uploads(mut multipart: Multipart) -> Result<Vec<Upload>> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::internal(format!("Failed to read multipart field: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::internal(format!("Failed to read {}: {}", filename, e)))?;

        if filename.is_empty() && data.is_empty() {
            continue;
        }
        uploads.push(Upload { filename, data });
    }

    Ok(uploads)
}

/// Save uploads into the documents folder
///
/// Returns the saved file names and the per-file rejections.
pub async fn save_uploads(
    state: &AppState,
    uploads: Vec<Upload>,
) -> Result<(Vec<String>, Vec<Error>)> {
    let folder = state.folder().clone();

    tokio::task::spawn_blocking(move || {
        let mut saved = Vec::new();
        let mut rejected = Vec::new();
        for upload in uploads {
            match folder.save(&upload.filename, &upload.data) {
                Ok(path) => saved.push(
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or(upload.filename),
                ),
                Err(err @ Error::InvalidUpload { .. }) => rejected.push(err),
                Err(err) => return Err(err),
            }
        }
        Ok((saved, rejected))
    })
    .await
    .map_err(|e| Error::internal(format!("Upload task failed: {}", e)))?
}
