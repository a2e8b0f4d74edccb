//! Error types for the verbatim Q&A system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for verbatim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Verbatim Q&A errors
#[derive(Debug, Error)]
pub enum Error {
    /// No PDFs in the documents directory at build time
    #[error("No PDFs found in {}", dir.display())]
    NoDocuments { dir: PathBuf },

    /// The index file does not exist yet
    #[error("Index not found at {} (build it first)", path.display())]
    IndexNotFound { path: PathBuf },

    /// Empty or whitespace-only question
    #[error("Question is empty.")]
    EmptyQuestion,

    /// Rejected upload (bad filename or extension)
    #[error("Invalid upload '{filename}': {reason}")]
    InvalidUpload { filename: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Index storage error
    #[error("Index error: {0}")]
    Index(String),

    /// Span extractor error
    #[error("Span extraction failed: {0}")]
    Extractor(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error taxonomy surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Something that should exist does not (documents, index)
    NotFound,
    /// Caller input was rejected before any work was done
    Validation,
    /// Any failure inside a collaborator
    Backend,
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create an extractor error
    pub fn extractor(message: impl Into<String>) -> Self {
        Self::Extractor(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoDocuments { .. } | Error::IndexNotFound { .. } => ErrorKind::NotFound,
            Error::EmptyQuestion | Error::InvalidUpload { .. } => ErrorKind::Validation,
            _ => ErrorKind::Backend,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Index(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// Render an error with its full cause chain, the way it is shown to the user
pub fn diagnostic<E>(err: E) -> String
where
    E: std::error::Error + Send + Sync + 'static,
{
    format!("{:?}", anyhow::Error::new(err))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::NoDocuments { .. } => (StatusCode::NOT_FOUND, "no_documents"),
            Error::IndexNotFound { .. } => (StatusCode::NOT_FOUND, "index_not_found"),
            Error::EmptyQuestion => (StatusCode::BAD_REQUEST, "empty_question"),
            Error::InvalidUpload { .. } => (StatusCode::BAD_REQUEST, "invalid_upload"),
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::FileParse { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "parse_error"),
            Error::Index(_) => (StatusCode::INTERNAL_SERVER_ERROR, "index_error"),
            Error::Extractor(_) => (StatusCode::SERVICE_UNAVAILABLE, "extractor_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
