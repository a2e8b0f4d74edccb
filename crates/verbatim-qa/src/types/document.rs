//! Document and passage types with source tracking for citations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Free-form metadata attached to a processed document
pub type DocumentMetadata = HashMap<String, serde_json::Value>;

/// Metadata key holding the document's origin path
pub const SOURCE_KEY: &str = "source";

/// A document after processing, ready to be added to an index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    /// Unique document ID
    pub id: Uuid,
    /// Display title (the upload filename)
    pub title: String,
    /// Content hash of the extracted text
    pub content_hash: String,
    /// Total number of pages
    pub total_pages: Option<u32>,
    /// Ordered passages
    pub passages: Vec<Passage>,
    /// Additional metadata (`source` holds the file path)
    #[serde(default)]
    pub metadata: DocumentMetadata,
    /// Processing timestamp
    pub processed_at: chrono::DateTime<chrono::Utc>,
}

impl ProcessedDocument {
    /// Create an empty document; passages are filled in by the chunker
    pub fn new(title: impl Into<String>, content_hash: String, metadata: DocumentMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content_hash,
            total_pages: None,
            passages: Vec::new(),
            metadata,
            processed_at: chrono::Utc::now(),
        }
    }

    /// Origin used in citations: the `source` metadata entry, else the title
    pub fn source(&self) -> String {
        self.metadata
            .get(SOURCE_KEY)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.title.clone())
    }
}

/// A contiguous piece of document text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Unique passage ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Position within the document
    pub index: u32,
    /// Page number (1-indexed)
    pub page_number: Option<u32>,
    /// Text content
    pub content: String,
}

impl Passage {
    /// Create a new passage
    pub fn new(document_id: Uuid, index: u32, page_number: Option<u32>, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            index,
            page_number,
            content,
        }
    }
}

/// A passage returned by index search, with its document context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Passage ID
    pub passage_id: Uuid,
    /// Document ID
    pub document_id: Uuid,
    /// Document title
    pub title: String,
    /// Document origin (path or title)
    pub source: String,
    /// Page number
    pub page_number: Option<u32>,
    /// Passage text
    pub content: String,
    /// Relevance score (higher is better)
    pub score: f32,
}

/// A PDF sitting in the documents folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    /// File name
    pub filename: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified_at: Option<chrono::DateTime<chrono::Utc>>,
}
