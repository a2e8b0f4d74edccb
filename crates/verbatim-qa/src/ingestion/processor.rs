//! Document processing: file → parsed pages → passages

use std::path::Path;

use crate::config::IndexConfig;
use crate::error::Result;
use crate::types::{DocumentMetadata, ProcessedDocument};

use super::chunker::TextChunker;
use super::parser::PdfParser;

/// Turns a file on disk into a [`ProcessedDocument`]
///
/// This is the single processing signature used by the index builder.
pub trait DocumentProcessor: Send + Sync {
    /// Process one file with the given title and metadata
    fn process_file(
        &self,
        path: &Path,
        title: &str,
        metadata: DocumentMetadata,
    ) -> Result<ProcessedDocument>;
}

/// PDF processor: pdf-extract/lopdf parsing followed by page-aware chunking
pub struct PdfProcessor {
    chunker: TextChunker,
}

impl PdfProcessor {
    /// Create a new processor
    pub fn new(chunk_size: usize, chunk_overlap: usize, min_chunk_size: usize) -> Self {
        Self {
            chunker: TextChunker::new(chunk_size, chunk_overlap, min_chunk_size),
        }
    }

    /// Create from index configuration
    pub fn from_config(config: &IndexConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.min_chunk_size)
    }

    /// Process in-memory PDF bytes
    pub fn process_bytes(
        &self,
        data: &[u8],
        title: &str,
        metadata: DocumentMetadata,
    ) -> Result<ProcessedDocument> {
        let parsed = PdfParser::parse(title, data)?;

        let mut doc = ProcessedDocument::new(title, parsed.content_hash.clone(), metadata);
        doc.total_pages = Some(parsed.total_pages);
        doc.passages = self.chunker.chunk_pages(&doc, &parsed.pages);

        tracing::debug!(
            "Processed {}: {} pages, {} passages",
            title,
            parsed.total_pages,
            doc.passages.len()
        );

        Ok(doc)
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::from_config(&IndexConfig::default())
    }
}

impl DocumentProcessor for PdfProcessor {
    fn process_file(
        &self,
        path: &Path,
        title: &str,
        metadata: DocumentMetadata,
    ) -> Result<ProcessedDocument> {
        let data = std::fs::read(path)?;
        self.process_bytes(&data, title, metadata)
    }
}
