//! Question answering over a built index

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{resolve_path, VerbatimConfig};
use crate::error::{Error, Result};
use crate::extraction::{self, LexicalSpanExtractor, SpanExtractor};
use crate::storage::VerbatimIndex;
use crate::types::{Citation, CitationRecord, QueryResponse};

/// Bullet prefixed to every answer line
pub const ANSWER_BULLET: &str = "• ";

/// Retrieval plus verbatim span extraction over one index
pub struct VerbatimRag {
    index: Arc<VerbatimIndex>,
    k: usize,
    extractor: Arc<dyn SpanExtractor>,
}

impl VerbatimRag {
    /// Query engine retrieving `k` passages per question with the lexical extractor
    pub fn new(index: Arc<VerbatimIndex>, k: usize) -> Self {
        Self {
            index,
            k,
            extractor: Arc::new(LexicalSpanExtractor::new(
                crate::config::ExtractorConfig::default().max_spans,
            )),
        }
    }

    /// Replace the span extractor
    pub fn with_extractor(mut self, extractor: Arc<dyn SpanExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Answer `question` with verbatim spans and their citations
    pub async fn query(&self, question: &str) -> Result<QueryResponse> {
        let start = Instant::now();

        let index = Arc::clone(&self.index);
        let text = question.to_string();
        let k = self.k;
        let passages = tokio::task::spawn_blocking(move || index.search(&text, k))
            .await
            .map_err(|e| Error::internal(format!("Search task failed: {}", e)))??;

        tracing::info!("Retrieved {} passages for question", passages.len());

        let spans = if passages.is_empty() {
            Vec::new()
        } else {
            self.extractor.extract(question, &passages).await?
        };

        let answer = spans
            .iter()
            .map(|span| format!("{}{}", ANSWER_BULLET, span.text))
            .collect::<Vec<_>>()
            .join("\n");
        let citations = spans
            .iter()
            .map(|span| CitationRecord::from(Citation::from_span(span)))
            .collect();

        let mut response = QueryResponse::new(answer, citations);
        response.passages_retrieved = passages.len();
        response.processing_time_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "Answered with {} spans via {} in {}ms",
            spans.len(),
            self.extractor.name(),
            response.processing_time_ms
        );

        Ok(response)
    }
}

/// Ask a question against the index at `db_path`
///
/// Blank questions are rejected before the index is touched.
pub async fn ask(
    question: &str,
    db_path: &Path,
    k: usize,
    config: &VerbatimConfig,
) -> Result<QueryResponse> {
    if question.trim().is_empty() {
        return Err(Error::EmptyQuestion);
    }

    let db_path = resolve_path(db_path)?;
    if !db_path.is_file() {
        return Err(Error::IndexNotFound { path: db_path });
    }

    let sparse_model = config.index.sparse_model.clone();
    let index = tokio::task::spawn_blocking(move || VerbatimIndex::open(&sparse_model, &db_path))
        .await
        .map_err(|e| Error::internal(format!("Index open task failed: {}", e)))??;

    let extractor = extraction::from_config(&config.extractor)?;
    VerbatimRag::new(Arc::new(index), k)
        .with_extractor(extractor)
        .query(question.trim())
        .await
}
