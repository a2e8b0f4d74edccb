//! Term-overlap span selection

use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::Result;
use crate::retrieval::{query_terms, term_coverage};
use crate::types::{RetrievedPassage, Span};

use super::{sentences, SpanExtractor};

/// Picks the sentences covering the most question terms
pub struct LexicalSpanExtractor {
    max_spans: usize,
}

impl LexicalSpanExtractor {
    pub fn new(max_spans: usize) -> Self {
        Self { max_spans }
    }
}

#[async_trait]
impl SpanExtractor for LexicalSpanExtractor {
    async fn extract(&self, question: &str, passages: &[RetrievedPassage]) -> Result<Vec<Span>> {
        let terms = query_terms(question);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, _)> = sentences(passages)
            .into_iter()
            .map(|s| (term_coverage(s.text, &terms), s))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        // Stable: equal scores keep retrieval order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut seen = HashSet::new();
        let spans: Vec<Span> = scored
            .into_iter()
            .filter(|(_, s)| seen.insert(s.text))
            .take(self.max_spans)
            .map(|(score, s)| Span {
                text: s.text.to_string(),
                passage: s.passage.clone(),
                score,
            })
            .collect();

        tracing::debug!("Lexical extractor selected {} spans", spans.len());
        Ok(spans)
    }

    fn name(&self) -> &str {
        "lexical"
    }
}
