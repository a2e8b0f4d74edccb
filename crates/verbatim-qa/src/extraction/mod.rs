//! Verbatim span extraction
//!
//! An extractor picks sentences out of retrieved passages. It never rewrites
//! them: every [`Span`] text is a substring of its passage.

mod lexical;
mod ollama;

pub use lexical::LexicalSpanExtractor;
pub use ollama::OllamaSpanExtractor;

use async_trait::async_trait;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::ExtractorConfig;
use crate::error::Result;
use crate::types::{RetrievedPassage, Span};

/// Selects verbatim spans answering a question
#[async_trait]
pub trait SpanExtractor: Send + Sync {
    /// Extract spans from `passages`, best first
    async fn extract(&self, question: &str, passages: &[RetrievedPassage]) -> Result<Vec<Span>>;

    /// Extractor name for logging
    fn name(&self) -> &str;
}

/// Build the configured extractor; no model selects the lexical one
pub fn from_config(config: &ExtractorConfig) -> Result<Arc<dyn SpanExtractor>> {
    match config.model.as_deref() {
        Some(model) => {
            tracing::info!("Using Ollama span extractor with model {}", model);
            Ok(Arc::new(OllamaSpanExtractor::new(config, model)?))
        }
        None => Ok(Arc::new(LexicalSpanExtractor::new(config.max_spans))),
    }
}

/// A candidate sentence and the passage it came from
#[derive(Debug, Clone)]
pub(crate) struct Sentence<'a> {
    pub text: &'a str,
    pub passage: &'a RetrievedPassage,
}

/// Split passages into trimmed sentences, in retrieval order
pub(crate) fn sentences(passages: &[RetrievedPassage]) -> Vec<Sentence<'_>> {
    passages
        .iter()
        .flat_map(|passage| {
            passage
                .content
                .unicode_sentences()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(move |text| Sentence { text, passage })
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn passage(title: &str, page: Option<u32>, content: &str) -> RetrievedPassage {
    RetrievedPassage {
        passage_id: uuid::Uuid::new_v4(),
        document_id: uuid::Uuid::new_v4(),
        title: title.to_string(),
        source: format!("/docs/{title}"),
        page_number: page,
        content: content.to_string(),
        score: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentences_are_substrings() {
        let passages = vec![passage(
            "a.pdf",
            Some(1),
            "The repo rate is 6.5 percent. It was unchanged in June!  ",
        )];
        let found = sentences(&passages);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].text, "The repo rate is 6.5 percent.");
        assert_eq!(found[1].text, "It was unchanged in June!");
        assert!(found.iter().all(|s| passages[0].content.contains(s.text)));
    }

    #[test]
    fn test_from_config_defaults_to_lexical() {
        let extractor = from_config(&ExtractorConfig::default()).unwrap();
        assert_eq!(extractor.name(), "lexical");

        let config = ExtractorConfig {
            model: Some("llama3.2:3b".to_string()),
            ..Default::default()
        };
        assert_eq!(from_config(&config).unwrap().name(), "ollama");
    }
}
