//! Model-backed span selection through an Ollama server
//!
//! The model only sees numbered sentences and answers with numbers; the spans
//! are then looked up locally, so the returned text is always verbatim.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use crate::types::{RetrievedPassage, Span};

use super::{sentences, Sentence, SpanExtractor};

/// Sentences offered to the model per question
const MAX_CANDIDATES: usize = 80;

/// Ollama span extractor with automatic retry
pub struct OllamaSpanExtractor {
    client: Client,
    base_url: String,
    model: String,
    max_retries: u32,
    max_spans: usize,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaSpanExtractor {
    /// Create a new extractor for `model`
    pub fn new(config: &ExtractorConfig, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_retries: config.max_retries,
            max_spans: config.max_spans,
        })
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Span extraction request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::extractor("Unknown error")))
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        self.retry_request(|| {
            let request = GenerateRequest {
                model: self.model.clone(),
                prompt: prompt.clone(),
                stream: false,
                options: GenerateOptions { temperature: 0.0 },
            };
            let request = self.client.post(&url).json(&request);

            async move {
                let response = request
                    .send()
                    .await
                    .map_err(|e| Error::extractor(format!("Request to Ollama failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::extractor(format!("Ollama returned HTTP {} - {}", status, body)));
                }

                let generated: GenerateResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::extractor(format!("Failed to parse Ollama response: {}", e)))?;

                Ok(generated.response)
            }
        })
        .await
    }
}

/// Prompt listing numbered candidate sentences
fn build_prompt(question: &str, candidates: &[Sentence<'_>]) -> String {
    let listing: Vec<String> = candidates
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[{}] {}", i + 1, s.text))
        .collect();

    format!(
        r#"You select sentences from documents. Do not write an answer yourself.

Below are numbered sentences taken verbatim from the documents. Reply with the
numbers of the sentences that directly answer the question, most relevant first,
separated by commas. If none of them answer it, reply with NONE.

SENTENCES:
{sentences}

QUESTION: {question}

Sentence numbers:"#,
        sentences = listing.join("\n"),
        question = question
    )
}

static SELECTION_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("selection pattern is valid"));

/// 0-based candidate indexes named in a model reply, in order, without duplicates
fn parse_selection(reply: &str, candidates: usize) -> Vec<usize> {
    let mut seen = HashSet::new();
    SELECTION_NUMBER
        .find_iter(reply)
        .filter_map(|m| m.as_str().parse::<usize>().ok())
        .filter(|n| (1..=candidates).contains(n))
        .map(|n| n - 1)
        .filter(|i| seen.insert(*i))
        .collect()
}

#[async_trait]
impl SpanExtractor for OllamaSpanExtractor {
    async fn extract(&self, question: &str, passages: &[RetrievedPassage]) -> Result<Vec<Span>> {
        let mut candidates = sentences(passages);
        candidates.truncate(MAX_CANDIDATES);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(
            "Selecting spans with {} from {} sentences",
            self.model,
            candidates.len()
        );

        let reply = self.generate(build_prompt(question, &candidates)).await?;
        let selected = parse_selection(&reply, candidates.len());
        let total = selected.len().max(1) as f32;

        let spans = selected
            .into_iter()
            .take(self.max_spans)
            .enumerate()
            .map(|(rank, i)| Span {
                text: candidates[i].text.to_string(),
                passage: candidates[i].passage.clone(),
                score: 1.0 - rank as f32 / total,
            })
            .collect();

        Ok(spans)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
