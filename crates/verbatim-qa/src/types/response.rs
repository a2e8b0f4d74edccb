//! Response types for verbatim queries

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

use super::document::RetrievedPassage;

/// Version of the response contract produced by this crate
pub const RESPONSE_VERSION: u32 = 1;

/// A verbatim span selected from a retrieved passage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    /// Exact text copied from the passage
    pub text: String,
    /// Passage the span was taken from
    pub passage: RetrievedPassage,
    /// Extractor relevance score
    pub score: f32,
}

/// Citation backing an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Verbatim text
    pub text: String,
    /// Originating document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Page number (1-indexed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl Citation {
    /// Create a citation from a span
    pub fn from_span(span: &Span) -> Self {
        Self {
            text: span.text.clone(),
            source: Some(span.passage.source.clone()),
            page: span.passage.page_number,
        }
    }
}

/// A citation entry as carried by a response
///
/// `Span` is the typed shape this crate produces. `Map` and `Other` keep
/// responses from looser producers (e.g. JSON from another backend) renderable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CitationRecord {
    Span(Citation),
    Map(Map<String, Value>),
    Other(Value),
}

/// Borrowed view of the three citation fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationFields<'a> {
    pub text: Cow<'a, str>,
    pub source: Option<Cow<'a, str>>,
    pub page: Option<Cow<'a, str>>,
}

impl CitationRecord {
    /// Look up `text`/`source`/`page`; `None` when the entry is malformed
    pub fn fields(&self) -> Option<CitationFields<'_>> {
        match self {
            CitationRecord::Span(c) => Some(CitationFields {
                text: Cow::Borrowed(c.text.as_str()),
                source: c.source.as_deref().map(Cow::Borrowed),
                page: c.page.map(|p| Cow::Owned(p.to_string())),
            }),
            CitationRecord::Map(map) => {
                let text = match map.get("text") {
                    None | Some(Value::Null) => Cow::Borrowed(""),
                    Some(value) => scalar(value)?,
                };
                Some(CitationFields {
                    text,
                    source: map.get("source").and_then(scalar),
                    page: map.get("page").and_then(scalar),
                })
            }
            CitationRecord::Other(_) => None,
        }
    }

    /// Literal rendering used when fields cannot be read
    pub fn literal(&self) -> String {
        match self {
            CitationRecord::Span(c) => format!("{:?}", c),
            CitationRecord::Map(map) => Value::Object(map.clone()).to_string(),
            CitationRecord::Other(Value::String(s)) => s.clone(),
            CitationRecord::Other(value) => value.to_string(),
        }
    }
}

impl From<Citation> for CitationRecord {
    fn from(citation: Citation) -> Self {
        CitationRecord::Span(citation)
    }
}

fn scalar(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// Response from a verbatim query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Answer composed from verbatim spans
    #[serde(default)]
    pub answer: String,
    /// Citations backing the answer
    #[serde(default)]
    pub citations: Vec<CitationRecord>,
    /// Passages retrieved from the index
    #[serde(default)]
    pub passages_retrieved: usize,
    /// Processing time in milliseconds
    #[serde(default)]
    pub processing_time_ms: u64,
    /// Response contract version
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    RESPONSE_VERSION
}

impl QueryResponse {
    /// Create a new query response
    pub fn new(answer: String, citations: Vec<CitationRecord>) -> Self {
        Self {
            answer,
            citations,
            passages_retrieved: 0,
            processing_time_ms: 0,
            version: RESPONSE_VERSION,
        }
    }

    /// Response carrying no evidence
    pub fn empty() -> Self {
        Self::new(String::new(), Vec::new())
    }

    /// Whether neither an answer nor citations are present
    pub fn is_empty(&self) -> bool {
        self.answer.trim().is_empty() && self.citations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_untagged_deserialization() {
        let records: Vec<CitationRecord> = serde_json::from_value(json!([
            {"text": "Repo rate is 6.5%", "source": "policy.pdf", "page": 3},
            {"snippet": "no text key"},
            "plain string",
        ]))
        .unwrap();

        assert!(matches!(records[0], CitationRecord::Span(_)));
        assert!(matches!(records[1], CitationRecord::Map(_)));
        assert!(matches!(records[2], CitationRecord::Other(_)));
    }

    #[test]
    fn test_map_fields_accept_numeric_page() {
        let record: CitationRecord =
            serde_json::from_value(json!({"text": 42, "page": "iv"})).unwrap();
        let fields = record.fields().unwrap();
        assert_eq!(fields.text, "42");
        assert_eq!(fields.page.as_deref(), Some("iv"));
        assert!(fields.source.is_none());
    }

    #[test]
    fn test_malformed_map_has_no_fields() {
        let record = CitationRecord::Map(
            json!({"text": ["not", "scalar"]}).as_object().cloned().unwrap(),
        );
        assert!(record.fields().is_none());
        assert_eq!(record.literal(), r#"{"text":["not","scalar"]}"#);
    }

    #[test]
    fn test_response_defaults_on_deserialize() {
        let resp: QueryResponse = serde_json::from_value(json!({"answer": "x"})).unwrap();
        assert_eq!(resp.version, RESPONSE_VERSION);
        assert!(resp.citations.is_empty());
    }
}
