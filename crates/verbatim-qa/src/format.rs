//! Plain-text rendering of query responses

use crate::types::{CitationRecord, QueryResponse};

/// Shown when there is no response at all
pub const NO_ANSWER: &str = "No answer. Check that your index contains documents.";

/// Shown when a response carries neither answer text nor citations
pub const NO_EVIDENCE: &str = "No evidence found in the PDF.";

/// Glyphs removed from the start of answer lines
const BULLET_GLYPHS: &[char] = &['•', '●', '◦', '▪', '▫', '‣', '∙', '·', '⁃'];

/// Answer rendering options
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    /// Remove leading bullet glyphs from answer lines
    pub strip_bullets: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { strip_bullets: true }
    }
}

impl From<&crate::config::AnswerConfig> for FormatOptions {
    fn from(config: &crate::config::AnswerConfig) -> Self {
        Self {
            strip_bullets: config.strip_bullets,
        }
    }
}

/// Render an answer followed by its numbered sources
pub fn format_answer(response: Option<&QueryResponse>, options: FormatOptions) -> String {
    let Some(response) = response else {
        return NO_ANSWER.to_string();
    };

    let mut parts: Vec<String> = Vec::new();

    let answer = response.answer.trim();
    if !answer.is_empty() {
        if options.strip_bullets {
            parts.push(strip_bullets(answer));
        } else {
            parts.push(answer.to_string());
        }
    }

    if !response.citations.is_empty() {
        parts.push("\nSources:".to_string());
        for (i, citation) in response.citations.iter().enumerate() {
            parts.push(citation_line(i + 1, citation));
        }
    }

    let text = parts.join("\n").trim().to_string();
    if text.is_empty() {
        NO_EVIDENCE.to_string()
    } else {
        text
    }
}

fn strip_bullets(answer: &str) -> String {
    answer
        .lines()
        .map(|line| line.trim_start().trim_start_matches(BULLET_GLYPHS).trim_start())
        .collect::<Vec<_>>()
        .join("\n")
}

fn citation_line(number: usize, citation: &CitationRecord) -> String {
    let Some(fields) = citation.fields() else {
        return format!("{}. {}", number, citation.literal());
    };

    let mut line = format!("{}. {}", number, fields.text);

    let mut meta = Vec::new();
    if let Some(source) = fields.source.filter(|s| !s.is_empty()) {
        meta.push(format!("Source: {}", source));
    }
    if let Some(page) = fields.page {
        meta.push(format!("Page: {}", page));
    }
    if !meta.is_empty() {
        line.push_str(&format!("  ({})", meta.join(" | ")));
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Citation;
    use serde_json::json;

    fn response(answer: &str, citations: Vec<CitationRecord>) -> QueryResponse {
        QueryResponse::new(answer.to_string(), citations)
    }

    fn record(value: serde_json::Value) -> CitationRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_no_response() {
        assert_eq!(format_answer(None, FormatOptions::default()), NO_ANSWER);
    }

    #[test]
    fn test_empty_response() {
        let resp = response("  \n ", vec![]);
        assert_eq!(format_answer(Some(&resp), FormatOptions::default()), NO_EVIDENCE);
    }

    #[test]
    fn test_answer_with_sources() {
        let resp = response(
            "• The repo rate is 6.5%.\n• It was unchanged.",
            vec![
                Citation {
                    text: "The repo rate is 6.5%.".to_string(),
                    source: Some("/docs/policy.pdf".to_string()),
                    page: Some(3),
                }
                .into(),
                Citation {
                    text: "It was unchanged.".to_string(),
                    source: Some("/docs/policy.pdf".to_string()),
                    page: None,
                }
                .into(),
            ],
        );

        let expected = "The repo rate is 6.5%.\nIt was unchanged.\n\nSources:\n\
                        1. The repo rate is 6.5%.  (Source: /docs/policy.pdf | Page: 3)\n\
                        2. It was unchanged.  (Source: /docs/policy.pdf)";
        assert_eq!(format_answer(Some(&resp), FormatOptions::default()), expected);
    }

    #[test]
    fn test_keep_bullets_when_disabled() {
        let resp = response("● first\n◦ second", vec![]);
        let options = FormatOptions { strip_bullets: false };
        assert_eq!(format_answer(Some(&resp), options), "● first\n◦ second");
        assert_eq!(format_answer(Some(&resp), FormatOptions::default()), "first\nsecond");
    }

    #[test]
    fn test_mapping_matches_typed_citation() {
        let typed = response(
            "",
            vec![Citation {
                text: "Span".to_string(),
                source: Some("a.pdf".to_string()),
                page: Some(2),
            }
            .into()],
        );
        let mapped = response(
            "",
            vec![CitationRecord::Map(
                json!({"text": "Span", "source": "a.pdf", "page": 2})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )],
        );

        let options = FormatOptions::default();
        assert_eq!(format_answer(Some(&typed), options), format_answer(Some(&mapped), options));
        assert_eq!(
            format_answer(Some(&typed), options),
            "Sources:\n1. Span  (Source: a.pdf | Page: 2)"
        );
    }

    #[test]
    fn test_empty_source_and_missing_meta() {
        let resp = response("", vec![record(json!({"text": "Only text", "source": ""}))]);
        assert_eq!(
            format_answer(Some(&resp), FormatOptions::default()),
            "Sources:\n1. Only text"
        );
    }

    #[test]
    fn test_malformed_citations_render_literally() {
        let resp = response(
            "Answer",
            vec![
                record(json!("just a string")),
                record(json!(42)),
                record(json!({"text": {"nested": true}})),
            ],
        );

        assert_eq!(
            format_answer(Some(&resp), FormatOptions::default()),
            "Answer\n\nSources:\n1. just a string\n2. 42\n3. {\"text\":{\"nested\":true}}"
        );
    }
}
