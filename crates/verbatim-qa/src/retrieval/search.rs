//! Query analysis shared by index search and lexical span extraction

use std::collections::HashSet;

/// Words too common to carry retrieval signal
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "could", "did", "do", "does",
    "for", "from", "had", "has", "have", "how", "i", "in", "is", "it", "its", "me", "my",
    "of", "on", "or", "should", "tell", "that", "the", "their", "there", "these", "this",
    "to", "was", "we", "were", "what", "when", "where", "which", "who", "whom", "why",
    "will", "with", "would", "you", "your", "about", "explain", "describe",
];

/// Lowercased content terms of `text`, deduplicated, in first-seen order
pub fn query_terms(text: &str) -> Vec<String> {
    let stop: HashSet<&str> = STOPWORDS.iter().copied().collect();
    let mut seen = HashSet::new();

    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .filter(|w| !stop.contains(w.as_str()))
        .filter(|w| w.chars().count() > 1 || w.chars().all(|c| c.is_numeric()))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// FTS5 MATCH expression OR-ing the quoted terms; `None` when nothing is searchable
pub fn fts_match_expression(terms: &[String]) -> Option<String> {
    if terms.is_empty() {
        return None;
    }
    let quoted: Vec<String> = terms
        .iter()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect();
    Some(quoted.join(" OR "))
}

/// Fraction of `terms` that occur in `text` (case-insensitive, whole-word)
pub fn term_coverage(text: &str, terms: &[String]) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let words: HashSet<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    let hits = terms.iter().filter(|t| words.contains(t.as_str())).count();
    hits as f32 / terms.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_terms_drop_stopwords() {
        let terms = query_terms("What is the RBI's repo rate?");
        assert_eq!(terms, vec!["rbi", "repo", "rate"]);
    }

    #[test]
    fn test_query_terms_keep_numbers_and_dedupe() {
        let terms = query_terms("rate 6 rate 2024");
        assert_eq!(terms, vec!["rate", "6", "2024"]);
    }

    #[test]
    fn test_match_expression_quotes_terms() {
        let expr = fts_match_expression(&["repo".to_string(), "rate".to_string()]).unwrap();
        assert_eq!(expr, "\"repo\" OR \"rate\"");
        assert!(fts_match_expression(&[]).is_none());
    }

    #[test]
    fn test_term_coverage() {
        let terms = query_terms("repo rate inflation");
        let coverage = term_coverage("The repo rate was unchanged.", &terms);
        assert!((coverage - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(term_coverage("nothing relevant", &terms), 0.0);
    }
}
