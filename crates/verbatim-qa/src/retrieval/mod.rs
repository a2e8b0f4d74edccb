//! Retrieval helpers: query analysis for sparse search and span scoring

mod search;

pub use search::{fts_match_expression, query_terms, term_coverage};
