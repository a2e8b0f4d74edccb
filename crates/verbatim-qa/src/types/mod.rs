//! Core types for the verbatim Q&A system

pub mod document;
pub mod response;

pub use document::{
    DocumentMetadata, Passage, ProcessedDocument, RetrievedPassage, StoredFile, SOURCE_KEY,
};
pub use response::{Citation, CitationFields, CitationRecord, QueryResponse, Span};
