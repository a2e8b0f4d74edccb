//! verbatim-qa: PDF question answering with verbatim, citation-backed answers
//!
//! Upload PDFs into a documents folder, build a sparse SQLite index over them,
//! and ask questions whose answers are sentences copied verbatim from the
//! documents. A web front-end (`verbatim-ui`) and a CLI (`verbatim`) share the
//! three coordination functions re-exported here: [`build_index`], [`ask`] and
//! [`format_answer`].

pub mod config;
pub mod error;
pub mod extraction;
pub mod format;
pub mod ingestion;
pub mod pipeline;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::VerbatimConfig;
pub use error::{Error, ErrorKind, Result};
pub use format::{format_answer, FormatOptions};
pub use pipeline::{ask, build_index, VerbatimRag};
pub use types::{Citation, CitationRecord, QueryResponse};
