//! Coordination layer: index building and question answering

mod build;
mod query;

pub use build::{build_index, IndexBuilder};
pub use query::{ask, VerbatimRag, ANSWER_BULLET};
