//! Storage module for the sparse index
//!
//! Provides SQLite/FTS5 persistence for processed documents and passages.

mod index;

pub use index::{
    IndexFactory, IndexStats, IndexStore, SqliteIndexFactory, VerbatimIndex, SCHEMA_VERSION,
};
