//! SQLite-backed sparse index
//!
//! The whole index is one SQLite file. Passages live in a content table that
//! an FTS5 table mirrors through triggers; ranking is FTS5's BM25.

use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::retrieval::{fts_match_expression, query_terms};
use crate::types::{ProcessedDocument, RetrievedPassage};

/// On-disk schema version
pub const SCHEMA_VERSION: i64 = 1;

/// Sink for processed documents while an index is being built
pub trait IndexStore {
    /// Add documents; returns the number of passages stored
    fn add_documents(&mut self, docs: &[ProcessedDocument]) -> Result<usize>;

    /// Flush and close the store so the file can be moved into place
    fn finish(self) -> Result<()>
    where
        Self: Sized;
}

/// Creates an [`IndexStore`] at a given path
pub trait IndexFactory {
    type Store: IndexStore;

    /// Create a fresh store backed by `path`
    fn create(&self, path: &Path) -> Result<Self::Store>;
}

/// Summary of an index file
#[derive(Debug, Clone, serde::Serialize)]
pub struct IndexStats {
    pub sparse_model: String,
    pub documents: usize,
    pub passages: usize,
    pub built_at: Option<String>,
}

/// Sparse retrieval index over processed documents
pub struct VerbatimIndex {
    conn: Mutex<Connection>,
    path: PathBuf,
    sparse_model: String,
}

impl VerbatimIndex {
    /// Create (or extend) a writable index at `path`
    pub fn create<P: AsRef<Path>>(sparse_model: &str, path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| Error::index(format!("Failed to open {}: {}", path.display(), e)))?;

        let index = Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
            sparse_model: sparse_model.to_string(),
        };
        index.migrate()?;
        Ok(index)
    }

    /// Open an existing index read-only
    pub fn open<P: AsRef<Path>>(sparse_model: &str, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::IndexNotFound { path: path.to_path_buf() });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| Error::index(format!("Failed to open {}: {}", path.display(), e)))?;

        let index = Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
            sparse_model: sparse_model.to_string(),
        };
        index.check_meta()?;
        Ok(index)
    }

    /// Create an in-memory index (for testing)
    #[cfg(test)]
    pub fn in_memory(sparse_model: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let index = Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
            sparse_model: sparse_model.to_string(),
        };
        index.migrate()?;
        Ok(index)
    }

    /// Run schema migrations and record build metadata
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                source TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                total_pages INTEGER,
                metadata TEXT,
                processed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS passages (
                pk INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                document_id TEXT NOT NULL REFERENCES documents(id),
                passage_index INTEGER NOT NULL,
                page_number INTEGER,
                content TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_passages_document_id ON passages(document_id);

            CREATE VIRTUAL TABLE IF NOT EXISTS passages_fts USING fts5(
                content,
                content='passages',
                content_rowid='pk',
                tokenize='porter unicode61'
            );

            CREATE TRIGGER IF NOT EXISTS passages_ai AFTER INSERT ON passages BEGIN
                INSERT INTO passages_fts(rowid, content) VALUES (NEW.pk, NEW.content);
            END;

            CREATE TRIGGER IF NOT EXISTS passages_ad AFTER DELETE ON passages BEGIN
                INSERT INTO passages_fts(passages_fts, rowid, content) VALUES ('delete', OLD.pk, OLD.content);
            END;
            "#,
        )
        .map_err(|e| Error::index(format!("Failed to create schema: {}", e)))?;

        let now = chrono::Utc::now().to_rfc3339();
        for (key, value) in [
            ("schema_version", SCHEMA_VERSION.to_string()),
            ("sparse_model", self.sparse_model.clone()),
            ("built_at", now),
        ] {
            conn.execute(
                "INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }

        Ok(())
    }

    /// Validate schema version and compare the recorded sparse model
    fn check_meta(&self) -> Result<()> {
        let version = self
            .meta("schema_version")?
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| {
                Error::index(format!("{} is not a verbatim index", self.path.display()))
            })?;

        if version > SCHEMA_VERSION {
            return Err(Error::index(format!(
                "Index schema v{} is newer than supported v{}",
                version, SCHEMA_VERSION
            )));
        }

        if let Some(built_with) = self.meta("sparse_model")? {
            if built_with != self.sparse_model {
                tracing::warn!(
                    "Index {} was built with sparse model '{}', configured '{}'",
                    self.path.display(),
                    built_with,
                    self.sparse_model
                );
            }
        }

        Ok(())
    }

    fn meta(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::index(format!("Failed to read index metadata: {}", e)))?;
        Ok(value)
    }

    /// Path of the index file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sparse model this handle was configured with
    pub fn sparse_model(&self) -> &str {
        &self.sparse_model
    }

    /// Add documents and their passages in one transaction
    pub fn add_documents(&self, docs: &[ProcessedDocument]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut passages = 0usize;

        {
            let mut doc_stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO documents (
                    id, title, source, content_hash, total_pages, metadata, processed_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            let mut passage_stmt = tx.prepare(
                r#"
                INSERT INTO passages (id, document_id, passage_index, page_number, content)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;

            for doc in docs {
                doc_stmt.execute(params![
                    doc.id.to_string(),
                    doc.title,
                    doc.source(),
                    doc.content_hash,
                    doc.total_pages.map(|p| p as i64),
                    serde_json::to_string(&doc.metadata)?,
                    doc.processed_at.to_rfc3339(),
                ])?;

                for passage in &doc.passages {
                    passage_stmt.execute(params![
                        passage.id.to_string(),
                        doc.id.to_string(),
                        passage.index as i64,
                        passage.page_number.map(|p| p as i64),
                        passage.content,
                    ])?;
                    passages += 1;
                }
            }
        }

        tx.commit()?;
        Ok(passages)
    }

    /// BM25 search for the `k` best passages
    pub fn search(&self, question: &str, k: usize) -> Result<Vec<RetrievedPassage>> {
        let Some(expr) = fts_match_expression(&query_terms(question)) else {
            tracing::debug!("No searchable terms in question");
            return Ok(Vec::new());
        };

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT
                p.id, p.document_id, p.page_number, p.content,
                d.title, d.source,
                bm25(passages_fts) AS score
            FROM passages_fts f
            JOIN passages p ON p.pk = f.rowid
            JOIN documents d ON d.id = p.document_id
            WHERE passages_fts MATCH ?1
            ORDER BY score
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![expr, k as i64], |row| {
            let id: String = row.get(0)?;
            let document_id: String = row.get(1)?;
            let page_number: Option<i64> = row.get(2)?;
            let score: f64 = row.get(6)?;

            Ok(RetrievedPassage {
                passage_id: Uuid::parse_str(&id).unwrap_or_default(),
                document_id: Uuid::parse_str(&document_id).unwrap_or_default(),
                page_number: page_number.map(|p| p as u32),
                content: row.get(3)?,
                title: row.get(4)?,
                source: row.get(5)?,
                score: -score as f32, // BM25 is negative, lower is better
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Document and passage counts plus build metadata
    pub fn stats(&self) -> Result<IndexStats> {
        let (documents, passages) = {
            let conn = self.conn.lock();
            let documents: i64 =
                conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
            let passages: i64 =
                conn.query_row("SELECT COUNT(*) FROM passages", [], |row| row.get(0))?;
            (documents as usize, passages as usize)
        };

        Ok(IndexStats {
            sparse_model: self
                .meta("sparse_model")?
                .unwrap_or_else(|| self.sparse_model.clone()),
            documents,
            passages,
            built_at: self.meta("built_at")?,
        })
    }

    /// Close the underlying connection, surfacing any flush error
    pub fn close(self) -> Result<()> {
        self.conn
            .into_inner()
            .close()
            .map_err(|(_, e)| Error::index(format!("Failed to close index: {}", e)))
    }
}

impl IndexStore for VerbatimIndex {
    fn add_documents(&mut self, docs: &[ProcessedDocument]) -> Result<usize> {
        VerbatimIndex::add_documents(self, docs)
    }

    fn finish(self) -> Result<()> {
        self.close()
    }
}

/// Factory producing SQLite indexes tagged with a sparse model
#[derive(Debug, Clone)]
pub struct SqliteIndexFactory {
    sparse_model: String,
}

impl SqliteIndexFactory {
    pub fn new(sparse_model: impl Into<String>) -> Self {
        Self {
            sparse_model: sparse_model.into(),
        }
    }
}

impl IndexFactory for SqliteIndexFactory {
    type Store = VerbatimIndex;

    fn create(&self, path: &Path) -> Result<VerbatimIndex> {
        VerbatimIndex::create(&self.sparse_model, path)
    }
}
