//! Index builder: documents folder → processed documents → index file

use std::path::{Path, PathBuf};

use crate::config::{resolve_path, IndexConfig};
use crate::error::{Error, Result};
use crate::ingestion::{DocumentFolder, DocumentProcessor, PdfProcessor};
use crate::storage::{IndexFactory, IndexStore, SqliteIndexFactory};
use crate::types::{DocumentMetadata, ProcessedDocument, SOURCE_KEY};

/// Builds an index from every PDF in a folder
pub struct IndexBuilder<P, F> {
    processor: P,
    factory: F,
}

impl<P, F> IndexBuilder<P, F>
where
    P: DocumentProcessor,
    F: IndexFactory,
{
    pub fn new(processor: P, factory: F) -> Self {
        Self { processor, factory }
    }

    /// Build the index at `db_path` from the PDFs in `docs_dir`
    ///
    /// The index is staged next to `db_path` and renamed into place only once
    /// every document was added, so an existing index survives a failed build.
    pub fn build(&self, docs_dir: &Path, db_path: &Path) -> Result<PathBuf> {
        let docs_dir = resolve_path(docs_dir)?;
        let db_path = resolve_path(db_path)?;

        let pdfs = DocumentFolder::new(&docs_dir).pdf_paths()?;
        if pdfs.is_empty() {
            return Err(Error::NoDocuments { dir: docs_dir });
        }

        tracing::info!("Building index from {} PDFs in {}", pdfs.len(), docs_dir.display());

        let mut docs: Vec<ProcessedDocument> = Vec::with_capacity(pdfs.len());
        for (i, path) in pdfs.iter().enumerate() {
            let title = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let mut metadata = DocumentMetadata::new();
            metadata.insert(
                SOURCE_KEY.to_string(),
                serde_json::Value::String(path.display().to_string()),
            );

            tracing::info!("[{}/{}] Processing {}", i + 1, pdfs.len(), title);
            docs.push(self.processor.process_file(path, &title, metadata)?);
        }

        let parent = db_path
            .parent()
            .ok_or_else(|| Error::index(format!("Invalid index path {}", db_path.display())))?;
        std::fs::create_dir_all(parent)?;

        let staging = tempfile::Builder::new()
            .prefix(".index-")
            .suffix(".db.tmp")
            .tempfile_in(parent)?;

        let mut store = self.factory.create(staging.path())?;
        let passages = store.add_documents(&docs)?;
        store.finish()?;

        staging
            .persist(&db_path)
            .map_err(|e| Error::index(format!("Failed to move index into place: {}", e.error)))?;

        tracing::info!(
            "Index built at {}: {} documents, {} passages",
            db_path.display(),
            docs.len(),
            passages
        );

        Ok(db_path)
    }
}

/// Build an index with the PDF processor and the SQLite index
pub fn build_index(docs_dir: &Path, db_path: &Path, config: &IndexConfig) -> Result<PathBuf> {
    IndexBuilder::new(
        PdfProcessor::from_config(config),
        SqliteIndexFactory::new(config.sparse_model.clone()),
    )
    .build(docs_dir, db_path)
}
