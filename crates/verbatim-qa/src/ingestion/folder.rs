//! The documents folder: where uploaded PDFs live

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::StoredFile;

/// A directory of PDF files, named by their upload filename
#[derive(Debug, Clone)]
pub struct DocumentFolder {
    dir: PathBuf,
}

impl DocumentFolder {
    /// Wrap a directory; nothing is touched until [`ensure_exists`](Self::ensure_exists)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The folder path
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Create the folder if absent
    pub fn ensure_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Sorted `*.pdf` files directly inside the folder
    pub fn pdf_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut pdfs = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if entry.file_type().is_file() && is_pdf(entry.path()) {
                pdfs.push(entry.into_path());
            }
        }
        pdfs.sort();
        Ok(pdfs)
    }

    /// List stored PDFs with size and modification time
    pub fn list(&self) -> Result<Vec<StoredFile>> {
        let mut files = Vec::new();
        for path in self.pdf_paths()? {
            let meta = std::fs::metadata(&path)?;
            files.push(StoredFile {
                filename: file_name(&path),
                size: meta.len(),
                modified_at: meta.modified().ok().map(chrono::DateTime::from),
            });
        }
        Ok(files)
    }

    /// Write an uploaded PDF, replacing any file with the same name
    pub fn save(&self, filename: &str, data: &[u8]) -> Result<PathBuf> {
        let name = sanitize_filename(filename)?;
        self.ensure_exists()?;

        let path = self.dir.join(&name);
        std::fs::write(&path, data)?;
        tracing::info!("Saved {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }
}

/// Whether the path has a `.pdf` extension (any case)
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reduce an upload filename to a bare `*.pdf` name
fn sanitize_filename(filename: &str) -> Result<String> {
    let invalid = |reason: &str| Error::InvalidUpload {
        filename: filename.to_string(),
        reason: reason.to_string(),
    };

    // Browsers may send a full client path; keep only the last component
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if name.is_empty() || name.starts_with('.') {
        return Err(invalid("empty or hidden file name"));
    }
    if !is_pdf(Path::new(name)) {
        return Err(invalid("only .pdf files are accepted"));
    }

    Ok(name.to_string())
}
