//! Document ingestion: the documents folder, PDF parsing and passage chunking

mod chunker;
mod folder;
mod parser;
mod processor;

pub use chunker::TextChunker;
pub use folder::{is_pdf, DocumentFolder};
pub use parser::{hash_content, PageContent, ParsedPdf, PdfParser};
pub use processor::{DocumentProcessor, PdfProcessor};
