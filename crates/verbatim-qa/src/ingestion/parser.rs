//! PDF text extraction

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};

/// How long pdf-extract may run before falling back to lopdf
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Common Unicode glyph name mappings for PDF fonts
fn get_unicode_glyph_map() -> HashMap<&'static str, char> {
    let mut map = HashMap::new();
    // Hyphens and dashes
    map.insert("uni2010", '\u{2010}');
    map.insert("uni2011", '\u{2011}');
    map.insert("uni2013", '\u{2013}');
    map.insert("uni2014", '\u{2014}');
    // Quotation marks
    map.insert("uni2018", '\u{2018}');
    map.insert("uni2019", '\u{2019}');
    map.insert("uni201C", '\u{201C}');
    map.insert("uni201D", '\u{201D}');
    // Bullets and symbols
    map.insert("uni2022", '\u{2022}');
    map.insert("uni2026", '\u{2026}');
    // Spaces
    map.insert("uni00A0", '\u{00A0}');
    // Currency
    map.insert("uni20AC", '\u{20AC}');
    map.insert("uni20B9", '\u{20B9}'); // Rupee
    // Ligatures
    map.insert("f_i", '\u{FB01}');
    map.insert("f_l", '\u{FB02}');
    map.insert("f_f", '\u{FB00}');
    map
}

/// Clean up PDF text: glyph names, ligatures, stray NULs and blank lines
fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.to_string();

    for (glyph_name, char_value) in &get_unicode_glyph_map() {
        for pattern in [format!("({})", glyph_name), format!("<{}>", glyph_name)] {
            result = result.replace(&pattern, &char_value.to_string());
        }
    }

    // Bullets are kept as-is: answers quote the text verbatim
    result = result
        .replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    result
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of one PDF page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Cleaned text content of the page
    pub content: String,
}

/// Parsed PDF with page-level text
#[derive(Debug, Clone)]
pub struct ParsedPdf {
    /// Non-empty pages in order
    pub pages: Vec<PageContent>,
    /// Total pages in the file, including pages without text
    pub total_pages: u32,
    /// SHA-256 of the extracted text
    pub content_hash: String,
}

impl ParsedPdf {
    /// All page text joined together
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// PDF parser built on pdf-extract with a lopdf fallback
pub struct PdfParser;

impl PdfParser {
    /// Parse PDF bytes into per-page text
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedPdf> {
        let raw_pages = match Self::extract_pages_with_timeout(data) {
            Ok(pages) if pages.iter().any(|p| !p.trim().is_empty()) => pages,
            Ok(_) => {
                tracing::warn!("pdf-extract found no text in {}, trying lopdf", filename);
                Self::extract_pages_fallback(filename, data)?
            }
            Err(e) => {
                tracing::warn!("pdf-extract failed on {}: {}, trying lopdf", filename, e);
                Self::extract_pages_fallback(filename, data)?
            }
        };

        let total_pages = raw_pages.len() as u32;
        let pages: Vec<PageContent> = raw_pages
            .iter()
            .enumerate()
            .map(|(i, text)| PageContent {
                page_number: i as u32 + 1,
                content: cleanup_pdf_text(text),
            })
            .filter(|p| !p.content.is_empty())
            .collect();

        if pages.is_empty() {
            return Err(Error::file_parse(
                filename,
                "No text content could be extracted (the PDF may be scanned or encrypted)",
            ));
        }

        let mut parsed = ParsedPdf {
            pages,
            total_pages,
            content_hash: String::new(),
        };
        parsed.content_hash = hash_content(&parsed.full_text());
        Ok(parsed)
    }

    /// Run pdf-extract on a worker thread so a pathological font cannot hang the build
    fn extract_pages_with_timeout(data: &[u8]) -> Result<Vec<String>> {
        use std::sync::mpsc;
        use std::thread;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem_by_pages(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(EXTRACT_TIMEOUT) {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(Error::internal(e.to_string())),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Error::internal(format!(
                "extraction timed out after {}s",
                EXTRACT_TIMEOUT.as_secs()
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(Error::internal("extraction thread panicked"))
            }
        }
    }

    /// Page-by-page extraction through lopdf
    fn extract_pages_fallback(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let pages = doc.get_pages();
        let mut texts = Vec::with_capacity(pages.len());
        for page_num in pages.keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    tracing::debug!("No text on page {} of {}: {}", page_num, filename, e);
                    texts.push(String::new());
                }
            }
        }

        Ok(texts)
    }
}

/// Hash content for change detection
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
