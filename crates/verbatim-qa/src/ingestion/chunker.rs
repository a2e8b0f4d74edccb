//! Page-aware passage chunking

use unicode_segmentation::UnicodeSegmentation;

use crate::types::{Passage, ProcessedDocument};
use super::parser::PageContent;

/// Sentence-respecting chunker with configurable size and overlap
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize, min_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap: overlap.min(chunk_size / 2),
            min_size,
        }
    }

    /// Chunk every page of a document; passages never cross page boundaries
    pub fn chunk_pages(&self, doc: &ProcessedDocument, pages: &[PageContent]) -> Vec<Passage> {
        let mut passages = Vec::new();
        for page in pages {
            for text in self.chunk_text(&page.content) {
                let index = passages.len() as u32;
                passages.push(Passage::new(doc.id, index, Some(page.page_number), text));
            }
        }
        passages
    }

    /// Split text into overlapping chunks along sentence boundaries
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in text.split_sentence_bounds() {
            if !current.is_empty() && current.len() + sentence.len() > self.chunk_size {
                self.push_chunk(&mut chunks, &current);
                current = self.get_overlap_text(&current);
            }
            current.push_str(sentence);
        }
        self.push_chunk(&mut chunks, &current);

        chunks
    }

    fn push_chunk(&self, chunks: &mut Vec<String>, text: &str) {
        let trimmed = text.trim();
        if trimmed.len() >= self.min_size {
            chunks.push(trimmed.to_string());
        }
    }

    /// Get overlap text from the end of a chunk
    fn get_overlap_text(&self, text: &str) -> String {
        let tail = text.trim_end();
        if self.overlap == 0 || tail.is_empty() {
            return String::new();
        }
        if tail.len() <= self.overlap {
            return format!("{} ", tail);
        }

        let mut start = tail.len() - self.overlap;
        while start > 0 && !tail.is_char_boundary(start) {
            start -= 1;
        }
        let overlap_text = &tail[start..];

        // Prefer starting at a sentence, then a word
        let carried = if let Some(pos) = overlap_text.find(". ") {
            &overlap_text[pos + 2..]
        } else if let Some(pos) = overlap_text.find(' ') {
            &overlap_text[pos + 1..]
        } else {
            overlap_text
        };

        if carried.is_empty() {
            String::new()
        } else {
            format!("{} ", carried)
        }
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(1024, 200, 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::default();
        let chunks = chunker.chunk_text("The repo rate was kept unchanged at 6.5 percent.");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_long_text_splits_on_sentences() {
        let chunker = TextChunker::new(60, 0, 5);
        let text = "First sentence about banks. Second sentence about money. \
                    Third sentence about inflation. Fourth sentence about growth.";
        let chunks = chunker.chunk_text(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.ends_with('.'), "chunk should end at a sentence: {chunk:?}");
        }
    }

    #[test]
    fn test_overlap_carries_context() {
        let chunker = TextChunker::new(40, 15, 5);
        let chunks = chunker.chunk_text("One two three four five six seven. Eight nine ten.");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "One two three four five six seven.");
        assert_eq!(chunks[1], "six seven. Eight nine ten.");
    }

    #[test]
    fn test_tiny_chunks_dropped() {
        let chunker = TextChunker::new(100, 0, 20);
        assert!(chunker.chunk_text("p. 4").is_empty());
    }

    #[test]
    fn test_chunk_pages_keeps_page_numbers() {
        let doc = ProcessedDocument::new("a.pdf", "h".to_string(), DocumentMetadata::new());
        let pages = vec![
            PageContent { page_number: 1, content: "Page one talks about the central bank.".into() },
            PageContent { page_number: 3, content: "Page three talks about currency notes.".into() },
        ];
        let passages = TextChunker::default().chunk_pages(&doc, &pages);

        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].page_number, Some(1));
        assert_eq!(passages[1].page_number, Some(3));
        assert_eq!(passages[1].index, 1);
        assert!(passages.iter().all(|p| p.document_id == doc.id));
    }
}
