//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`]: greedy forward split preferring paragraph, line,
//!   sentence, then word boundaries before a hard cut
//! - [`FixedSizeChunker`]: always cuts at exactly `chunk_size` characters
//!
//! Both concatenate a document's pages (joined by [`PAGE_SEPARATOR`]) and
//! track which page every character came from, so each chunk can be cited
//! by page. Sizes and offsets count `char`s, not bytes.
//!
//! Consecutive chunks share exactly `chunk_overlap` characters: the next
//! chunk starts `chunk_overlap` characters before the previous one ended.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ChunkingStrategy, RagConfig};
use crate::document::{Chunk, META_PAGE, META_PAGE_END, META_START_INDEX, Page};

/// Inserted between consecutive pages; attributed to the earlier page.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// A strategy for splitting the pages of one document into chunks.
pub trait Chunker: Send + Sync {
    /// Split `pages` of the document named `document` into chunks.
    ///
    /// Pages belonging to another document are ignored, so a chunk never
    /// spans two documents. Every chunk inherits `metadata` plus `page`,
    /// `page_end` and `start_index`. Returns an empty `Vec` when the
    /// extracted text is empty or whitespace only.
    fn chunk(
        &self,
        document: &str,
        pages: &[Page],
        metadata: &HashMap<String, String>,
    ) -> Vec<Chunk>;
}

/// Build the chunker selected by `config.chunking`.
pub fn chunker_for(config: &RagConfig) -> Arc<dyn Chunker> {
    match config.chunking {
        ChunkingStrategy::Recursive => {
            Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap))
        }
        ChunkingStrategy::Fixed => {
            Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap))
        }
    }
}

/// Clamp parameters so that `0 <= overlap < size`, which guarantees forward progress.
fn clamp_params(chunk_size: usize, chunk_overlap: usize) -> (usize, usize) {
    let size = chunk_size.max(1);
    (size, chunk_overlap.min(size - 1))
}

/// Splits text with a greedy forward scan that prefers natural boundaries.
///
/// Within each window of `chunk_size` characters the cut is placed at the
/// last paragraph break (`\n\n`); failing that the last line break; then the
/// last sentence end (`.`, `!` or `?` followed by whitespace); then the last
/// whitespace. The separator stays attached to the preceding chunk. With no
/// boundary in the window, the chunk is cut at exactly `chunk_size`.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200);
/// let chunks = chunker.chunk("report.pdf", &pages, &metadata);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive
    ///   chunks; clamped to `chunk_size - 1`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let (chunk_size, chunk_overlap) = clamp_params(chunk_size, chunk_overlap);
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(
        &self,
        document: &str,
        pages: &[Page],
        metadata: &HashMap<String, String>,
    ) -> Vec<Chunk> {
        let text = PageText::new(document, pages);
        let spans = split_spans(&text.chars, self.chunk_size, self.chunk_overlap, true);
        text.into_chunks(document, spans, metadata)
    }
}

/// Splits text into fixed-size windows by character count with overlap.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive
    ///   chunks; clamped to `chunk_size - 1`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let (chunk_size, chunk_overlap) = clamp_params(chunk_size, chunk_overlap);
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(
        &self,
        document: &str,
        pages: &[Page],
        metadata: &HashMap<String, String>,
    ) -> Vec<Chunk> {
        let text = PageText::new(document, pages);
        let spans = split_spans(&text.chars, self.chunk_size, self.chunk_overlap, false);
        text.into_chunks(document, spans, metadata)
    }
}

/// Concatenated page text with a character → page mapping.
struct PageText {
    chars: Vec<char>,
    /// Offset of the first character of each page, ascending.
    page_starts: Vec<usize>,
    /// Page index for each entry of `page_starts`.
    page_indices: Vec<usize>,
}

impl PageText {
    fn new(document: &str, pages: &[Page]) -> Self {
        let mut chars = Vec::new();
        let mut page_starts = Vec::new();
        let mut page_indices = Vec::new();

        for page in pages.iter().filter(|p| p.document == document) {
            if !page_starts.is_empty() {
                chars.extend(PAGE_SEPARATOR.chars());
            }
            page_starts.push(chars.len());
            page_indices.push(page.index);
            chars.extend(page.text.chars());
        }

        if chars.iter().all(|c| c.is_whitespace()) {
            chars.clear();
        }

        Self { chars, page_starts, page_indices }
    }

    /// Page index owning the character at `offset`.
    fn page_at(&self, offset: usize) -> usize {
        let slot = self.page_starts.partition_point(|&start| start <= offset);
        self.page_indices[slot.saturating_sub(1)]
    }

    fn into_chunks(
        self,
        document: &str,
        spans: Vec<(usize, usize)>,
        metadata: &HashMap<String, String>,
    ) -> Vec<Chunk> {
        spans
            .into_iter()
            .map(|(start, end)| {
                let page = self.page_at(start);
                let page_end = self.page_at(end - 1);

                let mut metadata = metadata.clone();
                metadata.insert(META_PAGE.to_string(), page.to_string());
                metadata.insert(META_PAGE_END.to_string(), page_end.to_string());
                metadata.insert(META_START_INDEX.to_string(), start.to_string());

                Chunk {
                    id: format!("{document}#{start}"),
                    text: self.chars[start..end].iter().collect(),
                    start_index: start,
                    page,
                    document: document.to_string(),
                    metadata,
                }
            })
            .collect()
    }
}

/// Compute `(start, end)` character spans covering `chars`.
///
/// Requires `chunk_overlap < chunk_size`. Every span is at most `chunk_size`
/// long and each span after the first starts exactly `chunk_overlap`
/// characters before the previous span's end.
fn split_spans(
    chars: &[char],
    chunk_size: usize,
    chunk_overlap: usize,
    natural_boundaries: bool,
) -> Vec<(usize, usize)> {
    let len = chars.len();
    let mut spans = Vec::new();
    if len == 0 {
        return spans;
    }

    let mut start = 0;
    loop {
        if len - start <= chunk_size {
            spans.push((start, len));
            break;
        }

        let hard_end = start + chunk_size;
        // Cutting at or before start + overlap would not move the next start forward.
        let min_end = start + chunk_overlap + 1;
        let end = if natural_boundaries {
            find_boundary(chars, min_end, hard_end).unwrap_or(hard_end)
        } else {
            hard_end
        };

        spans.push((start, end));
        start = end - chunk_overlap;
    }

    spans
}

type BoundaryTest = fn(&[char], usize) -> bool;

fn is_paragraph_end(chars: &[char], end: usize) -> bool {
    end >= 2 && chars[end - 2] == '\n' && chars[end - 1] == '\n'
}

fn is_line_end(chars: &[char], end: usize) -> bool {
    chars[end - 1] == '\n'
}

fn is_sentence_end(chars: &[char], end: usize) -> bool {
    end >= 2 && matches!(chars[end - 2], '.' | '!' | '?') && chars[end - 1].is_whitespace()
}

fn is_word_end(chars: &[char], end: usize) -> bool {
    chars[end - 1].is_whitespace()
}

/// The last cut position in `min_end..=max_end` at the highest boundary level present.
fn find_boundary(chars: &[char], min_end: usize, max_end: usize) -> Option<usize> {
    const LEVELS: [BoundaryTest; 4] = [is_paragraph_end, is_line_end, is_sentence_end, is_word_end];

    LEVELS.iter().find_map(|is_boundary| {
        (min_end..=max_end).rev().find(|&end| is_boundary(chars, end))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn short_text_is_one_span() {
        assert_eq!(split_spans(&chars("hello"), 10, 3, true), vec![(0, 5)]);
    }

    #[test]
    fn prefers_sentence_over_word_boundary() {
        let text = chars("Alpha Beta Gamma. Delta Epsilon Zeta.");
        let spans = split_spans(&text, 20, 5, true);
        assert_eq!(spans[0], (0, 18));
        assert_eq!(spans[1].0, 13);
    }

    #[test]
    fn paragraph_boundary_wins_over_later_sentence() {
        let text = chars("One two.\n\nThree. Four five six");
        let spans = split_spans(&text, 20, 2, true);
        assert_eq!(spans[0], (0, 10));
    }

    #[test]
    fn hard_cut_without_boundaries() {
        let text = chars("abcdefghijklmnopqrstuvwxyz");
        let spans = split_spans(&text, 10, 3, true);
        assert_eq!(spans, vec![(0, 10), (7, 17), (14, 24), (21, 26)]);
    }

    #[test]
    fn page_lookup_follows_page_starts() {
        let pages = vec![Page::new("doc", 0, "first"), Page::new("doc", 1, "second")];
        let text = PageText::new("doc", &pages);
        assert_eq!(text.page_at(0), 0);
        // separator characters belong to the earlier page
        assert_eq!(text.page_at(6), 0);
        assert_eq!(text.page_at(7), 1);
    }

    #[test]
    fn whitespace_only_pages_yield_no_text() {
        let pages = vec![Page::new("doc", 0, "  \n"), Page::new("doc", 1, "\t")];
        assert!(PageText::new("doc", &pages).chars.is_empty());
    }
}
