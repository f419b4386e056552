//! Property and scenario tests for chunking.

use std::collections::HashMap;

use pdfqa_rag::chunking::{Chunker, FixedSizeChunker, PAGE_SEPARATOR, RecursiveChunker};
use pdfqa_rag::document::{Chunk, META_PAGE, META_PAGE_END, META_SOURCE, META_START_INDEX, Page};
use proptest::prelude::*;

fn pages(document: &str, texts: &[String]) -> Vec<Page> {
    texts.iter().enumerate().map(|(i, t)| Page::new(document, i, t.as_str())).collect()
}

fn joined(texts: &[String]) -> Vec<char> {
    texts.join(PAGE_SEPARATOR).chars().collect()
}

/// Rebuild the document text by dropping each chunk's overlapping head.
fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let skip = if i == 0 { 0 } else { overlap };
        out.extend(chunk.text.chars().skip(skip));
    }
    out
}

fn arb_pages() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-zA-Z]{1,8}([ .\n]{1,2}[a-zA-Z]{1,8}){0,30}", 1..5)
}

fn arb_params() -> impl Strategy<Value = (usize, usize)> {
    (5usize..80).prop_flat_map(|size| (Just(size), 0..size))
}

/// Chunks cover the document exactly once modulo the declared overlap.
mod prop_chunk_coverage {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn recursive_chunks_reconstruct_text_and_respect_bounds(
            texts in arb_pages(),
            (size, overlap) in arb_params(),
        ) {
            let chars = joined(&texts);
            prop_assume!(chars.iter().any(|c| !c.is_whitespace()));
            let chunks = RecursiveChunker::new(size, overlap).chunk("doc.pdf", &pages("doc.pdf", &texts), &HashMap::new());
            let original: String = chars.iter().collect();

            prop_assert!(!chunks.is_empty());
            prop_assert_eq!(reconstruct(&chunks, overlap), original);

            for chunk in &chunks {
                prop_assert!(chunk.char_len() <= size);
                let expected: String =
                    chars[chunk.start_index..chunk.start_index + chunk.char_len()].iter().collect();
                prop_assert_eq!(&chunk.text, &expected);
            }

            for pair in chunks.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert_eq!(b.start_index, a.start_index + a.char_len() - overlap);
                let tail: String = a.text.chars().skip(a.char_len() - overlap).collect();
                let head: String = b.text.chars().take(overlap).collect();
                prop_assert_eq!(tail, head);
            }
        }

        #[test]
        fn page_metadata_is_ordered_and_in_range(
            texts in arb_pages(),
            (size, overlap) in arb_params(),
        ) {
            let chunks = FixedSizeChunker::new(size, overlap).chunk("doc.pdf", &pages("doc.pdf", &texts), &HashMap::new());
            let mut last_page = 0;
            for chunk in &chunks {
                let page: usize = chunk.metadata[META_PAGE].parse().unwrap();
                let page_end: usize = chunk.metadata[META_PAGE_END].parse().unwrap();
                prop_assert_eq!(page, chunk.page);
                prop_assert!(page <= page_end);
                prop_assert!(page_end < texts.len());
                prop_assert!(page >= last_page);
                last_page = page;
            }
        }
    }
}

#[test]
fn sentence_scenario() {
    let pages = vec![Page::new("scenario.pdf", 0, "Alpha Beta Gamma. Delta Epsilon Zeta.")];
    let chunks = RecursiveChunker::new(20, 5).chunk("scenario.pdf", &pages, &HashMap::new());

    let spans: Vec<(usize, usize)> =
        chunks.iter().map(|c| (c.start_index, c.start_index + c.char_len())).collect();
    assert_eq!(spans, vec![(0, 18), (13, 32), (27, 37)]);
    assert_eq!(chunks[0].text, "Alpha Beta Gamma. ");
    assert!(chunks.iter().all(|c| c.char_len() <= 20));
    assert_eq!(&chunks[0].text[13..], &chunks[1].text[..5]);
}

#[test]
fn metadata_is_inherited_and_extended() {
    let metadata = HashMap::from([(META_SOURCE.to_string(), "report.pdf".to_string())]);
    let pages = vec![Page::new("report.pdf", 0, "first page"), Page::new("report.pdf", 1, "second page")];
    let chunks = FixedSizeChunker::new(8, 2).chunk("report.pdf", &pages, &metadata);

    for chunk in &chunks {
        assert_eq!(chunk.metadata[META_SOURCE], "report.pdf");
        assert_eq!(chunk.metadata[META_START_INDEX], chunk.start_index.to_string());
        assert_eq!(chunk.id, format!("report.pdf#{}", chunk.start_index));
    }
    assert_eq!(chunks.first().unwrap().page, 0);
    assert_eq!(chunks.last().unwrap().page, 1);
}

#[test]
fn empty_and_whitespace_documents_yield_no_chunks() {
    let chunker = RecursiveChunker::new(100, 10);
    assert!(chunker.chunk("empty.pdf", &[], &HashMap::new()).is_empty());
    let blank = vec![Page::new("blank.pdf", 0, "   "), Page::new("blank.pdf", 1, "\n")];
    assert!(chunker.chunk("blank.pdf", &blank, &HashMap::new()).is_empty());
}

#[test]
fn pages_of_other_documents_are_ignored() {
    let pages = vec![Page::new("a.pdf", 0, "alpha text"), Page::new("b.pdf", 0, "beta text")];
    let chunks = RecursiveChunker::new(100, 10).chunk("a.pdf", &pages, &HashMap::new());
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "alpha text");
}

#[test]
fn multibyte_text_is_split_on_chars() {
    let text = "สวัสดีครับ ยินดีต้อนรับ ".repeat(10);
    let pages = vec![Page::new("thai.txt", 0, text.clone())];
    let chunks = FixedSizeChunker::new(16, 4).chunk("thai.txt", &pages, &HashMap::new());
    assert!(chunks.iter().all(|c| c.char_len() <= 16));
    assert_eq!(reconstruct(&chunks, 4), text);
}
