//! Property tests for chunk layout and reconstruction.

use ragdesk_rag::chunking::{Chunker, FixedSizeChunker, RecursiveChunker, reconstruct};
use ragdesk_rag::document::{Chunk, Document};
use proptest::prelude::*;

/// Sizes and an overlap strictly smaller than the size.
fn arb_sizes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..64).prop_flat_map(|size| (Just(size), 0..size))
}

/// Text mixing words, separators and multi-byte characters.
fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "\\PC{0,300}",
        proptest::collection::vec(
            prop_oneof![
                "[a-zA-Z]{1,12}",
                Just(" ".to_string()),
                Just(". ".to_string()),
                Just("\n".to_string()),
                Just("\n\n".to_string()),
                Just("。".to_string()),
                "[你好世界文档]{1,6}",
            ],
            0..80,
        )
        .prop_map(|parts| parts.concat()),
    ]
}

fn check_layout(text: &str, size: usize, overlap: usize, chunks: &[Chunk]) -> Result<(), TestCaseError> {
    let len = text.chars().count();
    if len == 0 {
        prop_assert!(chunks.is_empty());
        return Ok(());
    }
    prop_assert!(!chunks.is_empty());
    prop_assert_eq!(chunks[0].offset_start, 0);
    prop_assert_eq!(chunks[0].overlap_with_previous, 0);
    prop_assert_eq!(chunks[chunks.len() - 1].offset_end, len);

    for chunk in chunks {
        prop_assert!(chunk.char_len() <= size, "chunk of {} chars exceeds {}", chunk.char_len(), size);
        prop_assert!(chunk.char_len() > 0);
        prop_assert_eq!(chunk.text.chars().count(), chunk.char_len());
    }
    for pair in chunks.windows(2) {
        prop_assert_eq!(pair[1].offset_start, pair[0].offset_end - overlap);
        prop_assert_eq!(pair[1].overlap_with_previous, overlap);
        prop_assert!(pair[1].offset_end > pair[0].offset_end);
    }
    prop_assert_eq!(reconstruct(chunks), text);
    Ok(())
}

/// *For any* text and valid `(chunk_size, chunk_overlap)`, the fixed-size
/// chunker covers the text with windows of at most `chunk_size` characters,
/// consecutive windows share exactly `chunk_overlap` characters, and
/// dropping overlaps rebuilds the text.
mod prop_fixed_chunker_layout {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn windows_cover_text_and_reconstruct(text in arb_text(), (size, overlap) in arb_sizes()) {
            let chunker = FixedSizeChunker::try_new(size, overlap).unwrap();
            let chunks = chunker.chunk(&Document::new("doc", text.clone()));
            check_layout(&text, size, overlap, &chunks)?;
        }
    }
}

/// *For any* text and valid `(chunk_size, chunk_overlap)`, the recursive
/// chunker keeps the same guarantees while moving cuts to separators.
mod prop_recursive_chunker_layout {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn windows_cover_text_and_reconstruct(text in arb_text(), (size, overlap) in arb_sizes()) {
            let chunker = RecursiveChunker::try_new(size, overlap).unwrap();
            let chunks = chunker.chunk(&Document::new("doc", text.clone()));
            check_layout(&text, size, overlap, &chunks)?;
        }

        #[test]
        fn chunk_ids_are_unique_and_ordered(text in arb_text(), (size, overlap) in arb_sizes()) {
            let chunker = RecursiveChunker::try_new(size, overlap).unwrap();
            let chunks = chunker.chunk(&Document::new("doc.pdf", text));
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(&chunk.id, &format!("doc.pdf#{i}"));
                prop_assert_eq!(chunk.document_id.as_str(), "doc.pdf");
            }
        }
    }
}

#[test]
fn recursive_chunker_prefers_paragraph_breaks() {
    let text = "First paragraph here.\n\nSecond paragraph follows with more words.";
    let chunker = RecursiveChunker::try_new(40, 5).unwrap();
    let chunks = chunker.split_text(text);
    assert_eq!(chunks[0], "First paragraph here.\n\n");
    assert_eq!(reconstruct(&chunker.chunk(&Document::new("d", text))), text);
}
