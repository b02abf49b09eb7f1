//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`] - splits by character count with configurable overlap
//! - [`RecursiveChunker`] - same windows, but each cut is pulled back to the
//!   nearest paragraph, line, sentence or word boundary
//!
//! Both count characters, not bytes, and share the same guarantees: no chunk
//! is longer than `chunk_size`, consecutive chunks share exactly
//! `chunk_overlap` characters, and the last chunk ends at the end of the text.
//! Dropping each chunk's overlap and concatenating therefore rebuilds the
//! input (see [`reconstruct`]).

use crate::config::validate_chunking;
use crate::document::{Chunk, Document};
use crate::error::Result;

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text, offsets and metadata but no
/// embeddings. Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;

    /// Split bare text, returning only the chunk strings.
    fn split_text(&self, text: &str) -> Vec<String> {
        self.chunk(&Document::new("text", text)).into_iter().map(|c| c.text).collect()
    }
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Chunk IDs are generated as `{document_id}#{chunk_index}`. Each chunk inherits
/// the parent document's metadata plus a `chunk_index` field.
///
/// # Example
///
/// ```rust,ignore
/// use ragdesk_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::try_new(1000, 200)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if
    /// `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    pub fn try_new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = CharText::new(&document.text);
        let windows = plan_windows(&text, self.chunk_size, self.chunk_overlap, |_, end| end);
        build_chunks(document, &text, &windows)
    }
}

/// Separators tried, in order, when looking for a cut point.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", "。", ". ", " "];

/// Splits text at natural boundaries: paragraphs → lines → sentences → words.
///
/// Every window is at most `chunk_size` characters. Instead of cutting at the
/// window end, the cut is moved back to just after the last separator found in
/// the second half of the window (trying `"\n\n"`, `"\n"`, `"。"`, `". "`,
/// `" "` in that order). When no separator qualifies the window is cut hard.
/// Overlap is then applied exactly as in [`FixedSizeChunker`].
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if
    /// `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    pub fn try_new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Pick the cut point for the window `[start, end)`.
    fn cut_point(&self, text: &CharText<'_>, start: usize, end: usize) -> usize {
        let min_len = self.chunk_overlap.max(self.chunk_size / 2);
        let window = text.slice(start, end);
        for separator in SEPARATORS {
            if let Some(pos) = window.rfind(separator) {
                let cut = start + window[..pos + separator.len()].chars().count();
                if cut - start > min_len {
                    return cut;
                }
            }
        }
        end
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = CharText::new(&document.text);
        let windows = plan_windows(&text, self.chunk_size, self.chunk_overlap, |start, end| {
            self.cut_point(&text, start, end)
        });
        build_chunks(document, &text, &windows)
    }
}

/// Rebuild the source text from one document's chunks by dropping each
/// chunk's overlap with its predecessor.
pub fn reconstruct(chunks: &[Chunk]) -> String {
    let mut text = String::new();
    for chunk in chunks {
        text.extend(chunk.text.chars().skip(chunk.overlap_with_previous));
    }
    text
}

/// Text indexed by character position.
struct CharText<'a> {
    text: &'a str,
    /// Byte offset of every character, plus `text.len()` as a sentinel.
    bounds: Vec<usize>,
}

impl<'a> CharText<'a> {
    fn new(text: &'a str) -> Self {
        let bounds = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        Self { text, bounds }
    }

    fn char_len(&self) -> usize {
        self.bounds.len() - 1
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.bounds[start]..self.bounds[end]]
    }
}

/// Lay out `[start, end)` character windows over `text`.
///
/// `cut` may move a non-final window's end backwards; it must return a value
/// in `(start + overlap, end]` for the loop to make progress, anything else
/// falls back to `end`.
fn plan_windows(
    text: &CharText<'_>,
    chunk_size: usize,
    chunk_overlap: usize,
    cut: impl Fn(usize, usize) -> usize,
) -> Vec<(usize, usize)> {
    let len = text.char_len();
    let mut windows = Vec::new();
    if len == 0 {
        return windows;
    }

    let mut start = 0;
    loop {
        let end = start + chunk_size;
        if end >= len {
            windows.push((start, len));
            break;
        }
        let proposed = cut(start, end);
        let end = if proposed > start + chunk_overlap && proposed <= end { proposed } else { end };
        windows.push((start, end));
        start = end - chunk_overlap;
    }
    windows
}

fn build_chunks(document: &Document, text: &CharText<'_>, windows: &[(usize, usize)]) -> Vec<Chunk> {
    let mut previous_end = None;
    windows
        .iter()
        .enumerate()
        .map(|(chunk_index, &(start, end))| {
            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), chunk_index.to_string());
            let overlap_with_previous = previous_end.map_or(0, |prev: usize| prev - start);
            previous_end = Some(end);
            Chunk {
                id: format!("{}#{chunk_index}", document.id),
                text: text.slice(start, end).to_string(),
                offset_start: start,
                offset_end: end,
                overlap_with_previous,
                embedding: Vec::new(),
                metadata,
                document_id: document.id.clone(),
            }
        })
        .collect()
}
