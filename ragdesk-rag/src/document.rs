//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source document containing extracted text and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document (the uploaded file name).
    pub id: String,
    /// The extracted text content of the document.
    pub text: String,
    /// Key-value metadata associated with the document.
    pub metadata: HashMap<String, String>,
    /// Optional URI pointing to the original source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new(), source_uri: None }
    }
}

/// A segment of a [`Document`] with its vector embedding.
///
/// Offsets count characters (not bytes) of the parent document text;
/// `offset_end` is exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk, `{document_id}#{index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Character offset of the first character in the parent document.
    pub offset_start: usize,
    /// Character offset one past the last character in the parent document.
    pub offset_end: usize,
    /// Number of leading characters shared with the previous chunk.
    pub overlap_with_previous: usize,
    /// The vector embedding for this chunk's text. Empty until embedded.
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Key-value metadata inherited from the parent document plus chunk-specific fields.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

impl Chunk {
    /// Number of characters in the chunk.
    pub fn char_len(&self) -> usize {
        self.offset_end - self.offset_start
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
