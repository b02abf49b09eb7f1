//! Text extraction from uploaded files.
//!
//! [`PdfExtractor`] pulls page-ordered text out of PDFs with `pdf-extract`;
//! [`TextExtractor`] accepts plain text and markdown uploads. The
//! [`ExtractorRegistry`] picks an extractor by file extension and processes a
//! batch in the order given, reporting failures per document.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::{RagError, Result};

/// An uploaded file: its name and raw bytes.
#[derive(Debug, Clone)]
pub struct IngestInput {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl IngestInput {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { filename: filename.into(), bytes: bytes.into() }
    }

    /// Read a file from disk, naming it by its file name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = tokio::fs::read(path).await.map_err(|e| RagError::ExtractionError {
            document: filename.clone(),
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Ok(Self { filename, bytes })
    }
}

/// Turns the bytes of one file into a [`Document`].
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Whether this extractor handles `filename`.
    fn supports(&self, filename: &str) -> bool;

    /// Extract the document text.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ExtractionError`] if the file cannot be parsed.
    async fn extract(&self, input: &IngestInput) -> Result<Document>;
}

fn has_extension(filename: &str, extensions: &[&str]) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

fn document_for(input: &IngestInput, text: String, kind: &str) -> Document {
    let mut document = Document::new(input.filename.clone(), text);
    document.metadata.insert("source".to_string(), input.filename.clone());
    document.metadata.insert("content_type".to_string(), kind.to_string());
    document
}

/// Extractor for PDF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    fn supports(&self, filename: &str) -> bool {
        has_extension(filename, &["pdf"])
    }

    async fn extract(&self, input: &IngestInput) -> Result<Document> {
        debug!(document = %input.filename, bytes = input.bytes.len(), "extracting PDF");

        let bytes = input.bytes.clone();
        // pdf-extract is blocking and may panic on malformed input.
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| RagError::ExtractionError {
            document: input.filename.clone(),
            message: format!("PDF parser aborted: {e}"),
        })?
        .map_err(|e| RagError::ExtractionError {
            document: input.filename.clone(),
            message: format!("PDF extraction failed: {e}"),
        })?;

        Ok(document_for(input, text, "application/pdf"))
    }
}

/// Extractor for plain text and markdown files. Invalid UTF-8 is replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentExtractor for TextExtractor {
    fn supports(&self, filename: &str) -> bool {
        has_extension(filename, &["txt", "md", "markdown"])
    }

    async fn extract(&self, input: &IngestInput) -> Result<Document> {
        let text = String::from_utf8_lossy(&input.bytes).into_owned();
        Ok(document_for(input, text, "text/plain"))
    }
}

/// Result of extracting one input of a batch.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub filename: String,
    pub result: Result<Document>,
}

/// Dispatches files to the first extractor that supports them.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn DocumentExtractor>>,
}

impl Default for ExtractorRegistry {
    /// A registry with the PDF and text extractors.
    fn default() -> Self {
        Self::empty().with(Arc::new(PdfExtractor::new())).with(Arc::new(TextExtractor::new()))
    }
}

impl ExtractorRegistry {
    /// A registry with no extractors.
    pub fn empty() -> Self {
        Self { extractors: Vec::new() }
    }

    /// Register an extractor. Earlier registrations take precedence.
    pub fn with(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Extract a single input.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ExtractionError`] if no extractor supports the file,
    /// extraction fails, or the document has no non-whitespace text.
    pub async fn extract(&self, input: &IngestInput) -> Result<Document> {
        let extractor = self.extractors.iter().find(|e| e.supports(&input.filename)).ok_or_else(
            || RagError::ExtractionError {
                document: input.filename.clone(),
                message: "unsupported file type".into(),
            },
        )?;

        let document = extractor.extract(input).await?;
        if document.text.trim().is_empty() {
            return Err(RagError::ExtractionError {
                document: input.filename.clone(),
                message: "no extractable text".into(),
            });
        }
        Ok(document)
    }

    /// Extract every input in order. A failure only affects its own entry.
    pub async fn extract_all(&self, inputs: &[IngestInput]) -> Vec<ExtractionOutcome> {
        let mut outcomes = Vec::with_capacity(inputs.len());
        for input in inputs {
            let result = self.extract(input).await;
            if let Err(e) = &result {
                warn!(document = %input.filename, error = %e, "extraction failed");
            }
            outcomes.push(ExtractionOutcome { filename: input.filename.clone(), result });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_matching_is_case_insensitive() {
        assert!(PdfExtractor.supports("Report.PDF"));
        assert!(!PdfExtractor.supports("notes.txt"));
        assert!(TextExtractor.supports("README.md"));
        assert!(!TextExtractor.supports("archive"));
    }

    #[tokio::test]
    async fn text_extractor_keeps_content_and_source() {
        let registry = ExtractorRegistry::default();
        let doc = registry.extract(&IngestInput::new("notes.txt", "hello world")).await.unwrap();
        assert_eq!(doc.id, "notes.txt");
        assert_eq!(doc.text, "hello world");
        assert_eq!(doc.metadata.get("source").map(String::as_str), Some("notes.txt"));
    }

    #[tokio::test]
    async fn pdf_pages_are_extracted_in_order() {
        let bytes = include_bytes!("../tests/fixtures/two_pages.pdf");
        let doc = PdfExtractor.extract(&IngestInput::new("manual.pdf", bytes.to_vec())).await.unwrap();

        let first = doc.text.find("Warranty").expect("first page text");
        let second = doc.text.find("Refunds").expect("second page text");
        assert!(first < second);
        assert_eq!(doc.metadata.get("content_type").map(String::as_str), Some("application/pdf"));
    }

    #[tokio::test]
    async fn batch_reports_failures_per_document() {
        let registry = ExtractorRegistry::default();
        let inputs = vec![
            IngestInput::new("a.txt", "first"),
            IngestInput::new("blank.txt", "  \n\t "),
            IngestInput::new("broken.pdf", b"definitely not a pdf".to_vec()),
            IngestInput::new("image.png", vec![0u8, 1, 2]),
            IngestInput::new("b.md", "# second"),
        ];

        let outcomes = registry.extract_all(&inputs).await;
        let names: Vec<&str> = outcomes.iter().map(|o| o.filename.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "blank.txt", "broken.pdf", "image.png", "b.md"]);

        assert!(outcomes[0].result.is_ok());
        for failed in &outcomes[1..4] {
            assert!(matches!(failed.result, Err(RagError::ExtractionError { .. })));
        }
        assert_eq!(outcomes[4].result.as_ref().unwrap().text, "# second");
    }

    #[tokio::test]
    async fn missing_file_is_an_extraction_error() {
        let err = IngestInput::from_path("/definitely/not/here.pdf").await.unwrap_err();
        assert!(matches!(err, RagError::ExtractionError { ref document, .. } if document == "here.pdf"));
    }
}
