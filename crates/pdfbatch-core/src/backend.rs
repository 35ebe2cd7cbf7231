use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors own the PDF parsing; the batching pipeline (page iteration,
/// buffering, flushing to disk) lives in [`crate::BatchExtractor`].
pub trait PdfBackend: Send + Sync {
    /// Open a PDF file and read enough of its structure to know the page count.
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError>;
}

/// An opened PDF document, held for the duration of one extraction run.
pub trait PdfDocument {
    /// Total number of pages in the document.
    fn page_count(&self) -> usize;

    /// Extract the text of a single page. `index` is 0-based.
    fn page_text(&self, index: usize) -> Result<String, BackendError>;
}
