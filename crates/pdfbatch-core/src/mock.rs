//! Mock PDF backend for testing.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{BackendError, PdfBackend, PdfDocument};

/// A configurable page for [`MockBackend`].
#[derive(Clone, Debug)]
pub enum MockPage {
    /// Page extracts successfully with this text.
    Text(String),
    /// Page extraction returns an error with this message.
    Fail(String),
    /// Page extraction panics inside the backend.
    Panic,
}

impl MockPage {
    pub fn text(s: impl Into<String>) -> Self {
        MockPage::Text(s.into())
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        MockPage::Fail(reason.into())
    }
}

/// A hand-rolled mock implementing [`PdfBackend`] for tests.
///
/// Supports:
/// - A fixed list of pages, each succeeding, failing, or panicking.
/// - Simulating a document that cannot be opened at all.
/// - Counting `open()` and `page_text()` calls.
pub struct MockBackend {
    pages: Vec<MockPage>,
    open_error: Option<String>,
    open_count: AtomicUsize,
    page_calls: Arc<AtomicUsize>,
    opened_paths: Mutex<Vec<PathBuf>>,
}

impl MockBackend {
    /// Create a backend whose document has the given pages.
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self {
            pages,
            open_error: None,
            open_count: AtomicUsize::new(0),
            page_calls: Arc::new(AtomicUsize::new(0)),
            opened_paths: Mutex::new(Vec::new()),
        }
    }

    /// A document with `count` pages whose text is `"page N"` (1-based).
    pub fn numbered(count: usize) -> Self {
        Self::new((1..=count).map(|n| MockPage::Text(format!("page {n}"))).collect())
    }

    /// A backend whose `open()` always fails with `reason`.
    pub fn failing_open(reason: impl Into<String>) -> Self {
        let mut backend = Self::new(Vec::new());
        backend.open_error = Some(reason.into());
        backend
    }

    /// How many times `open()` has been called.
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    /// How many times `page_text()` has been called across all opened documents.
    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    /// Paths passed to `open()`, in call order.
    pub fn opened_paths(&self) -> Vec<PathBuf> {
        self.opened_paths.lock().unwrap().clone()
    }
}

impl PdfBackend for MockBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        self.opened_paths.lock().unwrap().push(path.to_path_buf());

        if let Some(reason) = &self.open_error {
            return Err(BackendError::OpenError(reason.clone()));
        }

        Ok(Box::new(MockDocument {
            pages: self.pages.clone(),
            page_calls: Arc::clone(&self.page_calls),
        }))
    }
}

struct MockDocument {
    pages: Vec<MockPage>,
    page_calls: Arc<AtomicUsize>,
}

impl PdfDocument for MockDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, BackendError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(index) {
            Some(MockPage::Text(text)) => Ok(text.clone()),
            Some(MockPage::Fail(reason)) => Err(BackendError::ExtractionError(reason.clone())),
            Some(MockPage::Panic) => panic!("mock backend panicked on page index {index}"),
            None => Err(BackendError::ExtractionError(format!(
                "page index {index} out of range"
            ))),
        }
    }
}
