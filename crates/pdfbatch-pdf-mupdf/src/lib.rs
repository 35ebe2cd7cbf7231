use std::path::Path;

use mupdf::{Document, TextPageFlags};

use pdfbatch_core::{BackendError, PdfBackend, PdfDocument};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island — it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the batching core and its tests do not
/// transitively depend on it.
///
/// Typographic ligatures (`ﬁ`, `ﬂ`, ...) are expanded by default so the
/// exported text is searchable with plain ASCII queries.
pub struct MupdfBackend {
    expand_ligatures: bool,
}

impl Default for MupdfBackend {
    fn default() -> Self {
        Self {
            expand_ligatures: true,
        }
    }
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep ligature code points as MuPDF reports them.
    pub fn without_ligature_expansion(mut self) -> Self {
        self.expand_ligatures = false;
        self
    }
}

impl PdfBackend for MupdfBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        if !path.exists() {
            return Err(BackendError::OpenError(format!(
                "no such file: {}",
                path.display()
            )));
        }

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;
        let page_count = document
            .page_count()
            .map_err(|e| BackendError::OpenError(e.to_string()))?;

        Ok(Box::new(MupdfDocument {
            document,
            page_count: page_count.max(0) as usize,
            expand_ligatures: self.expand_ligatures,
        }))
    }
}

struct MupdfDocument {
    document: Document,
    page_count: usize,
    expand_ligatures: bool,
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_text(&self, index: usize) -> Result<String, BackendError> {
        let index = i32::try_from(index)
            .map_err(|_| BackendError::ExtractionError(format!("page index {index} too large")))?;
        let page = self
            .document
            .load_page(index)
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

        // Use block/line iteration to match PyMuPDF's get_text() behavior
        let mut page_text = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let line_text: String = line
                    .chars()
                    .map(|c| c.char().unwrap_or('\u{FFFD}'))
                    .collect();
                page_text.push_str(&line_text);
                page_text.push('\n');
            }
        }

        if self.expand_ligatures {
            Ok(expand_ligatures(&page_text))
        } else {
            Ok(page_text)
        }
    }
}

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}
