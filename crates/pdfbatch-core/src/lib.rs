use std::path::PathBuf;

use thiserror::Error;

pub mod backend;
pub mod batch_file;
pub mod config_file;
pub mod extractor;
pub mod mock;
pub mod record;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend, PdfDocument};
pub use batch_file::{RunStamp, read_batch};
pub use extractor::BatchExtractor;
pub use record::{BatchRecord, PageOutcome, PageStatus};

/// Pages per batch file unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: u32 = 500;

/// A progress line is emitted every this many pages unless configured otherwise.
pub const DEFAULT_PROGRESS_INTERVAL: u32 = 500;

/// Output directory used when none is configured, relative to the CWD.
pub const DEFAULT_OUTPUT_DIR: &str = "extracted_text";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("batch size must be at least 1")]
    InvalidBatchSize,
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Open(BackendError),
    #[error("failed to write batch file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read batch file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("batch JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub batch_size: u32,
    /// Emit a [`ProgressEvent::PagesProcessed`] every N pages; 0 disables it.
    pub progress_interval: u32,
    pub output_dir: PathBuf,
    /// Write the per-page `pages` status array into each batch file.
    pub record_page_status: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            record_page_status: true,
        }
    }
}

/// Progress events emitted during an extraction run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The document opened; this many pages will be processed.
    Started { total_pages: u32 },
    /// A page could not be extracted and was skipped.
    PageFailed { page: u32, reason: String },
    /// A batch file was written.
    BatchSaved {
        batch_number: u32,
        start_page: u32,
        end_page: u32,
        path: PathBuf,
    },
    /// Periodic page counter.
    PagesProcessed { processed: u32, total: u32 },
    Completed {
        total_pages: u32,
        batches_written: usize,
        pages_failed: usize,
    },
}

/// What a successful run produced.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total_pages: u32,
    pub pages_extracted: u32,
    /// 1-based numbers of pages that failed, in order.
    pub failed_pages: Vec<u32>,
    /// Batch files written, in batch-number order.
    pub batch_files: Vec<PathBuf>,
}

impl RunSummary {
    pub fn batches_written(&self) -> usize {
        self.batch_files.len()
    }
}
