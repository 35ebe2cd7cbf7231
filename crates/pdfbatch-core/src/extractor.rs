use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

use crate::backend::{BackendError, PdfBackend, PdfDocument};
use crate::batch_file::{RunStamp, write_batch};
use crate::record::{BatchRecord, PageStatus, nominal_range};
use crate::{ExtractConfig, ExtractError, ProgressEvent, RunSummary};

/// Pages extracted since the last flush.
struct PendingBatch {
    batch_number: u32,
    text: Vec<String>,
    pages: Vec<PageStatus>,
}

impl PendingBatch {
    fn new(batch_number: u32) -> Self {
        Self {
            batch_number,
            text: Vec::new(),
            pages: Vec::new(),
        }
    }
}

/// Walks a PDF page by page and flushes the extracted text to batch files.
///
/// Batch boundaries follow page indices, not the number of successfully
/// extracted pages: batch `n` always covers pages
/// `(n-1)*batch_size + 1 ..= min(n*batch_size, total)`, so the nominal ranges
/// of a run tile the whole document even when pages fail.
///
/// A batch is flushed at its boundary even when every page in it failed. The
/// file then has an empty `text`, and a run always writes
/// `ceil(total / batch_size)` files.
pub struct BatchExtractor<'a> {
    backend: &'a dyn PdfBackend,
    config: ExtractConfig,
    run_stamp: Option<RunStamp>,
}

impl<'a> BatchExtractor<'a> {
    pub fn new(backend: &'a dyn PdfBackend, config: ExtractConfig) -> Self {
        Self {
            backend,
            config,
            run_stamp: None,
        }
    }

    /// Pin the filename timestamp instead of taking the wall clock at run start.
    pub fn with_run_stamp(mut self, stamp: RunStamp) -> Self {
        self.run_stamp = Some(stamp);
        self
    }

    /// Run one extraction over `pdf_path`.
    ///
    /// `Err(ExtractError::Open)` means the document could not be opened and
    /// nothing was written. Page-level failures are reported through
    /// `progress` and recorded in the batch files; they never abort the run.
    pub fn run(
        &self,
        pdf_path: &Path,
        mut progress: impl FnMut(ProgressEvent),
    ) -> Result<RunSummary, ExtractError> {
        let batch_size = self.config.batch_size;
        if batch_size == 0 {
            return Err(ExtractError::InvalidBatchSize);
        }

        let output_dir = &self.config.output_dir;
        std::fs::create_dir_all(output_dir).map_err(|source| ExtractError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let document = self.backend.open(pdf_path).map_err(ExtractError::Open)?;
        let total_pages = u32::try_from(document.page_count()).map_err(|_| {
            ExtractError::Open(BackendError::OpenError(
                "page count does not fit in 32 bits".into(),
            ))
        })?;

        tracing::info!(
            pdf = %pdf_path.display(),
            total_pages,
            batch_size,
            output_dir = %output_dir.display(),
            "starting extraction"
        );
        progress(ProgressEvent::Started { total_pages });

        let stamp = self.run_stamp.clone().unwrap_or_else(RunStamp::now);
        let mut summary = RunSummary {
            total_pages,
            ..RunSummary::default()
        };
        let mut pending = PendingBatch::new(1);

        for page in 1..=total_pages {
            match extract_page(document.as_ref(), page - 1) {
                Ok(text) => {
                    pending.text.push(text);
                    pending.pages.push(PageStatus::ok(page));
                    summary.pages_extracted += 1;
                }
                Err(reason) => {
                    tracing::warn!(page, reason = %reason, "page extraction failed");
                    progress(ProgressEvent::PageFailed {
                        page,
                        reason: reason.clone(),
                    });
                    pending.pages.push(PageStatus::failed(page, reason));
                    summary.failed_pages.push(page);
                }
            }

            if page % batch_size == 0 || page == total_pages {
                let next = PendingBatch::new(pending.batch_number + 1);
                let done = std::mem::replace(&mut pending, next);
                let path = self.flush(done, total_pages, &stamp, &mut progress)?;
                summary.batch_files.push(path);
            }

            let interval = self.config.progress_interval;
            if interval > 0 && page % interval == 0 {
                progress(ProgressEvent::PagesProcessed {
                    processed: page,
                    total: total_pages,
                });
            }
        }

        tracing::info!(
            total_pages,
            extracted = summary.pages_extracted,
            failed = summary.failed_pages.len(),
            batches = summary.batch_files.len(),
            "extraction complete"
        );
        progress(ProgressEvent::Completed {
            total_pages,
            batches_written: summary.batch_files.len(),
            pages_failed: summary.failed_pages.len(),
        });

        Ok(summary)
    }

    fn flush(
        &self,
        batch: PendingBatch,
        total_pages: u32,
        stamp: &RunStamp,
        progress: &mut impl FnMut(ProgressEvent),
    ) -> Result<PathBuf, ExtractError> {
        let (start_page, end_page) =
            nominal_range(batch.batch_number, self.config.batch_size, total_pages);
        let record = BatchRecord {
            batch_number: batch.batch_number,
            start_page,
            end_page,
            text: batch.text,
            pages: self.config.record_page_status.then_some(batch.pages),
        };

        let path = write_batch(&self.config.output_dir, &record, stamp)?;
        tracing::debug!(
            batch = record.batch_number,
            start_page,
            end_page,
            pages_with_text = record.text.len(),
            path = %path.display(),
            "flushed batch"
        );
        progress(ProgressEvent::BatchSaved {
            batch_number: record.batch_number,
            start_page,
            end_page,
            path: path.clone(),
        });
        Ok(path)
    }
}

/// Extract one page, turning backend errors and backend panics into a
/// printable reason.
fn extract_page(document: &dyn PdfDocument, index: u32) -> Result<String, String> {
    let index = index as usize;
    match catch_unwind(AssertUnwindSafe(|| document.page_text(index))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(format!("backend panicked: {msg}"))
        }
    }
}
