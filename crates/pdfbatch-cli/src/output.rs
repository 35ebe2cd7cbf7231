use std::io::Write;

use owo_colors::OwoColorize;
use pdfbatch_core::ProgressEvent;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Console line for a progress event.
pub fn format_event(event: &ProgressEvent, color: ColorMode) -> String {
    match event {
        ProgressEvent::Started { total_pages } => {
            format!("Total pages in PDF: {}", total_pages)
        }
        ProgressEvent::PageFailed { page, reason } => {
            let msg = format!("Error processing page {}: {}", page, reason);
            if color.enabled() {
                msg.red().to_string()
            } else {
                msg
            }
        }
        ProgressEvent::BatchSaved {
            batch_number,
            start_page,
            end_page,
            path,
        } => {
            let range = format!("(pages {}-{})", start_page, end_page);
            if color.enabled() {
                format!(
                    "Saved batch {} to {} {}",
                    batch_number,
                    path.display(),
                    range.dimmed()
                )
            } else {
                format!("Saved batch {} to {} {}", batch_number, path.display(), range)
            }
        }
        ProgressEvent::PagesProcessed { processed, total } => {
            format!("Processed {}/{} pages", processed, total)
        }
        ProgressEvent::Completed {
            batches_written,
            pages_failed,
            ..
        } => {
            let detail = format!(
                "({} batch files written, {} pages failed)",
                batches_written, pages_failed
            );
            if color.enabled() {
                format!("PDF processing completed! {}", detail.dimmed())
            } else {
                format!("PDF processing completed! {}", detail)
            }
        }
    }
}

/// Print a real-time progress event.
pub fn print_progress(
    w: &mut dyn Write,
    event: &ProgressEvent,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "{}", format_event(event, color))
}

/// Final line after a successful run.
pub fn print_success(w: &mut dyn Write, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", "Text extraction completed successfully!".green())
    } else {
        writeln!(w, "Text extraction completed successfully!")
    }
}

/// Cause and final line after a failed run.
pub fn print_failure(
    w: &mut dyn Write,
    error: &anyhow::Error,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {:#}", "Error:".red().bold(), error)?;
        writeln!(w, "{}", "Text extraction failed!".bold().red())
    } else {
        writeln!(w, "Error: {:#}", error)?;
        writeln!(w, "Text extraction failed!")
    }
}
