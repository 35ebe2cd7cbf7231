use serde::{Deserialize, Serialize};

/// Outcome of extracting a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageOutcome {
    Ok,
    Failed { reason: String },
}

/// Per-page status entry, aligned to a batch's nominal page range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStatus {
    /// 1-based page number.
    pub page: u32,
    #[serde(flatten)]
    pub outcome: PageOutcome,
}

impl PageStatus {
    pub fn ok(page: u32) -> Self {
        Self {
            page,
            outcome: PageOutcome::Ok,
        }
    }

    pub fn failed(page: u32, reason: impl Into<String>) -> Self {
        Self {
            page,
            outcome: PageOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, PageOutcome::Ok)
    }
}

/// One persisted batch of extracted pages.
///
/// `start_page..=end_page` is the nominal range the batch covers. `text` only
/// holds pages that extracted successfully, so it can be shorter than the
/// range; `pages` (when recorded) has one entry per page of the range and
/// says which ones failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub batch_number: u32,
    pub start_page: u32,
    pub end_page: u32,
    pub text: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<PageStatus>>,
}

impl BatchRecord {
    /// Number of pages in the nominal range. A hand-edited record with
    /// `end_page < start_page` counts as one page.
    pub fn page_span(&self) -> u32 {
        self.end_page.saturating_sub(self.start_page) + 1
    }

    /// Pages in the nominal range that did not produce text.
    pub fn failed_pages(&self) -> Vec<u32> {
        self.pages
            .iter()
            .flatten()
            .filter(|p| !p.is_ok())
            .map(|p| p.page)
            .collect()
    }
}

/// Nominal page range for batch `batch_number` (1-based) of a document with
/// `total_pages` pages split into batches of `batch_size`.
pub fn nominal_range(batch_number: u32, batch_size: u32, total_pages: u32) -> (u32, u32) {
    let start = (batch_number - 1) * batch_size + 1;
    let end = (batch_number * batch_size).min(total_pages);
    (start, end)
}

/// Number of batch files a run over `total_pages` pages produces.
pub fn batch_count(total_pages: u32, batch_size: u32) -> u32 {
    total_pages.div_ceil(batch_size)
}
