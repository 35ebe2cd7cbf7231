use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::ExtractError;
use crate::record::BatchRecord;

/// Extension used for every batch file.
pub const BATCH_EXTENSION: &str = "json";

/// Upper bound on `_N` suffixes tried before giving up on a free filename.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Timestamp embedded in every batch filename of one run.
///
/// Captured once when the run starts, so two flushes in the same run never
/// produce the same name however close together they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStamp(String);

impl RunStamp {
    /// Stamp for the current local time, `YYYYMMDD_HHMMSS`.
    pub fn now() -> Self {
        Self(chrono::Local::now().format("%Y%m%d_%H%M%S").to_string())
    }

    /// Use a fixed stamp (tests, reproducible output).
    pub fn fixed(stamp: impl Into<String>) -> Self {
        Self(stamp.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `batch_<n>_<stamp>.json`, or `batch_<n>_<stamp>_<k>.json` for `attempt > 0`.
pub fn batch_file_name(batch_number: u32, stamp: &RunStamp, attempt: u32) -> String {
    if attempt == 0 {
        format!("batch_{}_{}.{}", batch_number, stamp, BATCH_EXTENSION)
    } else {
        format!(
            "batch_{}_{}_{}.{}",
            batch_number, stamp, attempt, BATCH_EXTENSION
        )
    }
}

/// Serialize `record` as pretty JSON into a new file under `output_dir`.
///
/// Never overwrites: if the preferred name is taken (e.g. an earlier run in
/// the same second), a numeric suffix is added until a free name is found.
/// Returns the path actually written.
pub fn write_batch(
    output_dir: &Path,
    record: &BatchRecord,
    stamp: &RunStamp,
) -> Result<PathBuf, ExtractError> {
    let json = serde_json::to_string_pretty(record)?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = output_dir.join(batch_file_name(record.batch_number, stamp, attempt));
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(path = %path.display(), "batch file exists, trying next suffix");
                continue;
            }
            Err(source) => return Err(ExtractError::Write { path, source }),
        };

        file.write_all(json.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.sync_all())
            .map_err(|source| ExtractError::Write {
                path: path.clone(),
                source,
            })?;
        return Ok(path);
    }

    Err(ExtractError::Write {
        path: output_dir.join(batch_file_name(record.batch_number, stamp, 0)),
        source: std::io::Error::new(
            ErrorKind::AlreadyExists,
            "no free batch filename after repeated attempts",
        ),
    })
}

/// Read a batch file back.
pub fn read_batch(path: &Path) -> Result<BatchRecord, ExtractError> {
    let content = std::fs::read_to_string(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}
