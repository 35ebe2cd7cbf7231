use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-directory config file picked up from the CWD.
pub const LOCAL_CONFIG_NAME: &str = ".pdfbatch.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub extraction: Option<ExtractionSection>,
    pub output: Option<OutputSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionSection {
    pub batch_size: Option<u32>,
    pub progress_interval: Option<u32>,
    pub record_page_status: Option<bool>,
    pub expand_ligatures: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub dir: Option<String>,
}

impl ConfigFile {
    pub fn batch_size(&self) -> Option<u32> {
        self.extraction.as_ref().and_then(|e| e.batch_size)
    }

    pub fn progress_interval(&self) -> Option<u32> {
        self.extraction.as_ref().and_then(|e| e.progress_interval)
    }

    pub fn record_page_status(&self) -> Option<bool> {
        self.extraction.as_ref().and_then(|e| e.record_page_status)
    }

    pub fn expand_ligatures(&self) -> Option<bool> {
        self.extraction.as_ref().and_then(|e| e.expand_ligatures)
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        self.output
            .as_ref()
            .and_then(|o| o.dir.as_ref())
            .map(PathBuf::from)
    }
}

/// Platform config directory path: `<config_dir>/pdfbatch/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pdfbatch").join("config.toml"))
}

/// Load config by cascading CWD `.pdfbatch.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(LOCAL_CONFIG_NAME));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    match load_strict(path) {
        Ok(config) => Some(config),
        Err(ConfigError::Read { .. }) => None,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Load a config the user pointed at explicitly. Missing or malformed files
/// are errors here rather than silently ignored.
pub fn load_strict(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        extraction: Some(ExtractionSection {
            batch_size: overlay.batch_size().or_else(|| base.batch_size()),
            progress_interval: overlay
                .progress_interval()
                .or_else(|| base.progress_interval()),
            record_page_status: overlay
                .record_page_status()
                .or_else(|| base.record_page_status()),
            expand_ligatures: overlay
                .expand_ligatures()
                .or_else(|| base.expand_ligatures()),
        }),
        output: Some(OutputSection {
            dir: overlay
                .output
                .as_ref()
                .and_then(|o| o.dir.clone())
                .or_else(|| base.output.as_ref().and_then(|o| o.dir.clone())),
        }),
    }
}
