use std::path::PathBuf;

use anyhow::Context;
use pdfbatch_core::ExtractConfig;
use pdfbatch_core::config_file::ConfigFile;

pub const ENV_BATCH_SIZE: &str = "PDFBATCH_BATCH_SIZE";
pub const ENV_OUTPUT_DIR: &str = "PDFBATCH_OUTPUT_DIR";
pub const ENV_PROGRESS_INTERVAL: &str = "PDFBATCH_PROGRESS_INTERVAL";

/// Values given on the command line; `None` means "not specified".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub batch_size: Option<u32>,
    pub output_dir: Option<PathBuf>,
    pub progress_interval: Option<u32>,
    pub no_page_status: bool,
    pub keep_ligatures: bool,
}

/// Fully resolved settings for one `extract` run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub extract: ExtractConfig,
    pub expand_ligatures: bool,
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
pub fn resolve(
    cli: &Overrides,
    file: &ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let defaults = ExtractConfig::default();

    let batch_size = match cli.batch_size {
        Some(n) => n,
        None => env_u32(&env, ENV_BATCH_SIZE)?
            .or_else(|| file.batch_size())
            .unwrap_or(defaults.batch_size),
    };
    if batch_size == 0 {
        anyhow::bail!("batch size must be a positive integer");
    }

    let progress_interval = match cli.progress_interval {
        Some(n) => n,
        None => env_u32(&env, ENV_PROGRESS_INTERVAL)?
            .or_else(|| file.progress_interval())
            .unwrap_or(defaults.progress_interval),
    };

    let output_dir = cli
        .output_dir
        .clone()
        .or_else(|| env(ENV_OUTPUT_DIR).filter(|s| !s.is_empty()).map(PathBuf::from))
        .or_else(|| file.output_dir())
        .unwrap_or(defaults.output_dir);

    let record_page_status = if cli.no_page_status {
        false
    } else {
        file.record_page_status()
            .unwrap_or(defaults.record_page_status)
    };

    let expand_ligatures = !cli.keep_ligatures && file.expand_ligatures().unwrap_or(true);

    Ok(Settings {
        extract: ExtractConfig {
            batch_size,
            progress_interval,
            output_dir,
            record_page_status,
        },
        expand_ligatures,
    })
}

fn env_u32(env: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<u32>> {
    match env(key) {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} must be a non-negative integer, got {v:?}")),
        _ => Ok(None),
    }
}
