use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdfbatch_core::{BatchExtractor, ExtractConfig, ProgressEvent, config_file};
use pdfbatch_pdf_mupdf::MupdfBackend;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod output;
mod settings;

use output::ColorMode;

/// PDF batch exporter - extract a PDF's text page by page into batched JSON files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from a PDF into batch files
    Extract(ExtractArgs),

    /// Print where config files are looked up
    ConfigPath,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Path to the PDF file
    pdf_path: PathBuf,

    /// Number of pages per batch file [default: 500]
    #[arg(short, long)]
    batch_size: Option<u32>,

    /// Directory batch files are written to [default: extracted_text]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print a progress line every N pages (0 disables) [default: 500]
    #[arg(long)]
    progress_interval: Option<u32>,

    /// Leave the per-page status array out of batch files
    #[arg(long)]
    no_page_status: bool,

    /// Keep ligature characters (e.g. "ﬁ") instead of expanding them
    #[arg(long)]
    keep_ligatures: bool,

    /// Read settings from this TOML file instead of the default locations
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Show a progress bar instead of periodic progress lines
    #[arg(long, conflicts_with = "progress_interval")]
    progress_bar: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::ConfigPath => {
            match config_file::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("(no platform config directory)"),
            }
            println!("{}", config_file::LOCAL_CONFIG_NAME);
            ExitCode::SUCCESS
        }
        Command::Extract(args) => {
            let color = ColorMode(!args.no_color);
            let mut stdout = std::io::stdout();
            match extract(&args, color) {
                Ok(()) => {
                    let _ = output::print_success(&mut stdout, color);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::debug!(error = ?e, "extraction failed");
                    let _ = output::print_failure(&mut stdout, &e, color);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Filter used when `RUST_LOG` is unset. Warnings such as an unparseable
/// config file still show.
const DEFAULT_LOG_FILTER: &str = "warn";

/// Structured logs go to stderr so they never mix with the progress lines on
/// stdout. `RUST_LOG=debug` shows per-batch detail.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn extract(args: &ExtractArgs, color: ColorMode) -> anyhow::Result<()> {
    let file_config = match &args.config {
        Some(path) => config_file::load_strict(path)?,
        None => config_file::load_config(),
    };

    let overrides = settings::Overrides {
        batch_size: args.batch_size,
        output_dir: args.output_dir.clone(),
        progress_interval: args.progress_interval,
        no_page_status: args.no_page_status,
        keep_ligatures: args.keep_ligatures,
    };
    let settings =
        settings::resolve(&overrides, &file_config, |k: &str| std::env::var(k).ok())?;
    let backend = backend_for(&settings);
    let mut config = settings.extract;

    if args.progress_bar {
        // The bar is redrawn from the periodic page counter.
        config.progress_interval = 1;
        run_with_bar(args, &backend, config, color)
    } else {
        run_with_lines(args, &backend, config, color)
    }
}

fn backend_for(settings: &settings::Settings) -> MupdfBackend {
    if settings.expand_ligatures {
        MupdfBackend::new()
    } else {
        MupdfBackend::new().without_ligature_expansion()
    }
}

fn run_with_lines(
    args: &ExtractArgs,
    backend: &MupdfBackend,
    config: ExtractConfig,
    color: ColorMode,
) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();

    BatchExtractor::new(backend, config)
        .run(&args.pdf_path, |event| {
            let _ = output::print_progress(&mut stdout, &event, color);
            let _ = stdout.flush();
        })
        .with_context(|| format!("extracting {}", args.pdf_path.display()))?;

    Ok(())
}

fn run_with_bar(
    args: &ExtractArgs,
    backend: &MupdfBackend,
    config: ExtractConfig,
    color: ColorMode,
) -> anyhow::Result<()> {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.green/dim}] {pos}/{len} pages ({per_sec}, eta {eta})",
        )
        .context("invalid progress bar template")?
        .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let result = BatchExtractor::new(backend, config).run(&args.pdf_path, |event| match event {
        ProgressEvent::Started { total_pages } => {
            bar.set_length(u64::from(total_pages));
            bar.println(output::format_event(&event, color));
        }
        ProgressEvent::PagesProcessed { processed, .. } => {
            bar.set_position(u64::from(processed));
        }
        ProgressEvent::Completed { .. } => {
            bar.finish_and_clear();
            println!("{}", output::format_event(&event, color));
        }
        _ => bar.println(output::format_event(&event, color)),
    });

    if !bar.is_finished() {
        bar.finish_and_clear();
    }
    result.with_context(|| format!("extracting {}", args.pdf_path.display()))?;
    Ok(())
}
