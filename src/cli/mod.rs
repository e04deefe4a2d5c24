//! # CLI Module
//!
//! Command-line interface for the fingerprint pipeline.
//!
//! ## Usage
//! ```bash
//! # Write 100x100 fingerprints of every photo under ~/keepers
//! photo-fingerprint generate -s ~/keepers -d ~/fingerprints
//!
//! # Compare an archive against them, exporting pairs for review
//! photo-fingerprint find-duplicates -s ~/fingerprints -d /mnt/archive --pairs pairs.csv --pairs-format csv
//!
//! # Capture timestamps, top directory only
//! photo-fingerprint extract-metadata -s ~/Pictures --shallow
//! ```
//!
//! Result lines go to stdout; the progress spinner, summary and logs go to
//! stderr. Ctrl-C stops the walker and workers cleanly.

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_fingerprint::core::config::FingerprintConfig;
use photo_fingerprint::core::output::StdoutSink;
use photo_fingerprint::core::pipeline::{
    default_concurrency, CancellationToken, Pipeline, PipelineBuilder, PipelineResult, WorkerTask,
};
use photo_fingerprint::core::reporter::{export_pairs_to_file, ExportFormat};
use photo_fingerprint::error::{ConfigError, Result};
use photo_fingerprint::events::{
    Event, EventChannel, EventReceiver, EventSender, PipelineEvent, WalkEvent, WorkerEvent,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Photo Fingerprint - find near-duplicate photos by comparing small thumbnails
#[derive(Parser, Debug)]
#[command(name = "photo-fingerprint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a fixed-size fingerprint for every image under a directory
    Generate {
        /// Directory of reference photos
        #[arg(short, long)]
        source: PathBuf,

        /// Existing directory the fingerprints are written into
        #[arg(short, long)]
        destination: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Compare every image under a directory against stored fingerprints
    FindDuplicates {
        /// Directory of fingerprints written by `generate`
        #[arg(short = 's', long = "fingerprints")]
        fingerprints: PathBuf,

        /// Directory to search for duplicates
        #[arg(short = 'd', long = "search")]
        search: PathBuf,

        /// Colour tolerance, as a fraction of the largest RGB distance (0-1)
        #[arg(long, default_value_t = 0.15)]
        fuzz: f64,

        /// Report "identical" when fewer than this fraction of pixels differ
        #[arg(long, default_value_t = 0.01)]
        identical_below: f64,

        /// Report "similar" when fewer than this fraction of pixels differ
        #[arg(long, default_value_t = 0.10)]
        similar_below: f64,

        /// Also write the duplicate pairs to this file for review
        #[arg(long)]
        pairs: Option<PathBuf>,

        /// Format of the pairs file
        #[arg(long, value_enum, default_value = "json")]
        pairs_format: PairsFormat,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print the capture timestamp of every image under a directory
    ExtractMetadata {
        /// Directory of photos
        #[arg(short, long)]
        source: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Number of worker threads
    #[arg(short = 't', long, default_value_t = default_concurrency())]
    threads: usize,

    /// Only process the top directory, not subdirectories
    #[arg(long)]
    shallow: bool,

    /// Descend into symlinked directories
    #[arg(long)]
    follow_symlinks: bool,

    /// Fingerprint width in pixels
    #[arg(long, default_value_t = 100)]
    width: u32,

    /// Fingerprint height in pixels
    #[arg(long, default_value_t = 100)]
    height: u32,

    /// Disable the progress spinner
    #[arg(long)]
    no_progress: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PairsFormat {
    /// JSON array of pairs
    Json,
    /// One CSV row per pair
    Csv,
}

impl From<PairsFormat> for ExportFormat {
    fn from(format: PairsFormat) -> Self {
        match format {
            PairsFormat::Json => ExportFormat::Json,
            PairsFormat::Csv => ExportFormat::Csv,
        }
    }
}

impl Commands {
    fn common(&self) -> &CommonArgs {
        match self {
            Commands::Generate { common, .. }
            | Commands::FindDuplicates { common, .. }
            | Commands::ExtractMetadata { common, .. } => common,
        }
    }
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    photo_fingerprint::init_tracing(cli.command.common().verbose);

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let term = Term::stderr();
    match execute(cli.command, &term, cancel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            term.write_line(&format!("{} {}", style("error:").red().bold(), e))
                .ok();
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands, term: &Term, cancel: CancellationToken) -> Result<()> {
    match command {
        Commands::Generate {
            source,
            destination,
            common,
        } => {
            let config = FingerprintConfig::new().geometry(common.width, common.height);
            let pipeline = builder(&source, &common, config, &cancel).build()?;
            if !destination.is_dir() {
                return Err(ConfigError::NotADirectory { path: destination }.into());
            }
            let task = WorkerTask::Generate { destination };

            let result = with_progress(&common, |sender| pipeline.run_with_events(&task, sender))?;
            print_summary(term, &result);
        }

        Commands::FindDuplicates {
            fingerprints,
            search,
            fuzz,
            identical_below,
            similar_below,
            pairs,
            pairs_format,
            common,
        } => {
            let config = FingerprintConfig::new()
                .geometry(common.width, common.height)
                .thresholds(identical_below, similar_below)
                .fuzz(fuzz);

            // Both pipelines are validated before either starts.
            let loader = builder(&fingerprints, &common, config.clone(), &cancel).build()?;
            let searcher = builder(&search, &common, config, &cancel).build()?;

            let mut header = String::new();
            let result = with_progress(&common, |sender| {
                let store = loader.load_fingerprints(sender)?;
                if store.is_empty() {
                    warn!("No fingerprints found in {}", fingerprints.display());
                }
                header = format!(
                    "  {} fingerprints, {}",
                    style(store.len()).cyan(),
                    store.policy().description()
                );
                let task = WorkerTask::FindDuplicates {
                    store: Arc::new(store),
                    fuzz,
                };
                searcher.run_with_events(&task, sender)
            })?;

            term.write_line(&header).ok();
            if let Some(path) = pairs {
                export_pairs_to_file(&result.matches, &path, pairs_format.into())?;
                term.write_line(&format!(
                    "  {} pairs written to {}",
                    style(result.matches.len()).cyan(),
                    path.display()
                ))
                .ok();
            }
            print_summary(term, &result);
        }

        Commands::ExtractMetadata { source, common } => {
            let config = FingerprintConfig::new().geometry(common.width, common.height);
            let pipeline = builder(&source, &common, config, &cancel).build()?;

            let result = with_progress(&common, |sender| {
                pipeline.run_with_events(&WorkerTask::ExtractMetadata, sender)
            })?;
            print_summary(term, &result);
        }
    }

    Ok(())
}

fn builder(
    source: &Path,
    common: &CommonArgs,
    config: FingerprintConfig,
    cancel: &CancellationToken,
) -> PipelineBuilder {
    Pipeline::builder(source)
        .concurrency(common.threads)
        .recursive(!common.shallow)
        .follow_symlinks(common.follow_symlinks)
        .fingerprint_config(config)
        .sink(Arc::new(StdoutSink))
        .cancellation(cancel.clone())
}

/// Run `work` while a separate thread drives the progress spinner
fn with_progress<T>(
    common: &CommonArgs,
    work: impl FnOnce(&EventSender) -> Result<T>,
) -> Result<T> {
    let (sender, receiver) = EventChannel::new();

    let progress = if common.no_progress || !Term::stderr().is_term() {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}] {pos} done")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let event_thread = {
        let progress = progress.clone();
        thread::spawn(move || drive_progress(receiver, progress))
    };

    let result = work(&sender);

    // Dropping the sender ends the event thread's loop.
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    result
}

fn drive_progress(receiver: EventReceiver, progress: Option<ProgressBar>) {
    let Some(pb) = progress else {
        // Drain so events do not pile up in memory.
        for _ in receiver.iter() {}
        return;
    };

    let mut phase = String::new();
    for event in receiver.iter() {
        match event {
            Event::Pipeline(PipelineEvent::Started { phase: started }) => {
                phase = started.to_string();
                pb.set_position(0);
                pb.set_message(phase.clone());
            }
            Event::Walk(WalkEvent::Progress(p)) => {
                pb.set_message(format!("{} ({} files found)", phase, p.files_queued));
            }
            Event::Worker(WorkerEvent::Processed(_))
            | Event::Worker(WorkerEvent::Failed { .. }) => {
                pb.inc(1);
            }
            Event::Pipeline(PipelineEvent::Cancelled) => {
                pb.set_message(format!("{} (cancelled)", phase));
            }
            _ => {}
        }
    }
}

fn print_summary(term: &Term, result: &PipelineResult) {
    let headline = if result.cancelled {
        style("Cancelled").yellow().bold()
    } else {
        style("Done").green().bold()
    };

    term.write_line(&format!(
        "{} {} files in {:.1}s: {} processed, {} without data, {} failed, {} skipped",
        headline,
        style(result.files_queued).cyan(),
        result.duration_ms as f64 / 1000.0,
        style(result.processed).cyan(),
        result.no_data,
        style(result.failed).red(),
        style(result.unsupported).dim(),
    ))
    .ok();

    if !result.matches.is_empty() {
        term.write_line(&format!(
            "  {} duplicate pairs found",
            style(result.matches.len()).yellow()
        ))
        .ok();
    }
    if result.walk_errors > 0 {
        term.write_line(&format!(
            "  {} directory entries could not be read (run with -v for details)",
            style(result.walk_errors).red()
        ))
        .ok();
    }
}
