use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lightbox_core::{
    discover_images, BrowserConfig, ImageBrowser, LoadingMode, NullStatusSink, StatusSink,
};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "lightbox-cli")]
#[command(about = "Lightbox CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the qualifying image files in a directory.
    Scan {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
    /// Print machine-readable directory metadata.
    Info {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        /// Memory ceiling in megabytes used to decide the loading mode.
        #[arg(long, default_value_t = 3072)]
        max_memory_mb: u64,
    },
    /// Load a directory and walk through every image, printing a status
    /// line per position.
    Browse {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        /// Memory ceiling in megabytes.
        #[arg(long, default_value_t = 3072)]
        max_memory_mb: u64,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    image_count: usize,
    total_bytes: u64,
    max_memory_bytes: u64,
    mode: &'static str,
    resident_count: usize,
    memory_used_bytes: u64,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Scan { dir } => run_scan(&dir),
        Commands::Info { dir, max_memory_mb } => run_info(&dir, max_memory_mb),
        Commands::Browse { dir, max_memory_mb } => run_browse(&dir, max_memory_mb),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_scan(dir: &Path) -> Result<()> {
    ensure_directory_exists(dir)?;

    let records = discover_images(dir).context("failed to scan directory")?;
    for record in &records {
        println!("{}\t{}", record.file_size(), record.path().display());
    }
    println!("{} images", records.len());

    Ok(())
}

fn run_info(dir: &Path, max_memory_mb: u64) -> Result<()> {
    ensure_directory_exists(dir)?;

    let records = discover_images(dir).context("failed to scan directory")?;
    let total_bytes: u64 = records.iter().map(|r| r.file_size()).sum();

    let browser = ImageBrowser::with_status_sink(
        BrowserConfig::with_limit_mb(max_memory_mb),
        Arc::new(NullStatusSink),
    );
    browser.load_directory(dir).context("failed to load directory")?;

    let payload = InfoOutput {
        path: dir.display().to_string(),
        image_count: browser.count(),
        total_bytes,
        max_memory_bytes: browser.memory_ceiling(),
        mode: match browser.loading_mode() {
            Some(LoadingMode::Sequential) => "sequential",
            _ => "bulk",
        },
        resident_count: browser.resident_count(),
        memory_used_bytes: browser.current_memory_usage(),
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

fn run_browse(dir: &Path, max_memory_mb: u64) -> Result<()> {
    ensure_directory_exists(dir)?;

    let browser = ImageBrowser::with_status_sink(
        BrowserConfig::with_limit_mb(max_memory_mb),
        Arc::new(ConsoleSink),
    );
    browser.load_directory(dir).context("failed to load directory")?;

    for position in 0..browser.count() {
        match browser.current_decoded() {
            Ok(decoded) => println!("  {}x{} px", decoded.width(), decoded.height()),
            Err(error) => log::warn!("decode failed: {error:#}"),
        }
        if position + 1 < browser.count() {
            if let Err(error) = browser.next() {
                log::warn!("navigation error: {error:#}");
            }
        }
    }

    let mode = match browser.loading_mode() {
        Some(LoadingMode::Sequential) => "sequential",
        _ => "bulk",
    };
    println!(
        "browsed {} images ({} mode), {} resident, {:.2} MB in use",
        browser.count(),
        mode,
        browser.resident_count(),
        browser.current_memory_usage() as f64 / 1024.0 / 1024.0,
    );

    Ok(())
}

/// Sink that forwards engine status lines to stdout and progress to the
/// debug log.
struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn status(&self, message: &str) {
        println!("{message}");
    }

    fn progress(&self, fraction: f64) {
        log::debug!("load progress: {:.0}%", fraction * 100.0);
    }
}

fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("directory does not exist: {}", path.display());
    }

    if !path.is_dir() {
        anyhow::bail!("path is not a directory: {}", path.display());
    }

    Ok(())
}
