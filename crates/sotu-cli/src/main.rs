use anyhow::{Context, Result};
use clap::Parser;
use sotu_acquire::{catalog, HttpFetcher};
use sotu_run::{CatalogChoice, Config, RunOptions, Startup};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "sotu")]
#[command(about = "Archive State of the Union speeches to SQLite and text files")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long)]
    utc: bool,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Which catalog of speech pages to walk
    #[arg(short, long, default_value = "index", value_enum)]
    catalog: CatalogSource,

    /// Catalog index page (for --catalog index)
    #[arg(long, default_value = catalog::INFOPLEASE_INDEX_URL)]
    index_url: String,

    /// Re-scrape speeches that are already in the database
    #[arg(long)]
    refresh: bool,

    /// Process at most this many catalog entries
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Directory for individual speech files [env: SOTU_OUTPUT_DIR]
    #[arg(short = 'O', long)]
    output_dir: Option<PathBuf>,

    /// Combined archive file [env: SOTU_ARCHIVE_FILE]
    #[arg(long)]
    archive_file: Option<PathBuf>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    report_json: Option<PathBuf>,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, clap::ValueEnum)]
enum CatalogSource {
    /// infoplease.com State of the Union index (every address since 1790)
    Index,
    /// A few American Presidency Project pages, no index fetch
    Builtin,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    archive_logged(&cli).await
}

/// Run the archive, sending any fatal error through tracing so it also
/// reaches the log file.
async fn archive_logged(cli: &Cli) -> Result<()> {
    let result = archive(cli).await;
    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "Run aborted");
    }
    result
}

async fn archive(cli: &Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(path) = &cli.archive_file {
        config.archive_file = path.clone();
    }

    let fetcher = HttpFetcher::new(config.timeout, config.delay)
        .context("Failed to build HTTP client")?;

    let choice = match cli.catalog {
        CatalogSource::Index => CatalogChoice::Index(cli.index_url.clone()),
        CatalogSource::Builtin => CatalogChoice::Builtin,
    };
    let Startup { mut store, mut entries } = sotu_run::start(&fetcher, &config, &choice).await?;
    if let Some(limit) = cli.limit {
        entries.truncate(limit);
    }
    tracing::info!(
        entries = entries.len(),
        database = %config.database_path().display(),
        output_dir = %config.output_dir.display(),
        "Starting run"
    );

    let options = RunOptions {
        skip_existing: !cli.refresh,
    };
    let report = sotu_run::run(&fetcher, &mut store, &entries, &options).await;

    println!("{}", report.summary());

    if let Some(path) = &cli.report_json {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote run report");
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> Result<()> {
    // Map log level, suppressing noisy HTML-parsing crates at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn  => "warn",
        LogLevel::Info  => "info",
        LogLevel::Debug => "debug,selectors=warn,html5ever=warn",
        LogLevel::Trace => "trace,selectors=warn,html5ever=warn",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let log_file = match &cli.log_file {
        Some(path) => Some(
            File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?,
        ),
        None => None,
    };

    // Timestamp format: 2026-02-14 19:44:09.123 -08:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z".to_string();

    if cli.utc {
        install_subscriber(
            env_filter,
            tracing_subscriber::fmt::time::ChronoUtc::new(time_format),
            log_file,
        );
    } else {
        install_subscriber(
            env_filter,
            tracing_subscriber::fmt::time::ChronoLocal::new(time_format),
            log_file,
        );
    }
    Ok(())
}

fn install_subscriber<T>(env_filter: tracing_subscriber::EnvFilter, timer: T, log_file: Option<File>)
where
    T: FormatTime + Clone + Send + Sync + 'static,
{
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer.clone());
    let file = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_timer(timer)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();
}
