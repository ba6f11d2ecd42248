//! PDF Workbench CLI tool
//!
//! Runs the web service, and offers the same PDF operations plus usage
//! bookkeeping from the command line.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use glob::glob;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf_workbench::date::parse_date_key;
use pdf_workbench::pdf::{extract_metadata, merge_pdfs, protect_pdf, MergeOptions, ProtectOptions};
use pdf_workbench::usage::{JsonFileUsageStore, QuotaGate, UsageStore};
use pdf_workbench::Config;

/// PDF Workbench - merge and protect PDFs under a daily quota
#[derive(Parser)]
#[command(name = "pdf-workbench")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Run the web service with settings from a file
    pdf-workbench serve --config workbench.toml

    # Merge numbered PDFs in order
    pdf-workbench merge -o handout.pdf \"[0-9]*.pdf\"

    # Lock a PDF behind a password
    pdf-workbench protect report.pdf -o report-locked.pdf --password hunter2

    # Check and clear today's usage
    pdf-workbench usage
    pdf-workbench reset-usage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Config file (TOML); falls back to $PDF_WORKBENCH_CONFIG
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Merge multiple PDF files into one (does not count against the quota)
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Encrypt a PDF with a password (does not count against the quota)
    Protect {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Password needed to open the output
        #[arg(long, env = "PDF_WORKBENCH_PASSWORD")]
        password: String,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,

        /// Check this password against a protected file
        #[arg(long)]
        password: Option<String>,
    },

    /// Show the recorded usage for a day
    Usage {
        /// Day to show (YYYY-MM-DD or "today")
        #[arg(long, default_value = "today")]
        date: String,

        /// Config file (TOML); falls back to $PDF_WORKBENCH_CONFIG
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Zero the recorded usage for a day
    ///
    /// Rewrites the usage file directly. The server's lock does not reach
    /// across processes, so run this only while the server is stopped and
    /// use POST /reset-usage against a live one.
    ResetUsage {
        /// Day to reset (YYYY-MM-DD or "today")
        #[arg(long, default_value = "today")]
        date: String,

        /// Config file (TOML); falls back to $PDF_WORKBENCH_CONFIG
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => cmd_serve(config).await,
        Commands::Merge { inputs, output } => cmd_merge(inputs, output),
        Commands::Protect { input, output, password } => cmd_protect(input, output, password),
        Commands::Info { input, password } => cmd_info(input, password),
        Commands::Usage { date, config } => cmd_usage(date, config).await,
        Commands::ResetUsage { date, config } => cmd_reset_usage(date, config).await,
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pdf_workbench=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched: Vec<PathBuf> = Vec::new();
            for entry in glob(&pattern)? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => tracing::warn!("glob error for {}: {}", pattern, e),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            // Glob results are sorted within a pattern; patterns keep their order
            matched.sort();
            paths.extend(matched);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

fn usage_store(config: Option<PathBuf>) -> anyhow::Result<(Config, JsonFileUsageStore)> {
    let config = Config::load(config.as_deref()).context("Failed to load configuration")?;
    let store = JsonFileUsageStore::new(&config.storage.usage_file);
    Ok((config, store))
}

async fn cmd_serve(config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::load(config.as_deref()).context("Failed to load configuration")?;

    tracing::info!("Starting pdf-workbench v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("  Daily limit: {}", config.quota.daily_limit);
    tracing::info!("  Usage file: {}", config.storage.usage_file.display());
    tracing::info!("  Max request size: {}MB", config.server.max_upload_mb);

    pdf_workbench::web::serve(config).await?;
    Ok(())
}

/// Merge multiple PDFs into one
fn cmd_merge(inputs: Vec<String>, output: PathBuf) -> anyhow::Result<()> {
    let inputs = expand_globs(inputs)?;

    tracing::info!("Merging {} PDF files...", inputs.len());

    let options = MergeOptions {
        input_paths: inputs,
        output_path: output.clone(),
    };
    let pages = merge_pdfs(&options)?;

    tracing::info!("Merged {} pages to {}", pages, output.display());
    Ok(())
}

/// Encrypt a PDF with a password
fn cmd_protect(input: PathBuf, output: PathBuf, password: String) -> anyhow::Result<()> {
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let options = ProtectOptions {
        input_path: input,
        output_path: output.clone(),
        password,
    };
    let pages = protect_pdf(&options)?;

    tracing::info!("Protected {} pages to {}", pages, output.display());
    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf, password: Option<String>) -> anyhow::Result<()> {
    let metadata = extract_metadata(Path::new(&input), password.as_deref())
        .with_context(|| format!("Failed to read {}", input.display()))?;

    println!("File: {}", input.display());
    match metadata.page_count {
        Some(pages) => println!("Pages: {}", pages),
        None => println!("Pages: unknown (locked by a user password)"),
    }
    println!("Encrypted: {}", if metadata.encrypted { "yes" } else { "no" });
    if metadata.encrypted && password.is_some() {
        println!("Password: accepted");
    }

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    Ok(())
}

/// Print the stored count for a day
async fn cmd_usage(date: String, config: Option<PathBuf>) -> anyhow::Result<()> {
    let day = parse_date_key(&date)?;
    let (config, store) = usage_store(config)?;
    let gate = QuotaGate::new(config.quota.daily_limit);

    let used = store.count_for(&day).await?;

    println!("Date: {}", day);
    println!("Used: {}", used);
    println!("Remaining: {} of {}", gate.remaining(used), gate.limit());
    Ok(())
}

/// Zero a day's counter, if the day has one
async fn cmd_reset_usage(date: String, config: Option<PathBuf>) -> anyhow::Result<()> {
    let day = parse_date_key(&date)?;
    let (_, store) = usage_store(config)?;

    if store.reset_to(&day, 0).await? {
        println!("Usage reset for {}.", day);
    } else {
        println!("No usage recorded for {}; nothing to reset.", day);
    }
    Ok(())
}
