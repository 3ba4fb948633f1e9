//! fc - JPDB frequency cache
//!
//! CLI entry point for loading and querying the local frequency data.

use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use freqcache::cache::{CacheError, FrequencyCache};
use freqcache::cli::{Cli, Command, get_log_path};
use freqcache::config::Config;
use freqcache::remote::{DirSource, HttpSource, RemoteSource};

fn setup_logging(verbose: bool) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Write to the log file; stdout is reserved for command output
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

fn build_source(from_dir: Option<&PathBuf>, config: &Config) -> Result<Arc<dyn RemoteSource>> {
    match from_dir {
        Some(dir) => Ok(Arc::new(DirSource::new(dir))),
        None => {
            let source = HttpSource::new(&config.remote).context("Failed to build HTTP client")?;
            Ok(Arc::new(source))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(
        "freqcache loaded config: db={}, remote={}",
        config.storage.db_path.display(),
        config.remote.base_url
    );

    let source = build_source(cli.from_dir.as_ref(), &config)?;
    let cache = FrequencyCache::new(&config, source);

    let result = match cli.command {
        Command::Init => cmd_init(&cache).await,
        Command::Lookup { words } => cmd_lookup(&cache, words).await,
        Command::Search { kanji, limit } => cmd_search(&cache, &kanji, limit).await,
        Command::Reload => cmd_reload(&cache).await,
        Command::Status => cmd_status(&cache).await,
    };

    cache.shutdown().await.context("Failed to close frequency store")?;
    result
}

/// Run `operation` while a progress bar follows the cache status
async fn with_progress<F>(cache: &FrequencyCache, operation: F) -> Result<(), CacheError>
where
    F: Future<Output = Result<(), CacheError>>,
{
    let bar = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{wide_bar}] {pos:>3}% {msg}") {
        bar.set_style(style);
    }

    let mut rx = cache.subscribe();
    let follower = bar.clone();
    let watcher = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let status = rx.borrow_and_update().clone();
            follower.set_position(status.progress.into());
            follower.set_message(status.message);
        }
    });

    let result = operation.await;
    watcher.abort();
    bar.finish_and_clear();
    result
}

fn print_ready(cache: &FrequencyCache) -> Result<()> {
    let status = cache.status();
    let version = cache.stored_version()?.unwrap_or_else(|| "unknown".to_string());
    println!(
        "{} {} entries (version {})",
        "Ready:".green().bold(),
        status.entry_count,
        version.cyan()
    );
    Ok(())
}

/// Check the version and load when needed
async fn cmd_init(cache: &FrequencyCache) -> Result<()> {
    with_progress(cache, cache.initialize())
        .await
        .context("Frequency cache initialization failed")?;
    print_ready(cache)
}

/// Drop local data and load again
async fn cmd_reload(cache: &FrequencyCache) -> Result<()> {
    with_progress(cache, cache.force_reload())
        .await
        .context("Frequency data reload failed")?;
    print_ready(cache)
}

/// Print `word<TAB>rank` per word, `-` for words not stored
async fn cmd_lookup(cache: &FrequencyCache, words: Vec<String>) -> Result<()> {
    if let Err(e) = cache.initialize().await {
        eprintln!("{} {} (using local data)", "Warning:".yellow().bold(), e);
    }

    let found = cache.get_frequencies(words.iter().cloned()).await?;
    for word in &words {
        match found.get(word) {
            Some(rank) => println!("{}\t{}", word, rank),
            None => println!("{}\t{}", word, "-".dimmed()),
        }
    }
    Ok(())
}

/// List stored words containing `kanji`
async fn cmd_search(cache: &FrequencyCache, kanji: &str, limit: Option<usize>) -> Result<()> {
    let results = cache.search(kanji, limit).await?;
    if results.is_empty() {
        println!("No words containing {}", kanji.bold());
        return Ok(());
    }
    for record in results {
        println!("{}\t{}\t{}", record.word, record.reading.dimmed(), record.frequency);
    }
    Ok(())
}

/// Show marker, row count and state
async fn cmd_status(cache: &FrequencyCache) -> Result<()> {
    let version = cache.stored_version()?;
    let count = cache.stored_count().await?;
    let status = cache.status();

    println!("{}", "Frequency cache".bold());
    match version {
        Some(version) => println!("  Version: {}", version.cyan()),
        None => println!("  Version: {}", "none".yellow()),
    }
    println!("  Entries: {}", count);
    println!("  State:   {}", status.state);
    if let Some(error) = status.error {
        println!("  Error:   {}", error.red());
    }
    Ok(())
}
