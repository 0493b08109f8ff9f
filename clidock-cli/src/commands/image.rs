//! Image command handlers
//!
//! Ingestion and removal run locally against the container engine; their
//! results are written to the JSON cache file.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clidock_core::domain::image::MetadataCache;
use clidock_core::domain::ingestion::{IngestionFailure, JobAborted, JobStatus};
use clidock_core::domain::log::{LogEntry, LogLevel};
use clidock_core::dto::ingestion::IngestionRequest;
use clidock_runner::{
    CacheStore, CliContainerRunner, ImageIngestionPipeline, TracingLogSink,
};
use colored::*;

use crate::config::Config;

fn pipeline(config: &Config) -> ImageIngestionPipeline {
    let runner = Arc::new(CliContainerRunner::from_config(&config.runner));
    ImageIngestionPipeline::new(runner, &config.runner, Arc::new(TracingLogSink))
}

/// Ingest images and publish them to the cache file
pub fn ingest(config: &Config, pull: Vec<String>, load: Vec<String>) -> Result<()> {
    let request = IngestionRequest {
        pull_list: pull,
        load_list: load,
    };
    if request.is_empty() {
        bail!("Nothing to ingest: pass at least one --pull or --load image");
    }

    let outcome = pipeline(config)
        .ingest(&request)
        .map_err(|aborted| report_abort("Ingestion", aborted))?;

    print_log(&outcome.log);

    let cache = config
        .store()
        .publish(outcome.cache.clone())
        .with_context(|| format!("Failed to write cache {}", config.cache_path.display()))?;

    println!();
    println!("Status:   {}", colorize_status(outcome.status()));
    println!(
        "Cached:   {} image(s) now in {}",
        cache.len(),
        config.cache_path.display().to_string().dimmed()
    );
    print_failures(&outcome.not_found, &outcome.failures);

    Ok(())
}

/// Remove images and evict them from the cache file
pub fn remove(config: &Config, images: Vec<String>) -> Result<()> {
    let outcome = pipeline(config)
        .remove_images(&images)
        .map_err(|aborted| report_abort("Removal", aborted))?;

    print_log(&outcome.log);

    let evicted = config
        .store()
        .evict(&outcome.removed)
        .with_context(|| format!("Failed to write cache {}", config.cache_path.display()))?;

    println!();
    println!("Status:   {}", colorize_status(outcome.job.status));
    println!("Evicted:  {} image(s) from the cache", evicted.len());
    print_failures(&[], &outcome.failures);

    Ok(())
}

/// List cached images and their CLIs
pub fn list(config: &Config) -> Result<()> {
    let cache = config
        .store()
        .load()
        .with_context(|| format!("Failed to read cache {}", config.cache_path.display()))?;

    print_cache(&cache);
    Ok(())
}

fn print_cache(cache: &MetadataCache) {
    if cache.is_empty() {
        println!("{}", "No images cached.".yellow());
        return;
    }

    println!("{}", format!("Found {} image(s):", cache.len()).bold());
    println!();
    for record in cache.records() {
        println!("  {} {}", "▸".cyan(), record.name.bold());
        for (cli, entry) in &record.clis {
            println!("    {} {}", cli, format!("({})", entry.cli_type).dimmed());
        }
        println!();
    }
}

/// Prints what an aborted job logged and its final status
fn report_abort(what: &str, aborted: JobAborted) -> anyhow::Error {
    print_log(&aborted.log);
    println!();
    println!("Status:   {}", colorize_status(aborted.job.status));
    anyhow::Error::new(aborted).context(format!("{} aborted", what))
}

fn print_log(log: &[LogEntry]) {
    for entry in log {
        let level = match entry.level {
            LogLevel::Debug => "DEBUG".dimmed(),
            LogLevel::Info => "INFO ".blue(),
            LogLevel::Warning => "WARN ".yellow(),
            LogLevel::Error => "ERROR".red(),
        };
        println!(
            "{} {} {}",
            entry.timestamp.format("%H:%M:%S").to_string().dimmed(),
            level,
            entry.message
        );
    }
}

fn print_failures(not_found: &[String], failures: &[IngestionFailure]) {
    if not_found.is_empty() && failures.is_empty() {
        return;
    }

    println!("\n{}", "Failures:".bold());
    for image in not_found {
        println!("  {} {}: image not found", "✗".red(), image);
    }
    for failure in failures {
        match &failure.cli {
            Some(cli) => println!(
                "  {} {} {}: {}",
                "✗".red(),
                failure.image,
                cli,
                failure.reason
            ),
            None => println!("  {} {}: {}", "✗".red(), failure.image, failure.reason),
        }
    }
}

fn colorize_status(status: JobStatus) -> ColoredString {
    match status {
        JobStatus::Running => status.to_string().yellow(),
        JobStatus::Success => status.to_string().green(),
        JobStatus::Error => status.to_string().red(),
    }
}
