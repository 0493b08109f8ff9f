//! Clidock CLI
//!
//! Command-line interface for ingesting containerized CLIs and compiling
//! their invocations without a server. Metadata is kept in a JSON cache file.

mod commands;
mod config;
mod types;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use clidock_runner::RunnerConfig;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clidock")]
#[command(about = "Containerized CLI catalog", long_about = None)]
struct Cli {
    /// Metadata cache file
    #[arg(long, env = "CLIDOCK_CACHE", default_value = "clidock-cache.json")]
    cache: PathBuf,

    /// Container engine binary
    #[arg(long, env = "CLIDOCK_ENGINE", default_value = "podman")]
    engine: String,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clidock=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let runner = RunnerConfig {
        engine: cli.engine,
        ..RunnerConfig::from_env()?
    };
    runner.validate()?;

    let config = Config {
        cache_path: cli.cache,
        runner,
    };

    handle_command(cli.command, &config)
}
