//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod cli;
mod image;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;
use crate::types::ParamAssignment;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Pull and/or load images and cache the metadata of their CLIs
    Ingest {
        /// Image to pull before loading (repeatable)
        #[arg(long = "pull", value_name = "IMAGE")]
        pull: Vec<String>,

        /// Local image to load without pulling (repeatable)
        #[arg(long = "load", value_name = "IMAGE")]
        load: Vec<String>,
    },
    /// Force-remove local images and evict them from the cache
    Remove {
        /// Images to remove
        #[arg(required = true)]
        images: Vec<String>,
    },
    /// List cached images and their CLIs
    List,
    /// Show the REST parameters of a CLI
    Describe {
        /// Image name (repo:tag)
        image: String,
        /// CLI name within the image
        cli: String,
    },
    /// Print the raw XML schema of a CLI
    Xml {
        /// Image name (repo:tag)
        image: String,
        /// CLI name within the image
        cli: String,
    },
    /// Compile an invocation request into a task specification
    Compile {
        /// Image name (repo:tag)
        image: String,
        /// CLI name within the image
        cli: String,

        /// Request value as key=value (repeatable, overrides --values)
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<ParamAssignment>,

        /// JSON file holding request values
        #[arg(long)]
        values: Option<PathBuf>,

        /// Container directory outputs are written under
        #[arg(long, env = "CLIDOCK_DATA_DIR")]
        data_dir: Option<String>,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Ingest { pull, load } => image::ingest(config, pull, load),
        Commands::Remove { images } => image::remove(config, images),
        Commands::List => image::list(config),
        Commands::Describe { image, cli } => cli::describe(config, &image, &cli),
        Commands::Xml { image, cli } => cli::xml(config, &image, &cli),
        Commands::Compile {
            image,
            cli,
            params,
            values,
            data_dir,
        } => cli::compile(config, &image, &cli, &params, values.as_deref(), data_dir),
    }
}
