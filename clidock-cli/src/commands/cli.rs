//! CLI command handlers
//!
//! Inspect the cached CLIs of an image and compile invocation requests
//! offline, through the same route registry the server uses.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clidock_runner::CacheStore;
use clidock_schema::{RouteRegistry, RunHandler};
use colored::*;

use crate::config::Config;
use crate::types::{ParamAssignment, request_values};

fn load_registry(config: &Config) -> Result<RouteRegistry> {
    let cache = config
        .store()
        .load()
        .with_context(|| format!("Failed to read cache {}", config.cache_path.display()))?;
    Ok(RouteRegistry::build(&cache))
}

/// Run handler of a cached CLI, explaining why it is missing if it is
fn find_handler(registry: &RouteRegistry, image: &str, cli: &str) -> Result<Arc<RunHandler>> {
    if let Some(handler) = registry.run_handler(image, cli) {
        return Ok(handler.clone());
    }

    match registry
        .failures()
        .iter()
        .find(|f| f.image == image && f.cli == cli)
    {
        Some(failure) => Err(anyhow!(
            "CLI {} of image {} could not be loaded: {}",
            cli,
            image,
            failure.reason
        )),
        None => Err(anyhow!("CLI {} not found in image {}", cli, image)),
    }
}

/// Show the REST parameters of a CLI
pub fn describe(config: &Config, image: &str, cli: &str) -> Result<()> {
    let registry = load_registry(config)?;
    let sheet = find_handler(&registry, image, cli)?.sheet();

    println!("{}", sheet.title.bold());
    println!("  Image: {}", sheet.image.cyan());
    println!("  CLI:   {}", sheet.cli.cyan());
    if !sheet.notes.is_empty() {
        println!("\n{}", sheet.notes.dimmed());
    }

    println!("\n{}", "Parameters:".bold());
    for decl in &sheet.declarations {
        let marker = if decl.required {
            "required".red()
        } else {
            "optional".dimmed()
        };
        println!("  {} ({}, {})", decl.name.cyan(), decl.data_type, marker);
        if !decl.description.is_empty() {
            println!("      {}", decl.description);
        }
        if let Some(default) = &decl.default {
            println!("      default: {}", default.dimmed());
        }
    }

    Ok(())
}

/// Print the raw XML schema of a CLI
pub fn xml(config: &Config, image: &str, cli: &str) -> Result<()> {
    let registry = load_registry(config)?;
    let xml = registry
        .xml_spec(image, cli)
        .ok_or_else(|| anyhow!("CLI {} not found in image {}", cli, image))?;

    println!("{}", xml);
    Ok(())
}

/// Compile an invocation request and print the task as JSON
pub fn compile(
    config: &Config,
    image: &str,
    cli: &str,
    params: &[ParamAssignment],
    values_file: Option<&Path>,
    data_dir: Option<String>,
) -> Result<()> {
    let registry = load_registry(config)?;
    let handler = find_handler(&registry, image, cli)?;

    let values = request_values(values_file, params)?;
    let compiled = handler
        .compile(&values, &config.compile_options(data_dir))
        .with_context(|| format!("Failed to compile task for CLI {} of image {}", cli, image))?;

    println!("{}", serde_json::to_string_pretty(&compiled)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clidock_core::domain::image::{CliMetadataEntry, ImageRecord, MetadataCache};
    use clidock_runner::{JsonFileCacheStore, RunnerConfig};

    const XML: &str = r#"<executable>
  <title>Threshold</title>
  <parameters>
    <image><name>inputImage</name><channel>input</channel><index>0</index></image>
  </parameters>
</executable>"#;

    fn config_with_cache(dir: &Path) -> Config {
        let cache_path = dir.join("cache.json");
        let mut record = ImageRecord::new("toolimg:1");
        record.add_cli(
            "threshold",
            CliMetadataEntry {
                cli_type: "cpu".to_string(),
                xml: XML.to_string(),
            },
        );
        record.add_cli(
            "broken",
            CliMetadataEntry {
                cli_type: "cpu".to_string(),
                xml: "<executable><parameters><matrix><name>m</name><index>0</index></matrix></parameters></executable>".to_string(),
            },
        );
        let mut cache = MetadataCache::new();
        cache.insert(record);
        JsonFileCacheStore::new(&cache_path).publish(cache).unwrap();

        Config {
            cache_path,
            runner: RunnerConfig::default(),
        }
    }

    #[test]
    fn test_find_handler() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_cache(dir.path());
        let registry = load_registry(&config).unwrap();

        let handler = find_handler(&registry, "toolimg:1", "threshold").unwrap();
        assert_eq!(handler.title, "Threshold");

        let err = find_handler(&registry, "toolimg:1", "broken").unwrap_err();
        assert!(err.to_string().contains("could not be loaded"));

        let err = find_handler(&registry, "toolimg:1", "nope").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_compile_requires_indexed_value() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_cache(dir.path());

        assert!(compile(&config, "toolimg:1", "threshold", &[], None, None).is_err());

        let params = vec![ParamAssignment::parse("inputImage_fileId=file-1").unwrap()];
        assert!(compile(&config, "toolimg:1", "threshold", &params, None, None).is_ok());
    }
}
