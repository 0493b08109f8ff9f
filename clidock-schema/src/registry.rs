//! Route registry
//!
//! An immutable lookup table from `(image, cli, verb)` to the handler that
//! serves the route. It is built once from a [`MetadataCache`] and swapped
//! whole when the cache changes; routing layers only read it.

use std::collections::BTreeMap;
use std::sync::Arc;

use clidock_core::Result;
use clidock_core::domain::image::MetadataCache;
use clidock_core::domain::task::{CompiledTask, RequestValues, RestDeclaration};
use clidock_core::dto::cli::{CliSummary, ParameterSheet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::ClassifiedParameters;
use crate::compiler::{CompileOptions, Invocation, TaskSpecCompiler};

/// HTTP verb of a CLI route
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RouteVerb {
    /// Returns the raw XML schema
    Get,
    /// Compiles a run of the CLI
    Post,
}

/// Key of one registered route
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteKey {
    pub image: String,
    pub cli: String,
    pub verb: RouteVerb,
}

impl RouteKey {
    pub fn new(image: impl Into<String>, cli: impl Into<String>, verb: RouteVerb) -> Self {
        Self {
            image: image.into(),
            cli: cli.into(),
            verb,
        }
    }
}

/// What serves a route
#[derive(Debug, Clone)]
pub enum HandlerDescriptor {
    Run(Arc<RunHandler>),
    XmlSpec(Arc<str>),
}

/// Everything needed to compile runs of one CLI
#[derive(Debug)]
pub struct RunHandler {
    pub invocation: Invocation,
    pub cli_type: String,
    pub title: String,
    pub notes: String,
    pub classified: ClassifiedParameters,
    pub declarations: Vec<RestDeclaration>,
}

impl RunHandler {
    pub fn image(&self) -> &str {
        &self.invocation.image
    }

    pub fn cli(&self) -> &str {
        &self.invocation.cli_rel_path
    }

    /// Compile a run from request values
    pub fn compile(&self, values: &RequestValues, options: &CompileOptions) -> Result<CompiledTask> {
        TaskSpecCompiler::new(&self.invocation, &self.classified, options).compile(values)
    }

    /// REST parameter sheet of the run route
    pub fn sheet(&self) -> ParameterSheet {
        ParameterSheet {
            image: self.image().to_string(),
            cli: self.cli().to_string(),
            title: self.title.clone(),
            notes: self.notes.clone(),
            declarations: self.declarations.clone(),
        }
    }
}

/// A CLI left out of the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationFailure {
    pub image: String,
    pub cli: String,
    pub reason: String,
}

/// Path segment of an image on the REST surface
///
/// # Example
/// ```
/// use clidock_schema::rest_path;
///
/// assert_eq!(rest_path("dsarchive/histomicstk:latest"), "dsarchive_histomicstk_latest");
/// ```
pub fn rest_path(image: &str) -> String {
    image.replace([':', '/', '@'], "_")
}

/// Immutable `(image, cli, verb)` → handler table
#[derive(Debug, Default)]
pub struct RouteRegistry {
    handlers: BTreeMap<RouteKey, HandlerDescriptor>,
    rest_paths: BTreeMap<String, String>,
    failures: Vec<RegistrationFailure>,
}

impl RouteRegistry {
    /// Build the registry from every CLI in the cache
    ///
    /// A CLI whose schema fails to compile is logged, recorded as a failure,
    /// and skipped; sibling CLIs of the same image still register.
    pub fn build(cache: &MetadataCache) -> Self {
        let mut registry = Self::default();

        for record in cache.records() {
            let path = rest_path(&record.name);
            if let Some(other) = registry.rest_paths.get(&path) {
                warn!(
                    image = %record.name,
                    other = %other,
                    "Skipping image whose REST path is already taken"
                );
                let reason = format!("REST path '{}' already used by {}", path, other);
                for cli in record.cli_names() {
                    registry.fail(&record.name, cli, reason.clone());
                }
                continue;
            }
            registry.rest_paths.insert(path, record.name.clone());

            for (cli, entry) in &record.clis {
                match load_handler(&record.name, cli, &entry.cli_type, &entry.xml) {
                    Ok(handler) => {
                        debug!(image = %record.name, cli = %cli, "Registered CLI routes");
                        registry.handlers.insert(
                            RouteKey::new(&record.name, cli, RouteVerb::Post),
                            HandlerDescriptor::Run(Arc::new(handler)),
                        );
                        registry.handlers.insert(
                            RouteKey::new(&record.name, cli, RouteVerb::Get),
                            HandlerDescriptor::XmlSpec(Arc::from(entry.xml.as_str())),
                        );
                    }
                    Err(e) => {
                        warn!(
                            image = %record.name,
                            cli = %cli,
                            error = %e,
                            "Failed to create REST endpoints for CLI"
                        );
                        registry.fail(&record.name, cli, e.to_string());
                    }
                }
            }
        }

        registry
    }

    fn fail(&mut self, image: &str, cli: &str, reason: String) {
        self.failures.push(RegistrationFailure {
            image: image.to_string(),
            cli: cli.to_string(),
            reason,
        });
    }

    pub fn get(&self, key: &RouteKey) -> Option<&HandlerDescriptor> {
        self.handlers.get(key)
    }

    /// Run handler of a CLI
    pub fn run_handler(&self, image: &str, cli: &str) -> Option<&Arc<RunHandler>> {
        match self.get(&RouteKey::new(image, cli, RouteVerb::Post)) {
            Some(HandlerDescriptor::Run(handler)) => Some(handler),
            _ => None,
        }
    }

    /// Raw XML schema of a CLI
    pub fn xml_spec(&self, image: &str, cli: &str) -> Option<&Arc<str>> {
        match self.get(&RouteKey::new(image, cli, RouteVerb::Get)) {
            Some(HandlerDescriptor::XmlSpec(xml)) => Some(xml),
            _ => None,
        }
    }

    /// Image name behind a REST path segment
    pub fn resolve_rest_path(&self, path: &str) -> Option<&str> {
        self.rest_paths.get(path).map(String::as_str)
    }

    /// Relative routes (`<restPath>/<cli>`) of every registered CLI
    pub fn routes(&self) -> Vec<String> {
        self.run_handlers()
            .map(|h| format!("{}/{}", rest_path(h.image()), h.cli()))
            .collect()
    }

    /// Summary of every registered CLI
    pub fn summaries(&self) -> Vec<CliSummary> {
        self.run_handlers()
            .map(|h| CliSummary {
                image: h.image().to_string(),
                cli: h.cli().to_string(),
                cli_type: h.cli_type.clone(),
                route: format!("{}/{}", rest_path(h.image()), h.cli()),
            })
            .collect()
    }

    fn run_handlers(&self) -> impl Iterator<Item = &Arc<RunHandler>> {
        self.handlers.values().filter_map(|handler| match handler {
            HandlerDescriptor::Run(handler) => Some(handler),
            HandlerDescriptor::XmlSpec(_) => None,
        })
    }

    pub fn failures(&self) -> &[RegistrationFailure] {
        &self.failures
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

fn load_handler(image: &str, cli: &str, cli_type: &str, xml: &str) -> Result<RunHandler> {
    let (schema, classified) = crate::load_cli(xml)?;
    let invocation = Invocation::new(image, cli);
    let declarations = TaskSpecCompiler::new(&invocation, &classified, &CompileOptions::default())
        .declarations()?;

    Ok(RunHandler {
        invocation,
        cli_type: cli_type.to_string(),
        title: schema.title.clone(),
        notes: schema.notes(),
        classified,
        declarations,
    })
}
