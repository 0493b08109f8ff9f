//! Clidock Schema Compiler
//!
//! Turns the XML parameter schema of a containerized CLI into everything
//! needed to expose and run it:
//! - XML schema parsing
//! - Static type maps (engine value type, storage resource, input suffix)
//! - Parameter classification (indexed/optional × input/output)
//! - Task compilation (REST declarations, task spec, bindings, container args)
//! - An immutable route registry built from a metadata cache
//!
//! Nothing in this crate performs I/O.

pub mod classify;
pub mod compiler;
pub mod parser;
pub mod registry;
pub mod typemap;

pub use classify::{ClassifiedParameters, classify};
pub use compiler::{CompileOptions, Invocation, TaskSpecCompiler};
pub use parser::parse_cli_schema;
pub use registry::{
    HandlerDescriptor, RegistrationFailure, RouteKey, RouteRegistry, RouteVerb, RunHandler,
    rest_path,
};

use clidock_core::Result;
use clidock_core::domain::schema::CliSchema;

/// Parses and classifies a CLI schema in one step
pub fn load_cli(xml: &str) -> Result<(CliSchema, ClassifiedParameters)> {
    let schema = parse_cli_schema(xml)?;
    let classified = classify(&schema)?;
    Ok((schema, classified))
}
