//! Compiled task domain types
//!
//! The artifacts generated from one CLI schema for one invocation request:
//! REST parameter declarations, the task specification handed to the
//! execution engine, and the input/output binding descriptors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Caller-supplied request values, keyed by REST parameter name
///
/// Inline values are JSON-encoded text; resource ids, output parents and
/// output names are plain strings.
pub type RequestValues = BTreeMap<String, String>;

/// Kind of storage resource a parameter is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    File,
    Folder,
    Url,
}

/// One parameter of the REST surface of a CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestDeclaration {
    pub name: String,
    pub description: String,
    pub data_type: String,
    pub required: bool,
    /// JSON-encoded default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// How the engine should treat a task parameter's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Value is materialised as a file and passed by path
    Filepath,
}

/// Default value attached to an optional input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultValue {
    pub format: String,
    pub data: serde_json::Value,
}

/// Entry of a task specification's `inputs` or `outputs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskParameter {
    pub id: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Task specification handed to the external execution engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub mode: String,
    pub docker_image: String,
    pub pull_image: bool,
    pub inputs: Vec<TaskParameter>,
    pub outputs: Vec<TaskParameter>,
    pub container_args: Vec<String>,
}

/// Back-reference linking an output to the input it derives from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputReference {
    /// Resource id supplied for the referenced input
    pub resource_id: String,
    /// Identifier of the referenced input parameter
    pub input: String,
    /// Identifier of the output parameter
    pub identifier: String,
}

/// How the engine materialises an input or persists an output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BindingSpec {
    /// Fetch a storage resource
    ResourceFetch {
        resource_type: ResourceKind,
        resource_id: String,
        fetch_parent: bool,
    },
    /// Fetch over HTTP
    Http { url: String },
    /// Pass the value inline
    Inline {
        #[serde(rename = "type")]
        value_type: String,
        format: String,
        data: String,
    },
    /// Write to a storage resource
    ResourceWrite {
        parent_type: ResourceKind,
        parent_id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference: Option<OutputReference>,
    },
}

/// Everything compiled for one invocation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledTask {
    pub declarations: Vec<RestDeclaration>,
    pub task: TaskSpec,
    pub inputs: BTreeMap<String, BindingSpec>,
    pub outputs: BTreeMap<String, BindingSpec>,
}
