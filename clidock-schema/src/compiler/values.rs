//! Request value resolution
//!
//! Decides, once per request, where each input's value comes from and where
//! each output goes. Every artifact builder reads from the [`Resolved`] set
//! instead of the raw request.

use std::collections::BTreeMap;

use clidock_core::domain::parameter::{Parameter, ParameterType};
use clidock_core::domain::task::{RequestValues, ResourceKind};
use clidock_core::{Error, Result};
use serde_json::Value;

use crate::classify::ClassifiedParameters;
use crate::typemap::{self, OUTPUT_NAME_SUFFIX, OUTPUT_PARENT_SUFFIX, RETURN_PARAMETER_FILE};

/// Source of one input's value
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum InputValue {
    /// Storage resource, materialised as a file
    Resource { kind: ResourceKind, id: String },
    /// HTTP download, materialised as a file
    Url(String),
    /// JSON value passed inline
    Inline { value: Value, encoded: String },
}

impl InputValue {
    /// Whether the engine hands the CLI a path rather than the value itself
    pub fn is_materialised(&self) -> bool {
        !matches!(self, InputValue::Inline { .. })
    }
}

/// Destination of one output
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutputTarget {
    pub parent_id: String,
    pub name: String,
}

/// Request values resolved against the classified parameters
#[derive(Debug, Default)]
pub(crate) struct Resolved {
    /// Inputs that have a value, keyed by identifier
    pub inputs: BTreeMap<String, InputValue>,
    /// Outputs that have a destination, keyed by identifier
    pub outputs: BTreeMap<String, OutputTarget>,
}

impl Resolved {
    pub fn input(&self, identifier: &str) -> Option<&InputValue> {
        self.inputs.get(identifier)
    }

    pub fn output(&self, identifier: &str) -> Option<&OutputTarget> {
        self.outputs.get(identifier)
    }
}

pub(crate) fn resolve(params: &ClassifiedParameters, request: &RequestValues) -> Result<Resolved> {
    let mut resolved = Resolved::default();

    for param in params.indexed_inputs() {
        let value = match resource_key(param) {
            Some((kind, key)) => InputValue::Resource {
                kind,
                id: required(request, &key)?.to_string(),
            },
            None => {
                let raw = required(request, &param.identifier)?;
                inline(param, raw)?
            }
        };
        resolved.inputs.insert(param.identifier.clone(), value);
    }

    for param in params.optional_inputs() {
        if let Some(value) = optional_input(param, request)? {
            resolved.inputs.insert(param.identifier.clone(), value);
        }
    }

    for param in params.indexed_outputs() {
        let name_key = name_key(&param.identifier);
        let target = OutputTarget {
            parent_id: required(request, &parent_key(&param.identifier))?.to_string(),
            name: output_name(&name_key, required(request, &name_key)?)?,
        };
        resolved.outputs.insert(param.identifier.clone(), target);
    }

    for param in params.optional_outputs() {
        if let Some(target) = optional_target(request, &param.identifier)? {
            resolved.outputs.insert(param.identifier.clone(), target);
        }
    }

    if params.has_simple_outputs() {
        if let Some(target) = optional_target(request, RETURN_PARAMETER_FILE)? {
            resolved
                .outputs
                .insert(RETURN_PARAMETER_FILE.to_string(), target);
        }
    }

    Ok(resolved)
}

fn optional_input(param: &Parameter, request: &RequestValues) -> Result<Option<InputValue>> {
    if let Some((kind, key)) = resource_key(param) {
        let value = request.get(&key).map(|id| match kind {
            ResourceKind::Url => InputValue::Url(id.clone()),
            _ => InputValue::Resource {
                kind,
                id: id.clone(),
            },
        });

        // A string without a URL falls through to its inline value
        if value.is_some() || param.param_type != ParameterType::String {
            return Ok(value);
        }
    }

    if let Some(raw) = request.get(&param.identifier) {
        return inline(param, raw).map(Some);
    }

    match &param.default {
        Some(default) => Ok(Some(InputValue::Inline {
            value: default.clone(),
            encoded: serde_json::to_string(default)?,
        })),
        None if param.is_vector() => Ok(None),
        None => Err(Error::MissingDefault {
            parameter: param.identifier.clone(),
            type_name: param.param_type.to_string(),
        }),
    }
}

/// Resource kind and request key of an input bound to a resource
///
/// Indexed strings are always inline; only optional strings may be fetched
/// from a URL.
fn resource_key(param: &Parameter) -> Option<(ResourceKind, String)> {
    if param.param_type == ParameterType::String && param.is_indexed() {
        return None;
    }
    let kind = typemap::resource_kind(param.param_type)?;
    let suffix = typemap::input_suffix(param.param_type)?;
    Some((kind, format!("{}{}", param.identifier, suffix)))
}

fn inline(param: &Parameter, raw: &str) -> Result<InputValue> {
    let invalid = |reason: String| Error::InvalidValue {
        parameter: param.identifier.clone(),
        value: raw.to_string(),
        reason,
    };

    let value: Value = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    if param.is_vector() && !value.is_array() {
        return Err(invalid(format!("{} expects a JSON array", param.param_type)));
    }

    Ok(InputValue::Inline {
        value,
        encoded: raw.to_string(),
    })
}

fn optional_target(request: &RequestValues, identifier: &str) -> Result<Option<OutputTarget>> {
    let name_key = name_key(identifier);
    let (Some(parent_id), Some(name)) = (request.get(&parent_key(identifier)), request.get(&name_key))
    else {
        return Ok(None);
    };
    Ok(Some(OutputTarget {
        parent_id: parent_id.clone(),
        name: output_name(&name_key, name)?,
    }))
}

/// Output names are bare file names inside the data directory
fn output_name(key: &str, name: &str) -> Result<String> {
    let reason = if name.is_empty() {
        Some("output name cannot be empty")
    } else if name.contains(['/', '\\', '\0']) {
        Some("output name cannot contain a path separator")
    } else if name == "." || name == ".." {
        Some("output name cannot leave the data directory")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidValue {
            parameter: key.to_string(),
            value: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(name.to_string()),
    }
}

fn required<'r>(request: &'r RequestValues, key: &str) -> Result<&'r str> {
    request
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| Error::MissingValue {
            name: key.to_string(),
        })
}

pub(crate) fn parent_key(identifier: &str) -> String {
    format!("{}{}", identifier, OUTPUT_PARENT_SUFFIX)
}

pub(crate) fn name_key(identifier: &str) -> String {
    format!("{}{}", identifier, OUTPUT_NAME_SUFFIX)
}

/// Request key of an input's resource reference, if it has one
pub(crate) fn input_key(param: &Parameter) -> Option<String> {
    resource_key(param).map(|(_, key)| key)
}
