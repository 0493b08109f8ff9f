//! Container argument list
//!
//! Layout: `<cliRelPath> [indexed values ascending] [flag value]* [--returnparameterfile <path>]`.

use serde_json::Value;

use super::Invocation;
use super::values::{InputValue, Resolved};
use crate::classify::ClassifiedParameters;
use crate::typemap::{self, RETURN_PARAMETER_FILE, RETURN_PARAMETER_FLAG};

pub(crate) fn container_args(
    invocation: &Invocation,
    params: &ClassifiedParameters,
    resolved: &Resolved,
    data_dir: &str,
) -> Vec<String> {
    let mut args = vec![invocation.cli_rel_path.clone()];

    // Indexed inputs and outputs interleave by index
    for param in &params.indexed {
        if param.is_input() {
            if let Some(value) = resolved.input(&param.identifier) {
                args.push(input_arg(&param.identifier, value));
            }
        } else if let Some(target) = resolved.output(&param.identifier) {
            args.push(container_path(data_dir, &target.name));
        }
    }

    for param in params.optional_inputs() {
        let (Some(flag), Some(value)) = (
            param.binding.flag_token(),
            resolved.input(&param.identifier),
        ) else {
            continue;
        };
        args.push(flag.to_string());
        args.push(input_arg(&param.identifier, value));
    }

    for param in params.optional_outputs() {
        let (Some(flag), Some(target)) = (
            param.binding.flag_token(),
            resolved.output(&param.identifier),
        ) else {
            continue;
        };
        args.push(flag.to_string());
        args.push(container_path(data_dir, &target.name));
    }

    if let Some(target) = resolved.output(RETURN_PARAMETER_FILE) {
        args.push(RETURN_PARAMETER_FLAG.to_string());
        args.push(container_path(data_dir, &target.name));
    }

    args
}

fn input_arg(identifier: &str, value: &InputValue) -> String {
    match value {
        InputValue::Inline { value, .. } => render_value(value),
        InputValue::Resource { .. } | InputValue::Url(_) => typemap::input_placeholder(identifier),
    }
}

fn container_path(data_dir: &str, name: &str) -> String {
    format!("{}/{}", data_dir.trim_end_matches('/'), name)
}

/// Command-line text of a decoded JSON value
///
/// Lists render as their elements joined with `", "`; strings render without
/// quotes and null as an empty string.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
