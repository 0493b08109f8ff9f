//! Task specification

use clidock_core::domain::parameter::Parameter;
use clidock_core::domain::task::{DefaultValue, Target, TaskParameter, TaskSpec};
use clidock_core::{Error, Result};
use serde_json::Value;

use super::Invocation;
use super::values::Resolved;
use crate::classify::ClassifiedParameters;
use crate::typemap::{self, RETURN_PARAMETER_FILE, RETURN_PARAMETER_FILE_TYPE};

pub(crate) fn task_spec(
    invocation: &Invocation,
    params: &ClassifiedParameters,
    resolved: &Resolved,
    container_args: Vec<String>,
) -> Result<TaskSpec> {
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();

    for param in params.indexed_inputs() {
        inputs.push(entry(param, resolved));
    }

    for param in params.optional_inputs() {
        let mut spec = entry(param, resolved);
        spec.default = Some(DefaultValue {
            format: spec.format.clone(),
            data: default_data(param)?,
        });
        inputs.push(spec);
    }

    let requested_outputs = params.indexed_outputs().chain(params.optional_outputs());
    for param in requested_outputs {
        if let Some(target) = resolved.output(&param.identifier) {
            let mut spec = entry(param, resolved);
            spec.path = Some(target.name.clone());
            outputs.push(spec);
        }
    }

    if let Some(target) = resolved.output(RETURN_PARAMETER_FILE) {
        let value_type = typemap::engine_type(RETURN_PARAMETER_FILE_TYPE).to_string();
        outputs.push(TaskParameter {
            id: RETURN_PARAMETER_FILE.to_string(),
            format: value_type.clone(),
            value_type,
            target: Some(Target::Filepath),
            default: None,
            path: Some(target.name.clone()),
        });
    }

    Ok(TaskSpec {
        name: invocation.task_name(),
        mode: "docker".to_string(),
        docker_image: invocation.image.clone(),
        pull_image: false,
        inputs,
        outputs,
        container_args,
    })
}

fn entry(param: &Parameter, resolved: &Resolved) -> TaskParameter {
    let value_type = typemap::engine_type(param.param_type).to_string();
    let materialised = param.is_external()
        || resolved
            .input(&param.identifier)
            .is_some_and(|value| value.is_materialised());

    TaskParameter {
        id: param.identifier.clone(),
        format: value_type.clone(),
        value_type,
        target: materialised.then_some(Target::Filepath),
        default: None,
        path: None,
    }
}

/// Default data of an optional input
///
/// External inputs default to an empty reference and vectors to null. Any
/// other input must declare its own default.
pub(crate) fn default_data(param: &Parameter) -> Result<Value> {
    match &param.default {
        Some(default) => Ok(default.clone()),
        None if param.is_external() => Ok(Value::String(String::new())),
        None if param.is_vector() => Ok(Value::Null),
        None => Err(Error::MissingDefault {
            parameter: param.identifier.clone(),
            type_name: param.param_type.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::values::resolve;
    use crate::load_cli;
    use clidock_core::domain::task::RequestValues;
    use serde_json::json;

    const XML: &str = r#"
<executable><parameters>
  <image><name>input</name><index>0</index></image>
  <file><name>labels</name><channel>output</channel><index>1</index></file>
  <float><name>threshold</name><flag>t</flag><default>0.25</default></float>
  <string-vector><name>channels</name><longflag>channels</longflag></string-vector>
  <directory><name>report</name><channel>output</channel><longflag>report</longflag></directory>
</parameters></executable>
"#;

    fn build(pairs: &[(&str, &str)]) -> TaskSpec {
        let (_, params) = load_cli(XML).unwrap();
        let request: RequestValues = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let resolved = resolve(&params, &request).unwrap();
        let invocation = Invocation::new("lab/seg:2", "bin/segment");
        task_spec(&invocation, &params, &resolved, Vec::new()).unwrap()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("input_fileId", "f-1"),
            ("labels_folderId", "d-1"),
            ("labels_name", "labels.tif"),
        ]
    }

    #[test]
    fn test_inputs_in_indexed_then_optional_order() {
        let spec = build(&base());
        let ids: Vec<_> = spec.inputs.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["input", "threshold", "channels"]);
        assert_eq!(spec.name, "bin.segment");
        assert_eq!(spec.docker_image, "lab/seg:2");
    }

    #[test]
    fn test_external_inputs_target_filepath() {
        let spec = build(&base());
        assert_eq!(spec.inputs[0].target, Some(Target::Filepath));
        assert_eq!(spec.inputs[0].value_type, "string");
        assert!(spec.inputs[0].default.is_none());
        assert_eq!(spec.inputs[1].target, None);
    }

    #[test]
    fn test_optional_inputs_carry_defaults() {
        let spec = build(&base());
        let threshold = spec.inputs[1].default.as_ref().unwrap();
        assert_eq!(threshold.format, "number");
        assert_eq!(threshold.data, json!(0.25));

        let channels = spec.inputs[2].default.as_ref().unwrap();
        assert_eq!(channels.format, "string_list");
        assert_eq!(channels.data, Value::Null);
    }

    #[test]
    fn test_output_path_only_when_requested() {
        let spec = build(&base());
        assert_eq!(spec.outputs.len(), 1);
        assert_eq!(spec.outputs[0].id, "labels");
        assert_eq!(spec.outputs[0].path.as_deref(), Some("labels.tif"));

        let mut pairs = base();
        pairs.push(("report_folderId", "d-2"));
        pairs.push(("report_name", "summary"));
        let spec = build(&pairs);
        assert_eq!(spec.outputs.len(), 2);
        assert_eq!(spec.outputs[1].path.as_deref(), Some("summary"));
        assert_eq!(spec.outputs[1].target, Some(Target::Filepath));
    }
}
