//! Input and output binding specs

use std::collections::BTreeMap;

use clidock_core::domain::task::{BindingSpec, OutputReference, ResourceKind};
use clidock_core::{Error, Result};

use super::values::{InputValue, Resolved};
use crate::classify::ClassifiedParameters;
use crate::typemap::{self, RETURN_PARAMETER_FILE};

pub(crate) fn input_bindings(
    params: &ClassifiedParameters,
    resolved: &Resolved,
) -> BTreeMap<String, BindingSpec> {
    params
        .inputs()
        .filter_map(|param| {
            let value = resolved.input(&param.identifier)?;
            let spec = match value {
                InputValue::Resource { kind, id } => BindingSpec::ResourceFetch {
                    resource_type: *kind,
                    resource_id: id.clone(),
                    fetch_parent: true,
                },
                InputValue::Url(url) => BindingSpec::Http { url: url.clone() },
                InputValue::Inline { encoded, .. } => BindingSpec::Inline {
                    value_type: typemap::engine_type(param.param_type).to_string(),
                    format: "json".to_string(),
                    data: encoded.clone(),
                },
            };
            Some((param.identifier.clone(), spec))
        })
        .collect()
}

pub(crate) fn output_bindings(
    params: &ClassifiedParameters,
    resolved: &Resolved,
) -> Result<BTreeMap<String, BindingSpec>> {
    let mut bindings = BTreeMap::new();

    for param in params.indexed_outputs().chain(params.optional_outputs()) {
        let Some(target) = resolved.output(&param.identifier) else {
            continue;
        };

        let reference = match &param.reference {
            Some(input) => Some(OutputReference {
                resource_id: referenced_resource(resolved, &param.identifier, input)?,
                input: input.clone(),
                identifier: param.identifier.clone(),
            }),
            None => None,
        };

        bindings.insert(
            param.identifier.clone(),
            BindingSpec::ResourceWrite {
                parent_type: ResourceKind::Folder,
                parent_id: target.parent_id.clone(),
                name: target.name.clone(),
                reference,
            },
        );
    }

    if let Some(target) = resolved.output(RETURN_PARAMETER_FILE) {
        bindings.insert(
            RETURN_PARAMETER_FILE.to_string(),
            BindingSpec::ResourceWrite {
                parent_type: ResourceKind::Folder,
                parent_id: target.parent_id.clone(),
                name: target.name.clone(),
                reference: None,
            },
        );
    }

    Ok(bindings)
}

/// Resource id supplied for the input an output refers to
fn referenced_resource(resolved: &Resolved, output: &str, input: &str) -> Result<String> {
    match resolved.input(input) {
        Some(InputValue::Resource { id, .. }) => Ok(id.clone()),
        _ => Err(Error::InvalidReference {
            parameter: output.to_string(),
            reference: input.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::values::resolve;
    use crate::load_cli;
    use clidock_core::domain::task::RequestValues;

    const XML: &str = r#"
<executable><parameters>
  <image><name>slide</name><index>0</index></image>
  <file><name>extra</name><longflag>extra</longflag></file>
  <file reference="extra"><name>derived</name><channel>output</channel><longflag>derived</longflag></file>
  <integer><name>level</name><longflag>level</longflag><default>0</default></integer>
</parameters></executable>
"#;

    fn request(pairs: &[(&str, &str)]) -> RequestValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_input_bindings() {
        let (_, params) = load_cli(XML).unwrap();
        let resolved = resolve(&params, &request(&[("slide_fileId", "s-1"), ("level", "2")])).unwrap();
        let bindings = input_bindings(&params, &resolved);

        assert_eq!(
            bindings.get("slide"),
            Some(&BindingSpec::ResourceFetch {
                resource_type: ResourceKind::File,
                resource_id: "s-1".to_string(),
                fetch_parent: true,
            })
        );
        assert_eq!(
            bindings.get("level"),
            Some(&BindingSpec::Inline {
                value_type: "integer".to_string(),
                format: "json".to_string(),
                data: "2".to_string(),
            })
        );
        assert!(!bindings.contains_key("extra"));
    }

    #[test]
    fn test_reference_to_unsupplied_input_is_invalid() {
        let (_, params) = load_cli(XML).unwrap();
        let resolved = resolve(
            &params,
            &request(&[
                ("slide_fileId", "s-1"),
                ("derived_folderId", "d-1"),
                ("derived_name", "derived.json"),
            ]),
        )
        .unwrap();

        let err = output_bindings(&params, &resolved).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidReference { ref parameter, ref reference }
                if parameter == "derived" && reference == "extra"
        ));
    }

    #[test]
    fn test_reference_to_supplied_input() {
        let (_, params) = load_cli(XML).unwrap();
        let resolved = resolve(
            &params,
            &request(&[
                ("slide_fileId", "s-1"),
                ("extra_fileId", "e-7"),
                ("derived_folderId", "d-1"),
                ("derived_name", "derived.json"),
            ]),
        )
        .unwrap();

        let bindings = output_bindings(&params, &resolved).unwrap();
        let Some(BindingSpec::ResourceWrite {
            reference: Some(reference),
            ..
        }) = bindings.get("derived")
        else {
            panic!("derived output should be bound with a reference");
        };
        assert_eq!(reference.resource_id, "e-7");
        assert_eq!(reference.input, "extra");
    }
}
