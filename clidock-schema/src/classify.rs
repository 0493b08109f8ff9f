//! Parameter classification
//!
//! Turns the declared parameters of a [`CliSchema`] into typed [`Parameter`]s
//! split along two axes: indexed vs optional, and input vs output. The result
//! is materialised once into ordered vectors and handed by reference to every
//! consumer.

use std::collections::{BTreeMap, HashSet};

use clidock_core::domain::parameter::{
    ArgumentBinding, Channel, Parameter, ParameterType, ScalarKind,
};
use clidock_core::domain::schema::{CliSchema, ParameterDecl};
use clidock_core::{Error, Result};
use serde_json::Value;

use crate::typemap::{self, RETURN_PARAMETER_FILE};

/// Classified parameters of one CLI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedParameters {
    /// Positional parameters, ascending by index
    pub indexed: Vec<Parameter>,
    /// Flagged inputs and flagged external outputs, in declaration order
    pub optional: Vec<Parameter>,
    /// Flagged outputs of inline type, returned through the return parameter file
    pub simple_outputs: Vec<Parameter>,
}

impl ClassifiedParameters {
    pub fn indexed_inputs(&self) -> impl Iterator<Item = &Parameter> {
        self.indexed.iter().filter(|p| p.is_input())
    }

    pub fn indexed_outputs(&self) -> impl Iterator<Item = &Parameter> {
        self.indexed.iter().filter(|p| p.is_output())
    }

    pub fn optional_inputs(&self) -> impl Iterator<Item = &Parameter> {
        self.optional.iter().filter(|p| p.is_input())
    }

    pub fn optional_outputs(&self) -> impl Iterator<Item = &Parameter> {
        self.optional.iter().filter(|p| p.is_output())
    }

    /// Every input, indexed first
    pub fn inputs(&self) -> impl Iterator<Item = &Parameter> {
        self.indexed_inputs().chain(self.optional_inputs())
    }

    /// Looks up an input by identifier
    pub fn input(&self, identifier: &str) -> Option<&Parameter> {
        self.inputs().find(|p| p.identifier == identifier)
    }

    /// Whether the return parameter file must be offered
    pub fn has_simple_outputs(&self) -> bool {
        !self.simple_outputs.is_empty()
    }

    /// Total number of classified parameters
    pub fn len(&self) -> usize {
        self.indexed.len() + self.optional.len() + self.simple_outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classify the parameters of a parsed CLI schema
///
/// # Errors
/// - `UnsupportedType` for a declared type without a type mapping
/// - `MissingDefault` for an optional inline scalar input without a default
/// - `InvalidReference` for an output referencing no declared external input
/// - `Schema` for a missing identifier, an unknown channel, both or neither
///   of index and flag, a duplicate index or identifier, an indexed output of
///   inline type, or an undecodable default
pub fn classify(schema: &CliSchema) -> Result<ClassifiedParameters> {
    let mut classified = ClassifiedParameters::default();
    let mut identifiers = HashSet::new();
    let mut indices = BTreeMap::new();

    for decl in schema.parameters() {
        let param = to_parameter(decl)?;

        if !identifiers.insert(param.identifier.clone()) {
            return Err(Error::schema(format!(
                "duplicate parameter identifier '{}'",
                param.identifier
            )));
        }

        match param.binding {
            ArgumentBinding::Index(index) => {
                if let Some(other) = indices.insert(index, param.identifier.clone()) {
                    return Err(Error::schema(format!(
                        "parameters '{}' and '{}' share index {}",
                        other, param.identifier, index
                    )));
                }
                if param.is_output() && !param.is_external() {
                    return Err(Error::schema(format!(
                        "indexed output '{}' must be a file, directory or image, not {}",
                        param.identifier, param.param_type
                    )));
                }
                classified.indexed.push(param);
            }
            ArgumentBinding::Flag { .. } => {
                if param.is_output() && !param.is_external() {
                    classified.simple_outputs.push(param);
                } else {
                    check_default(&param)?;
                    classified.optional.push(param);
                }
            }
        }
    }

    classified
        .indexed
        .sort_by_key(|p| p.binding.index().unwrap_or(u32::MAX));

    check_references(&classified)?;

    if classified.has_simple_outputs() && identifiers.contains(RETURN_PARAMETER_FILE) {
        return Err(Error::schema(format!(
            "parameter identifier '{}' is reserved for simple outputs",
            RETURN_PARAMETER_FILE
        )));
    }

    Ok(classified)
}

fn to_parameter(decl: &ParameterDecl) -> Result<Parameter> {
    let identifier = decl
        .identifier()
        .ok_or_else(|| Error::schema(format!("{} parameter has no name or flag", decl.tag)))?
        .to_string();

    let param_type = typemap::parameter_type(&decl.tag).ok_or_else(|| Error::UnsupportedType {
        type_name: decl.tag.clone(),
    })?;

    let channel = match decl.channel.as_deref() {
        None | Some("input") => Channel::Input,
        Some("output") => Channel::Output,
        Some(other) => {
            return Err(Error::schema(format!(
                "parameter '{}' has unknown channel '{}'",
                identifier, other
            )));
        }
    };

    let has_flag = decl.flag.is_some() || decl.longflag.is_some();
    let binding = match (decl.index, has_flag) {
        (Some(index), false) => ArgumentBinding::Index(index),
        (None, true) => ArgumentBinding::Flag {
            flag: decl.flag.clone(),
            longflag: decl.longflag.clone(),
        },
        (Some(_), true) => {
            return Err(Error::schema(format!(
                "parameter '{}' declares both an index and a flag",
                identifier
            )));
        }
        (None, false) => {
            return Err(Error::schema(format!(
                "parameter '{}' declares neither an index nor a flag",
                identifier
            )));
        }
    };

    // Only text kinds can hold an empty default
    let default = decl
        .default
        .as_deref()
        .filter(|text| !text.trim().is_empty() || param_type.scalar_kind() == ScalarKind::Text)
        .map(|text| decode_default(&identifier, param_type, text))
        .transpose()?;

    Ok(Parameter {
        identifier,
        param_type,
        channel,
        binding,
        label: decl.label.clone(),
        description: decl.description.clone().unwrap_or_default(),
        default,
        reference: decl.reference.clone(),
        elements: decl.elements.clone(),
    })
}

/// Optional inline scalars must declare a default; vectors and external
/// types fall back to null and empty defaults
fn check_default(param: &Parameter) -> Result<()> {
    if param.is_input() && !param.is_external() && !param.is_vector() && param.default.is_none()
    {
        return Err(Error::MissingDefault {
            parameter: param.identifier.clone(),
            type_name: param.param_type.to_string(),
        });
    }
    Ok(())
}

fn check_references(classified: &ClassifiedParameters) -> Result<()> {
    let outputs = classified
        .indexed_outputs()
        .chain(classified.optional_outputs());

    for output in outputs {
        let Some(reference) = &output.reference else {
            continue;
        };

        let resolves = classified
            .input(reference)
            .is_some_and(|input| input.is_external());
        if !resolves {
            return Err(Error::InvalidReference {
                parameter: output.identifier.clone(),
                reference: reference.clone(),
            });
        }
    }

    Ok(())
}

/// Decode a declared default into a typed JSON value
fn decode_default(identifier: &str, param_type: ParameterType, text: &str) -> Result<Value> {
    let kind = param_type.scalar_kind();

    if param_type.is_vector() {
        let trimmed = text.trim().trim_start_matches('[').trim_end_matches(']');
        if trimmed.trim().is_empty() {
            return Ok(Value::Array(Vec::new()));
        }
        return trimmed
            .split(',')
            .map(|item| decode_scalar(identifier, kind, item.trim()))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array);
    }

    decode_scalar(identifier, kind, text)
}

fn decode_scalar(identifier: &str, kind: ScalarKind, text: &str) -> Result<Value> {
    let invalid = || {
        Error::schema(format!(
            "default '{}' of parameter '{}' is not a valid {:?} value",
            text, identifier, kind
        ))
    };

    match kind {
        ScalarKind::Boolean => match text.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        ScalarKind::Integer => text.parse::<i64>().map(Value::from).map_err(|_| invalid()),
        ScalarKind::Number => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid),
        ScalarKind::Text => Ok(Value::String(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_cli_schema;
    use serde_json::json;

    fn classify_xml(parameters: &str) -> Result<ClassifiedParameters> {
        let xml = format!(
            "<executable><title>T</title><parameters>{}</parameters></executable>",
            parameters
        );
        classify(&parse_cli_schema(&xml)?)
    }

    #[test]
    fn test_indexed_sorted_by_index_regardless_of_declaration_order() {
        let classified = classify_xml(
            r#"
            <file><name>out</name><channel>output</channel><index>2</index></file>
            <image><name>first</name><channel>input</channel><index>0</index></image>
            <integer><name>count</name><index>1</index></integer>
            "#,
        )
        .unwrap();

        let order: Vec<_> = classified
            .indexed
            .iter()
            .map(|p| p.identifier.as_str())
            .collect();
        assert_eq!(order, vec!["first", "count", "out"]);
        assert_eq!(classified.indexed_inputs().count(), 2);
        assert_eq!(classified.indexed_outputs().count(), 1);
    }

    #[test]
    fn test_optional_keep_declaration_order_and_simple_outputs_split() {
        let classified = classify_xml(
            r#"
            <double><name>zeta</name><longflag>zeta</longflag><default>1.5</default></double>
            <integer><name>count</name><channel>output</channel><longflag>count</longflag></integer>
            <boolean><name>alpha</name><flag>a</flag><default>false</default></boolean>
            <file><name>report</name><channel>output</channel><longflag>report</longflag></file>
            "#,
        )
        .unwrap();

        let optional: Vec<_> = classified
            .optional
            .iter()
            .map(|p| p.identifier.as_str())
            .collect();
        assert_eq!(optional, vec!["zeta", "alpha", "report"]);
        assert_eq!(classified.simple_outputs.len(), 1);
        assert_eq!(classified.simple_outputs[0].identifier, "count");
        assert!(classified.has_simple_outputs());
        assert_eq!(classified.len(), 4);
    }

    #[test]
    fn test_duplicate_index_is_schema_error() {
        let err = classify_xml(
            r#"
            <image><name>a</name><index>0</index></image>
            <image><name>b</name><index>0</index></image>
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
        assert!(err.to_string().contains("share index 0"));
    }

    #[test]
    fn test_duplicate_identifier_is_schema_error() {
        let err = classify_xml(
            r#"
            <image><name>a</name><index>0</index></image>
            <integer><name>a</name><longflag>a</longflag><default>1</default></integer>
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_index_and_flag_are_exclusive() {
        let both = classify_xml(
            r#"<integer><name>n</name><index>0</index><flag>n</flag></integer>"#,
        )
        .unwrap_err();
        assert!(both.to_string().contains("both"));

        let neither = classify_xml(r#"<integer><name>n</name></integer>"#).unwrap_err();
        assert!(neither.to_string().contains("neither"));
    }

    #[test]
    fn test_unsupported_type() {
        let err = classify_xml(
            r#"<geometry><name>shape</name><index>0</index></geometry>"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedType { ref type_name } if type_name == "geometry"
        ));
    }

    #[test]
    fn test_missing_default_is_never_substituted() {
        for tag in ["integer", "double", "string", "boolean", "string-enumeration"] {
            let xml = format!("<{0}><name>p</name><longflag>p</longflag></{0}>", tag);
            let err = classify_xml(&xml).unwrap_err();
            assert!(
                matches!(err, Error::MissingDefault { ref parameter, .. } if parameter == "p"),
                "{} should require a default",
                tag
            );
        }
    }

    #[test]
    fn test_empty_default_only_counts_for_text() {
        let classified = classify_xml(
            r#"<string><name>suffix</name><longflag>suffix</longflag><default></default></string>"#,
        )
        .unwrap();
        assert_eq!(classified.optional[0].default, Some(json!("")));

        let err = classify_xml(
            r#"<integer><name>n</name><longflag>n</longflag><default></default></integer>"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingDefault { ref parameter, .. } if parameter == "n"));
    }

    #[test]
    fn test_vectors_and_external_types_need_no_default() {
        let classified = classify_xml(
            r#"
            <integer-vector><name>sizes</name><longflag>sizes</longflag></integer-vector>
            <file><name>mask</name><longflag>mask</longflag></file>
            <region><name>roi</name><longflag>roi</longflag></region>
            "#,
        )
        .unwrap();
        assert_eq!(classified.optional.len(), 3);
        assert!(classified.optional.iter().all(|p| p.default.is_none()));
    }

    #[test]
    fn test_indexed_output_must_be_external() {
        let err = classify_xml(
            r#"<integer><name>n</name><channel>output</channel><index>0</index></integer>"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_unknown_channel() {
        let err = classify_xml(
            r#"<image><name>a</name><channel>sideways</channel><index>0</index></image>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("sideways"));
    }

    #[test]
    fn test_reference_must_name_external_input() {
        let ok = classify_xml(
            r#"
            <image><name>in</name><index>0</index></image>
            <file reference="in"><name>out</name><channel>output</channel><index>1</index></file>
            "#,
        )
        .unwrap();
        assert_eq!(ok.indexed[1].reference.as_deref(), Some("in"));

        let err = classify_xml(
            r#"
            <image><name>in</name><index>0</index></image>
            <file reference="nope"><name>out</name><channel>output</channel><index>1</index></file>
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidReference { ref parameter, ref reference }
                if parameter == "out" && reference == "nope"
        ));
    }

    #[test]
    fn test_defaults_are_decoded_to_typed_json() {
        let classified = classify_xml(
            r#"
            <boolean><name>flag</name><flag>f</flag><default>True</default></boolean>
            <integer><name>count</name><flag>c</flag><default>7</default></integer>
            <double><name>sigma</name><flag>s</flag><default>0.5</default></double>
            <string><name>label</name><flag>l</flag><default>nuclei</default></string>
            <double-vector><name>stain</name><flag>v</flag><default>0.65, 0.7,0.29</default></double-vector>
            <string-vector><name>tags</name><flag>t</flag><default>a,b</default></string-vector>
            "#,
        )
        .unwrap();

        let defaults: Vec<_> = classified
            .optional
            .iter()
            .map(|p| p.default.clone().unwrap())
            .collect();
        assert_eq!(
            defaults,
            vec![
                json!(true),
                json!(7),
                json!(0.5),
                json!("nuclei"),
                json!([0.65, 0.7, 0.29]),
                json!(["a", "b"]),
            ]
        );
    }

    #[test]
    fn test_undecodable_default_is_schema_error() {
        let err = classify_xml(
            r#"<integer><name>n</name><flag>n</flag><default>seven</default></integer>"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
        assert!(err.to_string().contains("seven"));
    }

    #[test]
    fn test_return_parameter_file_name_is_reserved() {
        let err = classify_xml(
            r#"
            <file><name>returnparameterfile</name><longflag>rpf</longflag></file>
            <integer><name>count</name><channel>output</channel><longflag>count</longflag></integer>
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }
}
