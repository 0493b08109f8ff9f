//! REST declarations of a CLI's run route

use clidock_core::Result;
use clidock_core::domain::parameter::{Parameter, ParameterType};
use clidock_core::domain::task::RestDeclaration;

use super::task::default_data;
use super::values::{input_key, name_key, parent_key};
use crate::classify::ClassifiedParameters;
use crate::typemap::{
    RETURN_PARAMETER_FILE, RETURN_PARAMETER_FILE_DESCRIPTION, RETURN_PARAMETER_FILE_TYPE,
};

pub(crate) fn declarations(params: &ClassifiedParameters) -> Result<Vec<RestDeclaration>> {
    let mut decls = Vec::new();

    for param in params.indexed_inputs() {
        decls.push(input_declaration(param, true));
    }

    for param in params.indexed_outputs() {
        decls.extend(output_declarations(
            &param.identifier,
            param.param_type,
            &param.description,
            true,
        ));
    }

    for param in params.optional_inputs() {
        if param.is_external() {
            decls.push(input_declaration(param, false));
            continue;
        }

        let default = serde_json::to_string(&default_data(param)?)?;
        decls.push(RestDeclaration {
            name: param.identifier.clone(),
            description: param.description.clone(),
            data_type: "string".to_string(),
            required: false,
            default: Some(default),
        });

        if param.param_type == ParameterType::String {
            decls.push(input_declaration(param, false));
        }
    }

    for param in params.optional_outputs() {
        decls.extend(output_declarations(
            &param.identifier,
            param.param_type,
            &param.description,
            false,
        ));
    }

    if params.has_simple_outputs() {
        decls.extend(output_declarations(
            RETURN_PARAMETER_FILE,
            RETURN_PARAMETER_FILE_TYPE,
            RETURN_PARAMETER_FILE_DESCRIPTION,
            false,
        ));
    }

    Ok(decls)
}

/// Declaration of an input's value or resource reference
fn input_declaration(param: &Parameter, required: bool) -> RestDeclaration {
    match input_key(param) {
        Some(name) => RestDeclaration {
            description: format!(
                "{} of input {} - {}: {}",
                if param.param_type == ParameterType::String {
                    "URL"
                } else {
                    "ID"
                },
                param.param_type,
                param.identifier,
                param.description
            ),
            name,
            data_type: "string".to_string(),
            required,
            default: None,
        },
        None => RestDeclaration {
            name: param.identifier.clone(),
            description: param.description.clone(),
            data_type: "string".to_string(),
            required,
            default: None,
        },
    }
}

/// Parent folder and name declarations of an output
fn output_declarations(
    identifier: &str,
    param_type: ParameterType,
    description: &str,
    required: bool,
) -> [RestDeclaration; 2] {
    [
        RestDeclaration {
            name: parent_key(identifier),
            description: format!(
                "ID of parent folder for output {} - {}: {}",
                param_type, identifier, description
            ),
            data_type: "string".to_string(),
            required,
            default: None,
        },
        RestDeclaration {
            name: name_key(identifier),
            description: format!(
                "Name of output {} - {}: {}",
                param_type, identifier, description
            ),
            data_type: "string".to_string(),
            required,
            default: None,
        },
    ]
}
