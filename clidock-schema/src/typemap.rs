//! Static type maps
//!
//! Process-wide constant tables mapping a schema parameter type to the
//! execution engine's value type, the storage resource it is bound to, and
//! the suffix used for its resource reference on the REST surface. There is
//! no mutation API.

use clidock_core::domain::parameter::ParameterType;
use clidock_core::domain::task::ResourceKind;

/// Every schema type the compiler supports
pub const SUPPORTED_TYPES: [ParameterType; 17] = [
    ParameterType::Boolean,
    ParameterType::Integer,
    ParameterType::Float,
    ParameterType::Double,
    ParameterType::String,
    ParameterType::IntegerVector,
    ParameterType::FloatVector,
    ParameterType::DoubleVector,
    ParameterType::StringVector,
    ParameterType::IntegerEnumeration,
    ParameterType::FloatEnumeration,
    ParameterType::DoubleEnumeration,
    ParameterType::StringEnumeration,
    ParameterType::Region,
    ParameterType::File,
    ParameterType::Directory,
    ParameterType::Image,
];

/// Suffix of the parent folder id of an output
pub const OUTPUT_PARENT_SUFFIX: &str = "_folderId";

/// Suffix of the name of an output
pub const OUTPUT_NAME_SUFFIX: &str = "_name";

/// Identifier of the synthesized return parameter file output
pub const RETURN_PARAMETER_FILE: &str = "returnparameterfile";

/// Command-line flag of the return parameter file
pub const RETURN_PARAMETER_FLAG: &str = "--returnparameterfile";

/// Description of the return parameter file on the REST surface
pub const RETURN_PARAMETER_FILE_DESCRIPTION: &str = "Filename in which to write simple return parameters \
     (integer, float, integer-vector, etc.) as opposed to bulk return parameters \
     (image, file, directory).";

/// Value type of the return parameter file in the task spec
pub const RETURN_PARAMETER_FILE_TYPE: ParameterType = ParameterType::File;

/// Looks up a schema element tag
pub fn parameter_type(tag: &str) -> Option<ParameterType> {
    SUPPORTED_TYPES.iter().copied().find(|t| t.tag() == tag)
}

/// Value type understood by the execution engine
pub fn engine_type(param_type: ParameterType) -> &'static str {
    match param_type {
        ParameterType::Boolean => "boolean",
        ParameterType::Integer | ParameterType::IntegerEnumeration => "integer",
        ParameterType::Float
        | ParameterType::Double
        | ParameterType::FloatEnumeration
        | ParameterType::DoubleEnumeration => "number",
        ParameterType::String | ParameterType::StringEnumeration => "string",
        ParameterType::IntegerVector => "integer_list",
        ParameterType::FloatVector | ParameterType::DoubleVector | ParameterType::Region => {
            "number_list"
        }
        ParameterType::StringVector => "string_list",
        ParameterType::File | ParameterType::Directory | ParameterType::Image => "string",
    }
}

/// Storage resource a parameter of this type can be bound to
///
/// `string` maps to a URL: a string input may be fetched over HTTP instead of
/// passed inline.
pub fn resource_kind(param_type: ParameterType) -> Option<ResourceKind> {
    match param_type {
        ParameterType::File | ParameterType::Image => Some(ResourceKind::File),
        ParameterType::Directory => Some(ResourceKind::Folder),
        ParameterType::String => Some(ResourceKind::Url),
        _ => None,
    }
}

/// Suffix appended to an input's identifier for its resource reference
pub fn input_suffix(param_type: ParameterType) -> Option<&'static str> {
    resource_kind(param_type).map(|kind| match kind {
        ResourceKind::File => "_fileId",
        ResourceKind::Folder => "_folderId",
        ResourceKind::Url => "_url",
    })
}

/// Indirection placeholder the engine replaces with a materialised input path
pub fn input_placeholder(identifier: &str) -> String {
    format!("$input{{{}}}", identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_supported_tag_round_trips() {
        for param_type in SUPPORTED_TYPES {
            assert_eq!(parameter_type(param_type.tag()), Some(param_type));
        }
    }

    #[test]
    fn test_unknown_tags_are_unsupported() {
        assert_eq!(parameter_type("geometry"), None);
        assert_eq!(parameter_type("transform"), None);
        assert_eq!(parameter_type("Integer"), None);
    }

    #[test]
    fn test_engine_types() {
        assert_eq!(engine_type(ParameterType::Double), "number");
        assert_eq!(engine_type(ParameterType::Region), "number_list");
        assert_eq!(engine_type(ParameterType::StringEnumeration), "string");
        assert_eq!(engine_type(ParameterType::Image), "string");
    }

    #[test]
    fn test_resource_bindings() {
        assert_eq!(resource_kind(ParameterType::Image), Some(ResourceKind::File));
        assert_eq!(
            resource_kind(ParameterType::Directory),
            Some(ResourceKind::Folder)
        );
        assert_eq!(resource_kind(ParameterType::String), Some(ResourceKind::Url));
        assert_eq!(resource_kind(ParameterType::Integer), None);

        assert_eq!(input_suffix(ParameterType::File), Some("_fileId"));
        assert_eq!(input_suffix(ParameterType::Directory), Some("_folderId"));
        assert_eq!(input_suffix(ParameterType::String), Some("_url"));
        assert_eq!(input_suffix(ParameterType::Boolean), None);
    }

    #[test]
    fn test_input_placeholder() {
        assert_eq!(input_placeholder("inputImage"), "$input{inputImage}");
    }
}
