//! Parameter domain types
//!
//! The typed parameter model produced by classifying a CLI schema. Every
//! declared parameter becomes a [`Parameter`] over the closed
//! [`ParameterType`] set; anything outside that set is rejected during
//! classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a CLI parameter
///
/// Serialized with the schema's own tag spelling (`integer-vector`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterType {
    Boolean,
    Integer,
    Float,
    Double,
    String,
    IntegerVector,
    FloatVector,
    DoubleVector,
    StringVector,
    IntegerEnumeration,
    FloatEnumeration,
    DoubleEnumeration,
    StringEnumeration,
    Region,
    File,
    Directory,
    Image,
}

impl ParameterType {
    /// The schema tag for this type
    pub fn tag(self) -> &'static str {
        match self {
            ParameterType::Boolean => "boolean",
            ParameterType::Integer => "integer",
            ParameterType::Float => "float",
            ParameterType::Double => "double",
            ParameterType::String => "string",
            ParameterType::IntegerVector => "integer-vector",
            ParameterType::FloatVector => "float-vector",
            ParameterType::DoubleVector => "double-vector",
            ParameterType::StringVector => "string-vector",
            ParameterType::IntegerEnumeration => "integer-enumeration",
            ParameterType::FloatEnumeration => "float-enumeration",
            ParameterType::DoubleEnumeration => "double-enumeration",
            ParameterType::StringEnumeration => "string-enumeration",
            ParameterType::Region => "region",
            ParameterType::File => "file",
            ParameterType::Directory => "directory",
            ParameterType::Image => "image",
        }
    }

    /// Whether values of this type are lists
    pub fn is_vector(self) -> bool {
        matches!(
            self,
            ParameterType::IntegerVector
                | ParameterType::FloatVector
                | ParameterType::DoubleVector
                | ParameterType::StringVector
                | ParameterType::Region
        )
    }

    /// Whether this type is bound to a storage resource rather than carried inline
    pub fn is_external(self) -> bool {
        matches!(
            self,
            ParameterType::File | ParameterType::Directory | ParameterType::Image
        )
    }

    /// Element kind of a scalar or vector value, used when decoding defaults
    pub fn scalar_kind(self) -> ScalarKind {
        match self {
            ParameterType::Boolean => ScalarKind::Boolean,
            ParameterType::Integer
            | ParameterType::IntegerVector
            | ParameterType::IntegerEnumeration => ScalarKind::Integer,
            ParameterType::Float
            | ParameterType::Double
            | ParameterType::FloatVector
            | ParameterType::DoubleVector
            | ParameterType::FloatEnumeration
            | ParameterType::DoubleEnumeration
            | ParameterType::Region => ScalarKind::Number,
            ParameterType::String
            | ParameterType::StringVector
            | ParameterType::StringEnumeration
            | ParameterType::File
            | ParameterType::Directory
            | ParameterType::Image => ScalarKind::Text,
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Element kind of a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Boolean,
    Integer,
    Number,
    Text,
}

/// Direction of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Input,
    Output,
}

/// How a parameter is addressed on the command line
///
/// A parameter is either positional or flagged, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentBinding {
    /// Positional argument at the given index
    Index(u32),
    /// Flagged argument; at least one of the two spellings is present
    Flag {
        flag: Option<String>,
        longflag: Option<String>,
    },
}

impl ArgumentBinding {
    pub fn index(&self) -> Option<u32> {
        match self {
            ArgumentBinding::Index(index) => Some(*index),
            ArgumentBinding::Flag { .. } => None,
        }
    }

    /// Token placed before the value on the command line (long form preferred)
    pub fn flag_token(&self) -> Option<&str> {
        match self {
            ArgumentBinding::Index(_) => None,
            ArgumentBinding::Flag { flag, longflag } => longflag.as_deref().or(flag.as_deref()),
        }
    }
}

/// A classified CLI parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Identifier, unique within a CLI
    pub identifier: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub channel: Channel,
    pub binding: ArgumentBinding,
    pub label: Option<String>,
    pub description: String,
    /// Declared default decoded into a typed JSON value
    pub default: Option<serde_json::Value>,
    /// Identifier of the input this output is attached to
    pub reference: Option<String>,
    /// Allowed values for enumerations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<String>,
}

impl Parameter {
    pub fn is_indexed(&self) -> bool {
        matches!(self.binding, ArgumentBinding::Index(_))
    }

    pub fn is_input(&self) -> bool {
        self.channel == Channel::Input
    }

    pub fn is_output(&self) -> bool {
        self.channel == Channel::Output
    }

    pub fn is_external(&self) -> bool {
        self.param_type.is_external()
    }

    pub fn is_vector(&self) -> bool {
        self.param_type.is_vector()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_types() {
        assert!(ParameterType::File.is_external());
        assert!(ParameterType::Directory.is_external());
        assert!(ParameterType::Image.is_external());
        assert!(!ParameterType::String.is_external());
        assert!(!ParameterType::Region.is_external());
    }

    #[test]
    fn test_vector_types() {
        assert!(ParameterType::IntegerVector.is_vector());
        assert!(ParameterType::Region.is_vector());
        assert!(!ParameterType::IntegerEnumeration.is_vector());
        assert!(!ParameterType::Image.is_vector());
    }

    #[test]
    fn test_flag_token_prefers_longflag() {
        let binding = ArgumentBinding::Flag {
            flag: Some("-t".to_string()),
            longflag: Some("--threshold".to_string()),
        };
        assert_eq!(binding.flag_token(), Some("--threshold"));
        assert_eq!(binding.index(), None);

        let short_only = ArgumentBinding::Flag {
            flag: Some("-t".to_string()),
            longflag: None,
        };
        assert_eq!(short_only.flag_token(), Some("-t"));

        assert_eq!(ArgumentBinding::Index(2).flag_token(), None);
        assert_eq!(ArgumentBinding::Index(2).index(), Some(2));
    }

    #[test]
    fn test_type_serializes_as_schema_tag() {
        let json = serde_json::to_string(&ParameterType::DoubleVector).unwrap();
        assert_eq!(json, "\"double-vector\"");
        assert_eq!(ParameterType::StringEnumeration.to_string(), "string-enumeration");
    }
}
