//! CLI schema domain types
//!
//! The structure of a CLI's XML parameter schema as declared, before
//! classification. Parameter types are kept as the raw element tag so that
//! unsupported types surface as classification errors instead of parse
//! errors.

use serde::{Deserialize, Serialize};

/// Parsed CLI schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliSchema {
    pub category: Option<String>,
    pub title: String,
    pub description: String,
    pub version: Option<String>,
    pub documentation_url: Option<String>,
    pub license: Option<String>,
    pub contributor: Option<String>,
    pub acknowledgements: Option<String>,
    pub groups: Vec<ParameterGroup>,
}

impl CliSchema {
    /// All declared parameters in document order
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterDecl> {
        self.groups.iter().flat_map(|group| group.parameters.iter())
    }

    /// Human readable notes for the CLI's REST surface
    ///
    /// Blank metadata fields are left out.
    pub fn notes(&self) -> String {
        let mut sections = vec![format!("Description: {}", self.description.trim())];

        let optional = [
            ("Version", &self.version),
            ("License", &self.license),
            ("Author(s)", &self.contributor),
            ("Acknowledgements", &self.acknowledgements),
        ];

        for (heading, value) in optional {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                sections.push(format!("{}: {}", heading, value));
            }
        }

        sections.join("\n\n")
    }
}

/// A `<parameters>` group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterGroup {
    pub label: Option<String>,
    pub description: Option<String>,
    pub advanced: bool,
    pub parameters: Vec<ParameterDecl>,
}

/// A parameter as declared in the schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterDecl {
    /// Element tag, i.e. the declared type
    pub tag: String,
    pub name: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub index: Option<u32>,
    /// Short flag, normalised to a single leading dash
    pub flag: Option<String>,
    /// Long flag, normalised to two leading dashes
    pub longflag: Option<String>,
    pub channel: Option<String>,
    pub default: Option<String>,
    pub reference: Option<String>,
    pub elements: Vec<String>,
}

impl ParameterDecl {
    /// Identifier of the parameter: its name, falling back to the flags
    pub fn identifier(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.longflag.as_deref().map(|f| f.trim_start_matches('-')))
            .or_else(|| self.flag.as_deref().map(|f| f.trim_start_matches('-')))
            .filter(|id| !id.is_empty())
    }

    pub fn is_output(&self) -> bool {
        self.channel.as_deref() == Some("output")
    }
}
