//! CLI surface DTOs

use serde::{Deserialize, Serialize};

use crate::domain::task::RestDeclaration;

/// One registered CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliSummary {
    pub image: String,
    pub cli: String,
    #[serde(rename = "type")]
    pub cli_type: String,
    /// Route of the CLI relative to the CLI root
    pub route: String,
}

/// REST parameter sheet of a CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSheet {
    pub image: String,
    pub cli: String,
    pub title: String,
    pub notes: String,
    pub declarations: Vec<RestDeclaration>,
}
