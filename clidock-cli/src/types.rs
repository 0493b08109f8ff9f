//! Common types used across CLI modules

use std::path::Path;

use anyhow::{Context, Result, bail};
use clidock_core::domain::task::RequestValues;

/// One `key=value` request value given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamAssignment {
    pub key: String,
    pub value: String,
}

impl ParamAssignment {
    /// Parse `key=value`; the value may itself contain `=`
    pub fn parse(input: &str) -> Result<Self> {
        let Some((key, value)) = input.split_once('=') else {
            bail!("expected key=value, got '{}'", input);
        };

        let key = key.trim();
        if key.is_empty() {
            bail!("empty key in '{}'", input);
        }

        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

impl std::str::FromStr for ParamAssignment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Build request values from an optional JSON file plus assignments
///
/// The file holds a JSON object. String members are taken as-is, any other
/// member is re-encoded as JSON text. Assignments override file values.
pub fn request_values(file: Option<&Path>, params: &[ParamAssignment]) -> Result<RequestValues> {
    let mut values = RequestValues::new();

    if let Some(path) = file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read values file {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&contents)
            .with_context(|| format!("Values file {} is not valid JSON", path.display()))?;

        let serde_json::Value::Object(members) = json else {
            bail!("Values file {} must hold a JSON object", path.display());
        };

        for (key, value) in members {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            values.insert(key, text);
        }
    }

    for param in params {
        values.insert(param.key.clone(), param.value.clone());
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let param = ParamAssignment::parse("inputImage_fileId=abc").unwrap();
        assert_eq!(param.key, "inputImage_fileId");
        assert_eq!(param.value, "abc");

        let param: ParamAssignment = "query=a=b".parse().unwrap();
        assert_eq!(param.value, "a=b");

        assert!(ParamAssignment::parse("novalue").is_err());
        assert!(ParamAssignment::parse("=1").is_err());
    }

    #[test]
    fn test_request_values_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.json");
        std::fs::write(
            &path,
            r#"{"inputImage_fileId": "file-1", "minRadius": 2.5, "tileSize": [256, 256]}"#,
        )
        .unwrap();

        let params = vec![ParamAssignment::parse("minRadius=4").unwrap()];
        let values = request_values(Some(&path), &params).unwrap();

        assert_eq!(values["inputImage_fileId"], "file-1");
        assert_eq!(values["minRadius"], "4");
        assert_eq!(values["tileSize"], "[256,256]");
    }

    #[test]
    fn test_values_file_must_be_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        assert!(request_values(Some(&path), &[]).is_err());
    }
}
