//! Task compilation
//!
//! Compiles classified parameters plus caller-supplied request values into
//! four parallel artifacts: the REST declarations, the task specification,
//! the input/output binding specs, and the container argument list. Every
//! artifact is built from the same resolved values, so they always agree.

mod args;
mod binding;
mod rest;
mod task;
mod values;

use clidock_core::Result;
use clidock_core::domain::task::{CompiledTask, RequestValues, RestDeclaration};
use serde::{Deserialize, Serialize};

use crate::classify::ClassifiedParameters;

pub use args::render_value;

/// Default directory outputs are written to inside the container
pub const DEFAULT_DATA_DIR: &str = "/mnt/clidock/data";

/// Options that do not come from the schema or the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Container directory under which output paths are joined
    pub data_dir: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
        }
    }
}

/// Which CLI of which image is being run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub image: String,
    /// Path of the CLI inside the image, passed as the first container argument
    pub cli_rel_path: String,
}

impl Invocation {
    pub fn new(image: impl Into<String>, cli_rel_path: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            cli_rel_path: cli_rel_path.into(),
        }
    }

    /// Task name: the CLI path with separators replaced by dots
    pub fn task_name(&self) -> String {
        self.cli_rel_path
            .trim_matches('/')
            .replace('/', ".")
    }
}

/// Compiler for one CLI's classified parameters
///
/// Compilation is a pure function of the classified parameters, the
/// invocation, the options, and the request values: compiling twice with the
/// same inputs yields identical output.
pub struct TaskSpecCompiler<'a> {
    invocation: &'a Invocation,
    params: &'a ClassifiedParameters,
    options: &'a CompileOptions,
}

impl<'a> TaskSpecCompiler<'a> {
    pub fn new(
        invocation: &'a Invocation,
        params: &'a ClassifiedParameters,
        options: &'a CompileOptions,
    ) -> Self {
        Self {
            invocation,
            params,
            options,
        }
    }

    /// REST declarations exposed for the CLI's run route
    ///
    /// These do not depend on the request.
    pub fn declarations(&self) -> Result<Vec<RestDeclaration>> {
        rest::declarations(self.params)
    }

    /// Compile a runnable task from request values
    ///
    /// # Errors
    /// - `MissingValue` when a required value is not supplied
    /// - `InvalidValue` when an inline value is not JSON of the expected shape
    /// - `MissingDefault` when an optional inline scalar has no default
    /// - `InvalidReference` when an output references an input whose resource
    ///   id was not supplied
    pub fn compile(&self, request: &RequestValues) -> Result<CompiledTask> {
        let resolved = values::resolve(self.params, request)?;

        let declarations = self.declarations()?;
        let container_args = args::container_args(
            self.invocation,
            self.params,
            &resolved,
            &self.options.data_dir,
        );
        let task = task::task_spec(self.invocation, self.params, &resolved, container_args)?;
        let inputs = binding::input_bindings(self.params, &resolved);
        let outputs = binding::output_bindings(self.params, &resolved)?;

        Ok(CompiledTask {
            declarations,
            task,
            inputs,
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_cli;
    use clidock_core::Error;
    use clidock_core::domain::task::{BindingSpec, ResourceKind, Target};
    use serde_json::json;

    const SEGMENT_XML: &str = r#"
<executable>
  <title>Nuclei Segmentation</title>
  <description>Segments nuclei</description>
  <parameters>
    <file reference="inputImageFile">
      <name>outputAnnotationFile</name>
      <channel>output</channel>
      <index>1</index>
      <description>Annotations</description>
    </file>
    <image>
      <name>inputImageFile</name>
      <channel>input</channel>
      <index>0</index>
      <description>Input image</description>
    </image>
    <double>
      <name>minRadius</name>
      <longflag>min_radius</longflag>
      <default>2.5</default>
    </double>
    <integer-vector>
      <name>tileSize</name>
      <flag>t</flag>
      <longflag>tile_size</longflag>
    </integer-vector>
    <string>
      <name>analysisUrl</name>
      <longflag>analysis</longflag>
      <default>none</default>
    </string>
    <file>
      <name>mask</name>
      <longflag>mask</longflag>
    </file>
    <integer>
      <name>nucleiCount</name>
      <channel>output</channel>
      <longflag>nuclei_count</longflag>
    </integer>
  </parameters>
</executable>
"#;

    fn request(pairs: &[(&str, &str)]) -> RequestValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base_request() -> RequestValues {
        request(&[
            ("inputImageFile_fileId", "img-1"),
            ("outputAnnotationFile_folderId", "folder-1"),
            ("outputAnnotationFile_name", "nuclei.anot"),
        ])
    }

    fn compile(values: &RequestValues) -> Result<CompiledTask> {
        let (_, params) = load_cli(SEGMENT_XML)?;
        let invocation = Invocation::new("toolimg:1", "seg/Nuclei");
        let options = CompileOptions::default();
        TaskSpecCompiler::new(&invocation, &params, &options).compile(values)
    }

    #[test]
    fn test_indexed_args_in_ascending_order() {
        let compiled = compile(&base_request()).unwrap();
        assert_eq!(
            compiled.task.container_args,
            vec![
                "seg/Nuclei",
                "$input{inputImageFile}",
                "/mnt/clidock/data/nuclei.anot",
                "--min_radius",
                "2.5",
                "--analysis",
                "none",
            ]
        );
    }

    #[test]
    fn test_vector_value_follows_flag_token() {
        let mut values = base_request();
        values.insert("tileSize".to_string(), "[1,2,3]".to_string());

        let args = compile(&values).unwrap().task.container_args;
        let pos = args.iter().position(|a| a == "--tile_size").unwrap();
        assert_eq!(args[pos + 1], "1, 2, 3");
    }

    #[test]
    fn test_return_parameter_file() {
        let mut values = base_request();
        values.insert("returnparameterfile_folderId".to_string(), "folder-2".to_string());
        values.insert("returnparameterfile_name".to_string(), "out.params".to_string());

        let compiled = compile(&values).unwrap();
        let rpf = compiled
            .task
            .outputs
            .iter()
            .find(|o| o.id == "returnparameterfile")
            .unwrap();
        assert_eq!(rpf.target, Some(Target::Filepath));
        assert_eq!(rpf.path.as_deref(), Some("out.params"));

        let args = &compiled.task.container_args;
        assert_eq!(
            args[args.len() - 2..],
            ["--returnparameterfile", "/mnt/clidock/data/out.params"]
        );
        assert!(matches!(
            compiled.outputs.get("returnparameterfile"),
            Some(BindingSpec::ResourceWrite { parent_id, .. }) if parent_id == "folder-2"
        ));
    }

    #[test]
    fn test_return_parameter_file_omitted_without_destination() {
        let compiled = compile(&base_request()).unwrap();
        assert!(!compiled.task.outputs.iter().any(|o| o.id == "returnparameterfile"));
        assert!(!compiled.task.container_args.iter().any(|a| a == "--returnparameterfile"));
        assert!(
            compiled
                .declarations
                .iter()
                .any(|d| d.name == "returnparameterfile_name")
        );
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let mut values = base_request();
        values.insert("tileSize".to_string(), "[256, 256]".to_string());
        values.insert("mask_fileId".to_string(), "mask-9".to_string());

        let first = serde_json::to_string(&compile(&values).unwrap()).unwrap();
        let second = serde_json::to_string(&compile(&values).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_indexed_input_declarations_match_indexed_inputs() {
        let (_, params) = load_cli(SEGMENT_XML).unwrap();
        let invocation = Invocation::new("toolimg:1", "seg/Nuclei");
        let options = CompileOptions::default();
        let declarations = TaskSpecCompiler::new(&invocation, &params, &options)
            .declarations()
            .unwrap();

        let required_inputs: Vec<_> = declarations
            .iter()
            .filter(|d| d.required && !d.name.starts_with("outputAnnotationFile"))
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(required_inputs, vec!["inputImageFile_fileId"]);
        assert_eq!(params.indexed_inputs().count(), required_inputs.len());
    }

    #[test]
    fn test_missing_indexed_value() {
        let values = request(&[
            ("outputAnnotationFile_folderId", "folder-1"),
            ("outputAnnotationFile_name", "nuclei.anot"),
        ]);
        let err = compile(&values).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingValue { ref name } if name == "inputImageFile_fileId"
        ));
    }

    #[test]
    fn test_invalid_inline_value() {
        let mut values = base_request();
        values.insert("minRadius".to_string(), "not json".to_string());
        assert!(matches!(
            compile(&values).unwrap_err(),
            Error::InvalidValue { ref parameter, .. } if parameter == "minRadius"
        ));

        let mut values = base_request();
        values.insert("tileSize".to_string(), "5".to_string());
        assert!(matches!(
            compile(&values).unwrap_err(),
            Error::InvalidValue { ref parameter, .. } if parameter == "tileSize"
        ));
    }

    #[test]
    fn test_output_reference_carries_input_resource() {
        let compiled = compile(&base_request()).unwrap();
        match compiled.outputs.get("outputAnnotationFile") {
            Some(BindingSpec::ResourceWrite {
                parent_type,
                name,
                reference: Some(reference),
                ..
            }) => {
                assert_eq!(*parent_type, ResourceKind::Folder);
                assert_eq!(name, "nuclei.anot");
                assert_eq!(reference.resource_id, "img-1");
                assert_eq!(reference.input, "inputImageFile");
                assert_eq!(reference.identifier, "outputAnnotationFile");
            }
            other => panic!("unexpected output binding: {:?}", other),
        }
    }

    #[test]
    fn test_url_variant_for_optional_string() {
        let mut values = base_request();
        values.insert("analysisUrl_url".to_string(), "https://example.org/a.json".to_string());

        let compiled = compile(&values).unwrap();
        assert_eq!(
            compiled.inputs.get("analysisUrl"),
            Some(&BindingSpec::Http {
                url: "https://example.org/a.json".to_string()
            })
        );

        let args = &compiled.task.container_args;
        let pos = args.iter().position(|a| a == "--analysis").unwrap();
        assert_eq!(args[pos + 1], "$input{analysisUrl}");

        let spec = compiled
            .task
            .inputs
            .iter()
            .find(|i| i.id == "analysisUrl")
            .unwrap();
        assert_eq!(spec.target, Some(Target::Filepath));
    }

    #[test]
    fn test_unsupplied_optional_external_input_is_skipped() {
        let compiled = compile(&base_request()).unwrap();
        assert!(!compiled.inputs.contains_key("mask"));
        assert!(!compiled.task.container_args.iter().any(|a| a == "--mask"));

        let spec = compiled.task.inputs.iter().find(|i| i.id == "mask").unwrap();
        let default = spec.default.as_ref().unwrap();
        assert_eq!(default.data, json!(""));
    }

    #[test]
    fn test_inline_binding_uses_default_when_unsupplied() {
        let compiled = compile(&base_request()).unwrap();
        assert_eq!(
            compiled.inputs.get("minRadius"),
            Some(&BindingSpec::Inline {
                value_type: "number".to_string(),
                format: "json".to_string(),
                data: "2.5".to_string(),
            })
        );
        assert!(!compiled.inputs.contains_key("tileSize"));
    }

    #[test]
    fn test_empty_string_default_compiles() {
        let xml = r#"<executable><title>T</title><parameters>
            <string><name>suffix</name><longflag>suffix</longflag><default></default></string>
        </parameters></executable>"#;
        let (_, params) = load_cli(xml).unwrap();
        let invocation = Invocation::new("toolimg:1", "seg/Nuclei");
        let options = CompileOptions::default();
        let compiled = TaskSpecCompiler::new(&invocation, &params, &options)
            .compile(&RequestValues::new())
            .unwrap();

        assert_eq!(
            compiled.inputs.get("suffix"),
            Some(&BindingSpec::Inline {
                value_type: "string".to_string(),
                format: "json".to_string(),
                data: "\"\"".to_string(),
            })
        );
    }

    #[test]
    fn test_task_name_and_header() {
        let compiled = compile(&base_request()).unwrap();
        assert_eq!(compiled.task.name, "seg.Nuclei");
        assert_eq!(compiled.task.mode, "docker");
        assert_eq!(compiled.task.docker_image, "toolimg:1");
        assert!(!compiled.task.pull_image);
    }
}
