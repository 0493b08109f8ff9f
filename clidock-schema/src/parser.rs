//! CLI schema parser
//!
//! Parses the XML document a CLI prints for `<cli> --xml` into a
//! [`CliSchema`]. The parser is structural only: it keeps each parameter's
//! element tag as its declared type and leaves type support, channel and
//! binding validation to classification.

use clidock_core::domain::schema::{CliSchema, ParameterDecl, ParameterGroup};
use clidock_core::{Error, Result};
use roxmltree::{Document, Node};

/// Parse a CLI schema from XML text
///
/// # Errors
/// Returns a schema error if:
/// - The XML is not well-formed
/// - The root element is not `<executable>`
/// - A parameter's `<index>` is not a non-negative integer
///
/// # Example
/// ```
/// use clidock_schema::parser::parse_cli_schema;
///
/// let xml = r#"
///     <executable>
///       <title>Threshold</title>
///       <description>Thresholds an image</description>
///       <parameters>
///         <image>
///           <name>inputImage</name>
///           <channel>input</channel>
///           <index>0</index>
///         </image>
///         <double>
///           <name>level</name>
///           <longflag>level</longflag>
///           <default>0.5</default>
///         </double>
///       </parameters>
///     </executable>
/// "#;
///
/// let schema = parse_cli_schema(xml)?;
/// assert_eq!(schema.title, "Threshold");
/// assert_eq!(schema.parameters().count(), 2);
/// # Ok::<(), clidock_core::Error>(())
/// ```
pub fn parse_cli_schema(xml: &str) -> Result<CliSchema> {
    let doc = Document::parse(xml.trim_start_matches('\u{feff}').trim())
        .map_err(|e| Error::schema(format!("malformed CLI schema XML: {}", e)))?;

    let root = doc.root_element();
    if root.tag_name().name() != "executable" {
        return Err(Error::schema(format!(
            "expected <executable> root element, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut schema = CliSchema::default();

    for child in root.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "category" => schema.category = text_of(child),
            "title" => schema.title = text_of(child).unwrap_or_default(),
            "description" => schema.description = text_of(child).unwrap_or_default(),
            "version" => schema.version = text_of(child),
            "documentation-url" => schema.documentation_url = text_of(child),
            "license" => schema.license = text_of(child),
            "contributor" => schema.contributor = text_of(child),
            "acknowledgements" => schema.acknowledgements = text_of(child),
            "parameters" => schema.groups.push(parse_group(child)?),
            _ => {}
        }
    }

    Ok(schema)
}

/// Parse a `<parameters>` group
fn parse_group(node: Node) -> Result<ParameterGroup> {
    let mut group = ParameterGroup {
        advanced: node.attribute("advanced") == Some("true"),
        ..Default::default()
    };

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "label" => group.label = text_of(child),
            "description" => group.description = text_of(child),
            _ => group.parameters.push(parse_parameter(child)?),
        }
    }

    Ok(group)
}

/// Parse a single parameter element
fn parse_parameter(node: Node) -> Result<ParameterDecl> {
    let mut decl = ParameterDecl {
        tag: node.tag_name().name().to_string(),
        reference: node.attribute("reference").map(str::to_string),
        ..Default::default()
    };

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "name" => decl.name = text_of(child),
            "label" => decl.label = text_of(child),
            "description" => decl.description = text_of(child),
            "index" => decl.index = text_of(child).map(|t| parse_index(&decl, &t)).transpose()?,
            "flag" => decl.flag = text_of(child).and_then(|t| normalize_flag(&t, "-")),
            "longflag" => decl.longflag = text_of(child).and_then(|t| normalize_flag(&t, "--")),
            "channel" => decl.channel = text_of(child),
            // An empty element still declares a default: the empty string
            "default" => decl.default = Some(text_of(child).unwrap_or_default()),
            "reference" => decl.reference = text_of(child),
            "element" => decl.elements.extend(text_of(child)),
            _ => {}
        }
    }

    Ok(decl)
}

fn parse_index(decl: &ParameterDecl, text: &str) -> Result<u32> {
    text.parse::<u32>().map_err(|_| {
        Error::schema(format!(
            "index '{}' of {} parameter '{}' is not a non-negative integer",
            text,
            decl.tag,
            decl.name.as_deref().unwrap_or("?")
        ))
    })
}

/// Normalise a flag to carry exactly the given dash prefix
fn normalize_flag(text: &str, prefix: &str) -> Option<String> {
    let bare = text.trim().trim_start_matches('-');
    if bare.is_empty() {
        None
    } else {
        Some(format!("{}{}", prefix, bare))
    }
}

/// Trimmed text content of an element, `None` when blank
fn text_of(node: Node) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect();

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEGMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<executable>
  <category>HistomicsTK</category>
  <title>Nuclei Segmentation</title>
  <description><![CDATA[Segments nuclei in a slide]]></description>
  <version>0.1.0</version>
  <license>Apache 2.0</license>
  <contributor>Jane Doe</contributor>
  <parameters>
    <label>IO</label>
    <description>Input/output parameters</description>
    <image>
      <name>inputImageFile</name>
      <label>Input Image</label>
      <channel>input</channel>
      <index>0</index>
      <description>Input image</description>
    </image>
    <file fileExtensions=".anot" reference="inputImageFile">
      <name>outputNucleiAnnotationFile</name>
      <channel>output</channel>
      <index>1</index>
    </file>
  </parameters>
  <parameters advanced="true">
    <label>Tuning</label>
    <double-vector>
      <name>stainColor</name>
      <flag>s</flag>
      <longflag>stain_color</longflag>
      <default>0.65,0.70,0.29</default>
    </double-vector>
    <string-enumeration>
      <name>method</name>
      <longflag>--method</longflag>
      <element>otsu</element>
      <element>fixed</element>
      <default>otsu</default>
    </string-enumeration>
  </parameters>
</executable>
"#;

    #[test]
    fn test_parse_metadata() {
        let schema = parse_cli_schema(SEGMENT_XML).unwrap();
        assert_eq!(schema.category.as_deref(), Some("HistomicsTK"));
        assert_eq!(schema.title, "Nuclei Segmentation");
        assert_eq!(schema.description, "Segments nuclei in a slide");
        assert_eq!(schema.version.as_deref(), Some("0.1.0"));
        assert_eq!(schema.license.as_deref(), Some("Apache 2.0"));
        assert_eq!(schema.contributor.as_deref(), Some("Jane Doe"));
        assert!(schema.acknowledgements.is_none());
    }

    #[test]
    fn test_parse_groups_and_parameters_in_order() {
        let schema = parse_cli_schema(SEGMENT_XML).unwrap();
        assert_eq!(schema.groups.len(), 2);
        assert_eq!(schema.groups[0].label.as_deref(), Some("IO"));
        assert!(!schema.groups[0].advanced);
        assert!(schema.groups[1].advanced);

        let names: Vec<_> = schema.parameters().filter_map(|p| p.name.clone()).collect();
        assert_eq!(
            names,
            vec![
                "inputImageFile",
                "outputNucleiAnnotationFile",
                "stainColor",
                "method"
            ]
        );
    }

    #[test]
    fn test_parse_parameter_fields() {
        let schema = parse_cli_schema(SEGMENT_XML).unwrap();
        let params: Vec<_> = schema.parameters().collect();

        let image = params[0];
        assert_eq!(image.tag, "image");
        assert_eq!(image.index, Some(0));
        assert_eq!(image.channel.as_deref(), Some("input"));
        assert_eq!(image.label.as_deref(), Some("Input Image"));

        let output = params[1];
        assert_eq!(output.reference.as_deref(), Some("inputImageFile"));
        assert!(output.is_output());

        let stain = params[2];
        assert_eq!(stain.flag.as_deref(), Some("-s"));
        assert_eq!(stain.longflag.as_deref(), Some("--stain_color"));
        assert_eq!(stain.default.as_deref(), Some("0.65,0.70,0.29"));

        let method = params[3];
        assert_eq!(method.longflag.as_deref(), Some("--method"));
        assert_eq!(method.elements, vec!["otsu", "fixed"]);
    }

    #[test]
    fn test_malformed_xml_is_schema_error() {
        let err = parse_cli_schema("<executable><title>broken</executable>").unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_wrong_root_is_schema_error() {
        let err = parse_cli_schema("<tool><title>x</title></tool>").unwrap_err();
        assert!(err.to_string().contains("<executable>"));
    }

    #[test]
    fn test_negative_index_is_schema_error() {
        let xml = r#"<executable><parameters>
            <integer><name>n</name><index>-1</index></integer>
        </parameters></executable>"#;
        let err = parse_cli_schema(xml).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
        assert!(err.to_string().contains("'n'"));
    }

    #[test]
    fn test_empty_default_is_declared() {
        let xml = r#"<executable><parameters>
            <string><name>a</name><longflag>a</longflag><default></default></string>
            <string><name>b</name><longflag>b</longflag><default/></string>
            <string><name>c</name><longflag>c</longflag></string>
        </parameters></executable>"#;
        let schema = parse_cli_schema(xml).unwrap();
        let defaults: Vec<_> = schema.parameters().map(|p| p.default.as_deref()).collect();
        assert_eq!(defaults, vec![Some(""), Some(""), None]);
    }

    #[test]
    fn test_normalize_flag() {
        assert_eq!(normalize_flag("t", "-").as_deref(), Some("-t"));
        assert_eq!(normalize_flag("-t", "-").as_deref(), Some("-t"));
        assert_eq!(normalize_flag("--level", "--").as_deref(), Some("--level"));
        assert_eq!(normalize_flag(" level ", "--").as_deref(), Some("--level"));
        assert_eq!(normalize_flag("--", "--"), None);
    }
}
