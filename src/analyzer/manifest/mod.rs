//! Kubernetes manifest parsing.
//!
//! YAML streams are parsed per document: a bad document is skipped and
//! recorded as a [`ParseDiagnostic`] while its siblings still parse. JSON
//! input is all-or-nothing: a syntax error or any invalid element yields no
//! resources and a single diagnostic. Neither path returns an error.

pub mod extract;

use crate::analyzer::model::ClusterResource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Input encoding of a manifest file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
}

impl ManifestFormat {
    /// Pick a format from a file extension. Returns `None` for files that are
    /// not manifests.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// A manifest document that could not be turned into a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseDiagnostic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Zero-based position of the document in its stream (or array).
    pub document_index: usize,
    /// One-based line the document starts on, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl ParseDiagnostic {
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}: ", file)?;
        }
        write!(f, "document {}", self.document_index)?;
        if let Some(line) = self.line {
            write!(f, " (line {})", line)?;
        }
        write!(f, ": {}", self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestParseResult {
    pub resources: Vec<ClusterResource>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ManifestParseResult {
    fn push_diagnostic(&mut self, diagnostic: ParseDiagnostic) {
        log::warn!("Skipping manifest {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

pub struct ManifestParser;

impl ManifestParser {
    pub fn parse_yaml(text: &str) -> ManifestParseResult {
        let mut result = ManifestParseResult::default();

        for (index, (line, doc)) in split_documents(text).into_iter().enumerate() {
            let value = match serde_yaml::from_str::<Value>(&doc) {
                Ok(Value::Null) => continue,
                Ok(value) => value,
                Err(e) => {
                    result.push_diagnostic(ParseDiagnostic {
                        file: None,
                        document_index: index,
                        line: Some(line),
                        message: format!("invalid YAML: {}", e),
                    });
                    continue;
                }
            };

            if !value.is_object() {
                result.push_diagnostic(ParseDiagnostic {
                    file: None,
                    document_index: index,
                    line: Some(line),
                    message: "document is not a mapping".to_string(),
                });
                continue;
            }

            match ClusterResource::from_value(&value) {
                Ok(resource) => result.resources.push(resource),
                Err(e) => result.push_diagnostic(ParseDiagnostic {
                    file: None,
                    document_index: index,
                    line: Some(line),
                    message: e.to_string(),
                }),
            }
        }

        result
    }

    pub fn parse_json(text: &str) -> ManifestParseResult {
        let mut result = ManifestParseResult::default();

        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                result.push_diagnostic(ParseDiagnostic {
                    file: None,
                    document_index: 0,
                    line: Some(e.line()),
                    message: format!("invalid JSON: {}", e),
                });
                return result;
            }
        };

        let items = match value {
            Value::Array(items) => items,
            other => vec![other],
        };

        let mut resources = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match ClusterResource::from_value(item) {
                Ok(resource) => resources.push(resource),
                Err(e) => {
                    result.push_diagnostic(ParseDiagnostic {
                        file: None,
                        document_index: index,
                        line: None,
                        message: e.to_string(),
                    });
                    return result;
                }
            }
        }

        result.resources = resources;
        result
    }

    pub fn parse_file_content(text: &str, format: ManifestFormat) -> ManifestParseResult {
        match format {
            ManifestFormat::Yaml => Self::parse_yaml(text),
            ManifestFormat::Json => Self::parse_json(text),
        }
    }

    pub fn filter_by_kind<'a>(resources: &'a [ClusterResource], kind: &str) -> Vec<&'a ClusterResource> {
        resources.iter().filter(|r| r.kind == kind).collect()
    }

    pub fn filter_by_namespace<'a>(
        resources: &'a [ClusterResource],
        namespace: &str,
    ) -> Vec<&'a ClusterResource> {
        resources
            .iter()
            .filter(|r| r.namespace() == Some(namespace))
            .collect()
    }

    pub fn group_by_kind(resources: &[ClusterResource]) -> BTreeMap<String, Vec<&ClusterResource>> {
        let mut groups: BTreeMap<String, Vec<&ClusterResource>> = BTreeMap::new();
        for resource in resources {
            groups.entry(resource.kind.clone()).or_default().push(resource);
        }
        groups
    }

    /// Resources without a namespace are grouped under `"default"`.
    pub fn group_by_namespace(
        resources: &[ClusterResource],
    ) -> BTreeMap<String, Vec<&ClusterResource>> {
        let mut groups: BTreeMap<String, Vec<&ClusterResource>> = BTreeMap::new();
        for resource in resources {
            groups
                .entry(resource.namespace_or_default().to_string())
                .or_default()
                .push(resource);
        }
        groups
    }
}

/// Split a YAML stream on `---` separator lines.
///
/// Returns each document with the one-based line it starts on. Empty and
/// comment-only documents are dropped.
fn split_documents(text: &str) -> Vec<(usize, String)> {
    let mut docs = Vec::new();
    let mut current = String::new();
    let mut start = 1;

    for (i, line) in text.lines().enumerate() {
        if is_separator(line) {
            if !is_blank_document(&current) {
                docs.push((start, std::mem::take(&mut current)));
            }
            current.clear();
            start = i + 2;
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    if !is_blank_document(&current) {
        docs.push((start, current));
    }

    docs
}

fn is_blank_document(doc: &str) -> bool {
    doc.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

fn is_separator(line: &str) -> bool {
    let line = line.trim_end();
    line == "---" || line.starts_with("--- ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const POD: &str = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\n  namespace: prod\nspec:\n  containers: []\n";

    #[test]
    fn test_parse_yaml_multi_document() {
        let text = format!(
            "{}---\napiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: b\n",
            POD
        );
        let result = ManifestParser::parse_yaml(&text);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.resources.len(), 2);
        assert_eq!(result.resources[1].kind, "Deployment");
    }

    #[test]
    fn test_parse_yaml_skips_invalid_document() {
        let text = format!(
            "{}---\nkind: Service\nmetadata:\n  name: broken\n---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: c\n",
            POD
        );
        let result = ManifestParser::parse_yaml(&text);
        assert_eq!(result.resources.len(), 2);
        assert_eq!(result.diagnostics.len(), 1);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.document_index, 1);
        assert_eq!(diag.line, Some(9));
        assert!(diag.message.contains("apiVersion"));
    }

    #[test]
    fn test_parse_yaml_syntax_error_is_soft() {
        let text = format!("{}---\nkey: [unclosed\n", POD);
        let result = ManifestParser::parse_yaml(&text);
        assert_eq!(result.resources.len(), 1);
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].message.starts_with("invalid YAML"));
    }

    #[test]
    fn test_parse_yaml_ignores_empty_and_comment_documents() {
        let text = format!("---\n# just a comment\n---\n\n---\n{}---\n", POD);
        let result = ManifestParser::parse_yaml(&text);
        assert_eq!(result.resources.len(), 1);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_parse_yaml_non_mapping_document() {
        let result = ManifestParser::parse_yaml("- a\n- b\n");
        assert!(result.resources.is_empty());
        assert_eq!(result.diagnostics[0].message, "document is not a mapping");
    }

    #[test]
    fn test_parse_json_object_and_array() {
        let single = r#"{"apiVersion": "v1", "kind": "Pod", "metadata": {"name": "a"}}"#;
        assert_eq!(ManifestParser::parse_json(single).resources.len(), 1);

        let many = format!("[{0}, {0}]", single);
        assert_eq!(ManifestParser::parse_json(&many).resources.len(), 2);
    }

    #[test]
    fn test_parse_json_malformed_is_soft() {
        let result = ManifestParser::parse_json("{not json");
        assert!(result.resources.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn test_parse_json_invalid_element_drops_everything() {
        let text = r#"[
            {"apiVersion": "v1", "kind": "Pod", "metadata": {"name": "a"}},
            {"kind": "Pod", "metadata": {"name": "b"}}
        ]"#;
        let result = ManifestParser::parse_json(text);
        assert!(result.resources.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].document_index, 1);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ManifestFormat::from_path(Path::new("a/b.yml")), Some(ManifestFormat::Yaml));
        assert_eq!(ManifestFormat::from_path(Path::new("a/b.json")), Some(ManifestFormat::Json));
        assert_eq!(ManifestFormat::from_path(Path::new("README.md")), None);
    }

    #[test]
    fn test_grouping() {
        let text = format!(
            "{}---\napiVersion: v1\nkind: Pod\nmetadata:\n  name: b\n---\napiVersion: v1\nkind: Service\nmetadata:\n  name: c\n  namespace: prod\n",
            POD
        );
        let resources = ManifestParser::parse_yaml(&text).resources;
        let by_ns = ManifestParser::group_by_namespace(&resources);
        assert_eq!(by_ns["prod"].len(), 2);
        assert_eq!(by_ns["default"].len(), 1);

        let by_kind = ManifestParser::group_by_kind(&resources);
        assert_eq!(by_kind["Pod"].len(), 2);
        assert_eq!(ManifestParser::filter_by_kind(&resources, "Service").len(), 1);
        assert_eq!(ManifestParser::filter_by_namespace(&resources, "prod").len(), 2);
    }
}
