//! Boundary validation for raw plan and manifest documents.
//!
//! Validation collects every offending field before failing, so a caller
//! sees all problems with a document at once. A document is converted into
//! a typed record only when no issue was recorded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A single validation problem, addressed by field path
/// (e.g. `resource_changes[1].change.actions[0]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Raised when a raw document does not match the expected schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("validation failed: {}", render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Paths of all offending fields.
    pub fn paths(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.path.as_str()).collect()
    }
}

fn render_issues(issues: &[FieldIssue]) -> String {
    let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
    rendered.join("; ")
}

pub(crate) fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

pub(crate) fn index(parent: &str, i: usize) -> String {
    format!("{}[{}]", parent, i)
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Accumulates issues while a document is walked.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    issues: Vec<FieldIssue>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    fn expected(&mut self, path: String, expected: &str, found: &Value) {
        self.issue(
            path,
            format!("expected {}, received {}", expected, type_name(found)),
        );
    }

    /// The document root (or a nested record) must be an object.
    pub fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        match value.as_object() {
            Some(map) => Some(map),
            None => {
                self.expected(path.to_string(), "object", value);
                None
            }
        }
    }

    pub fn require_str<'a>(&mut self, obj: &'a Value, key: &str, parent: &str) -> Option<&'a str> {
        match obj.get(key) {
            None => {
                self.issue(join(parent, key), "required");
                None
            }
            Some(Value::String(s)) => Some(s.as_str()),
            Some(other) => {
                self.expected(join(parent, key), "string", other);
                None
            }
        }
    }

    pub fn optional_str<'a>(&mut self, obj: &'a Value, key: &str, parent: &str) -> Option<&'a str> {
        match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(other) => {
                self.expected(join(parent, key), "string", other);
                None
            }
        }
    }

    pub fn require_array<'a>(&mut self, obj: &'a Value, key: &str, parent: &str) -> Option<&'a Vec<Value>> {
        match obj.get(key) {
            None => {
                self.issue(join(parent, key), "required");
                None
            }
            Some(Value::Array(items)) => Some(items),
            Some(other) => {
                self.expected(join(parent, key), "array", other);
                None
            }
        }
    }

    pub fn require_object<'a>(
        &mut self,
        obj: &'a Value,
        key: &str,
        parent: &str,
    ) -> Option<&'a Value> {
        match obj.get(key) {
            None => {
                self.issue(join(parent, key), "required");
                None
            }
            Some(value @ Value::Object(_)) => Some(value),
            Some(other) => {
                self.expected(join(parent, key), "object", other);
                None
            }
        }
    }

    /// Optional open map: any content is accepted as long as it is an object.
    pub fn optional_object(&mut self, obj: &Value, key: &str, parent: &str) -> Option<Map<String, Value>> {
        match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(other) => {
                self.expected(join(parent, key), "object", other);
                None
            }
        }
    }

    /// Optional `string -> string` map such as labels or annotations.
    pub fn optional_string_map(
        &mut self,
        obj: &Value,
        key: &str,
        parent: &str,
    ) -> Option<BTreeMap<String, String>> {
        let map = self.optional_object(obj, key, parent)?;
        let path = join(parent, key);
        let mut out = BTreeMap::new();
        for (k, v) in map {
            match v {
                Value::String(s) => {
                    out.insert(k, s);
                }
                other => self.expected(join(&path, &k), "string", &other),
            }
        }
        Some(out)
    }

    pub fn into_error(self) -> ValidationError {
        ValidationError {
            issues: self.issues,
        }
    }

    /// Hand back `value` only if nothing was recorded.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationError> {
        if self.issues.is_empty() {
            Ok(value())
        } else {
            Err(self.into_error())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collects_all_issues() {
        let doc = json!({"kind": 7});
        let mut v = Validator::new();
        v.require_str(&doc, "apiVersion", "");
        v.require_str(&doc, "kind", "");
        let err = v.finish(|| ()).unwrap_err();
        assert_eq!(err.paths(), vec!["apiVersion", "kind"]);
        assert!(err.issues[1].message.contains("received number"));
    }

    #[test]
    fn test_nested_paths() {
        assert_eq!(join("", "metadata"), "metadata");
        assert_eq!(join("metadata", "name"), "metadata.name");
        assert_eq!(index("resource_changes", 2), "resource_changes[2]");
    }

    #[test]
    fn test_string_map_rejects_non_string_values() {
        let doc = json!({"labels": {"app": "web", "tier": 3}});
        let mut v = Validator::new();
        let labels = v.optional_string_map(&doc, "labels", "metadata").unwrap();
        assert_eq!(labels.len(), 1);
        let err = v.finish(|| ()).unwrap_err();
        assert_eq!(err.paths(), vec!["metadata.labels.tier"]);
    }

    #[test]
    fn test_display_lists_paths() {
        let mut v = Validator::new();
        v.issue("format_version", "required");
        let err = v.into_error();
        assert_eq!(err.to_string(), "validation failed: format_version: required");
    }
}
