//! Typed accessors over open `serde_json::Value` payloads.
//!
//! Plan `before`/`after` states and manifest `spec`/`status` blocks are kept
//! as dynamic values. Rules and analyzers read them through these helpers
//! instead of indexing by hand.

use serde_json::Value;

pub fn get_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key)?.as_str()
}

pub fn get_array<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value.get(key)?.as_array()
}

/// Array entries under `key`, or an empty slice when missing or not an array.
pub fn entries<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    get_array(value, key).map(Vec::as_slice).unwrap_or(&[])
}

/// First entry of a list-shaped block (Terraform encodes nested blocks as
/// single-element lists).
pub fn first_entry<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    get_array(value, key)?.first()
}

/// True when the key is missing or null. An empty block (`[]`, `{}`) still
/// counts as configured.
pub fn is_absent(value: &Value, key: &str) -> bool {
    matches!(value.get(key), None | Some(Value::Null))
}

/// Loose truthiness for flag-like attributes (`true`, non-empty strings,
/// non-zero numbers).
pub fn is_truthy(value: &Value, key: &str) -> bool {
    match value.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// True when `key` is an array of strings containing `needle`.
pub fn contains_str(value: &Value, key: &str, needle: &str) -> bool {
    entries(value, key)
        .iter()
        .any(|item| item.as_str() == Some(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_absent_only_for_missing_or_null() {
        let value = json!({"a": null, "b": [], "c": {}, "d": [{"x": 1}], "e": false});
        assert!(is_absent(&value, "a"));
        assert!(!is_absent(&value, "b"));
        assert!(!is_absent(&value, "c"));
        assert!(!is_absent(&value, "d"));
        assert!(!is_absent(&value, "e"));
        assert!(is_absent(&value, "zzz"));
    }

    #[test]
    fn test_first_entry() {
        let value = json!({"versioning": [{"enabled": true}], "empty": []});
        assert_eq!(first_entry(&value, "versioning"), Some(&json!({"enabled": true})));
        assert!(first_entry(&value, "empty").is_none());
        assert!(entries(&value, "missing").is_empty());
    }

    #[test]
    fn test_truthiness() {
        let value = json!({"t": true, "f": false, "s": "", "n": 0, "m": 3});
        assert!(is_truthy(&value, "t"));
        assert!(!is_truthy(&value, "f"));
        assert!(!is_truthy(&value, "s"));
        assert!(!is_truthy(&value, "n"));
        assert!(is_truthy(&value, "m"));
        assert!(!is_truthy(&value, "missing"));
    }

    #[test]
    fn test_contains_str() {
        let value = json!({"cidr_blocks": ["10.0.0.0/8", "0.0.0.0/0"]});
        assert!(contains_str(&value, "cidr_blocks", "0.0.0.0/0"));
        assert!(!contains_str(&value, "ipv6_cidr_blocks", "::/0"));
    }
}
