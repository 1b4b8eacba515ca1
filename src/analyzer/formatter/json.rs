//! JSON formatter.

use serde::Serialize;

/// Format any report as pretty-printed JSON.
pub fn format<T: Serialize + ?Sized>(report: &T) -> String {
    let mut output = serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
    output.push('\n');
    output
}
