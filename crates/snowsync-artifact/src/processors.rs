//! Built-in field processors

use crate::config::FieldProcessor;

/// Pretty-print JSON values that parse; others pass through
pub const PRETTY_JSON: FieldProcessor = FieldProcessor::new("pretty_json", pretty_json);

/// Minify JSON values that parse; others pass through
pub const COMPACT_JSON: FieldProcessor = FieldProcessor::new("compact_json", compact_json);

/// Convert CRLF line endings to LF
pub const NORMALIZE_LINE_ENDINGS: FieldProcessor =
    FieldProcessor::new("normalize_line_endings", normalize_line_endings);

/// See [`PRETTY_JSON`]
#[must_use]
pub fn pretty_json(input: &str) -> String {
    if input.trim().is_empty() {
        return input.to_string();
    }
    serde_json::from_str::<serde_json::Value>(input)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| input.to_string())
}

/// See [`COMPACT_JSON`]
#[must_use]
pub fn compact_json(input: &str) -> String {
    if input.trim().is_empty() {
        return input.to_string();
    }
    serde_json::from_str::<serde_json::Value>(input)
        .ok()
        .and_then(|v| serde_json::to_string(&v).ok())
        .unwrap_or_else(|| input.to_string())
}

/// See [`NORMALIZE_LINE_ENDINGS`]
#[must_use]
pub fn normalize_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_then_compact() {
        let pretty = pretty_json(r#"{"b":[1,2],"a":"x"}"#);
        assert!(pretty.lines().count() > 1);
        assert_eq!(compact_json(&pretty), r#"{"a":"x","b":[1,2]}"#);
    }

    #[test]
    fn invalid_json_passes_through() {
        assert_eq!(pretty_json("{not json"), "{not json");
        assert_eq!(compact_json("{not json"), "{not json");
        assert_eq!(pretty_json(""), "");
    }

    #[test]
    fn line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\r\n"), "a\nb\n");
        assert_eq!(NORMALIZE_LINE_ENDINGS.run("x\r\n"), "x\n");
    }
}
