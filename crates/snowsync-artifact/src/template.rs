//! Placeholder rendering for file names and wrapper templates
//!
//! `{field}` is replaced with the record's value for `field`. Unknown
//! fields render as the empty string; text outside braces is copied as is.

use crate::local::RecordData;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"));

/// Substitute `{field}` placeholders with record values
#[must_use]
pub fn render(template: &str, record: &RecordData) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            record.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Names of every placeholder in a template, in order of appearance
#[must_use]
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// True when the template contains at least one placeholder
#[inline]
#[must_use]
pub fn has_placeholders(template: &str) -> bool {
    PLACEHOLDER.is_match(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RecordData {
        let mut r = RecordData::new();
        r.insert("name".into(), "IncidentUtils".into());
        r.insert("api_name".into(), "global.IncidentUtils".into());
        r
    }

    #[test]
    fn substitutes_known_fields() {
        assert_eq!(
            render("/* {name} ({api_name}) */", &record()),
            "/* IncidentUtils (global.IncidentUtils) */"
        );
    }

    #[test]
    fn unknown_fields_render_empty() {
        assert_eq!(render("[{short_description}]", &record()), "[]");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(render("server", &record()), "server");
        assert_eq!(render("{ not a placeholder }", &record()), "{ not a placeholder }");
    }

    #[test]
    fn lists_placeholders() {
        assert_eq!(placeholders("{name}-{sys_id}"), vec!["name", "sys_id"]);
        assert!(has_placeholders("{name}"));
        assert!(!has_placeholders("template"));
    }
}
