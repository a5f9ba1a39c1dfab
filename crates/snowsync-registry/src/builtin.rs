//! Built-in ServiceNow artifact types
//!
//! Server-side script fields run on the instance's ES5 engine and carry
//! the legacy-syntax check. Client-side fields do not.

use snowsync_artifact::processors::{COMPACT_JSON, NORMALIZE_LINE_ENDINGS, PRETTY_JSON};
use snowsync_artifact::{ArtifactTypeConfig, CoherenceRule, FieldMapping, RecordValidator};
use snowsync_validation::{rules, FieldContents, ValidationResult};

/// Every built-in type, in lookup order
#[must_use]
pub fn catalog() -> Vec<ArtifactTypeConfig> {
    vec![
        widget(),
        script_include(),
        business_rule(),
        ui_page(),
        client_script(),
        ui_action(),
        rest_operation(),
        scheduled_job(),
        ui_script(),
    ]
}

/// `sp_widget`: Service Portal widget
#[must_use]
pub fn widget() -> ArtifactTypeConfig {
    ArtifactTypeConfig::new("sp_widget", "Service Portal Widget", "widgets", "name")
        .with_field(
            FieldMapping::new("template", "template", "html")
                .required()
                .with_header("<!-- Widget: {name} ({id}) -->\n"),
        )
        .with_field(
            FieldMapping::new("script", "server", "js")
                .required()
                .with_header("/**\n * Server script: {name}\n */\n")
                .legacy_syntax(),
        )
        .with_field(
            FieldMapping::new("client_script", "client", "js")
                .required()
                .with_header("/**\n * Client controller: {name}\n */\n"),
        )
        .with_field(
            FieldMapping::new("css", "style", "scss").with_header("/* Styles: {name} */\n"),
        )
        .with_field(FieldMapping::new("link", "link", "js"))
        .with_field(
            FieldMapping::new("option_schema", "options", "json")
                .with_pre_process(PRETTY_JSON)
                .with_post_process(COMPACT_JSON),
        )
        .with_field(
            FieldMapping::new("demo_data", "demo_data", "json")
                .with_pre_process(PRETTY_JSON)
                .with_post_process(COMPACT_JSON),
        )
        .with_rule(CoherenceRule::new(
            "template_data_bindings",
            "Every data property the template reads is set by the server script",
            rules::template_data_bindings,
        ))
        .with_rule(CoherenceRule::new(
            "client_server_actions",
            "Every action the client sends to the server is handled by the server script",
            rules::client_server_actions,
        ))
        .with_rule(CoherenceRule::new(
            "template_method_calls",
            "Every controller method the template calls is defined by the client script",
            rules::template_method_calls,
        ))
}

/// `sys_script_include`: server-side class library
#[must_use]
pub fn script_include() -> ArtifactTypeConfig {
    ArtifactTypeConfig::new("sys_script_include", "Script Include", "script_includes", "name")
        .with_field(
            FieldMapping::new("script", "{name}", "js")
                .required()
                .with_header("/**\n * Script Include: {name}\n * API name: {api_name}\n */\n")
                .with_post_process(NORMALIZE_LINE_ENDINGS)
                .legacy_syntax(),
        )
        .with_validator(RecordValidator::new(
            "script_include_class",
            script_include_defines_class,
        ))
}

/// `sys_script`: business rule
#[must_use]
pub fn business_rule() -> ArtifactTypeConfig {
    ArtifactTypeConfig::new("sys_script", "Business Rule", "business_rules", "name")
        .with_field(
            FieldMapping::new("script", "{name}", "js")
                .required()
                .with_header("/**\n * Business Rule: {name}\n * Table: {collection}\n * When: {when}\n */\n")
                .legacy_syntax(),
        )
        .with_field(FieldMapping::new("condition", "condition", "txt"))
}

/// `sys_ui_page`: UI page
#[must_use]
pub fn ui_page() -> ArtifactTypeConfig {
    ArtifactTypeConfig::new("sys_ui_page", "UI Page", "ui_pages", "name")
        .with_field(
            FieldMapping::new("html", "page", "html")
                .required()
                .with_header("<!-- UI Page: {name} -->\n"),
        )
        .with_field(FieldMapping::new("client_script", "client", "js"))
        .with_field(
            FieldMapping::new("processing_script", "processing", "js")
                .with_header("/**\n * Processing script: {name}\n */\n")
                .legacy_syntax(),
        )
}

/// `sys_script_client`: client script
#[must_use]
pub fn client_script() -> ArtifactTypeConfig {
    ArtifactTypeConfig::new("sys_script_client", "Client Script", "client_scripts", "name")
        .with_field(
            FieldMapping::new("script", "{name}", "js")
                .required()
                .with_header("/**\n * Client Script: {name}\n * Table: {table}\n * Type: {type}\n */\n"),
        )
}

/// `sys_ui_action`: UI action
#[must_use]
pub fn ui_action() -> ArtifactTypeConfig {
    ArtifactTypeConfig::new("sys_ui_action", "UI Action", "ui_actions", "name")
        .with_field(
            FieldMapping::new("script", "{name}", "js")
                .required()
                .with_header("/**\n * UI Action: {name}\n * Table: {table}\n */\n")
                .legacy_syntax(),
        )
        .with_field(FieldMapping::new("condition", "condition", "txt"))
}

/// `sys_ws_operation`: scripted REST resource
#[must_use]
pub fn rest_operation() -> ArtifactTypeConfig {
    ArtifactTypeConfig::new("sys_ws_operation", "Scripted REST Resource", "rest_resources", "name")
        .with_field(
            FieldMapping::new("operation_script", "{name}", "js")
                .required()
                .with_header("/**\n * REST resource: {http_method} {name}\n */\n")
                .legacy_syntax(),
        )
}

/// `sysauto_script`: scheduled script execution
#[must_use]
pub fn scheduled_job() -> ArtifactTypeConfig {
    ArtifactTypeConfig::new("sysauto_script", "Scheduled Job", "scheduled_jobs", "name")
        .with_field(
            FieldMapping::new("script", "{name}", "js")
                .required()
                .with_header("/**\n * Scheduled Job: {name}\n */\n")
                .legacy_syntax(),
        )
}

/// `sys_ui_script`: global UI script
#[must_use]
pub fn ui_script() -> ArtifactTypeConfig {
    ArtifactTypeConfig::new("sys_ui_script", "UI Script", "ui_scripts", "name")
        .with_field(
            FieldMapping::new("script", "{name}", "js")
                .required()
                .with_header("/**\n * UI Script: {name}\n */\n"),
        )
}

/// Script include must define the class it is named after
///
/// Client-callable includes should extend `AbstractAjaxProcessor`.
#[must_use]
pub fn script_include_defines_class(record: &FieldContents) -> ValidationResult {
    let mut result = ValidationResult::ok();
    let name = record.get("name").map_or("", |n| n.trim());
    let script = record.get("script").map_or("", String::as_str);

    if script.trim().is_empty() {
        result.push_warning("script include has an empty script");
        return result;
    }
    if name.is_empty() {
        return result;
    }

    let escaped = regex::escape(name);
    let defines = regex::Regex::new(&format!(
        r"(?m)(\b(var|function)\s+{escaped}\b)|(^\s*{escaped}\s*=)"
    ))
    .map(|re| re.is_match(script))
    .unwrap_or(true);
    if !defines {
        result.push_error(format!("script does not define '{name}'"));
    }

    let client_callable = record
        .get("client_callable")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
    if client_callable && !script.contains("AbstractAjaxProcessor") {
        result.push_warning(format!(
            "'{name}' is client callable but does not extend AbstractAjaxProcessor"
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> FieldContents {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn catalog_is_valid() {
        for config in catalog() {
            assert_eq!(config.validate(), Ok(()), "{}", config.table);
        }
    }

    #[test]
    fn widget_has_rules() {
        let config = widget();
        assert_eq!(config.coherence_rules.len(), 3);
        assert!(config.mapping("template").unwrap().required);
        assert!(!config.mapping("css").unwrap().required);
    }

    #[test]
    fn server_scripts_check_legacy_syntax() {
        assert!(script_include().mapping("script").unwrap().legacy_syntax_check);
        assert!(!client_script().mapping("script").unwrap().legacy_syntax_check);
    }

    #[test]
    fn class_defined() {
        let rec = record(&[
            ("name", "IncidentUtils"),
            ("script", "var IncidentUtils = Class.create();\nIncidentUtils.prototype = {};"),
        ]);
        assert!(script_include_defines_class(&rec).is_clean());
    }

    #[test]
    fn class_missing() {
        let rec = record(&[("name", "IncidentUtils"), ("script", "var Other = Class.create();")]);
        let result = script_include_defines_class(&rec);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn function_style_include() {
        let rec = record(&[("name", "formatDate"), ("script", "function formatDate(d) { return d; }")]);
        assert!(script_include_defines_class(&rec).valid);
    }

    #[test]
    fn client_callable_needs_ajax_processor() {
        let rec = record(&[
            ("name", "AjaxUtils"),
            ("client_callable", "true"),
            ("script", "var AjaxUtils = Class.create();"),
        ]);
        let result = script_include_defines_class(&rec);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn empty_script_warns() {
        let rec = record(&[("name", "X"), ("script", "  ")]);
        let result = script_include_defines_class(&rec);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
    }
}
