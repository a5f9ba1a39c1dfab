//! Built-in cross-file coherence rules for Service Portal widgets
//!
//! Each rule is a plain function over [`FieldContents`] so it can be attached
//! to an artifact type as data. Missing fields are treated as empty.

use crate::result::{FieldContents, ValidationResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Widget HTML template field
pub const TEMPLATE_FIELD: &str = "template";
/// Widget server script field
pub const SERVER_SCRIPT_FIELD: &str = "script";
/// Widget client controller field
pub const CLIENT_SCRIPT_FIELD: &str = "client_script";

static DATA_READ: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bdata\.([A-Za-z_$][\w$]*)").expect("valid regex"));
static DATA_WRITE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\bdata\.([A-Za-z_$][\w$]*)\s*=(?:[^=]|$)").expect("valid regex")
});
static SERVER_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.server\.(?:get|update|refresh)\s*\(").expect("valid regex"));
static ACTION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\baction\s*:\s*['"]([\w.-]+)['"]"#).expect("valid regex"));
static CONTROLLER_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bc\.([A-Za-z_$][\w$]*)\s*\(").expect("valid regex"));
static CONTROLLER_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\bc\.([A-Za-z_$][\w$]*)\s*=(?:[^=]|$)").expect("valid regex")
});

fn field<'a>(fields: &'a FieldContents, name: &str) -> &'a str {
    fields.get(name).map_or("", String::as_str)
}

fn captures(re: &Regex, text: &str) -> BTreeSet<String> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Template only reads `data.*` properties that a script assigns
///
/// Server assignments nobody reads are reported as hints.
#[must_use]
pub fn template_data_bindings(fields: &FieldContents) -> ValidationResult {
    let template = field(fields, TEMPLATE_FIELD);
    let server = field(fields, SERVER_SCRIPT_FIELD);
    let client = field(fields, CLIENT_SCRIPT_FIELD);
    let mut result = ValidationResult::ok();

    let read_by_template = captures(&DATA_READ, template);
    let written_by_server = captures(&DATA_WRITE, server);
    let written_by_client = captures(&DATA_WRITE, client);

    for name in &read_by_template {
        if !written_by_server.contains(name) && !written_by_client.contains(name) {
            result.push_error(format!(
                "template reads data.{name} but neither the server script nor the client controller assigns it"
            ));
        }
    }

    let read_by_client = captures(&DATA_READ, client);
    for name in &written_by_server {
        if !read_by_template.contains(name) && !read_by_client.contains(name) {
            result.push_hint(format!(
                "server script sets data.{name} but the template and client controller never read it"
            ));
        }
    }

    result
}

/// Every action the client sends is handled by the server script
#[must_use]
pub fn client_server_actions(fields: &FieldContents) -> ValidationResult {
    let server = field(fields, SERVER_SCRIPT_FIELD);
    let client = field(fields, CLIENT_SCRIPT_FIELD);
    let mut result = ValidationResult::ok();

    if !SERVER_CALL.is_match(client) {
        return result;
    }

    if !server.contains("input") {
        result.push_warning("client controller calls the server but the server script never reads input");
    }

    for action in captures(&ACTION_NAME, client) {
        let handled =
            server.contains(&format!("'{action}'")) || server.contains(&format!("\"{action}\""));
        if !handled {
            result.push_error(format!(
                "client sends action '{action}' but the server script never handles it"
            ));
        }
    }

    result
}

/// Every `c.fn()` the template calls is defined on the controller
#[must_use]
pub fn template_method_calls(fields: &FieldContents) -> ValidationResult {
    let template = field(fields, TEMPLATE_FIELD);
    let client = field(fields, CLIENT_SCRIPT_FIELD);
    let mut result = ValidationResult::ok();

    let defined = captures(&CONTROLLER_DEF, client);
    for name in captures(&CONTROLLER_CALL, template) {
        if !defined.contains(&name) {
            result.push_error(format!(
                "template calls c.{name}() but the client controller never defines it"
            ));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(template: &str, server: &str, client: &str) -> FieldContents {
        let mut fields = FieldContents::new();
        fields.insert(TEMPLATE_FIELD.into(), template.into());
        fields.insert(SERVER_SCRIPT_FIELD.into(), server.into());
        fields.insert(CLIENT_SCRIPT_FIELD.into(), client.into());
        fields
    }

    #[test]
    fn data_binding_satisfied_by_server() {
        let fields = widget(
            "<h1>{{c.data.title}}</h1>",
            "(function() { data.title = gs.getMessage('Hi'); })();",
            "",
        );
        let result = template_data_bindings(&fields);
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn data_binding_missing_is_error() {
        let fields = widget("<p>{{data.count}}</p>", "data.title = 'x';", "");
        let result = template_data_bindings(&fields);
        assert!(!result.valid);
        assert!(result.errors[0].contains("data.count"));
        assert!(result.hints[0].contains("data.title"));
    }

    #[test]
    fn comparison_is_not_an_assignment() {
        let fields = widget("<p>{{data.mode}}</p>", "if (data.mode == 'x') {}", "");
        assert!(!template_data_bindings(&fields).valid);
    }

    #[test]
    fn client_assignment_counts_as_definition() {
        let fields = widget("<p>{{c.data.local}}</p>", "", "c.data.local = true;");
        assert!(template_data_bindings(&fields).valid);
    }

    #[test]
    fn unhandled_action_is_error() {
        let fields = widget(
            "",
            "if (input && input.action === 'save') {}",
            "c.server.get({action: 'save'}); c.server.get({action: 'delete'});",
        );
        let result = client_server_actions(&fields);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("'delete'"));
    }

    #[test]
    fn server_without_input_is_warned() {
        let fields = widget("", "data.x = 1;", "c.server.update();");
        let result = client_server_actions(&fields);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn no_server_calls_is_clean() {
        let fields = widget("", "", "c.count = 0;");
        assert!(client_server_actions(&fields).is_clean());
    }

    #[test]
    fn template_method_defined() {
        let fields = widget(
            r#"<button ng-click="c.save()">Save</button>"#,
            "",
            "api.controller = function() { var c = this; c.save = function() {}; };",
        );
        assert!(template_method_calls(&fields).valid);
    }

    #[test]
    fn template_method_missing() {
        let fields = widget(
            r#"<button ng-click="c.remove(item)">x</button>"#,
            "",
            "var c = this;",
        );
        let result = template_method_calls(&fields);
        assert!(!result.valid);
        assert!(result.errors[0].contains("c.remove()"));
    }

    #[test]
    fn server_get_is_not_a_template_method() {
        let fields = widget(r#"<a ng-click="c.server.get()">x</a>"#, "", "");
        assert!(template_method_calls(&fields).valid);
    }

    #[test]
    fn missing_fields_are_empty() {
        let fields = FieldContents::new();
        assert!(template_data_bindings(&fields).is_clean());
        assert!(client_server_actions(&fields).is_clean());
        assert!(template_method_calls(&fields).is_clean());
    }
}
