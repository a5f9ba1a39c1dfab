//! Artifact type configuration
//!
//! Plain data describing how one remote table maps onto local files.
//! Processors, rules and validators are named function pointers attached
//! to the configuration, so a config is cheap to clone and easy to build
//! synthetically in tests.

use crate::local::{is_sentinel_field, RecordData};
use crate::sanitize::sanitize_file_stem;
use crate::template;
use crate::wrapper::{FileKind, Wrapper};
use snowsync_validation::{FieldContents, ValidationResult};
use std::collections::HashSet;
use std::fmt;

/// Named pure transformation applied to a field value
#[derive(Clone, Copy)]
pub struct FieldProcessor {
    /// Display name
    pub name: &'static str,
    /// Transformation
    pub apply: fn(&str) -> String,
}

impl FieldProcessor {
    /// Create processor
    #[inline]
    #[must_use]
    pub const fn new(name: &'static str, apply: fn(&str) -> String) -> Self {
        Self { name, apply }
    }

    /// Run the transformation
    #[inline]
    #[must_use]
    pub fn run(&self, input: &str) -> String {
        (self.apply)(input)
    }
}

impl fmt::Debug for FieldProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldProcessor").field(&self.name).finish()
    }
}

/// Cross-file consistency rule
#[derive(Clone)]
pub struct CoherenceRule {
    /// Rule name, reported with every finding
    pub name: String,
    /// Human description, written to the artifact README
    pub description: String,
    /// Check over field name → stripped, post-processed content
    pub check: fn(&FieldContents) -> ValidationResult,
}

impl CoherenceRule {
    /// Create rule
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        check: fn(&FieldContents) -> ValidationResult,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            check,
        }
    }
}

impl fmt::Debug for CoherenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoherenceRule")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Whole-record validator run over the last-fetched metadata
#[derive(Clone)]
pub struct RecordValidator {
    /// Validator name
    pub name: String,
    /// Check over the full record
    pub check: fn(&FieldContents) -> ValidationResult,
}

impl RecordValidator {
    /// Create validator
    #[must_use]
    pub fn new(name: impl Into<String>, check: fn(&FieldContents) -> ValidationResult) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl fmt::Debug for RecordValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordValidator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Correspondence between one remote field and one local file
#[derive(Debug, Clone)]
pub struct FieldMapping {
    /// Remote field name
    pub field: String,
    /// File name pattern without extension, may contain `{placeholders}`
    pub filename: String,
    /// Extension without the dot
    pub extension: String,
    /// Category derived from the extension
    pub kind: FileKind,
    /// Write the file even when the value is empty
    pub required: bool,
    /// Header template
    pub header: Option<String>,
    /// Footer template
    pub footer: Option<String>,
    /// Applied to the remote value before writing
    pub pre_process: Option<FieldProcessor>,
    /// Applied to the stripped local value before pushing
    pub post_process: Option<FieldProcessor>,
    /// Scan pushed content for post-ES5 syntax
    pub legacy_syntax_check: bool,
}

impl FieldMapping {
    /// Optional mapping with no wrapper or processors
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        filename: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        let extension: String = extension.into();
        Self {
            field: field.into(),
            filename: filename.into(),
            kind: FileKind::from_extension(&extension),
            extension: extension.trim_start_matches('.').to_string(),
            required: false,
            header: None,
            footer: None,
            pre_process: None,
            post_process: None,
            legacy_syntax_check: false,
        }
    }

    /// Mark the field as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set header template
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Set footer template
    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Set pre-processor
    #[must_use]
    pub fn with_pre_process(mut self, processor: FieldProcessor) -> Self {
        self.pre_process = Some(processor);
        self
    }

    /// Set post-processor
    #[must_use]
    pub fn with_post_process(mut self, processor: FieldProcessor) -> Self {
        self.post_process = Some(processor);
        self
    }

    /// Require the legacy-syntax scan
    #[must_use]
    pub fn legacy_syntax(mut self) -> Self {
        self.legacy_syntax_check = true;
        self
    }

    /// Rendered file name for a record, extension included
    ///
    /// Falls back to the field name when the pattern renders to nothing
    /// usable.
    #[must_use]
    pub fn file_name(&self, record: &RecordData) -> String {
        let stem = sanitize_file_stem(&template::render(&self.filename, record))
            .unwrap_or_else(|| self.field.clone());
        self.with_extension(stem)
    }

    fn with_extension(&self, stem: String) -> String {
        if self.extension.is_empty() {
            stem
        } else {
            format!("{stem}.{}", self.extension)
        }
    }

    /// Rendered wrapper for a record
    #[must_use]
    pub fn wrapper(&self, record: &RecordData) -> Wrapper {
        let render = |t: &Option<String>| {
            t.as_deref()
                .map(|t| template::render(t, record))
                .unwrap_or_default()
        };
        Wrapper::new(render(&self.header), render(&self.footer))
    }

    /// Remote value → value written to disk
    #[must_use]
    pub fn pre_process(&self, raw: &str) -> String {
        match &self.pre_process {
            Some(p) => p.run(raw),
            None => raw.to_string(),
        }
    }

    /// Local value → value sent to the remote
    #[must_use]
    pub fn post_process(&self, local: &str) -> String {
        match &self.post_process {
            Some(p) => p.run(local),
            None => local.to_string(),
        }
    }

    fn static_file_name(&self) -> Option<String> {
        if template::has_placeholders(&self.filename) {
            None
        } else {
            Some(self.with_extension(self.filename.clone()))
        }
    }
}

/// How one remote table is mirrored locally
#[derive(Debug, Clone)]
pub struct ArtifactTypeConfig {
    /// Remote table name
    pub table: String,
    /// Record-type label
    pub label: String,
    /// Local sub-directory and fallback-name prefix
    pub folder: String,
    /// Field holding the human-readable name
    pub identifier_field: String,
    /// Field mappings in write order
    pub fields: Vec<FieldMapping>,
    /// Cross-file rules
    pub coherence_rules: Vec<CoherenceRule>,
    /// Optional whole-record validator
    pub validator: Option<RecordValidator>,
}

impl ArtifactTypeConfig {
    /// Empty config for a table
    #[must_use]
    pub fn new(
        table: impl Into<String>,
        label: impl Into<String>,
        folder: impl Into<String>,
        identifier_field: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            label: label.into(),
            folder: folder.into(),
            identifier_field: identifier_field.into(),
            fields: Vec::new(),
            coherence_rules: Vec::new(),
            validator: None,
        }
    }

    /// Append a field mapping
    #[must_use]
    pub fn with_field(mut self, mapping: FieldMapping) -> Self {
        self.fields.push(mapping);
        self
    }

    /// Append a coherence rule
    #[must_use]
    pub fn with_rule(mut self, rule: CoherenceRule) -> Self {
        self.coherence_rules.push(rule);
        self
    }

    /// Set the whole-record validator
    #[must_use]
    pub fn with_validator(mut self, validator: RecordValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Mapping for a remote field
    #[must_use]
    pub fn mapping(&self, field: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|m| m.field == field)
    }

    /// True when any mapping requires the legacy-syntax scan
    #[must_use]
    pub fn checks_legacy_syntax(&self) -> bool {
        self.fields.iter().any(|m| m.legacy_syntax_check)
    }

    /// Check structural consistency
    ///
    /// # Errors
    /// Returns the first problem found: empty table or identifier field,
    /// no mappings, a duplicate source field or static file name, or a
    /// mapping onto a reserved field tag.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table.trim().is_empty() {
            return Err(ConfigError::EmptyTable);
        }
        if self.identifier_field.trim().is_empty() {
            return Err(ConfigError::EmptyIdentifier {
                table: self.table.clone(),
            });
        }
        if self.fields.is_empty() {
            return Err(ConfigError::NoFields {
                table: self.table.clone(),
            });
        }

        let mut fields = HashSet::new();
        let mut names = HashSet::new();
        for mapping in &self.fields {
            if is_sentinel_field(&mapping.field) {
                return Err(ConfigError::ReservedField {
                    table: self.table.clone(),
                    field: mapping.field.clone(),
                });
            }
            if !fields.insert(mapping.field.as_str()) {
                return Err(ConfigError::DuplicateField {
                    table: self.table.clone(),
                    field: mapping.field.clone(),
                });
            }
            if let Some(name) = mapping.static_file_name() {
                if !names.insert(name.clone()) {
                    return Err(ConfigError::DuplicateFileName {
                        table: self.table.clone(),
                        filename: name,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Structural problems in an [`ArtifactTypeConfig`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Table name is empty
    #[error("artifact type has an empty table name")]
    EmptyTable,

    /// Identifier field is empty
    #[error("artifact type '{table}' has an empty identifier field")]
    EmptyIdentifier { table: String },

    /// No field mappings
    #[error("artifact type '{table}' declares no field mappings")]
    NoFields { table: String },

    /// Same source field mapped twice
    #[error("artifact type '{table}' maps field '{field}' more than once")]
    DuplicateField { table: String, field: String },

    /// Two mappings write the same file
    #[error("artifact type '{table}' writes '{filename}' more than once")]
    DuplicateFileName { table: String, filename: String },

    /// Mapping uses a reserved field tag
    #[error("artifact type '{table}' maps reserved field '{field}'")]
    ReservedField { table: String, field: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors;

    fn widget() -> ArtifactTypeConfig {
        ArtifactTypeConfig::new("sp_widget", "Service Portal Widget", "widgets", "name")
            .with_field(FieldMapping::new("template", "template", "html").required())
            .with_field(FieldMapping::new("script", "server", "js").legacy_syntax())
    }

    fn record() -> RecordData {
        let mut r = RecordData::new();
        r.insert("name".into(), "My Widget".into());
        r.insert("api_name".into(), "x_app.MyWidget".into());
        r
    }

    #[test]
    fn valid_config_passes() {
        assert_eq!(widget().validate(), Ok(()));
        assert!(widget().checks_legacy_syntax());
    }

    #[test]
    fn rejects_empty_table() {
        let config = ArtifactTypeConfig::new(" ", "x", "x", "name")
            .with_field(FieldMapping::new("a", "a", "txt"));
        assert_eq!(config.validate(), Err(ConfigError::EmptyTable));
    }

    #[test]
    fn rejects_missing_fields() {
        let config = ArtifactTypeConfig::new("t", "x", "x", "name");
        assert!(matches!(config.validate(), Err(ConfigError::NoFields { .. })));
    }

    #[test]
    fn rejects_duplicate_field() {
        let config = widget().with_field(FieldMapping::new("template", "other", "html"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateField { field, .. }) if field == "template"
        ));
    }

    #[test]
    fn rejects_duplicate_file_name() {
        let config = widget().with_field(FieldMapping::new("css", "template", "html"));
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateFileName { .. })));
    }

    #[test]
    fn extensionless_names_match_materialized_names() {
        let mapping = FieldMapping::new("notes", "NOTES", "");
        assert_eq!(mapping.file_name(&record()), "NOTES");
        assert_eq!(mapping.static_file_name().as_deref(), Some("NOTES"));

        let clash = widget()
            .with_field(FieldMapping::new("notes", "NOTES", ""))
            .with_field(FieldMapping::new("extra", "NOTES", ""));
        assert!(matches!(
            clash.validate(),
            Err(ConfigError::DuplicateFileName { ref filename, .. }) if filename == "NOTES"
        ));

        let distinct = widget()
            .with_field(FieldMapping::new("notes", "NOTES", ""))
            .with_field(FieldMapping::new("extra", "NOTES", "txt"));
        assert_eq!(distinct.validate(), Ok(()));
    }

    #[test]
    fn rejects_reserved_field() {
        let config = widget().with_field(FieldMapping::new("documentation", "docs", "md"));
        assert!(matches!(config.validate(), Err(ConfigError::ReservedField { .. })));
    }

    #[test]
    fn file_name_renders_placeholders() {
        let mapping = FieldMapping::new("script", "{api_name}", "js");
        assert_eq!(mapping.file_name(&record()), "x_app.MyWidget.js");
    }

    #[test]
    fn file_name_falls_back_to_field() {
        let mapping = FieldMapping::new("script", "{missing}", "js");
        assert_eq!(mapping.file_name(&record()), "script.js");
    }

    #[test]
    fn wrapper_renders_templates() {
        let mapping = FieldMapping::new("template", "template", "html")
            .with_header("<!-- Widget: {name} -->\n");
        let wrapper = mapping.wrapper(&record());
        assert_eq!(wrapper.header(), "<!-- Widget: My Widget -->\n");
        assert_eq!(wrapper.footer(), "");
    }

    #[test]
    fn processors_apply() {
        let mapping = FieldMapping::new("option_schema", "options", "json")
            .with_pre_process(processors::PRETTY_JSON)
            .with_post_process(processors::COMPACT_JSON);
        let disk = mapping.pre_process(r#"{"a":1}"#);
        assert!(disk.contains('\n'));
        assert_eq!(mapping.post_process(&disk), r#"{"a":1}"#);
        assert_eq!(mapping.kind, FileKind::Json);
    }
}
