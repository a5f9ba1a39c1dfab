//! Cross-file rule orchestration

use snowsync_artifact::{ArtifactTypeConfig, RecordData};
use snowsync_validation::{CoherenceReport, FieldContents};
use tracing::{debug, warn};

/// Runs a type's declared rules over recomposed content
#[derive(Debug, Clone, Copy, Default)]
pub struct CoherenceValidator;

impl CoherenceValidator {
    /// Run every coherence rule, then the record validator
    ///
    /// The record validator sees `metadata` overlaid with `contents`, so it
    /// judges what the remote record will look like after the update.
    #[must_use]
    pub fn validate(
        config: &ArtifactTypeConfig,
        contents: &FieldContents,
        metadata: &RecordData,
    ) -> CoherenceReport {
        let mut report = CoherenceReport::new();

        for rule in &config.coherence_rules {
            let result = (rule.check)(contents);
            debug!(rule = %rule.name, valid = result.valid, "coherence rule ran");
            report.push(rule.name.clone(), result);
        }

        if let Some(validator) = &config.validator {
            let mut record = metadata.clone();
            record.extend(contents.iter().map(|(k, v)| (k.clone(), v.clone())));
            report.push(validator.name.clone(), (validator.check)(&record));
        }

        if !report.is_valid() {
            warn!(
                table = %config.table,
                errors = report.error_count(),
                warnings = report.warning_count(),
                "coherence check failed"
            );
        }
        report
    }
}
