//! Local files → minimal update payload
//!
//! Re-reads every mapped file, strips its wrapper and compares the result
//! with the baseline recorded at the last pull or push. Only fields whose
//! content differs end up in the payload.

use crate::error::{SyncError, SyncResult};
use serde::Serialize;
use snowsync_artifact::{is_sentinel_field, LocalArtifact, RecordData};
use snowsync_validation::{FieldContents, LegacySyntaxChecker, LegacySyntaxIssue};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Which fields get the legacy-syntax scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LegacyScope {
    /// Only fields that changed (push)
    #[default]
    ChangedFields,
    /// Every field whose mapping asks for it (explicit validation)
    AllFlaggedFields,
}

/// Legacy-syntax findings for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssues {
    /// Remote field name
    pub field: String,
    /// Findings in line order
    pub issues: Vec<LegacySyntaxIssue>,
}

/// What a change-detection pass found
#[derive(Debug, Clone, Default)]
pub struct Recomposition {
    /// Update payload: changed field → post-processed value
    pub changes: RecordData,
    /// Current post-processed content of every mapped field
    pub contents: FieldContents,
    /// Changed fields in mapping order
    pub modified_fields: Vec<String>,
    /// Legacy-syntax findings per field
    pub legacy_issues: Vec<FieldIssues>,
    /// Mapped files no longer on disk
    pub missing: Vec<PathBuf>,
}

impl Recomposition {
    /// True when nothing needs pushing
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    /// Total number of legacy-syntax findings
    #[must_use]
    pub fn legacy_issue_count(&self) -> usize {
        self.legacy_issues.iter().map(|f| f.issues.len()).sum()
    }
}

/// Compares local files with their baselines
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    /// Diff every mapped file against its baseline
    ///
    /// Updates `is_modified` and `current_content` on each file read.
    /// Baselines are left untouched.
    ///
    /// # Errors
    /// Returns error if a file exists but cannot be read.
    pub async fn detect_and_recompose(
        artifact: &mut LocalArtifact,
        scope: LegacyScope,
    ) -> SyncResult<Recomposition> {
        let mut out = Recomposition::default();

        for file in &mut artifact.files {
            let Some(mapping) = file.mapping.clone() else {
                continue;
            };
            if is_sentinel_field(&file.field) {
                continue;
            }

            let text = match tokio::fs::read_to_string(&file.path).await {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(field = %file.field, path = %file.path.display(), "mapped file missing");
                    out.missing.push(file.path.clone());
                    out.contents
                        .insert(file.field.clone(), mapping.post_process(&file.original_content));
                    continue;
                }
                Err(e) => return Err(SyncError::io(&file.path, e)),
            };

            let stripped = file.wrapper.unwrap(file.kind, &text);
            let changed = file.differs_from_baseline(&stripped);
            let value = mapping.post_process(&stripped);
            file.is_modified = changed;
            file.current_content = Some(stripped);

            if changed {
                debug!(field = %file.field, file = %file.filename, "field changed");
                out.changes.insert(file.field.clone(), value.clone());
                out.modified_fields.push(file.field.clone());
            }

            let scan = match scope {
                LegacyScope::ChangedFields => changed,
                LegacyScope::AllFlaggedFields => true,
            };
            if mapping.legacy_syntax_check && scan {
                let issues = LegacySyntaxChecker::check(&value);
                if !issues.is_empty() {
                    warn!(field = %file.field, count = issues.len(), "legacy syntax found");
                    out.legacy_issues.push(FieldIssues {
                        field: file.field.clone(),
                        issues,
                    });
                }
            }

            out.contents.insert(file.field.clone(), value);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materializer::Materializer;
    use pretty_assertions::assert_eq;
    use snowsync_artifact::{ArtifactTypeConfig, FieldMapping};
    use snowsync_validation::LegacyConstruct;
    use std::io::Write;

    fn config() -> ArtifactTypeConfig {
        ArtifactTypeConfig::new("sys_script_include", "Script Include", "includes", "name")
            .with_field(
                FieldMapping::new("script", "{name}", "js")
                    .required()
                    .with_header("/**\n * {name}\n */\n")
                    .legacy_syntax(),
            )
            .with_field(FieldMapping::new("description", "notes", "txt"))
    }

    fn record() -> RecordData {
        [
            ("sys_id", "1"),
            ("name", "Utils"),
            ("script", "var Utils = {};"),
            ("description", "helpers"),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
    }

    fn append(path: &std::path::Path, text: &str) {
        let mut f = std::fs::OpenOptions::new().append(true).open(path).unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn untouched_files_yield_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = Materializer::materialize(&config(), &record(), dir.path()).await.unwrap();

        let result = ChangeDetector::detect_and_recompose(&mut artifact, LegacyScope::ChangedFields)
            .await
            .unwrap();
        assert!(result.is_noop());
        assert_eq!(result.contents.len(), 2);
        assert!(artifact.modified_files().next().is_none());
    }

    #[tokio::test]
    async fn single_edit_yields_single_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = Materializer::materialize(&config(), &record(), dir.path()).await.unwrap();
        append(&artifact.path.join("notes.txt"), "!");

        let result = ChangeDetector::detect_and_recompose(&mut artifact, LegacyScope::ChangedFields)
            .await
            .unwrap();
        let mut expected = RecordData::new();
        expected.insert("description".into(), "helpers!".into());
        assert_eq!(result.changes, expected);
        assert_eq!(result.modified_fields, vec!["description".to_string()]);
        assert!(artifact.file_for_field("description").unwrap().is_modified);
        assert_eq!(artifact.file_for_field("description").unwrap().original_content, "helpers");
    }

    #[tokio::test]
    async fn legacy_scan_follows_scope() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = record();
        rec.insert("script".into(), "const x = 1;".into());
        let mut artifact = Materializer::materialize(&config(), &rec, dir.path()).await.unwrap();

        let push = ChangeDetector::detect_and_recompose(&mut artifact, LegacyScope::ChangedFields)
            .await
            .unwrap();
        assert!(push.legacy_issues.is_empty());

        let check = ChangeDetector::detect_and_recompose(&mut artifact, LegacyScope::AllFlaggedFields)
            .await
            .unwrap();
        assert_eq!(check.legacy_issues.len(), 1);
        assert_eq!(check.legacy_issues[0].issues[0].construct, LegacyConstruct::ConstDeclaration);
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = Materializer::materialize(&config(), &record(), dir.path()).await.unwrap();
        std::fs::remove_file(artifact.path.join("notes.txt")).unwrap();

        let result = ChangeDetector::detect_and_recompose(&mut artifact, LegacyScope::ChangedFields)
            .await
            .unwrap();
        assert!(result.is_noop());
        assert_eq!(result.missing, vec![artifact.path.join("notes.txt")]);
    }

    #[tokio::test]
    async fn change_is_judged_against_baseline_hash() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = Materializer::materialize(&config(), &record(), dir.path()).await.unwrap();
        let file = artifact
            .files
            .iter_mut()
            .find(|f| f.field == "description")
            .unwrap();
        file.original_content = "not what was pulled".into();

        let result = ChangeDetector::detect_and_recompose(&mut artifact, LegacyScope::ChangedFields)
            .await
            .unwrap();
        assert!(result.is_noop());
    }

    #[tokio::test]
    async fn readme_edits_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = Materializer::materialize(&config(), &record(), dir.path()).await.unwrap();
        append(&artifact.path.join("README.md"), "notes");

        let result = ChangeDetector::detect_and_recompose(&mut artifact, LegacyScope::ChangedFields)
            .await
            .unwrap();
        assert!(result.is_noop());
    }
}
