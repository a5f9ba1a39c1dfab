//! Local mirror of one remote record
//!
//! A [`LocalArtifact`] lives between a pull and its cleanup. Each of its
//! [`LocalFile`]s carries the wrapper-free baseline it was materialized
//! from; that baseline only moves on a successful pull or push.

use crate::config::FieldMapping;
use crate::hash::ContentHash;
use crate::wrapper::{FileKind, Wrapper};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Raw field values of a remote record
pub type RecordData = BTreeMap<String, String>;

/// Field tag of the generated description file
pub const DOCUMENTATION_FIELD: &str = "documentation";

/// Field tag reserved for record metadata
pub const METADATA_FIELD: &str = "metadata";

/// True for field tags that never take part in a remote update
#[inline]
#[must_use]
pub fn is_sentinel_field(field: &str) -> bool {
    field == DOCUMENTATION_FIELD || field == METADATA_FIELD
}

/// Synchronization state of a local artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Local files match the last pulled or pushed state
    Synced,
    /// Local edits not yet pushed
    Modified,
    /// A push was attempted and the remote update did not succeed
    PendingUpload,
}

impl SyncStatus {
    /// Stable name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Modified => "modified",
            Self::PendingUpload => "pending_upload",
        }
    }

    /// Cleanup without `force` is only allowed when synced
    #[inline]
    #[must_use]
    pub fn is_synced(self) -> bool {
        matches!(self, Self::Synced)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field written to disk
#[derive(Debug, Clone, Serialize)]
pub struct LocalFile {
    /// File name inside the artifact directory
    pub filename: String,
    /// Absolute path on disk
    pub path: PathBuf,
    /// Source field, or a sentinel tag
    pub field: String,
    /// File category
    pub kind: FileKind,
    /// Field value at last pull/push, wrapper stripped
    pub original_content: String,
    /// Fingerprint of `original_content`
    pub baseline_hash: ContentHash,
    /// Wrapper-stripped value read at the last check
    pub current_content: Option<String>,
    /// Whether the last check found a difference
    pub is_modified: bool,
    /// Mapping this file was produced from; `None` for generated files
    #[serde(skip)]
    pub mapping: Option<FieldMapping>,
    /// Header/footer written around the content
    pub wrapper: Wrapper,
}

impl LocalFile {
    /// Create a tracked file from its baseline
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        path: impl Into<PathBuf>,
        field: impl Into<String>,
        kind: FileKind,
        original_content: impl Into<String>,
    ) -> Self {
        let original_content = original_content.into();
        Self {
            filename: filename.into(),
            path: path.into(),
            field: field.into(),
            kind,
            baseline_hash: ContentHash::of_text(&original_content),
            original_content,
            current_content: None,
            is_modified: false,
            mapping: None,
            wrapper: Wrapper::none(),
        }
    }

    /// Attach the source mapping
    #[must_use]
    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Attach the rendered wrapper
    #[must_use]
    pub fn with_wrapper(mut self, wrapper: Wrapper) -> Self {
        self.wrapper = wrapper;
        self
    }

    /// True for files that may contribute to a remote update
    #[inline]
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.mapping.is_some() && !is_sentinel_field(&self.field)
    }

    /// True when `content` differs from the baseline fingerprint
    #[inline]
    #[must_use]
    pub fn differs_from_baseline(&self, content: &str) -> bool {
        !self.baseline_hash.matches(content)
    }

    /// Make `content` the new baseline
    pub fn rebase(&mut self, content: impl Into<String>) {
        self.original_content = content.into();
        self.baseline_hash = ContentHash::of_text(&self.original_content);
        self.current_content = None;
        self.is_modified = false;
    }
}

/// One in-flight synchronization unit
#[derive(Debug, Clone, Serialize)]
pub struct LocalArtifact {
    /// Remote record id
    pub sys_id: String,
    /// Display name
    pub name: String,
    /// Record-type label
    pub type_label: String,
    /// Remote table
    pub table: String,
    /// Local directory
    pub path: PathBuf,
    /// Files in mapping order, description file last
    pub files: Vec<LocalFile>,
    /// Last-fetched raw field map
    pub metadata: RecordData,
    /// Sync state
    pub sync_status: SyncStatus,
    /// When the artifact was pulled
    pub created_at: DateTime<Utc>,
    /// Last successful pull or push
    pub last_synced_at: DateTime<Utc>,
}

impl LocalArtifact {
    /// File materialized from `field`, if any
    #[must_use]
    pub fn file_for_field(&self, field: &str) -> Option<&LocalFile> {
        self.files.iter().find(|f| f.field == field)
    }

    /// Files that may contribute to a remote update
    pub fn tracked_files(&self) -> impl Iterator<Item = &LocalFile> {
        self.files.iter().filter(|f| f.is_tracked())
    }

    /// Files whose last check found a difference
    pub fn modified_files(&self) -> impl Iterator<Item = &LocalFile> {
        self.files.iter().filter(|f| f.is_modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_fields() {
        assert!(is_sentinel_field("documentation"));
        assert!(is_sentinel_field("metadata"));
        assert!(!is_sentinel_field("template"));
    }

    #[test]
    fn status_names() {
        assert_eq!(SyncStatus::PendingUpload.to_string(), "pending_upload");
        assert!(SyncStatus::Synced.is_synced());
        assert!(!SyncStatus::Modified.is_synced());
    }

    #[test]
    fn rebase_moves_baseline() {
        let mut file = LocalFile::new("a.html", "/tmp/a.html", "template", FileKind::Markup, "<div>");
        file.current_content = Some("<div></div>".into());
        file.is_modified = true;
        let before = file.baseline_hash;

        file.rebase("<div></div>");
        assert_eq!(file.original_content, "<div></div>");
        assert_ne!(file.baseline_hash, before);
        assert!(!file.is_modified);
        assert!(file.current_content.is_none());
    }

    #[test]
    fn baseline_comparison_uses_fingerprint() {
        let mut file = LocalFile::new("a.js", "/tmp/a.js", "script", FileKind::Script, "var a;");
        assert!(!file.differs_from_baseline("var a;"));
        assert!(file.differs_from_baseline("var a; "));

        file.rebase("var b;");
        assert!(file.differs_from_baseline("var a;"));
        assert!(!file.differs_from_baseline("var b;"));
    }

    #[test]
    fn generated_files_are_not_tracked() {
        let file = LocalFile::new("README.md", "/tmp/README.md", DOCUMENTATION_FIELD, FileKind::Text, "");
        assert!(!file.is_tracked());

        let mapped = LocalFile::new("t.html", "/tmp/t.html", "template", FileKind::Markup, "")
            .with_mapping(FieldMapping::new("template", "template", "html"));
        assert!(mapped.is_tracked());
    }
}
