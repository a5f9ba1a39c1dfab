//! Record → local files
//!
//! Writes one file per non-empty (or required) mapped field plus a
//! generated `README.md`. Everything is written into a staging directory
//! next to the target and renamed into place once complete, so a failed
//! pull never leaves a half-written artifact behind.

use crate::error::{SyncError, SyncResult};
use chrono::Utc;
use snowsync_artifact::{
    sanitize_name, ArtifactTypeConfig, FileKind, LocalArtifact, LocalFile, RecordData, SyncStatus,
    DOCUMENTATION_FIELD,
};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use ulid::Ulid;

/// Name of the generated description file
pub const README_FILENAME: &str = "README.md";

const SYS_ID_SUFFIX_LEN: usize = 8;

/// Writes records out as local artifacts
#[derive(Debug, Clone, Copy, Default)]
pub struct Materializer;

impl Materializer {
    /// Write `record` under `base_dir/<folder>/<sanitized name>`
    ///
    /// Any previous directory for the same name is replaced.
    ///
    /// # Errors
    /// Returns error if the record has no `sys_id` or any filesystem
    /// operation fails. Nothing is left at the target path in that case
    /// beyond what was there before.
    pub async fn materialize(
        config: &ArtifactTypeConfig,
        record: &RecordData,
        base_dir: &Path,
    ) -> SyncResult<LocalArtifact> {
        Self::materialize_avoiding(config, record, base_dir, |_| false).await
    }

    /// [`materialize`](Self::materialize), skipping directories another
    /// record already owns
    ///
    /// When `taken` reports the sanitized name's directory as owned, the
    /// directory gets a `_<sys_id prefix>` suffix, then the full sys_id.
    ///
    /// # Errors
    /// Same as [`materialize`](Self::materialize).
    pub async fn materialize_avoiding(
        config: &ArtifactTypeConfig,
        record: &RecordData,
        base_dir: &Path,
        taken: impl Fn(&Path) -> bool,
    ) -> SyncResult<LocalArtifact> {
        let sys_id = record
            .get("sys_id")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or(SyncError::MissingSysId)?
            .to_string();

        let display_name = record
            .get(&config.identifier_field)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map_or_else(|| format!("{}_{sys_id}", config.folder), str::to_string);
        let type_dir = base_dir.join(&config.folder);
        create_dir_all(&type_dir).await?;

        let (dir_name, target) = artifact_dir(&type_dir, &display_name, &sys_id, &taken);
        let staging = type_dir.join(format!(".{dir_name}.staging-{}", Ulid::new()));
        create_dir_all(&staging).await?;

        let files = match write_files(config, record, &sys_id, &staging, &target).await {
            Ok(files) => files,
            Err(e) => {
                discard_staging(&staging).await;
                return Err(e);
            }
        };

        if let Err(e) = replace_dir(&staging, &target).await {
            discard_staging(&staging).await;
            return Err(e);
        }

        let now = Utc::now();
        info!(
            table = %config.table,
            sys_id = %sys_id,
            path = %target.display(),
            files = files.len(),
            "artifact materialized"
        );

        Ok(LocalArtifact {
            sys_id,
            name: display_name,
            type_label: config.label.clone(),
            table: config.table.clone(),
            path: target,
            files,
            metadata: record.clone(),
            sync_status: SyncStatus::Synced,
            created_at: now,
            last_synced_at: now,
        })
    }
}

/// Directory name for a record, avoiding directories owned by others
fn artifact_dir(
    type_dir: &Path,
    display_name: &str,
    sys_id: &str,
    taken: impl Fn(&Path) -> bool,
) -> (String, PathBuf) {
    let base = sanitize_name(display_name);
    let id = sanitize_name(sys_id);
    let short: String = id.chars().take(SYS_ID_SUFFIX_LEN).collect();

    let first = type_dir.join(&base);
    if !taken(&first) {
        return (base, first);
    }

    let name = [format!("{base}_{short}"), format!("{base}_{id}")]
        .into_iter()
        .find(|name| !taken(&type_dir.join(name)))
        .unwrap_or_else(|| format!("{base}_{id}"));
    let path = type_dir.join(&name);
    warn!(
        sys_id,
        dir = %path.display(),
        "name already used by another tracked record"
    );
    (name, path)
}

async fn write_files(
    config: &ArtifactTypeConfig,
    record: &RecordData,
    sys_id: &str,
    staging: &Path,
    target: &Path,
) -> SyncResult<Vec<LocalFile>> {
    let mut used: HashSet<String> = HashSet::from([README_FILENAME.to_ascii_lowercase()]);
    let mut files = Vec::with_capacity(config.fields.len() + 1);

    for mapping in &config.fields {
        let raw = record.get(&mapping.field).map_or("", String::as_str);
        if raw.is_empty() && !mapping.required {
            debug!(field = %mapping.field, "skipping empty optional field");
            continue;
        }

        let content = mapping.pre_process(raw);
        let wrapper = mapping.wrapper(record);
        let filename = unique_name(mapping.file_name(record), &mapping.field, &mut used);

        write_file(&staging.join(&filename), &wrapper.wrap(&content)).await?;
        debug!(field = %mapping.field, file = %filename, "field written");

        files.push(
            LocalFile::new(
                filename.clone(),
                target.join(&filename),
                mapping.field.clone(),
                mapping.kind,
                content,
            )
            .with_mapping(mapping.clone())
            .with_wrapper(wrapper),
        );
    }

    let readme = render_readme(config, record, sys_id, &files);
    write_file(&staging.join(README_FILENAME), &readme).await?;
    files.push(LocalFile::new(
        README_FILENAME,
        target.join(README_FILENAME),
        DOCUMENTATION_FIELD,
        FileKind::Text,
        readme,
    ));

    Ok(files)
}

/// Resolve file-name clashes by suffixing the source field
fn unique_name(candidate: String, field: &str, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.to_ascii_lowercase()) {
        return candidate;
    }

    let (stem, ext) = match candidate.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{ext}")),
        _ => (candidate.clone(), String::new()),
    };
    let mut attempt = format!("{stem}_{field}{ext}");
    let mut n = 2;
    while !used.insert(attempt.to_ascii_lowercase()) {
        attempt = format!("{stem}_{field}_{n}{ext}");
        n += 1;
    }
    warn!(requested = %candidate, written = %attempt, "file name clash resolved");
    attempt
}

fn render_readme(
    config: &ArtifactTypeConfig,
    record: &RecordData,
    sys_id: &str,
    files: &[LocalFile],
) -> String {
    let field = |name: &str| {
        record
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .unwrap_or("unknown")
    };
    let title = record
        .get(&config.identifier_field)
        .filter(|v| !v.trim().is_empty())
        .map_or(sys_id, String::as_str);

    let mut out = String::new();
    let _ = writeln!(out, "# {}: {title}\n", config.label);
    let _ = writeln!(out, "- **Type:** {}", config.label);
    let _ = writeln!(out, "- **Table:** `{}`", config.table);
    let _ = writeln!(out, "- **sys_id:** `{sys_id}`");
    let _ = writeln!(out, "- **Created:** {}", field("sys_created_on"));
    let _ = writeln!(out, "- **Updated:** {}", field("sys_updated_on"));

    out.push_str("\n## Files\n\n");
    for file in files {
        let _ = writeln!(out, "- `{}` ← field `{}`", file.filename, file.field);
    }

    if !config.coherence_rules.is_empty() {
        out.push_str("\n## Coherence rules\n\n");
        for rule in &config.coherence_rules {
            let _ = writeln!(out, "- **{}**: {}", rule.name, rule.description);
        }
    }

    let legacy: Vec<&str> = config
        .fields
        .iter()
        .filter(|m| m.legacy_syntax_check)
        .map(|m| m.field.as_str())
        .collect();
    if !legacy.is_empty() {
        let _ = writeln!(
            out,
            "\n## Server-side syntax\n\nFields `{}` run on the instance's ES5 engine. \
             Use `var` and `function`; avoid `let`, `const`, arrow functions, template \
             literals, spread, classes, async functions and `for...of`.",
            legacy.join("`, `")
        );
    }

    out.push_str(
        "\n## Editing\n\n\
         Edit the files above and push the artifact to send changed fields back. \
         Header and footer comments are for orientation only and are not uploaded. \
         This README is regenerated on every pull and is never uploaded.\n",
    );
    out
}

async fn create_dir_all(path: &Path) -> SyncResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| SyncError::io(path, e))
}

async fn write_file(path: &Path, contents: &str) -> SyncResult<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| SyncError::io(path, e))
}

/// Swap the staging directory in for the target
async fn replace_dir(staging: &Path, target: &Path) -> SyncResult<()> {
    match tokio::fs::remove_dir_all(target).await {
        Ok(()) => debug!(path = %target.display(), "previous artifact directory removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(SyncError::io(target, e)),
    }
    tokio::fs::rename(staging, target)
        .await
        .map_err(|e| SyncError::io(target, e))
}

async fn discard_staging(staging: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(staging).await {
        warn!(path = %staging.display(), error = %e, "could not remove staging directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowsync_artifact::FieldMapping;

    fn config() -> ArtifactTypeConfig {
        ArtifactTypeConfig::new("sp_widget", "Widget", "widgets", "name")
            .with_field(
                FieldMapping::new("template", "template", "html")
                    .required()
                    .with_header("<!-- Widget: {name} -->\n"),
            )
            .with_field(FieldMapping::new("css", "style", "css"))
            .with_field(FieldMapping::new("script", "server", "js").legacy_syntax())
    }

    fn record(pairs: &[(&str, &str)]) -> RecordData {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[tokio::test]
    async fn writes_wrapped_files_and_readme() {
        let dir = tempfile::tempdir().unwrap();
        let rec = record(&[
            ("sys_id", "abc"),
            ("name", "My Widget"),
            ("template", "<div></div>"),
            ("script", "var x = 1;"),
        ]);

        let artifact = Materializer::materialize(&config(), &rec, dir.path()).await.unwrap();

        assert_eq!(artifact.path, dir.path().join("widgets").join("my_widget"));
        assert_eq!(artifact.sync_status, SyncStatus::Synced);
        let names: Vec<_> = artifact.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["template.html", "server.js", "README.md"]);

        let on_disk = std::fs::read_to_string(artifact.path.join("template.html")).unwrap();
        assert_eq!(on_disk, "<!-- Widget: My Widget -->\n<div></div>");
        assert_eq!(artifact.files[0].original_content, "<div></div>");

        let readme = std::fs::read_to_string(artifact.path.join(README_FILENAME)).unwrap();
        assert!(readme.contains("`template.html` ← field `template`"));
        assert!(readme.contains("`abc`"));
        assert!(readme.contains("ES5"));
    }

    #[tokio::test]
    async fn falls_back_to_folder_and_sys_id() {
        let dir = tempfile::tempdir().unwrap();
        let rec = record(&[("sys_id", "ABC123"), ("template", "x")]);
        let artifact = Materializer::materialize(&config(), &rec, dir.path()).await.unwrap();
        assert_eq!(artifact.name, "widgets_ABC123");
        assert!(artifact.path.ends_with("widgets/widgets_abc123"));
    }

    #[tokio::test]
    async fn replaces_previous_directory() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("widgets").join("w");
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("stale.txt"), "old").unwrap();

        let rec = record(&[("sys_id", "1"), ("name", "w"), ("template", "x")]);
        Materializer::materialize(&config(), &rec, dir.path()).await.unwrap();

        assert!(!stale.join("stale.txt").exists());
        assert!(stale.join("template.html").exists());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("widgets"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains("staging"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn owned_directory_gets_sys_id_suffix() {
        let type_dir = Path::new("/base/widgets");
        let (name, _) = artifact_dir(type_dir, "Dup", "ABCDEF123456", |_| false);
        assert_eq!(name, "dup");

        let owned = type_dir.join("dup");
        let (name, path) = artifact_dir(type_dir, "Dup", "ABCDEF123456", |p| p == owned);
        assert_eq!(name, "dup_abcdef12");
        assert_eq!(path, type_dir.join("dup_abcdef12"));

        let short = type_dir.join("dup_abcdef12");
        let (name, _) =
            artifact_dir(type_dir, "Dup", "ABCDEF123456", |p| p == owned || p == short);
        assert_eq!(name, "dup_abcdef123456");
    }

    #[tokio::test]
    async fn avoids_directory_of_another_record() {
        let dir = tempfile::tempdir().unwrap();
        let first = record(&[("sys_id", "aaa111"), ("name", "Dup"), ("template", "a")]);
        let second = record(&[("sys_id", "bbb222"), ("name", "Dup"), ("template", "b")]);

        let a = Materializer::materialize(&config(), &first, dir.path()).await.unwrap();
        let b = Materializer::materialize_avoiding(&config(), &second, dir.path(), |p| p == a.path)
            .await
            .unwrap();

        assert_ne!(a.path, b.path);
        assert!(b.path.ends_with("widgets/dup_bbb222"));
        let on_disk = std::fs::read_to_string(a.path.join("template.html")).unwrap();
        assert!(on_disk.ends_with('a'));
    }

    #[tokio::test]
    async fn missing_sys_id_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let rec = record(&[("name", "w"), ("template", "x")]);
        assert!(matches!(
            Materializer::materialize(&config(), &rec, dir.path()).await,
            Err(SyncError::MissingSysId)
        ));
    }

    #[test]
    fn clashing_names_get_field_suffix() {
        let mut used = HashSet::from(["readme.md".to_string()]);
        assert_eq!(unique_name("a.js".into(), "script", &mut used), "a.js");
        assert_eq!(unique_name("a.js".into(), "client", &mut used), "a_client.js");
        assert_eq!(unique_name("README.md".into(), "doc", &mut used), "README_doc.md");
    }
}
