//! Sync operations
//!
//! [`ArtifactSyncBridge`] ties the registry, gateway, materializer, change
//! detector, coherence validator and state store together. Every call runs
//! to completion on its own; concurrent calls on the same sys_id resolve
//! last-writer-wins in the store.

use crate::coherence::CoherenceValidator;
use crate::config::BridgeConfig;
use crate::error::{SyncError, SyncResult};
use crate::gateway::RecordGateway;
use crate::materializer::Materializer;
use crate::recompose::{ChangeDetector, FieldIssues, LegacyScope, Recomposition};
use crate::store::{CleanupOutcome, SyncStateStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use snowsync_artifact::{ArtifactTypeConfig, ContentHash, LocalArtifact, RecordData, SyncStatus};
use snowsync_registry::ArtifactTypeRegistry;
use snowsync_validation::{CoherenceReport, ValidationPolicy};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

/// Details of a push that reached the validation stage
#[derive(Debug, Clone, Serialize)]
pub struct PushReport {
    /// Changed fields in mapping order
    pub fields: Vec<String>,
    /// Update payload
    pub payload: RecordData,
    /// Coherence findings
    pub coherence: CoherenceReport,
    /// Legacy-syntax findings on changed fields
    pub legacy_issues: Vec<FieldIssues>,
    /// Mapped files no longer on disk
    pub missing: Vec<PathBuf>,
}

/// Result of [`ArtifactSyncBridge::push`]
#[derive(Debug, Clone)]
pub enum PushOutcome {
    /// Local files match their baselines
    NoChanges,
    /// Remote accepted the update
    Pushed(PushReport),
    /// Remote refused the update; retry recomputes the same diff
    Rejected(PushReport),
    /// Validation policy stopped the update before it was sent
    Blocked(PushReport),
}

impl PushOutcome {
    /// Report for outcomes that got past change detection
    #[must_use]
    pub fn report(&self) -> Option<&PushReport> {
        match self {
            Self::NoChanges => None,
            Self::Pushed(r) | Self::Rejected(r) | Self::Blocked(r) => Some(r),
        }
    }

    /// True when the remote accepted the update
    #[inline]
    #[must_use]
    pub fn is_pushed(&self) -> bool {
        matches!(self, Self::Pushed(_))
    }

    /// Status the artifact was left in
    ///
    /// A blocked push leaves an artifact that was already `pending_upload`
    /// unchanged; this reports the status for any other starting point.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        match self {
            Self::NoChanges | Self::Pushed(_) => SyncStatus::Synced,
            Self::Rejected(_) => SyncStatus::PendingUpload,
            Self::Blocked(_) => SyncStatus::Modified,
        }
    }
}

/// Per-file line of a status report
#[derive(Debug, Clone, Serialize)]
pub struct FileStatus {
    /// File name
    pub filename: String,
    /// Source field
    pub field: String,
    /// Differs from baseline
    pub modified: bool,
    /// Baseline fingerprint
    pub baseline_hash: ContentHash,
}

/// Result of [`ArtifactSyncBridge::sync_status`]
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatusReport {
    /// Remote record id
    pub sys_id: String,
    /// Display name
    pub name: String,
    /// Remote table
    pub table: String,
    /// Local directory
    pub path: PathBuf,
    /// Status after the check
    pub status: SyncStatus,
    /// Fields differing from their baselines
    pub modified_fields: Vec<String>,
    /// Mapped files no longer on disk
    pub missing: Vec<PathBuf>,
    /// Every mapped file
    pub files: Vec<FileStatus>,
    /// Last successful pull or push
    pub last_synced_at: DateTime<Utc>,
}

/// Result of [`ArtifactSyncBridge::validate_coherence`]
#[derive(Debug, Clone, Serialize)]
pub struct CoherenceCheck {
    /// Coherence findings over current content
    pub report: CoherenceReport,
    /// Legacy-syntax findings over every flagged field
    pub legacy_issues: Vec<FieldIssues>,
    /// Fields differing from their baselines
    pub modified_fields: Vec<String>,
}

impl CoherenceCheck {
    /// True when no rule failed and no legacy syntax was found
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.report.is_valid() && self.legacy_issues.is_empty()
    }
}

/// Pulls records into local files and pushes field-level changes back
#[derive(Debug)]
pub struct ArtifactSyncBridge<G> {
    gateway: G,
    registry: ArtifactTypeRegistry,
    store: SyncStateStore,
    config: BridgeConfig,
}

impl<G: RecordGateway> ArtifactSyncBridge<G> {
    /// Create bridge with explicit configuration
    #[must_use]
    pub fn new(gateway: G, registry: ArtifactTypeRegistry, config: BridgeConfig) -> Self {
        info!(
            artifacts_dir = %config.artifacts_dir.display(),
            policy = %config.validation_policy,
            tables = registry.len(),
            "sync bridge ready"
        );
        Self {
            gateway,
            registry,
            store: SyncStateStore::new(),
            config,
        }
    }

    /// Create bridge configured from the environment
    #[must_use]
    pub fn from_env(gateway: G, registry: ArtifactTypeRegistry) -> Self {
        Self::new(gateway, registry, BridgeConfig::from_env())
    }

    /// Base directory for artifacts
    #[inline]
    #[must_use]
    pub fn artifacts_dir(&self) -> &Path {
        &self.config.artifacts_dir
    }

    /// Active validation policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> ValidationPolicy {
        self.config.validation_policy
    }

    /// Injected registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ArtifactTypeRegistry {
        &self.registry
    }

    /// Sync state
    #[inline]
    #[must_use]
    pub fn store(&self) -> &SyncStateStore {
        &self.store
    }

    /// Record gateway
    #[inline]
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Pull one record into local files
    ///
    /// Replaces any previous artifact for the same sys_id.
    ///
    /// # Errors
    /// Returns error if the table is unsupported, the record does not
    /// exist, the gateway fails or the files cannot be written. No state
    /// changes in that case.
    #[instrument(skip(self), level = "debug")]
    pub async fn pull(&self, table: &str, sys_id: &str) -> SyncResult<LocalArtifact> {
        let sys_id = require_sys_id(sys_id)?;
        let config = self.config_for(table)?;
        let record = self
            .gateway
            .fetch(table, sys_id)
            .await?
            .ok_or_else(|| SyncError::not_found(table, sys_id))?;
        self.materialize_and_register(config, record, sys_id).await
    }

    /// Pull a record without knowing its table
    ///
    /// Searches every registered table in registry order. Gateway errors on
    /// one table are logged and the search continues.
    ///
    /// # Errors
    /// Returns error if no table holds the record or the files cannot be
    /// written.
    #[instrument(skip(self), level = "debug")]
    pub async fn pull_by_sys_id(&self, sys_id: &str) -> SyncResult<LocalArtifact> {
        let sys_id = require_sys_id(sys_id)?;

        for config in self.registry.iter() {
            match self.gateway.fetch(&config.table, sys_id).await {
                Ok(Some(record)) => {
                    info!(table = %config.table, sys_id, "record located");
                    return self.materialize_and_register(config, record, sys_id).await;
                }
                Ok(None) => debug!(table = %config.table, sys_id, "not in table"),
                Err(e) => warn!(table = %config.table, sys_id, error = %e, "lookup failed"),
            }
        }

        Err(SyncError::NotFoundInAnyTable {
            sys_id: sys_id.to_string(),
            searched: self.registry.len(),
        })
    }

    /// Send changed fields back to the remote
    ///
    /// # Errors
    /// Returns error if the artifact is not tracked, a file cannot be read
    /// or the gateway fails. A gateway failure leaves the artifact
    /// `pending_upload`.
    #[instrument(skip(self), level = "debug")]
    pub async fn push(&self, sys_id: &str) -> SyncResult<PushOutcome> {
        let mut artifact = self.tracked(sys_id)?;
        let config = self.config_for(&artifact.table)?;

        let recomposed =
            ChangeDetector::detect_and_recompose(&mut artifact, LegacyScope::ChangedFields).await?;

        if recomposed.is_noop() {
            artifact.sync_status = SyncStatus::Synced;
            self.store.register(sys_id, artifact);
            info!(sys_id, "no local changes to push");
            return Ok(PushOutcome::NoChanges);
        }

        let coherence =
            CoherenceValidator::validate(config, &recomposed.contents, &artifact.metadata);
        let report = push_report(recomposed, coherence);
        log_findings(sys_id, &report);

        let legacy_count: usize = report.legacy_issues.iter().map(|f| f.issues.len()).sum();
        if self.policy().blocks(&report.coherence, legacy_count) {
            if artifact.sync_status != SyncStatus::PendingUpload {
                artifact.sync_status = SyncStatus::Modified;
            }
            self.store.register(sys_id, artifact);
            warn!(sys_id, policy = %self.policy(), "push blocked by validation policy");
            return Ok(PushOutcome::Blocked(report));
        }

        match self
            .gateway
            .update(&artifact.table, sys_id, &report.payload)
            .await
        {
            Ok(true) => {
                accept_push(&mut artifact, &report);
                self.store.register(sys_id, artifact);
                info!(sys_id, fields = ?report.fields, "push accepted");
                Ok(PushOutcome::Pushed(report))
            }
            Ok(false) => {
                artifact.sync_status = SyncStatus::PendingUpload;
                self.store.register(sys_id, artifact);
                warn!(sys_id, fields = ?report.fields, "push rejected by remote");
                Ok(PushOutcome::Rejected(report))
            }
            Err(e) => {
                artifact.sync_status = SyncStatus::PendingUpload;
                self.store.register(sys_id, artifact);
                error!(sys_id, error = %e, "push failed");
                Err(e.into())
            }
        }
    }

    /// Remove an artifact's directory and state
    ///
    /// # Errors
    /// Returns error if the directory cannot be deleted.
    pub async fn cleanup(&self, sys_id: &str, force: bool) -> SyncResult<CleanupOutcome> {
        self.store.remove(sys_id, force).await
    }

    /// Every tracked artifact, sorted by name
    #[must_use]
    pub fn list_local(&self) -> Vec<LocalArtifact> {
        let mut artifacts = self.store.list();
        artifacts.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.sys_id.cmp(&b.sys_id)));
        artifacts
    }

    /// Re-read local files and report what changed, without pushing
    ///
    /// Flips `synced` ↔ `modified`; `pending_upload` is kept until a push
    /// succeeds.
    ///
    /// # Errors
    /// Returns error if the artifact is not tracked or a file cannot be read.
    pub async fn sync_status(&self, sys_id: &str) -> SyncResult<SyncStatusReport> {
        let mut artifact = self.tracked(sys_id)?;
        let recomposed =
            ChangeDetector::detect_and_recompose(&mut artifact, LegacyScope::ChangedFields).await?;

        let status = match artifact.sync_status {
            SyncStatus::PendingUpload => SyncStatus::PendingUpload,
            _ if recomposed.is_noop() => SyncStatus::Synced,
            _ => SyncStatus::Modified,
        };
        if status != artifact.sync_status {
            debug!(sys_id, from = %artifact.sync_status, to = %status, "status changed");
            self.store.set_status(sys_id, status);
        }

        Ok(SyncStatusReport {
            files: artifact
                .tracked_files()
                .map(|f| FileStatus {
                    filename: f.filename.clone(),
                    field: f.field.clone(),
                    modified: f.is_modified,
                    baseline_hash: f.baseline_hash,
                })
                .collect(),
            sys_id: artifact.sys_id,
            name: artifact.name,
            table: artifact.table,
            path: artifact.path,
            status,
            modified_fields: recomposed.modified_fields,
            missing: recomposed.missing,
            last_synced_at: artifact.last_synced_at,
        })
    }

    /// Run coherence rules and the legacy-syntax scan over current content
    ///
    /// Does not change sync status.
    ///
    /// # Errors
    /// Returns error if the artifact is not tracked or a file cannot be read.
    pub async fn validate_coherence(&self, sys_id: &str) -> SyncResult<CoherenceCheck> {
        let mut artifact = self.tracked(sys_id)?;
        let config = self.config_for(&artifact.table)?;
        let recomposed =
            ChangeDetector::detect_and_recompose(&mut artifact, LegacyScope::AllFlaggedFields)
                .await?;

        let report = CoherenceValidator::validate(config, &recomposed.contents, &artifact.metadata);
        let check = CoherenceCheck {
            report,
            legacy_issues: recomposed.legacy_issues,
            modified_fields: recomposed.modified_fields,
        };
        info!(
            sys_id,
            clean = check.is_clean(),
            errors = check.report.error_count(),
            legacy = check.legacy_issues.len(),
            "coherence check complete"
        );
        Ok(check)
    }

    fn config_for(&self, table: &str) -> SyncResult<&ArtifactTypeConfig> {
        self.registry
            .get_config(table)
            .ok_or_else(|| SyncError::unsupported(table, &self.registry.list_supported_tables()))
    }

    fn tracked(&self, sys_id: &str) -> SyncResult<LocalArtifact> {
        self.store
            .get(sys_id)
            .ok_or_else(|| SyncError::NotTracked(sys_id.to_string()))
    }

    async fn materialize_and_register(
        &self,
        config: &ArtifactTypeConfig,
        mut record: RecordData,
        sys_id: &str,
    ) -> SyncResult<LocalArtifact> {
        let id = record.entry("sys_id".to_string()).or_default();
        if id.trim().is_empty() {
            *id = sys_id.to_string();
        }

        let artifact = Materializer::materialize_avoiding(
            config,
            &record,
            &self.config.artifacts_dir,
            |path| {
                self.store
                    .owner_of(path)
                    .is_some_and(|owner| owner != sys_id)
            },
        )
        .await?;
        self.store.register(sys_id, artifact.clone());
        Ok(artifact)
    }
}

fn require_sys_id(sys_id: &str) -> SyncResult<&str> {
    let trimmed = sys_id.trim();
    if trimmed.is_empty() {
        Err(SyncError::MissingSysId)
    } else {
        Ok(trimmed)
    }
}

fn push_report(recomposed: Recomposition, coherence: CoherenceReport) -> PushReport {
    PushReport {
        fields: recomposed.modified_fields,
        payload: recomposed.changes,
        coherence,
        legacy_issues: recomposed.legacy_issues,
        missing: recomposed.missing,
    }
}

/// Changed files take their pushed content as the new baseline
fn accept_push(artifact: &mut LocalArtifact, report: &PushReport) {
    for file in &mut artifact.files {
        if !file.is_modified {
            continue;
        }
        if let Some(current) = file.current_content.take() {
            file.rebase(current);
        }
        if let Some(value) = report.payload.get(&file.field) {
            artifact.metadata.insert(file.field.clone(), value.clone());
        }
    }
    artifact.sync_status = SyncStatus::Synced;
    artifact.last_synced_at = Utc::now();
}

fn log_findings(sys_id: &str, report: &PushReport) {
    for (rule, message) in report.coherence.errors() {
        warn!(sys_id, rule, "{message}");
    }
    for (rule, message) in report.coherence.warnings() {
        info!(sys_id, rule, "{message}");
    }
    for field in &report.legacy_issues {
        for issue in &field.issues {
            warn!(sys_id, field = %field.field, "{issue}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, MockRecordGateway};
    use mockall::predicate::eq;
    use snowsync_artifact::FieldMapping;
    use std::io::Write;

    fn registry() -> ArtifactTypeRegistry {
        let first = ArtifactTypeConfig::new("u_first", "First", "first", "name")
            .with_field(FieldMapping::new("body", "body", "txt").required());
        let second = ArtifactTypeConfig::new("u_second", "Second", "second", "name")
            .with_field(FieldMapping::new("body", "body", "txt").required());
        ArtifactTypeRegistry::new()
            .with(first)
            .and_then(|r| r.with(second))
            .unwrap()
    }

    fn record(body: &str) -> RecordData {
        let mut r = RecordData::new();
        r.insert("sys_id".into(), "abc".into());
        r.insert("name".into(), "demo".into());
        r.insert("body".into(), body.into());
        r
    }

    fn bridge(gateway: MockRecordGateway, dir: &Path) -> ArtifactSyncBridge<MockRecordGateway> {
        ArtifactSyncBridge::new(gateway, registry(), BridgeConfig::new(dir))
    }

    fn append(path: &Path, text: &str) {
        let mut f = std::fs::OpenOptions::new().append(true).open(path).unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn unsupported_table_never_reaches_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = MockRecordGateway::new();
        gateway.expect_fetch().times(0);

        let err = bridge(gateway, dir.path()).pull("sp_widget", "abc").await.unwrap_err();
        assert!(matches!(err, SyncError::UnsupportedTable { .. }));
    }

    #[tokio::test]
    async fn search_continues_after_gateway_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = MockRecordGateway::new();
        gateway
            .expect_fetch()
            .with(eq("u_first"), eq("abc"))
            .times(1)
            .returning(|_, _| Err(GatewayError::transport("table locked")));
        gateway
            .expect_fetch()
            .with(eq("u_second"), eq("abc"))
            .times(1)
            .returning(|_, _| Ok(Some(record("hello"))));

        let bridge = bridge(gateway, dir.path());
        let artifact = bridge.pull_by_sys_id("abc").await.unwrap();
        assert_eq!(artifact.table, "u_second");
        assert!(bridge.store().contains("abc"));
    }

    #[tokio::test]
    async fn search_reports_tables_searched() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = MockRecordGateway::new();
        gateway.expect_fetch().times(2).returning(|_, _| Ok(None));

        let err = bridge(gateway, dir.path()).pull_by_sys_id("abc").await.unwrap_err();
        assert!(matches!(err, SyncError::NotFoundInAnyTable { searched: 2, .. }));
    }

    #[tokio::test]
    async fn gateway_failure_leaves_pending_upload() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = MockRecordGateway::new();
        gateway
            .expect_fetch()
            .returning(|_, _| Ok(Some(record("hello"))));
        gateway
            .expect_update()
            .times(1)
            .returning(|_, _, _| Err(GatewayError::transport("connection reset")));

        let bridge = bridge(gateway, dir.path());
        let artifact = bridge.pull("u_first", "abc").await.unwrap();
        append(&artifact.path.join("body.txt"), "!");

        let err = bridge.push("abc").await.unwrap_err();
        assert!(matches!(err, SyncError::Gateway(GatewayError::Transport(_))));

        let stored = bridge.store().get("abc").unwrap();
        assert_eq!(stored.sync_status, SyncStatus::PendingUpload);
        assert_eq!(stored.file_for_field("body").unwrap().original_content, "hello");

        let outcome = bridge.cleanup("abc", false).await.unwrap();
        assert!(matches!(outcome, CleanupOutcome::Refused { .. }));
        assert!(artifact.path.exists());
    }

    #[tokio::test]
    async fn fetch_error_propagates_from_pull() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = MockRecordGateway::new();
        gateway
            .expect_fetch()
            .returning(|_, _| Err(GatewayError::Auth("expired token".into())));

        let bridge = bridge(gateway, dir.path());
        let err = bridge.pull("u_first", "abc").await.unwrap_err();
        assert!(matches!(err, SyncError::Gateway(GatewayError::Auth(_))));
        assert!(bridge.store().is_empty());
    }

    #[tokio::test]
    async fn blank_sys_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge(MockRecordGateway::new(), dir.path());
        assert!(matches!(
            bridge.pull("u_first", "  ").await,
            Err(SyncError::MissingSysId)
        ));
    }

    #[tokio::test]
    async fn push_untracked_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge(MockRecordGateway::new(), dir.path());
        let err = bridge.push("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn outcome_status() {
        assert_eq!(PushOutcome::NoChanges.status(), SyncStatus::Synced);
        assert!(PushOutcome::NoChanges.report().is_none());
    }
}
