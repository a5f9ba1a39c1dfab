//! In-memory sync state
//!
//! One [`LocalArtifact`] per sys_id; the last registration wins. State
//! lives for the process only.

use crate::error::{SyncError, SyncResult};
use dashmap::DashMap;
use snowsync_artifact::{LocalArtifact, SyncStatus};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of a cleanup request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Directory and entry removed
    Removed {
        /// Directory that was deleted
        path: PathBuf,
    },
    /// Unsynced artifact kept because `force` was not set
    Refused {
        /// Status that blocked the cleanup
        status: SyncStatus,
    },
    /// Nothing registered for the id
    NotTracked,
}

impl CleanupOutcome {
    /// True when the artifact was removed
    #[inline]
    #[must_use]
    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }
}

/// Registry of pulled artifacts keyed by sys_id
#[derive(Debug, Default)]
pub struct SyncStateStore {
    artifacts: DashMap<String, LocalArtifact>,
}

impl SyncStateStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            artifacts: DashMap::new(),
        }
    }

    /// Register an artifact, returning the one it replaced
    pub fn register(&self, sys_id: &str, artifact: LocalArtifact) -> Option<LocalArtifact> {
        let previous = self.artifacts.insert(sys_id.to_string(), artifact);
        if let Some(prev) = &previous {
            if !prev.sync_status.is_synced() {
                warn!(sys_id, status = %prev.sync_status, "overwriting unsynced artifact");
            }
        }
        previous
    }

    /// Snapshot of one artifact
    #[must_use]
    pub fn get(&self, sys_id: &str) -> Option<LocalArtifact> {
        self.artifacts.get(sys_id).map(|a| a.value().clone())
    }

    /// Snapshot of every artifact, in no particular order
    #[must_use]
    pub fn list(&self) -> Vec<LocalArtifact> {
        self.artifacts.iter().map(|e| e.value().clone()).collect()
    }

    /// Id of the artifact materialized at `path`, if any
    #[must_use]
    pub fn owner_of(&self, path: &Path) -> Option<String> {
        self.artifacts
            .iter()
            .find(|e| e.value().path == path)
            .map(|e| e.key().clone())
    }

    /// Check if an id is tracked
    #[inline]
    #[must_use]
    pub fn contains(&self, sys_id: &str) -> bool {
        self.artifacts.contains_key(sys_id)
    }

    /// Number of tracked artifacts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Update the status of a tracked artifact
    pub fn set_status(&self, sys_id: &str, status: SyncStatus) -> bool {
        match self.artifacts.get_mut(sys_id) {
            Some(mut entry) => {
                entry.sync_status = status;
                true
            }
            None => false,
        }
    }

    /// Remove an artifact and its directory
    ///
    /// Refuses unless `force` is set or the artifact is synced. The
    /// directory is deleted before the entry, so a failed delete leaves
    /// the artifact tracked.
    ///
    /// # Errors
    /// Returns error if the directory exists and cannot be deleted.
    pub async fn remove(&self, sys_id: &str, force: bool) -> SyncResult<CleanupOutcome> {
        let Some((path, status)) = self
            .artifacts
            .get(sys_id)
            .map(|a| (a.path.clone(), a.sync_status))
        else {
            debug!(sys_id, "cleanup requested for untracked artifact");
            return Ok(CleanupOutcome::NotTracked);
        };

        if !force && !status.is_synced() {
            warn!(sys_id, %status, "cleanup refused; artifact has unsynced changes");
            return Ok(CleanupOutcome::Refused { status });
        }

        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(sys_id, path = %path.display(), "artifact directory already gone");
            }
            Err(e) => return Err(SyncError::io(&path, e)),
        }

        self.artifacts.remove(sys_id);
        info!(sys_id, path = %path.display(), force, "artifact cleaned up");
        Ok(CleanupOutcome::Removed { path })
    }
}
