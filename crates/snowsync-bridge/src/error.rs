//! Error types for the sync bridge
//!
//! Structural and local failures are errors. Validation findings and
//! refused cleanups are returned as data.

use crate::gateway::GatewayError;
use std::path::{Path, PathBuf};

/// Result alias for bridge operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Main bridge error type
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Table has no registered artifact type
    #[error("unsupported table '{table}' (supported: {supported})")]
    UnsupportedTable {
        /// Requested table
        table: String,
        /// Comma-separated supported tables
        supported: String,
    },

    /// Remote record absent
    #[error("record {sys_id} not found in {table}")]
    RecordNotFound {
        /// Table searched
        table: String,
        /// Requested id
        sys_id: String,
    },

    /// Searching every supported table found nothing
    #[error("record {sys_id} not found in any of {searched} supported tables")]
    NotFoundInAnyTable {
        /// Requested id
        sys_id: String,
        /// Number of tables searched
        searched: usize,
    },

    /// No local artifact for this id
    #[error("no local artifact for {0}; pull it first")]
    NotTracked(String),

    /// Empty identifier supplied
    #[error("sys_id must not be empty")]
    MissingSysId,

    /// Local filesystem failure
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Remote gateway failure
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Bad bridge configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Wrap an I/O error with the path it concerns
    #[inline]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create record-not-found error
    #[inline]
    pub fn not_found(table: impl Into<String>, sys_id: impl Into<String>) -> Self {
        Self::RecordNotFound {
            table: table.into(),
            sys_id: sys_id.into(),
        }
    }

    /// Create unsupported-table error
    #[inline]
    pub fn unsupported(table: impl Into<String>, supported: &[&str]) -> Self {
        Self::UnsupportedTable {
            table: table.into(),
            supported: supported.join(", "),
        }
    }

    /// True for not-found style errors
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedTable { .. }
                | Self::RecordNotFound { .. }
                | Self::NotFoundInAnyTable { .. }
                | Self::NotTracked(_)
        )
    }
}
