//! Registry errors

use snowsync_artifact::ConfigError;

/// Errors raised while building a registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Config failed structural validation
    #[error("invalid artifact type: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Table already registered
    #[error("table '{0}' is already registered")]
    DuplicateTable(String),
}

impl RegistryError {
    /// Create duplicate-table error
    #[inline]
    pub fn duplicate(table: impl Into<String>) -> Self {
        Self::DuplicateTable(table.into())
    }
}
