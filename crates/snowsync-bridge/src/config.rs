//! Bridge configuration
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then the `SNOW_FLOW_ARTIFACTS_DIR` environment variable. The
//! environment is read once, when the config is built.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use snowsync_validation::ValidationPolicy;
use std::path::{Path, PathBuf};

/// Environment variable overriding the artifacts directory
pub const ARTIFACTS_DIR_ENV: &str = "SNOW_FLOW_ARTIFACTS_DIR";

/// Default artifacts directory name under the working directory
pub const DEFAULT_ARTIFACTS_DIR: &str = "servicenow";

/// Settings for [`ArtifactSyncBridge`](crate::ArtifactSyncBridge)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base directory for pulled artifacts
    pub artifacts_dir: PathBuf,
    /// Whether validation findings block pushes
    pub validation_policy: ValidationPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            validation_policy: ValidationPolicy::default(),
        }
    }
}

impl BridgeConfig {
    /// Config rooted at `artifacts_dir`
    #[inline]
    #[must_use]
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            ..Self::default()
        }
    }

    /// Defaults with the environment override applied
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().resolve(env_override(), &current_dir())
    }

    /// Parse a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns error if the document is not valid TOML for this shape.
    pub fn from_toml_str(text: &str) -> SyncResult<Self> {
        toml::from_str(text).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Load a TOML file, then apply the environment override
    ///
    /// Relative directories in the file resolve against the working
    /// directory.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> SyncResult<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SyncError::io(path, e))?;
        Ok(Self::from_toml_str(&text)?.resolve(env_override(), &current_dir()))
    }

    /// Apply the environment override and anchor a relative directory at
    /// `cwd`
    #[must_use]
    pub fn resolve(mut self, env_override: Option<PathBuf>, cwd: &Path) -> Self {
        self.artifacts_dir = resolve_artifacts_dir(env_override, &self.artifacts_dir, cwd);
        self
    }

    /// Set artifacts directory
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// Set validation policy
    #[must_use]
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.validation_policy = policy;
        self
    }
}

/// Artifacts directory from an optional override, the configured
/// directory and the working directory
///
/// An empty override counts as unset.
#[must_use]
pub fn resolve_artifacts_dir(
    env_override: Option<PathBuf>,
    configured: &Path,
    cwd: &Path,
) -> PathBuf {
    env_override
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| cwd.join(configured))
}

fn env_override() -> Option<PathBuf> {
    std::env::var_os(ARTIFACTS_DIR_ENV).map(PathBuf::from)
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_servicenow_under_cwd() {
        let dir = resolve_artifacts_dir(None, Path::new(DEFAULT_ARTIFACTS_DIR), Path::new("/work"));
        assert_eq!(dir, Path::new("/work/servicenow"));
    }

    #[test]
    fn override_wins() {
        let dir =
            resolve_artifacts_dir(Some("/tmp/art".into()), Path::new("x"), Path::new("/work"));
        assert_eq!(dir, Path::new("/tmp/art"));
    }

    #[test]
    fn empty_override_is_ignored() {
        let dir = resolve_artifacts_dir(
            Some(PathBuf::new()),
            Path::new(DEFAULT_ARTIFACTS_DIR),
            Path::new("/work"),
        );
        assert_eq!(dir, Path::new("/work/servicenow"));
    }

    #[test]
    fn toml_keeps_defaults() {
        let config = BridgeConfig::from_toml_str("validation_policy = \"strict\"\n").unwrap();
        assert_eq!(config.validation_policy, ValidationPolicy::Strict);
        assert_eq!(config.artifacts_dir, PathBuf::from(DEFAULT_ARTIFACTS_DIR));
    }

    #[test]
    fn toml_rejects_unknown_policy() {
        let err = BridgeConfig::from_toml_str("validation_policy = \"sometimes\"\n").unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn file_directory_follows_the_same_override_rule() {
        let from_file = BridgeConfig::from_toml_str("artifacts_dir = \"work/art\"\n").unwrap();

        let resolved = from_file.clone().resolve(None, Path::new("/home"));
        assert_eq!(resolved.artifacts_dir, Path::new("/home/work/art"));

        let empty = from_file.clone().resolve(Some(PathBuf::new()), Path::new("/home"));
        assert_eq!(empty.artifacts_dir, Path::new("/home/work/art"));

        let overridden = from_file.resolve(Some("/env/dir".into()), Path::new("/home"));
        assert_eq!(overridden.artifacts_dir, Path::new("/env/dir"));
    }

    #[test]
    fn builders() {
        let config = BridgeConfig::new("/a")
            .with_artifacts_dir("/b")
            .with_policy(ValidationPolicy::BlockOnErrors);
        assert_eq!(config.artifacts_dir, Path::new("/b"));
        assert_eq!(config.validation_policy, ValidationPolicy::BlockOnErrors);
    }
}
