//! Push gating policy
//!
//! Decides whether validation findings stop a push before the remote
//! update is attempted.

use crate::result::CoherenceReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How validation findings affect a push
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Report findings, always proceed with the update
    #[default]
    Advisory,
    /// Coherence errors block the update
    BlockOnErrors,
    /// Coherence errors or any legacy-syntax issue block the update
    Strict,
}

impl ValidationPolicy {
    /// Whether the push must stop given the collected findings
    #[must_use]
    pub fn blocks(self, report: &CoherenceReport, legacy_issue_count: usize) -> bool {
        match self {
            Self::Advisory => false,
            Self::BlockOnErrors => !report.is_valid(),
            Self::Strict => !report.is_valid() || legacy_issue_count > 0,
        }
    }

    /// Stable name used in config files
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Advisory => "advisory",
            Self::BlockOnErrors => "block_on_errors",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "advisory" => Ok(Self::Advisory),
            "block_on_errors" | "block" => Ok(Self::BlockOnErrors),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown validation policy: '{other}'")),
        }
    }
}
