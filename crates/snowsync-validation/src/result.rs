//! Validation result types
//!
//! Every rule, built-in or custom, reports through [`ValidationResult`].
//! Findings are data: nothing in this crate returns `Err`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name → field content, as seen by rules
pub type FieldContents = BTreeMap<String, String>;

/// Outcome of a single rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// False when at least one error was reported
    pub valid: bool,
    /// Problems that make the artifact incoherent
    pub errors: Vec<String>,
    /// Likely problems
    pub warnings: Vec<String>,
    /// Suggestions
    pub hints: Vec<String>,
}

impl ValidationResult {
    /// Passing result with no findings
    #[inline]
    #[must_use]
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            hints: Vec::new(),
        }
    }

    /// Add an error (marks the result invalid)
    #[inline]
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.push_error(error);
        self
    }

    /// Add a warning
    #[inline]
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Add a hint
    #[inline]
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// Record an error in place
    pub fn push_error(&mut self, error: impl Into<String>) {
        self.valid = false;
        self.errors.push(error.into());
    }

    /// Record a warning in place
    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Record a hint in place
    pub fn push_hint(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.valid &= other.valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.hints.extend(other.hints);
    }

    /// True when there are no findings of any severity
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.valid && self.errors.is_empty() && self.warnings.is_empty() && self.hints.is_empty()
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Result of one named rule inside a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Rule name
    pub rule: String,
    /// What the rule found
    pub result: ValidationResult,
}

/// Concatenated outcomes of every rule run against an artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoherenceReport {
    outcomes: Vec<RuleOutcome>,
}

impl CoherenceReport {
    /// Create empty report
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule outcome
    pub fn push(&mut self, rule: impl Into<String>, result: ValidationResult) {
        self.outcomes.push(RuleOutcome {
            rule: rule.into(),
            result,
        });
    }

    /// All outcomes in execution order
    #[inline]
    #[must_use]
    pub fn outcomes(&self) -> &[RuleOutcome] {
        &self.outcomes
    }

    /// True when no rule reported `valid = false`
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.valid)
    }

    /// Outcomes with `valid = false`
    pub fn failed(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| !o.result.valid)
    }

    /// `(rule, message)` for every error
    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .flat_map(|o| o.result.errors.iter().map(move |e| (o.rule.as_str(), e.as_str())))
    }

    /// `(rule, message)` for every warning
    pub fn warnings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .flat_map(|o| o.result.warnings.iter().map(move |w| (o.rule.as_str(), w.as_str())))
    }

    /// `(rule, message)` for every hint
    pub fn hints(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .flat_map(|o| o.result.hints.iter().map(move |h| (o.rule.as_str(), h.as_str())))
    }

    /// Total number of errors
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.result.errors.len()).sum()
    }

    /// Total number of warnings
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.result.warnings.len()).sum()
    }

    /// Number of rules run
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True when no rule ran
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
