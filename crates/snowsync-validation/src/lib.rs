//! snowsync Validation
//!
//! Advisory checks run over recomposed artifact fields before they are
//! sent back to the remote instance.
//!
//! # Overview
//!
//! - [`ValidationResult`]: `{valid, errors, warnings, hints}` produced by every rule
//! - [`CoherenceReport`]: ordered aggregation of rule outcomes
//! - [`LegacySyntaxChecker`]: flags ES2015+ constructs in server-side scripts
//! - [`rules`]: built-in cross-file rules for Service Portal widgets
//! - [`ValidationPolicy`]: decides whether findings block a push
//!
//! # Example
//!
//! ```rust
//! use snowsync_validation::{FieldContents, LegacySyntaxChecker, rules};
//!
//! let mut fields = FieldContents::new();
//! fields.insert("template".into(), "<p>{{c.data.title}}</p>".into());
//! fields.insert("script".into(), "data.title = 'Hello';".into());
//! assert!(rules::template_data_bindings(&fields).valid);
//!
//! let issues = LegacySyntaxChecker::check("const x = 1;");
//! assert_eq!(issues.len(), 1);
//! ```

#![warn(missing_docs)]

pub mod legacy;
pub mod policy;
pub mod result;
pub mod rules;

// Re-exports
pub use legacy::{LegacyConstruct, LegacySyntaxChecker, LegacySyntaxIssue};
pub use policy::ValidationPolicy;
pub use result::{CoherenceReport, FieldContents, RuleOutcome, ValidationResult};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
