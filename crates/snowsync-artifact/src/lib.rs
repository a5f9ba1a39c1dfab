//! snowsync Artifact Model
//!
//! Configuration and local-file model for mirroring multi-field remote
//! records as editable files.
//!
//! # Core Concepts
//!
//! - [`ArtifactTypeConfig`]: how one remote table maps onto local files
//! - [`FieldMapping`]: one remote field ↔ one local file
//! - [`Wrapper`]: presentational header/footer, invisible to the field value
//! - [`LocalArtifact`] / [`LocalFile`]: bookkeeping for a pulled record
//! - [`ContentHash`]: Blake3 fingerprint of each file's baseline
//!
//! # Example
//!
//! ```rust
//! use snowsync_artifact::{ArtifactTypeConfig, FieldMapping, FileKind, RecordData};
//!
//! let config = ArtifactTypeConfig::new("sp_widget", "Widget", "widgets", "name")
//!     .with_field(
//!         FieldMapping::new("template", "template", "html")
//!             .required()
//!             .with_header("<!-- {name} -->\n"),
//!     );
//! config.validate().unwrap();
//!
//! let mut record = RecordData::new();
//! record.insert("name".into(), "Demo".into());
//!
//! let mapping = &config.fields[0];
//! let wrapper = mapping.wrapper(&record);
//! let on_disk = wrapper.wrap("<div></div>");
//! assert_eq!(wrapper.unwrap(FileKind::Markup, &on_disk), "<div></div>");
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod hash;
pub mod local;
pub mod processors;
pub mod sanitize;
pub mod template;
pub mod wrapper;

// Re-exports
pub use config::{
    ArtifactTypeConfig, CoherenceRule, ConfigError, FieldMapping, FieldProcessor, RecordValidator,
};
pub use hash::ContentHash;
pub use local::{
    is_sentinel_field, LocalArtifact, LocalFile, RecordData, SyncStatus, DOCUMENTATION_FIELD,
    METADATA_FIELD,
};
pub use sanitize::{sanitize_name, MAX_NAME_LEN};
pub use wrapper::{FileKind, Wrapper};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
