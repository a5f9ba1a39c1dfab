//! snowsync Registry
//!
//! Dependency-injected lookup table from remote table name to
//! [`ArtifactTypeConfig`]. The bridge receives a registry at
//! construction; tests build one from synthetic configs.
//!
//! # Example
//!
//! ```rust
//! use snowsync_registry::ArtifactTypeRegistry;
//!
//! let registry = ArtifactTypeRegistry::with_defaults();
//! assert!(registry.get_config("sp_widget").is_some());
//! assert!(registry.list_supported_tables().contains(&"sys_script_include"));
//! ```

#![warn(unreachable_pub)]

pub mod builtin;
mod error;
mod registry;

// Re-exports
pub use error::RegistryError;
pub use registry::ArtifactTypeRegistry;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
