//! snowsync ServiceNow
//!
//! [`RecordGateway`](snowsync_bridge::RecordGateway) implementation over
//! the ServiceNow Table API.
//!
//! # Example
//!
//! ```rust,no_run
//! use snowsync_bridge::{ArtifactSyncBridge, BridgeConfig};
//! use snowsync_registry::ArtifactTypeRegistry;
//! use snowsync_servicenow::{InstanceConfig, ServiceNowGateway};
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = ServiceNowGateway::new(InstanceConfig::from_env()?)?;
//! let bridge = ArtifactSyncBridge::new(
//!     gateway,
//!     ArtifactTypeRegistry::with_defaults(),
//!     BridgeConfig::from_env(),
//! );
//! # let _ = bridge;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod gateway;

// Re-exports
pub use config::{normalize_instance_url, Credentials, InstanceConfig, InstanceConfigError};
pub use gateway::ServiceNowGateway;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
