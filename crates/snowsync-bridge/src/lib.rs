//! snowsync Bridge
//!
//! Decomposes a multi-field remote record into local files, detects
//! field-level edits and recomposes them into a single remote update.
//!
//! # Architecture
//!
//! ```text
//! ArtifactSyncBridge
//!   ├── ArtifactTypeRegistry   (injected: table → config)
//!   ├── RecordGateway          (injected: fetch / update)
//!   ├── Materializer           (record → staging dir → artifact dir)
//!   ├── ChangeDetector         (files → minimal payload)
//!   ├── CoherenceValidator     (rules + record validator → report)
//!   └── SyncStateStore         (sys_id → LocalArtifact, in memory)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use snowsync_bridge::{ArtifactSyncBridge, BridgeConfig, InMemoryGateway, PushOutcome};
//! use snowsync_registry::ArtifactTypeRegistry;
//!
//! # async fn run() -> snowsync_bridge::SyncResult<()> {
//! let bridge = ArtifactSyncBridge::new(
//!     InMemoryGateway::new(),
//!     ArtifactTypeRegistry::with_defaults(),
//!     BridgeConfig::new("/tmp/servicenow"),
//! );
//!
//! let artifact = bridge.pull("sp_widget", "46d44a5dc0a8010e0000cbf6e5d4d2b4").await?;
//! println!("edit files under {}", artifact.path.display());
//!
//! if let PushOutcome::Pushed(report) = bridge.push(&artifact.sys_id).await? {
//!     println!("pushed {:?}", report.fields);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod bridge;
pub mod coherence;
pub mod config;
pub mod error;
pub mod gateway;
pub mod materializer;
pub mod recompose;
pub mod store;

// Re-exports
pub use bridge::{
    ArtifactSyncBridge, CoherenceCheck, FileStatus, PushOutcome, PushReport, SyncStatusReport,
};
pub use coherence::CoherenceValidator;
pub use config::{BridgeConfig, ARTIFACTS_DIR_ENV};
pub use error::{SyncError, SyncResult};
pub use gateway::{GatewayError, InMemoryGateway, RecordGateway, RecordedUpdate};
pub use materializer::{Materializer, README_FILENAME};
pub use recompose::{ChangeDetector, FieldIssues, LegacyScope, Recomposition};
pub use store::{CleanupOutcome, SyncStateStore};

/// Commonly used types
pub mod prelude {
    pub use crate::{
        ArtifactSyncBridge, BridgeConfig, CleanupOutcome, GatewayError, InMemoryGateway,
        PushOutcome, RecordGateway, SyncError, SyncResult,
    };
    pub use snowsync_artifact::{LocalArtifact, RecordData, SyncStatus};
    pub use snowsync_registry::ArtifactTypeRegistry;
    pub use snowsync_validation::ValidationPolicy;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
