//! Testing utilities for snowsync workspace
//!
//! Shared fixtures: synthetic artifact types, records, and a bridge rooted
//! in a temporary directory.

#![allow(missing_docs)]

use snowsync_artifact::{ArtifactTypeConfig, FieldMapping, RecordData};
use snowsync_bridge::{ArtifactSyncBridge, BridgeConfig, InMemoryGateway};
use snowsync_registry::ArtifactTypeRegistry;
use snowsync_validation::ValidationPolicy;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const WIDGET_TABLE: &str = "u_test_widget";
pub const SCRIPT_TABLE: &str = "u_test_script";
pub const WIDGET_SYS_ID: &str = "0a1b2c3d4e5f60718293a4b5c6d7e8f9";
pub const SCRIPT_SYS_ID: &str = "f9e8d7c6b5a4938271605f4e3d2c1b0a";

/// `{template: required, optionalNote: optional}` with a markup header
pub fn widget_config() -> ArtifactTypeConfig {
    ArtifactTypeConfig::new(WIDGET_TABLE, "Test Widget", "widgets", "name")
        .with_field(
            FieldMapping::new("template", "template", "html")
                .required()
                .with_header("<!-- Widget: {name} -->\n"),
        )
        .with_field(FieldMapping::new("optionalNote", "note", "txt"))
}

/// Server script requiring the legacy-syntax scan
pub fn script_config() -> ArtifactTypeConfig {
    ArtifactTypeConfig::new(SCRIPT_TABLE, "Test Script", "scripts", "name")
        .with_field(
            FieldMapping::new("script", "{name}", "js")
                .required()
                .with_header("/**\n * {name}\n */\n")
                .legacy_syntax(),
        )
}

pub fn test_registry() -> ArtifactTypeRegistry {
    ArtifactTypeRegistry::new()
        .with(widget_config())
        .and_then(|r| r.with(script_config()))
        .unwrap()
}

pub fn record(pairs: &[(&str, &str)]) -> RecordData {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

pub fn widget_record(template: &str, note: &str) -> RecordData {
    record(&[
        ("sys_id", WIDGET_SYS_ID),
        ("name", "Test Widget"),
        ("template", template),
        ("optionalNote", note),
        ("sys_created_on", "2024-01-02 03:04:05"),
        ("sys_updated_on", "2024-02-03 04:05:06"),
    ])
}

pub fn script_record(script: &str) -> RecordData {
    record(&[
        ("sys_id", SCRIPT_SYS_ID),
        ("name", "LegacyHelper"),
        ("script", script),
    ])
}

/// Bridge over a shared in-memory gateway, rooted in its own temp dir
pub struct TestBridge {
    pub bridge: ArtifactSyncBridge<Arc<InMemoryGateway>>,
    pub gateway: Arc<InMemoryGateway>,
    pub dir: TempDir,
}

pub fn test_bridge(policy: ValidationPolicy) -> TestBridge {
    test_bridge_with(test_registry(), policy)
}

pub fn test_bridge_with(registry: ArtifactTypeRegistry, policy: ValidationPolicy) -> TestBridge {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(InMemoryGateway::new());
    let config = BridgeConfig::new(dir.path()).with_policy(policy);
    let bridge = ArtifactSyncBridge::new(Arc::clone(&gateway), registry, config);
    TestBridge {
        bridge,
        gateway,
        dir,
    }
}

pub fn append_to_file(path: &Path, text: &str) {
    let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

pub fn read_file(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

/// Names of every entry directly under `dir`, sorted
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
