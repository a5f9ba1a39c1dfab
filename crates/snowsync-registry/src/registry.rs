//! Table → artifact type lookup
//!
//! Provides [`ArtifactTypeRegistry`], an insertion-ordered map handed to the
//! bridge at construction. Lookup by sys_id walks tables in this order.

use crate::builtin;
use crate::error::RegistryError;
use indexmap::IndexMap;
use snowsync_artifact::ArtifactTypeConfig;

/// Registry of supported artifact types keyed by table name
#[derive(Debug, Default, Clone)]
pub struct ArtifactTypeRegistry {
    types: IndexMap<String, ArtifactTypeConfig>,
}

impl ArtifactTypeRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Create registry with the built-in ServiceNow catalog
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for config in builtin::catalog() {
            registry.types.insert(config.table.clone(), config);
        }
        registry
    }

    /// Register a new artifact type
    ///
    /// # Errors
    /// Returns error if the config is structurally invalid or its table is
    /// already registered.
    pub fn register(&mut self, config: ArtifactTypeConfig) -> Result<(), RegistryError> {
        config.validate()?;
        if self.types.contains_key(&config.table) {
            return Err(RegistryError::duplicate(config.table));
        }
        self.types.insert(config.table.clone(), config);
        Ok(())
    }

    /// Register or overwrite an artifact type, returning the previous one
    ///
    /// # Errors
    /// Returns error if the config is structurally invalid.
    pub fn replace(
        &mut self,
        config: ArtifactTypeConfig,
    ) -> Result<Option<ArtifactTypeConfig>, RegistryError> {
        config.validate()?;
        Ok(self.types.insert(config.table.clone(), config))
    }

    /// Builder-style [`register`](Self::register)
    ///
    /// # Errors
    /// Same as [`register`](Self::register).
    pub fn with(mut self, config: ArtifactTypeConfig) -> Result<Self, RegistryError> {
        self.register(config)?;
        Ok(self)
    }

    /// Configuration for a table
    #[inline]
    #[must_use]
    pub fn get_config(&self, table: &str) -> Option<&ArtifactTypeConfig> {
        self.types.get(table)
    }

    /// Check if table is supported
    #[inline]
    #[must_use]
    pub fn contains(&self, table: &str) -> bool {
        self.types.contains_key(table)
    }

    /// Supported tables in registration order
    #[must_use]
    pub fn list_supported_tables(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    /// Get number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over configs in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactTypeConfig> {
        self.types.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowsync_artifact::FieldMapping;

    fn custom(table: &str) -> ArtifactTypeConfig {
        ArtifactTypeConfig::new(table, "Custom", "custom", "name")
            .with_field(FieldMapping::new("script", "{name}", "js"))
    }

    #[test]
    fn registry_new_empty() {
        let registry = ArtifactTypeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.get_config("sp_widget").is_none());
    }

    #[test]
    fn registry_with_defaults() {
        let registry = ArtifactTypeRegistry::with_defaults();
        assert_eq!(registry.len(), 9);
        assert!(registry.contains("sp_widget"));
        assert!(registry.contains("sys_script_include"));
        assert_eq!(registry.list_supported_tables()[0], "sp_widget");
    }

    #[test]
    fn registry_register() {
        let mut registry = ArtifactTypeRegistry::new();
        registry.register(custom("u_custom")).unwrap();
        assert_eq!(registry.get_config("u_custom").unwrap().label, "Custom");
    }

    #[test]
    fn registry_rejects_duplicate() {
        let mut registry = ArtifactTypeRegistry::new();
        registry.register(custom("u_custom")).unwrap();
        assert_eq!(
            registry.register(custom("u_custom")),
            Err(RegistryError::DuplicateTable("u_custom".into()))
        );
    }

    #[test]
    fn registry_rejects_invalid() {
        let mut registry = ArtifactTypeRegistry::new();
        let bad = ArtifactTypeConfig::new("u_bad", "Bad", "bad", "name");
        assert!(matches!(
            registry.register(bad),
            Err(RegistryError::InvalidConfig(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_replace_returns_previous() {
        let mut registry = ArtifactTypeRegistry::with_defaults();
        let previous = registry.replace(custom("sp_widget")).unwrap();
        assert_eq!(previous.unwrap().label, "Service Portal Widget");
        assert_eq!(registry.get_config("sp_widget").unwrap().label, "Custom");
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn registry_preserves_order() {
        let registry = ArtifactTypeRegistry::new()
            .with(custom("u_b"))
            .and_then(|r| r.with(custom("u_a")))
            .unwrap();
        assert_eq!(registry.list_supported_tables(), vec!["u_b", "u_a"]);
        let tables: Vec<_> = registry.iter().map(|c| c.table.as_str()).collect();
        assert_eq!(tables, vec!["u_b", "u_a"]);
    }
}
