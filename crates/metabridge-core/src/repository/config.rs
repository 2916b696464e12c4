//! Connector configuration.

use std::path::PathBuf;

/// Default repository name.
pub const DEFAULT_REPOSITORY_NAME: &str = "metabridge";

/// Default metadata collection id.
pub const DEFAULT_METADATA_COLLECTION_ID: &str = "metabridge-collection";

/// Default catalog base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default maximum page size (0 = unlimited).
pub const DEFAULT_MAX_PAGE_SIZE: usize = 0;

/// Connector configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// Name the repository is known by.
    pub repository_name: String,

    /// Id stamped on every instance returned.
    pub metadata_collection_id: String,

    /// Base URL of the catalog, used for instance URLs.
    pub base_url: String,

    /// Path to the JSON type-mapping table. None means an empty table.
    pub mapping_path: Option<PathBuf>,

    /// Open-metadata type names that are never implemented.
    pub reserved_types: Vec<String>,

    /// Upper bound on any requested page size. Zero disables the bound.
    pub max_page_size: usize,
}

impl ConnectorConfig {
    /// Create a configuration for a catalog at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            repository_name: DEFAULT_REPOSITORY_NAME.to_string(),
            metadata_collection_id: DEFAULT_METADATA_COLLECTION_ID.to_string(),
            base_url: base_url.into(),
            mapping_path: None,
            reserved_types: Vec::new(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Set the repository name.
    pub fn with_repository_name(mut self, name: impl Into<String>) -> Self {
        self.repository_name = name.into();
        self
    }

    /// Set the metadata collection id.
    pub fn with_metadata_collection_id(mut self, id: impl Into<String>) -> Self {
        self.metadata_collection_id = id.into();
        self
    }

    /// Set the mapping table path.
    pub fn with_mapping_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.mapping_path = Some(path.into());
        self
    }

    /// Add a reserved open-metadata type.
    pub fn with_reserved_type(mut self, name: impl Into<String>) -> Self {
        self.reserved_types.push(name.into());
        self
    }

    /// Set the maximum page size.
    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    /// Page size actually used for a requested one.
    ///
    /// With a bound set, an unlimited (zero) or oversize request is clamped
    /// to the bound.
    pub fn effective_page_size(&self, requested: usize) -> usize {
        if self.max_page_size == 0 {
            requested
        } else if requested == 0 || requested > self.max_page_size {
            self.max_page_size
        } else {
            requested
        }
    }
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ConnectorConfig::new("https://catalog.example.com")
            .with_repository_name("sales")
            .with_metadata_collection_id("mc-1")
            .with_mapping_path("/etc/metabridge/mappings.json")
            .with_reserved_type("Referenceable")
            .with_max_page_size(100);

        assert_eq!(config.repository_name, "sales");
        assert_eq!(config.metadata_collection_id, "mc-1");
        assert_eq!(config.base_url, "https://catalog.example.com");
        assert_eq!(
            config.mapping_path,
            Some(PathBuf::from("/etc/metabridge/mappings.json"))
        );
        assert_eq!(config.reserved_types, vec!["Referenceable".to_string()]);
        assert_eq!(config.max_page_size, 100);
    }

    #[test]
    fn test_default() {
        let config = ConnectorConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.repository_name, DEFAULT_REPOSITORY_NAME);
        assert!(config.mapping_path.is_none());
        assert_eq!(config.max_page_size, 0);
    }

    #[test]
    fn test_effective_page_size() {
        let unbounded = ConnectorConfig::default();
        assert_eq!(unbounded.effective_page_size(0), 0);
        assert_eq!(unbounded.effective_page_size(500), 500);

        let bounded = ConnectorConfig::default().with_max_page_size(50);
        assert_eq!(bounded.effective_page_size(0), 50);
        assert_eq!(bounded.effective_page_size(10), 10);
        assert_eq!(bounded.effective_page_size(80), 50);
    }
}
