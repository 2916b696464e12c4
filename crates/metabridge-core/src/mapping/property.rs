//! Property-to-property mappings within one type mapping.

/// Catalog-side marker: the rest of the key is a literal value.
pub const CONSTANT_MARKER: &str = "constant.";

/// Generic-side marker: fold into the additional-properties map.
pub const ADDITIONAL_PROPERTIES_MARKER: &str = "additionalProperties.";

/// Where a mapped value comes from on the catalog side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource<'a> {
    /// A literal value.
    Constant(&'a str),
    /// A namespaced catalog property.
    Property(&'a str),
}

impl<'a> CatalogSource<'a> {
    /// Classify a catalog-side key.
    pub fn parse(key: &'a str) -> Self {
        match key.strip_prefix(CONSTANT_MARKER) {
            Some(literal) => CatalogSource::Constant(literal),
            None => CatalogSource::Property(key),
        }
    }
}

/// Where a mapped value goes on the open-metadata side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericTarget<'a> {
    /// A key in the additional-properties map.
    Additional(&'a str),
    /// A typed attribute.
    Attribute(&'a str),
}

impl<'a> GenericTarget<'a> {
    /// Classify a generic-side key.
    pub fn parse(key: &'a str) -> Self {
        match key.strip_prefix(ADDITIONAL_PROPERTIES_MARKER) {
            Some(name) => GenericTarget::Additional(name),
            None => GenericTarget::Attribute(key),
        }
    }
}

/// A generic property paired with a catalog property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPair {
    pub generic: String,
    pub catalog: String,
}

/// Ordered property pairs for one (type, prefix) mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMapping {
    pairs: Vec<PropertyPair>,
}

impl PropertyMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map every name to itself.
    pub fn identity<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut mapping = Self::new();
        for name in names {
            let name = name.into();
            mapping.insert(name.clone(), name);
        }
        mapping
    }

    /// Add a pair. A later pair for the same generic property replaces the
    /// earlier one.
    pub fn insert(&mut self, generic: impl Into<String>, catalog: impl Into<String>) {
        let generic = generic.into();
        let catalog = catalog.into();
        match self.pairs.iter_mut().find(|p| p.generic == generic) {
            Some(existing) => existing.catalog = catalog,
            None => self.pairs.push(PropertyPair { generic, catalog }),
        }
    }

    /// Catalog property mapped to a generic property.
    pub fn catalog_for(&self, generic: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.generic == generic)
            .map(|p| p.catalog.as_str())
    }

    /// Generic property mapped to a catalog property.
    pub fn generic_for(&self, catalog: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.catalog == catalog)
            .map(|p| p.generic.as_str())
    }

    /// Check if a catalog property is consumed by this mapping.
    pub fn consumes(&self, catalog: &str) -> bool {
        self.pairs.iter().any(|p| p.catalog == catalog)
    }

    /// Pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyPair> {
        self.pairs.iter()
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        assert_eq!(CatalogSource::parse("constant.SAS"), CatalogSource::Constant("SAS"));
        assert_eq!(
            CatalogSource::parse("instance.name"),
            CatalogSource::Property("instance.name")
        );
        assert_eq!(
            GenericTarget::parse("additionalProperties.vendor"),
            GenericTarget::Additional("vendor")
        );
        assert_eq!(GenericTarget::parse("name"), GenericTarget::Attribute("name"));
    }

    #[test]
    fn test_lookup_both_directions() {
        let mut mapping = PropertyMapping::new();
        mapping.insert("name", "instance.name");
        mapping.insert("description", "instance.description");
        assert_eq!(mapping.catalog_for("name"), Some("instance.name"));
        assert_eq!(mapping.generic_for("instance.description"), Some("description"));
        assert!(mapping.consumes("instance.name"));
        assert!(!mapping.consumes("instance.label"));
    }

    #[test]
    fn test_insert_replaces() {
        let mut mapping = PropertyMapping::new();
        mapping.insert("name", "instance.name");
        mapping.insert("name", "instance.label");
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.catalog_for("name"), Some("instance.label"));
    }

    #[test]
    fn test_identity() {
        let mapping = PropertyMapping::identity(["a", "b"]);
        assert_eq!(mapping.catalog_for("a"), Some("a"));
        assert_eq!(mapping.generic_for("b"), Some("b"));
    }
}
