//! In-memory catalog.
//!
//! Evaluates filter expressions itself, so it behaves like the remote
//! catalog for tests, demos and offline tooling.

use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use tracing::debug;

use super::access::{CatalogAccess, CatalogError, CatalogQuery};
use super::object::{CatalogObject, ObjectKind, REFERENCE_TYPE, REFERENCE_TYPE_PREFIX};
use crate::query::{AttributeFilter, FilterEvaluator};

/// A catalog held in memory.
///
/// Entities are listed in insertion order.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entities: DashMap<String, CatalogObject>,
    entity_order: RwLock<Vec<String>>,
    relationships: DashMap<String, CatalogObject>,
    definitions: DashSet<(ObjectKind, String)>,
    failing_filters: RwLock<Vec<String>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entity.
    pub fn insert_entity(&self, object: CatalogObject) {
        let id = object.guid().to_string();
        if self.entities.insert(id.clone(), object).is_none() {
            self.entity_order.write().push(id);
        }
    }

    /// Add or replace a relationship.
    pub fn insert_relationship(&self, object: CatalogObject) {
        self.relationships.insert(object.guid().to_string(), object);
    }

    /// Declare a definition.
    pub fn insert_definition(&self, name: impl Into<String>, kind: ObjectKind) {
        self.definitions.insert((kind, name.into()));
    }

    /// Remove an entity.
    pub fn remove_entity(&self, id: &str) -> Option<CatalogObject> {
        let removed = self.entities.remove(id).map(|(_, object)| object);
        if removed.is_some() {
            self.entity_order.write().retain(|existing| existing != id);
        }
        removed
    }

    /// Make every list query whose rendered filter contains `fragment` fail
    /// with a transport error.
    pub fn fail_filters_containing(&self, fragment: impl Into<String>) {
        self.failing_filters.write().push(fragment.into());
    }

    /// Number of entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl CatalogAccess for MemoryCatalog {
    fn get_by_id(&self, id: &str, kind: ObjectKind) -> Result<Option<CatalogObject>, CatalogError> {
        let found = match kind {
            ObjectKind::Entity => self.entities.get(id).map(|o| o.value().clone()),
            ObjectKind::Relationship => self.relationships.get(id).map(|o| o.value().clone()),
            ObjectKind::Definition => None,
        };
        Ok(found)
    }

    fn list_by_filter(
        &self,
        query: &CatalogQuery,
        attribute_filter: &AttributeFilter,
    ) -> Result<Vec<CatalogObject>, CatalogError> {
        if let Some(filter) = &query.filter {
            let rendered = filter.to_string();
            if let Some(fragment) = self
                .failing_filters
                .read()
                .iter()
                .find(|fragment| rendered.contains(fragment.as_str()))
            {
                return Err(CatalogError::Transport(format!(
                    "injected failure for filter containing {}",
                    fragment
                )));
            }
        }

        let order = self.entity_order.read();
        let matching = order
            .iter()
            .filter_map(|id| self.entities.get(id).map(|o| o.value().clone()))
            .filter(|object| match &query.filter {
                Some(filter) => FilterEvaluator::evaluate(filter, object),
                None => true,
            })
            .filter(|object| FilterEvaluator::matches_attributes(attribute_filter, object));

        let start = query.start.unwrap_or(0);
        let results: Vec<CatalogObject> = match query.limit {
            Some(limit) => matching.skip(start).take(limit).collect(),
            None => matching.skip(start).collect(),
        };
        debug!(
            filter = ?query.filter.as_ref().map(ToString::to_string),
            count = results.len(),
            "Listed in-memory catalog objects"
        );
        Ok(results)
    }

    fn definition_exists_by_name(
        &self,
        name: &str,
        kind: ObjectKind,
    ) -> Result<bool, CatalogError> {
        let name = if name.starts_with(REFERENCE_TYPE_PREFIX) {
            REFERENCE_TYPE
        } else {
            name
        };
        Ok(self.definitions.contains(&(kind, name.to_string())))
    }

    fn relationships_for_entity(&self, id: &str) -> Result<Vec<CatalogObject>, CatalogError> {
        let mut found: Vec<CatalogObject> = self
            .relationships
            .iter()
            .filter(|entry| {
                let object = entry.value();
                object.get_str("instance.endpoint1Id") == Some(id)
                    || object.get_str("instance.endpoint2Id") == Some(id)
            })
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.guid().cmp(b.guid()));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FilterExpr;

    fn table(id: &str, name: &str) -> CatalogObject {
        CatalogObject::new(id)
            .with_instance("name", name)
            .with_definition("name", "table")
    }

    fn sample_catalog() -> MemoryCatalog {
        let catalog = MemoryCatalog::new();
        catalog.insert_entity(table("t1", "orders").with_attribute("owner", "finance"));
        catalog.insert_entity(table("t2", "order_lines"));
        catalog.insert_entity(
            CatalogObject::new("c1")
                .with_instance("name", "id")
                .with_definition("name", "column"),
        );
        catalog.insert_relationship(
            CatalogObject::new("r1")
                .with_instance("endpoint1Id", "t1")
                .with_instance("endpoint2Id", "c1")
                .with_definition("name", "dataSetColumns"),
        );
        catalog
    }

    #[test]
    fn test_get_by_id() {
        let catalog = sample_catalog();
        assert!(catalog.get_by_id("t1", ObjectKind::Entity).unwrap().is_some());
        assert!(catalog.get_by_id("t1", ObjectKind::Relationship).unwrap().is_none());
        assert!(catalog.get_by_id("r1", ObjectKind::Relationship).unwrap().is_some());
        assert!(catalog.get_by_id("zz", ObjectKind::Entity).unwrap().is_none());
    }

    #[test]
    fn test_list_by_filter_with_paging() {
        let catalog = sample_catalog();
        let query = CatalogQuery::new(Some(FilterExpr::eq("type", "table")));
        let all = catalog.list_by_filter(&query, &AttributeFilter::new()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].guid(), "t1");

        let page = catalog
            .list_by_filter(&query.clone().with_start(1).with_limit(5), &AttributeFilter::new())
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].guid(), "t2");
    }

    #[test]
    fn test_list_applies_attribute_filter() {
        let catalog = sample_catalog();
        let mut attrs = AttributeFilter::new();
        attrs.insert("owner".into(), "finance".into());
        let found = catalog.list_by_filter(&CatalogQuery::default(), &attrs).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].guid(), "t1");
    }

    #[test]
    fn test_injected_failure() {
        let catalog = sample_catalog();
        catalog.fail_filters_containing("eq(type,column)");
        let query = CatalogQuery::new(Some(FilterExpr::eq("type", "column")));
        assert!(catalog.list_by_filter(&query, &AttributeFilter::new()).is_err());
    }

    #[test]
    fn test_definition_exists_maps_reference_kinds() {
        let catalog = MemoryCatalog::new();
        catalog.insert_definition("reference", ObjectKind::Entity);
        catalog.insert_definition("table", ObjectKind::Entity);
        assert!(catalog
            .definition_exists_by_name("reference.Glossary", ObjectKind::Entity)
            .unwrap());
        assert!(catalog.definition_exists_by_name("table", ObjectKind::Entity).unwrap());
        assert!(!catalog
            .definition_exists_by_name("table", ObjectKind::Relationship)
            .unwrap());
    }

    #[test]
    fn test_relationships_for_entity() {
        let catalog = sample_catalog();
        assert_eq!(catalog.relationships_for_entity("t1").unwrap().len(), 1);
        assert_eq!(catalog.relationships_for_entity("c1").unwrap().len(), 1);
        assert!(catalog.relationships_for_entity("t2").unwrap().is_empty());
    }

    #[test]
    fn test_remove_entity() {
        let catalog = sample_catalog();
        assert!(catalog.remove_entity("t2").is_some());
        assert_eq!(catalog.entity_count(), 2);
        assert!(catalog.remove_entity("t2").is_none());
    }
}
