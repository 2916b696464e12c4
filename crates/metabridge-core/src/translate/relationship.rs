//! Catalog relationship translation and synthesis of self-referencing
//! relationships.

use metabridge_proto::{EntityProxy, InstanceProperties, Relationship, TypeDef, TypeDefCategory};
use tracing::{debug, error, warn};

use super::{AuditFields, EntityTranslator, PropertyProjection, TranslationContext};
use crate::catalog::{CatalogAccess, CatalogObject, ObjectKind};
use crate::error::{Error, Result};

/// Builds open-metadata relationships.
pub struct RelationshipTranslator<'a> {
    context: TranslationContext<'a>,
}

impl<'a> RelationshipTranslator<'a> {
    pub fn new(context: TranslationContext<'a>) -> Self {
        Self { context }
    }

    /// Translate a catalog relationship under a prefix, fetching both
    /// endpoint entities from the catalog.
    ///
    /// Returns `None` when no relationship type maps to the catalog type
    /// under the prefix.
    pub fn from_catalog_relationship(
        &self,
        relationship: &CatalogObject,
        prefix: Option<&str>,
        catalog: &dyn CatalogAccess,
    ) -> Result<Option<Relationship>> {
        let registry = self.context.registry;
        let catalog_type = relationship.type_name().ok_or_else(|| {
            Error::MalformedData(format!("relationship {} has no type", relationship.guid()))
        })?;
        let Some(def) = registry
            .generic_name_for(&catalog_type, prefix)
            .and_then(|name| self.relationship_def(&name))
        else {
            debug!(catalog_type = %catalog_type, prefix = ?prefix, "No relationship type mapped");
            return Ok(None);
        };

        let (prefix_one, prefix_two) = match registry.endpoint_mapping(&catalog_type, prefix) {
            Some(mapping) => (mapping.one.prefix, mapping.two.prefix),
            None => (None, None),
        };
        let one = self.endpoint_proxy(relationship, "instance.endpoint1Id", prefix_one.as_deref(), catalog)?;
        let two = self.endpoint_proxy(relationship, "instance.endpoint2Id", prefix_two.as_deref(), catalog)?;

        let mut properties = InstanceProperties::new();
        if let Some(mapping) = registry.property_mapping(&catalog_type, prefix) {
            let attributes = registry.all_attributes(&def.name).unwrap_or_default();
            PropertyProjection {
                type_name: &def.name,
                attributes: &attributes,
            }
            .apply(relationship, &mapping, &mut properties);
        }

        let audit = AuditFields::read(relationship)?.versioned_by_update();
        self.assemble(&def, relationship, prefix, &audit, one, two, properties)
            .map(Some)
    }

    /// Synthesize the relationship generated under `prefix` between two
    /// roles of the same catalog entity.
    ///
    /// Returns `None` when the prefix names no relationship type or the
    /// entity's catalog type declares no endpoints for it. Synthesized
    /// relationships have no properties.
    pub fn synthesize_self_referencing(
        &self,
        entity: &CatalogObject,
        prefix: &str,
    ) -> Result<Option<Relationship>> {
        let registry = self.context.registry;
        let Some(def) = registry
            .type_def_for_prefix(prefix)
            .filter(|def| def.category == TypeDefCategory::Relationship)
        else {
            warn!(prefix = %prefix, "No relationship type generated under prefix");
            return Ok(None);
        };
        let Some(mapping) = entity
            .type_name()
            .and_then(|catalog_type| registry.endpoint_mapping(&catalog_type, Some(prefix)))
        else {
            warn!(prefix = %prefix, guid = %entity.guid(), "No endpoint mapping for generated relationship");
            return Ok(None);
        };

        let one = EntityTranslator::new(self.context, entity, mapping.prefix_one()).proxy()?;
        let two = EntityTranslator::new(self.context, entity, mapping.prefix_two()).proxy()?;
        let audit = AuditFields::read(entity)?.versioned_by_update();
        self.assemble(
            &def,
            entity,
            Some(prefix),
            &audit,
            one,
            two,
            InstanceProperties::new(),
        )
        .map(Some)
    }

    fn relationship_def(&self, name: &str) -> Option<TypeDef> {
        self.context
            .registry
            .type_def_by_name(name)
            .filter(|def| def.category == TypeDefCategory::Relationship)
    }

    fn endpoint_proxy(
        &self,
        relationship: &CatalogObject,
        key: &str,
        prefix: Option<&str>,
        catalog: &dyn CatalogAccess,
    ) -> Result<Option<EntityProxy>> {
        let id = relationship.get_str(key).ok_or_else(|| {
            Error::MalformedData(format!("relationship {} has no {}", relationship.guid(), key))
        })?;
        let entity = match catalog.get_by_id(id, ObjectKind::Entity) {
            Ok(Some(entity)) => entity,
            Ok(None) => {
                return Err(Error::EndpointNotFound {
                    relationship: relationship.guid().to_string(),
                    endpoint: id.to_string(),
                })
            }
            Err(e) => {
                error!(guid = %id, error = %e, "Unable to fetch relationship endpoint");
                return Err(Error::EntityNotKnown {
                    guid: id.to_string(),
                });
            }
        };
        EntityTranslator::new(self.context, &entity, prefix).proxy()
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        def: &TypeDef,
        source: &CatalogObject,
        prefix: Option<&str>,
        audit: &AuditFields,
        one: Option<EntityProxy>,
        two: Option<EntityProxy>,
        properties: InstanceProperties,
    ) -> Result<Relationship> {
        let header = self.context.header(def, source, prefix, audit);
        match (one, two) {
            (Some(entity_one), Some(entity_two)) => Ok(Relationship {
                header,
                entity_one,
                entity_two,
                properties,
            }),
            (one, two) => {
                let describe = |p: &Option<EntityProxy>| {
                    p.as_ref()
                        .map(|p| p.guid().to_string())
                        .unwrap_or_else(|| "null".to_string())
                };
                Err(Error::InvalidRelationshipEnds(format!(
                    "{} {} ({}, {})",
                    def.name,
                    header.guid,
                    describe(&one),
                    describe(&two)
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::mapping::{
        EndpointRecord, MappingRecord, MappingTable, PropertyRecord, TypeMappingRegistry,
    };
    use metabridge_proto::{PrimitiveKind, PrimitiveValue, TypeDefAttribute};
    use pretty_assertions::assert_eq;

    fn endpoint(catalog: &str, generic: &str, prefix: Option<&str>) -> EndpointRecord {
        EndpointRecord {
            catalog: catalog.to_string(),
            generic: generic.to_string(),
            prefix: prefix.map(str::to_string),
        }
    }

    fn registry() -> TypeMappingRegistry {
        let table = MappingTable::new(vec![
            MappingRecord {
                catalog: "table".to_string(),
                generic: "RelationalTable".to_string(),
                prefix: None,
                property_mappings: None,
                endpoint_mappings: None,
            },
            MappingRecord {
                catalog: "table".to_string(),
                generic: "RelationalTableType".to_string(),
                prefix: Some("TT".to_string()),
                property_mappings: None,
                endpoint_mappings: None,
            },
            MappingRecord {
                catalog: "table".to_string(),
                generic: "SchemaAttributeType".to_string(),
                prefix: Some("ST".to_string()),
                property_mappings: None,
                endpoint_mappings: Some(vec![
                    endpoint("table", "attributes", None),
                    endpoint("table", "type", Some("TT")),
                ]),
            },
            MappingRecord {
                catalog: "dataFlow".to_string(),
                generic: "DataFlow".to_string(),
                prefix: None,
                property_mappings: Some(vec![PropertyRecord {
                    catalog: "attribute.formula".to_string(),
                    generic: "formula".to_string(),
                }]),
                endpoint_mappings: None,
            },
        ])
        .unwrap();
        let registry = TypeMappingRegistry::from_table(&table, Vec::<String>::new());
        registry.register_implemented(TypeDef::entity("g-table", "RelationalTable"));
        registry.register_implemented(TypeDef::entity("g-tt", "RelationalTableType"));
        registry.register_implemented(TypeDef::relationship("g-sat", "SchemaAttributeType"));
        registry.register_implemented(
            TypeDef::relationship("g-flow", "DataFlow")
                .with_attribute(TypeDefAttribute::primitive("formula", PrimitiveKind::String)),
        );
        registry
    }

    fn stamped(object: CatalogObject) -> CatalogObject {
        object
            .with_instance("creationTimeStamp", "2021-03-01T10:00:00.000Z")
            .with_instance("modifiedTimeStamp", "2021-03-02T10:00:00.000Z")
    }

    fn table(id: &str, name: &str) -> CatalogObject {
        stamped(
            CatalogObject::new(id)
                .with_definition("name", "table")
                .with_instance("name", name),
        )
    }

    fn flow(id: &str, from: &str, to: &str) -> CatalogObject {
        stamped(
            CatalogObject::new(id)
                .with_definition("name", "dataFlow")
                .with_instance("endpoint1Id", from)
                .with_instance("endpoint2Id", to)
                .with_attribute("formula", "a + b"),
        )
    }

    #[test]
    fn test_synthesize_self_referencing() {
        let registry = registry();
        let context = TranslationContext::new(&registry, "mc-1", "http://cat");
        let entity = table("t-1", "orders");
        let relationship = RelationshipTranslator::new(context)
            .synthesize_self_referencing(&entity, "ST")
            .unwrap()
            .unwrap();

        assert_eq!(relationship.guid(), "ST!t-1");
        assert_eq!(relationship.header.type_name(), "SchemaAttributeType");
        assert_eq!(relationship.entity_one.guid(), "t-1");
        assert_eq!(relationship.entity_two.guid(), "TT!t-1");
        assert!(relationship.properties.is_empty());
        assert_eq!(relationship.header.version, relationship.header.update_time.unwrap());
    }

    #[test]
    fn test_synthesize_unknown_prefix() {
        let registry = registry();
        let context = TranslationContext::new(&registry, "mc-1", "http://cat");
        let entity = table("t-1", "orders");
        let translator = RelationshipTranslator::new(context);
        assert!(translator.synthesize_self_referencing(&entity, "XX").unwrap().is_none());
        // TT names an entity type, not a relationship type.
        assert!(translator.synthesize_self_referencing(&entity, "TT").unwrap().is_none());
    }

    #[test]
    fn test_synthesize_requires_named_entity() {
        let registry = registry();
        let context = TranslationContext::new(&registry, "mc-1", "http://cat");
        let entity = stamped(CatalogObject::new("t-1").with_definition("name", "table"));
        assert!(matches!(
            RelationshipTranslator::new(context).synthesize_self_referencing(&entity, "ST"),
            Err(Error::MalformedData(_))
        ));
    }

    #[test]
    fn test_from_catalog_relationship() {
        let registry = registry();
        let context = TranslationContext::new(&registry, "mc-1", "http://cat");
        let catalog = MemoryCatalog::new();
        catalog.insert_entity(table("t-1", "orders"));
        catalog.insert_entity(table("t-2", "invoices"));
        let object = flow("f-1", "t-1", "t-2");

        let relationship = RelationshipTranslator::new(context)
            .from_catalog_relationship(&object, None, &catalog)
            .unwrap()
            .unwrap();
        assert_eq!(relationship.guid(), "f-1");
        assert_eq!(relationship.entity_one.guid(), "t-1");
        assert_eq!(relationship.entity_two.guid(), "t-2");
        assert_eq!(
            relationship.properties.primitive("formula"),
            Some(&PrimitiveValue::from("a + b"))
        );
    }

    #[test]
    fn test_missing_endpoint() {
        let registry = registry();
        let context = TranslationContext::new(&registry, "mc-1", "http://cat");
        let catalog = MemoryCatalog::new();
        catalog.insert_entity(table("t-1", "orders"));
        let object = flow("f-1", "t-1", "t-9");

        match RelationshipTranslator::new(context).from_catalog_relationship(&object, None, &catalog) {
            Err(Error::EndpointNotFound { relationship, endpoint }) => {
                assert_eq!(relationship, "f-1");
                assert_eq!(endpoint, "t-9");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unmapped_endpoint_type_is_invalid_ends() {
        let registry = registry();
        let context = TranslationContext::new(&registry, "mc-1", "http://cat");
        let catalog = MemoryCatalog::new();
        catalog.insert_entity(table("t-1", "orders"));
        catalog.insert_entity(stamped(
            CatalogObject::new("c-1")
                .with_definition("name", "column")
                .with_instance("name", "id"),
        ));
        let object = flow("f-1", "t-1", "c-1");

        assert!(matches!(
            RelationshipTranslator::new(context).from_catalog_relationship(&object, None, &catalog),
            Err(Error::InvalidRelationshipEnds(_))
        ));
    }

    #[test]
    fn test_unmapped_relationship_type() {
        let registry = registry();
        let context = TranslationContext::new(&registry, "mc-1", "http://cat");
        let catalog = MemoryCatalog::new();
        let object = stamped(CatalogObject::new("x-1").with_definition("name", "lineage"));
        assert!(RelationshipTranslator::new(context)
            .from_catalog_relationship(&object, None, &catalog)
            .unwrap()
            .is_none());
    }
}
