//! Repository operations over the catalog.

use std::sync::Arc;

use metabridge_proto::{
    is_active_only, EntityDetail, EntitySearch, EntitySummary, InstanceStatus, Paging,
    Relationship, RelationshipQuery, TypeDef, TypeDefAttribute, TypeDefCategory,
};
use tracing::{debug, error, info, warn};

use super::config::ConnectorConfig;
use crate::catalog::{CatalogAccess, CatalogObject, ObjectKind};
use crate::error::{Error, Result};
use crate::guid::CompositeGuid;
use crate::mapping::TypeMappingRegistry;
use crate::query::{page, sort_instances, ResultAssembler, SearchCompiler, SearchPlan};
use crate::translate::{EntityTranslator, RelationshipTranslator, TranslationContext};

/// The open-metadata view of one catalog.
///
/// Cheap to clone; every clone shares the registry and the catalog handle.
#[derive(Clone)]
pub struct MetadataCollection {
    config: Arc<ConnectorConfig>,
    registry: Arc<TypeMappingRegistry>,
    catalog: Arc<dyn CatalogAccess>,
}

impl MetadataCollection {
    /// Create a collection over a registry and catalog handle.
    pub fn new(
        config: Arc<ConnectorConfig>,
        registry: Arc<TypeMappingRegistry>,
        catalog: Arc<dyn CatalogAccess>,
    ) -> Self {
        Self {
            config,
            registry,
            catalog,
        }
    }

    /// Metadata collection id stamped on returned instances.
    pub fn id(&self) -> &str {
        &self.config.metadata_collection_id
    }

    /// The type mapping registry.
    pub fn registry(&self) -> &TypeMappingRegistry {
        &self.registry
    }

    /// The catalog handle.
    pub(crate) fn catalog(&self) -> &dyn CatalogAccess {
        self.catalog.as_ref()
    }

    pub(crate) fn context(&self) -> TranslationContext<'_> {
        TranslationContext::new(
            &self.registry,
            &self.config.metadata_collection_id,
            &self.config.base_url,
        )
    }

    // ---------------------------------------------------------------------
    // Type negotiation
    // ---------------------------------------------------------------------

    /// Offer a type definition to the repository.
    ///
    /// Mapped types, types the catalog defines under the same name, and
    /// supertypes of already implemented types are accepted. Reserved types
    /// are never accepted.
    pub fn add_type_def(&self, def: TypeDef) -> Result<()> {
        let name = def.name.clone();
        if self.registry.is_reserved(&name) {
            info!(type_name = %name, "Type is reserved, not implementing");
            self.registry.register_unimplemented(def);
            return Err(Error::NotSupported(format!("type {} is reserved", name)));
        }

        if self.registry.is_mapped(&name)
            || self.registry.is_pending_supertype(&def.guid)
            || self.catalog_defines(&def)
        {
            self.registry.register_implemented(def);
            return Ok(());
        }

        info!(type_name = %name, "Type not mapped and not defined in the catalog");
        self.registry.register_unimplemented(def);
        Err(Error::TypeDefNotSupported(name))
    }

    fn catalog_defines(&self, def: &TypeDef) -> bool {
        if def.category == TypeDefCategory::Classification {
            return false;
        }
        match self
            .catalog
            .definition_exists_by_name(&def.name, ObjectKind::Definition)
        {
            Ok(exists) => exists,
            Err(e) => {
                warn!(type_name = %def.name, error = %e, "Unable to check catalog definition");
                false
            }
        }
    }

    /// Check whether a type is implemented.
    pub fn verify_type_def(&self, def: &TypeDef) -> Result<bool> {
        if self.registry.is_unimplemented(&def.guid) {
            return Err(Error::NotSupported(format!(
                "type {} is not implemented",
                def.name
            )));
        }
        Ok(self.registry.is_implemented(&def.guid))
    }

    /// Attribute type definitions cannot be verified.
    pub fn verify_attribute_type_def(&self, attribute: &TypeDefAttribute) -> Result<bool> {
        Err(Error::NotSupported(format!(
            "attribute type definitions cannot be verified ({})",
            attribute.name
        )))
    }

    // ---------------------------------------------------------------------
    // Entities
    // ---------------------------------------------------------------------

    fn fetch_entity(&self, guid: &str, native_id: &str) -> Result<CatalogObject> {
        match self.catalog.get_by_id(native_id, ObjectKind::Entity) {
            Ok(Some(object)) => Ok(object),
            Ok(None) => Err(Error::EntityNotKnown {
                guid: guid.to_string(),
            }),
            Err(e) => {
                error!(guid = %guid, error = %e, "Unable to retrieve entity");
                Err(Error::EntityNotKnown {
                    guid: guid.to_string(),
                })
            }
        }
    }

    /// Summary of the entity with this composite GUID.
    pub fn get_entity_summary(&self, guid: &str) -> Result<EntitySummary> {
        let composite = CompositeGuid::decode(guid);
        let object = self.fetch_entity(guid, composite.native_id())?;
        EntityTranslator::new(self.context(), &object, composite.prefix())
            .summary()?
            .ok_or_else(|| Error::EntityNotKnown {
                guid: guid.to_string(),
            })
    }

    /// Detail of the entity with this composite GUID.
    pub fn get_entity_detail(&self, guid: &str) -> Result<EntityDetail> {
        let composite = CompositeGuid::decode(guid);
        let object = self.fetch_entity(guid, composite.native_id())?;
        EntityTranslator::new(self.context(), &object, composite.prefix())
            .detail()?
            .ok_or_else(|| Error::EntityNotKnown {
                guid: guid.to_string(),
            })
    }

    /// Detail of the entity if it is known.
    pub fn is_entity_known(&self, guid: &str) -> Result<Option<EntityDetail>> {
        match self.get_entity_detail(guid) {
            Ok(detail) => Ok(Some(detail)),
            Err(Error::EntityNotKnown { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ---------------------------------------------------------------------
    // Relationships
    // ---------------------------------------------------------------------

    /// The relationship with this composite GUID.
    ///
    /// A prefixed GUID names a relationship generated from the entity with
    /// the same native id. A missing endpoint entity is reported as
    /// `EndpointNotFound`; any other failure as not known.
    pub fn get_relationship(&self, guid: &str) -> Result<Relationship> {
        let composite = CompositeGuid::decode(guid);
        let not_known = || Error::RelationshipNotKnown {
            guid: guid.to_string(),
        };
        let translator = RelationshipTranslator::new(self.context());

        let translated = match composite.prefix() {
            Some(prefix) => self
                .fetch_entity(guid, composite.native_id())
                .and_then(|entity| translator.synthesize_self_referencing(&entity, prefix)),
            None => match self
                .catalog
                .get_by_id(composite.native_id(), ObjectKind::Relationship)
            {
                Ok(Some(object)) => {
                    translator.from_catalog_relationship(&object, None, self.catalog.as_ref())
                }
                Ok(None) => Ok(None),
                Err(e) => Err(e.into()),
            },
        };

        match translated {
            Ok(Some(relationship)) => Ok(relationship),
            Ok(None) => Err(not_known()),
            Err(e @ Error::EndpointNotFound { .. }) => {
                warn!(guid = %guid, error = %e, "Relationship endpoint is missing");
                Err(e)
            }
            Err(e) => {
                error!(guid = %guid, error = %e, "Unable to retrieve relationship");
                Err(not_known())
            }
        }
    }

    /// The relationship if it is known.
    pub fn is_relationship_known(&self, guid: &str) -> Result<Option<Relationship>> {
        match self.get_relationship(guid) {
            Ok(relationship) => Ok(Some(relationship)),
            Err(Error::RelationshipNotKnown { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Every relationship with the entity at one end, both catalog
    /// relationships and those generated from the entity itself.
    ///
    /// Candidates that fail to translate are dropped. Returns `None` for an
    /// empty page.
    pub fn get_relationships_for_entity(
        &self,
        entity_guid: &str,
        query: &RelationshipQuery,
    ) -> Result<Option<Vec<Relationship>>> {
        check_current(query.as_of_time)?;
        check_statuses(query.limit_results_by_status.as_deref())?;

        let composite = CompositeGuid::decode(entity_guid);
        let entity = self.fetch_entity(entity_guid, composite.native_id())?;
        let relationship_type = match &query.relationship_type_guid {
            Some(type_guid) => match self.registry.type_def_by_guid(type_guid) {
                Some(def) => Some(def.name),
                None => {
                    debug!(type_guid = %type_guid, "Relationship type is not implemented");
                    return Ok(None);
                }
            },
            None => None,
        };
        let wanted = |generic: &str| match &relationship_type {
            Some(name) => self.registry.is_subtype_of(generic, name),
            None => true,
        };

        let translator = RelationshipTranslator::new(self.context());
        let mut results = Vec::new();

        let candidates = self
            .catalog
            .relationships_for_entity(composite.native_id())
            .map_err(|e| {
                error!(guid = %entity_guid, error = %e, "Unable to list relationships");
                Error::EntityNotKnown {
                    guid: entity_guid.to_string(),
                }
            })?;
        for candidate in &candidates {
            let Some(catalog_type) = candidate.type_name() else {
                warn!(guid = %candidate.guid(), "Dropping relationship without a type");
                continue;
            };
            for (prefix, generic) in self.registry.all_generic_names_for(&catalog_type) {
                if !wanted(&generic) {
                    continue;
                }
                match translator.from_catalog_relationship(
                    candidate,
                    prefix.as_deref(),
                    self.catalog.as_ref(),
                ) {
                    Ok(Some(relationship)) if relationship.touches(entity_guid) => {
                        results.push(relationship)
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(guid = %candidate.guid(), prefix = ?prefix, error = %e, "Dropping relationship candidate");
                    }
                }
            }
        }

        if let Some(catalog_type) = entity.type_name() {
            for (prefix, mapping) in self.registry.all_endpoint_mappings_for(&catalog_type) {
                let Some(prefix) = prefix else {
                    continue;
                };
                if !wanted(&mapping.generic_type) {
                    continue;
                }
                match translator.synthesize_self_referencing(&entity, &prefix) {
                    Ok(Some(relationship)) if relationship.touches(entity_guid) => {
                        results.push(relationship)
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(guid = %entity.guid(), prefix = %prefix, error = %e, "Dropping generated relationship");
                    }
                }
            }
        }

        sort_instances(
            &mut results,
            query.paging.sequencing_order,
            query.paging.sequencing_property.as_deref(),
        );
        Ok(page(results, &self.bounded(&query.paging)))
    }

    // ---------------------------------------------------------------------
    // Search
    // ---------------------------------------------------------------------

    /// Entities matching the search's match properties.
    pub fn find_entities_by_property(
        &self,
        search: &EntitySearch,
    ) -> Result<Option<Vec<EntityDetail>>> {
        let Some(search) = self.searchable(search)? else {
            return Ok(None);
        };
        let plan = SearchCompiler::new(&self.registry).compile_properties(&search);
        Ok(self.run(&plan, &search.paging))
    }

    /// Entities with a string property matching the search's value.
    ///
    /// Without an entity type only the first catalog query is issued.
    pub fn find_entities_by_property_value(
        &self,
        search: &EntitySearch,
    ) -> Result<Option<Vec<EntityDetail>>> {
        let Some(search) = self.searchable(search)? else {
            return Ok(None);
        };
        let value = search.search_value.clone().unwrap_or_default();
        let plan = SearchCompiler::new(&self.registry).compile_value(&search, &value);
        Ok(self.run(&plan, &search.paging))
    }

    /// Reject what cannot be searched and bound the page size. `None` means
    /// nothing can match.
    fn searchable(&self, search: &EntitySearch) -> Result<Option<EntitySearch>> {
        check_current(search.as_of_time)?;
        check_statuses(search.limit_results_by_status.as_deref())?;
        if !search.classifications.is_empty() {
            debug!(classifications = ?search.classifications, "Catalog entities carry no classifications");
            return Ok(None);
        }
        let mut search = search.clone();
        search.paging = self.bounded(&search.paging);
        Ok(Some(search))
    }

    fn bounded(&self, paging: &Paging) -> Paging {
        let mut paging = paging.clone();
        paging.page_size = self.config.effective_page_size(paging.page_size);
        paging
    }

    fn run(&self, plan: &SearchPlan, paging: &Paging) -> Option<Vec<EntityDetail>> {
        debug!(
            sub_queries = plan.sub_queries.len(),
            first_only = plan.first_only,
            "Running search"
        );
        ResultAssembler::new(self.context(), self.catalog.as_ref()).assemble(plan, paging)
    }
}

fn check_current(as_of_time: Option<i64>) -> Result<()> {
    match as_of_time {
        Some(time) => Err(Error::NotSupported(format!(
            "historical queries are not supported (as of {})",
            time
        ))),
        None => Ok(()),
    }
}

fn check_statuses(statuses: Option<&[InstanceStatus]>) -> Result<()> {
    if is_active_only(statuses) {
        Ok(())
    } else {
        Err(Error::NotSupported(
            "only active instances can be requested".to_string(),
        ))
    }
}
