//! Catalog entity to open-metadata entity translation.

use metabridge_proto::{
    EntityDetail, EntityProxy, EntitySummary, InstanceProperties, TypeDef, TypeDefCategory,
};
use tracing::{debug, error, warn};

use super::{AuditFields, PropertyProjection, TranslationContext};
use crate::catalog::CatalogObject;
use crate::error::{Error, Result};

/// Unique property carried by every entity proxy.
pub const PROXY_NAME_PROPERTY: &str = "qualifiedName";

/// Translates one catalog object under one prefix.
pub struct EntityTranslator<'a> {
    context: TranslationContext<'a>,
    object: &'a CatalogObject,
    prefix: Option<&'a str>,
}

impl<'a> EntityTranslator<'a> {
    pub fn new(
        context: TranslationContext<'a>,
        object: &'a CatalogObject,
        prefix: Option<&'a str>,
    ) -> Self {
        Self {
            context,
            object,
            prefix,
        }
    }

    /// The entity type this object maps to under the prefix, if any.
    pub fn generic_type(&self) -> Option<TypeDef> {
        let catalog_type = self.object.type_name()?;
        let Some(generic) = self
            .context
            .registry
            .generic_name_for(&catalog_type, self.prefix)
        else {
            warn!(catalog_type = %catalog_type, prefix = ?self.prefix, "No mapping defined for catalog type");
            return None;
        };
        let def = self.context.registry.type_def_by_name(&generic)?;
        if def.category != TypeDefCategory::Entity {
            debug!(generic_type = %generic, category = %def.category, "Mapped type is not an entity type");
            return None;
        }
        Some(def)
    }

    /// Summary of the entity, or `None` when no entity type maps to it.
    pub fn summary(&self) -> Result<Option<EntitySummary>> {
        let Some(def) = self.generic_type() else {
            return Ok(None);
        };
        let audit = AuditFields::read(self.object)?;
        Ok(Some(EntitySummary {
            header: self.context.header(&def, self.object, self.prefix, &audit),
            classifications: Vec::new(),
        }))
    }

    /// Detail of the entity, or `None` when no entity type maps to it.
    ///
    /// Free-form attributes not consumed by the property mapping are folded
    /// into the additional-properties map as strings.
    pub fn detail(&self) -> Result<Option<EntityDetail>> {
        let Some(def) = self.generic_type() else {
            return Ok(None);
        };
        let audit = AuditFields::read(self.object)?;
        let header = self.context.header(&def, self.object, self.prefix, &audit);

        let registry = self.context.registry;
        let attributes = registry.all_attributes(&def.name).unwrap_or_default();
        let mut properties = InstanceProperties::new();
        let consumed = match self
            .object
            .type_name()
            .and_then(|catalog_type| registry.property_mapping(&catalog_type, self.prefix))
        {
            Some(mapping) => PropertyProjection {
                type_name: &def.name,
                attributes: &attributes,
            }
            .apply(self.object, &mapping, &mut properties),
            None => Default::default(),
        };

        for (name, value) in self.object.attributes() {
            if !consumed.contains(name) && !value.is_null() {
                properties.add_additional_property(name.clone(), value.to_string());
            }
        }

        Ok(Some(EntityDetail {
            header,
            classifications: Vec::new(),
            properties,
        }))
    }

    /// Reference-only form of the entity for a relationship endpoint.
    ///
    /// Returns `None` when no entity type maps to the object under the
    /// prefix. A catalog object without `instance.name` cannot be proxied.
    pub fn proxy(&self) -> Result<Option<EntityProxy>> {
        let Some(def) = self.generic_type() else {
            return Ok(None);
        };
        let Some(name) = self
            .object
            .get_str("instance.name")
            .filter(|name| !name.is_empty())
        else {
            error!(guid = %self.object.guid(), "No qualified name found for object, cannot create proxy");
            return Err(Error::MalformedData(format!(
                "catalog object {} has no name to identify a proxy",
                self.object.guid()
            )));
        };
        let audit = AuditFields::read(self.object)?;
        Ok(Some(EntityProxy {
            header: self.context.header(&def, self.object, self.prefix, &audit),
            unique_properties: InstanceProperties::new().with(PROXY_NAME_PROPERTY, name),
        }))
    }
}
