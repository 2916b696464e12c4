//! Translation of catalog objects into open-metadata instances.
//!
//! Entities are translated per prefix: one catalog object may appear as
//! several generic entities, each addressed by a composite GUID carrying the
//! prefix. Relationships are either translated from catalog relationship
//! objects or synthesized from a single entity playing two roles.

pub mod attribute;
mod entity;
mod relationship;

pub use attribute::{parse_timestamp, AttributeTranslator, ConversionError};
pub use entity::EntityTranslator;
pub use relationship::RelationshipTranslator;

use std::collections::{BTreeMap, BTreeSet};

use metabridge_proto::{
    InstanceHeader, InstanceProperties, InstanceType, TypeDef, TypeDefAttribute,
};
use tracing::{debug, warn};

use crate::catalog::{CatalogObject, CatalogValue, Namespace, PropertyKey};
use crate::error::{Error, Result};
use crate::guid::CompositeGuid;
use crate::mapping::{CatalogSource, GenericTarget, PropertyMapping, TypeMappingRegistry};

/// Path segment under which instances are dereferenced.
const INSTANCE_PATH: &str = "/catalog/instances/";

/// What every translated instance needs besides the catalog object itself.
#[derive(Clone, Copy)]
pub struct TranslationContext<'a> {
    pub registry: &'a TypeMappingRegistry,
    pub metadata_collection_id: &'a str,
    pub base_url: &'a str,
}

impl<'a> TranslationContext<'a> {
    pub fn new(
        registry: &'a TypeMappingRegistry,
        metadata_collection_id: &'a str,
        base_url: &'a str,
    ) -> Self {
        Self {
            registry,
            metadata_collection_id,
            base_url,
        }
    }

    /// URL at which the catalog serves the instance with this native id.
    pub fn instance_url(&self, native_id: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url.trim_end_matches('/'),
            INSTANCE_PATH,
            native_id
        )
    }

    /// Instance type for a definition, with its supertype chain.
    pub fn instance_type(&self, def: &TypeDef) -> InstanceType {
        InstanceType::from_type_def(def, self.registry.super_type_names(&def.name))
    }

    /// A header stamped with the composite GUID, URL and audit fields.
    pub(crate) fn header(
        &self,
        def: &TypeDef,
        object: &CatalogObject,
        prefix: Option<&str>,
        audit: &AuditFields,
    ) -> InstanceHeader {
        let mut header = InstanceHeader::new(
            CompositeGuid::encode(object.guid(), prefix),
            self.instance_type(def),
            self.metadata_collection_id,
        );
        header.instance_url = self.instance_url(object.guid());
        audit.stamp(&mut header);
        header
    }
}

/// Audit fields read from the instance namespace.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AuditFields {
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub create_time: i64,
    pub update_time: i64,
    pub version: i64,
}

impl AuditFields {
    /// Read audit fields. Both timestamps are required; a missing version
    /// counts as zero.
    pub fn read(object: &CatalogObject) -> Result<Self> {
        let version = match object.get("instance.version") {
            None | Some(CatalogValue::Null) => 0,
            Some(raw) => raw
                .as_i64()
                .or_else(|| raw.as_f64().map(|f| f as i64))
                .ok_or_else(|| {
                    Error::MalformedData(format!(
                        "version {} of {} is not numeric",
                        raw,
                        object.guid()
                    ))
                })?,
        };
        Ok(Self {
            created_by: object.get_str("instance.createdBy").map(str::to_string),
            updated_by: object.get_str("instance.modifiedBy").map(str::to_string),
            create_time: required_timestamp(object, "instance.creationTimeStamp")?,
            update_time: required_timestamp(object, "instance.modifiedTimeStamp")?,
            version,
        })
    }

    /// Relationships are versioned by their last update time.
    pub fn versioned_by_update(mut self) -> Self {
        self.version = self.update_time;
        self
    }

    fn stamp(&self, header: &mut InstanceHeader) {
        header.created_by = self.created_by.clone();
        header.updated_by = self.updated_by.clone();
        header.create_time = Some(self.create_time);
        header.update_time = Some(self.update_time);
        header.version = self.version;
    }
}

fn required_timestamp(object: &CatalogObject, key: &str) -> Result<i64> {
    object
        .get(key)
        .and_then(parse_timestamp)
        .map(|t| t.timestamp_millis())
        .ok_or_else(|| {
            Error::MalformedData(format!("{} missing or malformed on {}", key, object.guid()))
        })
}

/// Applies a property mapping to a catalog object.
pub(crate) struct PropertyProjection<'a> {
    pub type_name: &'a str,
    pub attributes: &'a BTreeMap<String, TypeDefAttribute>,
}

impl PropertyProjection<'_> {
    /// Map every pair into `properties`, returning the names of the free-form
    /// attributes that were consumed into typed attributes.
    pub fn apply(
        &self,
        object: &CatalogObject,
        mapping: &PropertyMapping,
        properties: &mut InstanceProperties,
    ) -> BTreeSet<String> {
        let mut consumed = BTreeSet::new();
        for pair in mapping.iter() {
            let target = GenericTarget::parse(&pair.generic);
            match CatalogSource::parse(&pair.catalog) {
                CatalogSource::Constant(literal) => match target {
                    GenericTarget::Additional(name) => {
                        properties.add_additional_property(name, literal);
                    }
                    GenericTarget::Attribute(name) => {
                        debug!(property = %name, value = %literal, "Adding constant value");
                        self.set(properties, name, &CatalogValue::from(literal));
                    }
                },
                CatalogSource::Property(key) => {
                    let Some(raw) = object.lookup(key).filter(|v| !v.is_null()) else {
                        debug!(catalog_property = %key, "No value for catalog property");
                        continue;
                    };
                    let added = match target {
                        GenericTarget::Additional(name) => {
                            properties.add_additional_property(name, raw.to_string());
                            false
                        }
                        GenericTarget::Attribute(name) => self.set(properties, name, raw),
                    };
                    if added {
                        if let Some(attribute) = attribute_name(key) {
                            consumed.insert(attribute.to_string());
                        }
                    }
                }
            }
        }
        consumed
    }

    fn set(&self, properties: &mut InstanceProperties, name: &str, raw: &CatalogValue) -> bool {
        match self.attributes.get(name) {
            Some(attribute) => AttributeTranslator::add_property(properties, attribute, raw),
            None => {
                warn!(attribute = %name, type_name = %self.type_name, "No attribute defined for type, skipping mapping");
                false
            }
        }
    }
}

/// Name of the free-form attribute a catalog key reads, if any.
fn attribute_name(key: &str) -> Option<&str> {
    match PropertyKey::parse(key) {
        Some(PropertyKey {
            namespace: Namespace::Attribute,
            name,
        }) => Some(name),
        Some(_) => None,
        None => Some(key),
    }
}
