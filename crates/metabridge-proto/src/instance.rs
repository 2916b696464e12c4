//! Open-metadata instances: entities, proxies and relationships.

use serde::{Deserialize, Serialize};

use crate::typedef::{TypeDef, TypeDefCategory};
use crate::value::InstanceProperties;

/// Lifecycle status of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstanceStatus {
    Unknown,
    Proposed,
    Draft,
    Active,
    Deleted,
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceStatus::Unknown => write!(f, "unknown"),
            InstanceStatus::Proposed => write!(f, "proposed"),
            InstanceStatus::Draft => write!(f, "draft"),
            InstanceStatus::Active => write!(f, "active"),
            InstanceStatus::Deleted => write!(f, "deleted"),
        }
    }
}

/// The type of an instance, with the names of all its supertypes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceType {
    pub type_def_guid: String,
    pub type_def_name: String,
    pub category: TypeDefCategory,
    /// Supertype names, nearest first.
    #[serde(default)]
    pub super_types: Vec<String>,
}

impl InstanceType {
    /// Build an instance type from a type definition and its supertype chain.
    pub fn from_type_def(def: &TypeDef, super_types: Vec<String>) -> Self {
        Self {
            type_def_guid: def.guid.clone(),
            type_def_name: def.name.clone(),
            category: def.category,
            super_types,
        }
    }

    /// Check whether this type is `name` or inherits from it.
    pub fn is_a(&self, name: &str) -> bool {
        self.type_def_name == name || self.super_types.iter().any(|s| s == name)
    }
}

/// Identity, type and audit fields shared by every instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceHeader {
    pub guid: String,
    pub instance_type: InstanceType,
    pub instance_url: String,
    pub metadata_collection_id: String,
    pub status: InstanceStatus,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    /// Creation time in epoch milliseconds.
    pub create_time: Option<i64>,
    /// Last update time in epoch milliseconds.
    pub update_time: Option<i64>,
    pub version: i64,
}

impl InstanceHeader {
    /// Create a header with empty audit fields.
    pub fn new(
        guid: impl Into<String>,
        instance_type: InstanceType,
        metadata_collection_id: impl Into<String>,
    ) -> Self {
        Self {
            guid: guid.into(),
            instance_type,
            instance_url: String::new(),
            metadata_collection_id: metadata_collection_id.into(),
            status: InstanceStatus::Active,
            created_by: None,
            updated_by: None,
            create_time: None,
            update_time: None,
            version: 0,
        }
    }

    /// The instance's type name.
    pub fn type_name(&self) -> &str {
        &self.instance_type.type_def_name
    }
}

/// Header-level view of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub header: InstanceHeader,
    /// Names of attached classifications.
    #[serde(default)]
    pub classifications: Vec<String>,
}

/// An entity with its properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDetail {
    pub header: InstanceHeader,
    #[serde(default)]
    pub classifications: Vec<String>,
    pub properties: InstanceProperties,
}

impl EntityDetail {
    /// The entity's GUID.
    pub fn guid(&self) -> &str {
        &self.header.guid
    }

    /// Drop the properties, keeping the header.
    pub fn to_summary(&self) -> EntitySummary {
        EntitySummary {
            header: self.header.clone(),
            classifications: self.classifications.clone(),
        }
    }
}

/// Reference-only view of an entity used as a relationship endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityProxy {
    pub header: InstanceHeader,
    /// Properties that identify the entity uniquely.
    pub unique_properties: InstanceProperties,
}

impl EntityProxy {
    /// The proxied entity's GUID.
    pub fn guid(&self) -> &str {
        &self.header.guid
    }
}

/// A typed link between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub header: InstanceHeader,
    pub entity_one: EntityProxy,
    pub entity_two: EntityProxy,
    pub properties: InstanceProperties,
}

impl Relationship {
    /// The relationship's GUID.
    pub fn guid(&self) -> &str {
        &self.header.guid
    }

    /// Check whether either endpoint is the given entity.
    pub fn touches(&self, entity_guid: &str) -> bool {
        self.entity_one.guid() == entity_guid || self.entity_two.guid() == entity_guid
    }
}
