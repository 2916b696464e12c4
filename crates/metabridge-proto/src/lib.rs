//! Open-metadata model types for metabridge.
//!
//! This crate defines the vendor-neutral side of the bridge: typed property
//! values, type definitions, entity and relationship instances, search
//! requests and repository change events. Everything here is plain data and
//! serializes with serde.
//!
//! # Modules
//!
//! - [`value`] - Primitive values and instance property sets
//! - [`typedef`] - Type definitions and attribute declarations
//! - [`instance`] - Entity, proxy and relationship instances
//! - [`search`] - Entity search and relationship listing requests
//! - [`event`] - Repository change events
//! - [`error`] - Protocol error types

pub mod error;
pub mod event;
pub mod instance;
pub mod search;
pub mod typedef;
pub mod value;

pub use error::{Error, Result};

// Re-export commonly used types at crate root
pub use event::{EventKind, RepositoryEvent};
pub use instance::{
    EntityDetail, EntityProxy, EntitySummary, InstanceHeader, InstanceStatus, InstanceType,
    Relationship,
};
pub use search::{
    is_active_only, EntitySearch, MatchCriteria, Paging, RelationshipQuery, SequencingOrder,
};
pub use typedef::{AttributeKind, TypeDef, TypeDefAttribute, TypeDefCategory, TypeDefLink};
pub use value::{
    InstanceProperties, PrimitiveKind, PrimitiveValue, PropertyValue, ADDITIONAL_PROPERTIES,
};
