//! Catalog ⇄ open-metadata type mappings.
//!
//! - [`table`] - The declarative mapping table and its loader
//! - [`property`] - Property pairs and the `constant.` / `additionalProperties.` markers
//! - [`endpoint`] - Relationship endpoint mappings
//! - [`registry`] - The indexed registry with type negotiation state

pub mod endpoint;
pub mod property;
pub mod registry;
pub mod table;

pub use endpoint::{EndpointMapping, EndpointRole};
pub use property::{
    CatalogSource, GenericTarget, PropertyMapping, PropertyPair, ADDITIONAL_PROPERTIES_MARKER,
    CONSTANT_MARKER,
};
pub use registry::{ByPrefix, TypeMappingRegistry};
pub use table::{EndpointRecord, MappingRecord, MappingTable, PropertyRecord};
