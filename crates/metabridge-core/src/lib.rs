//! Metabridge Core - Type mapping, translation and search between a
//! catalog and the open-metadata model.
//!
//! A catalog object may surface as several open-metadata instances, each
//! addressed by a prefixed composite GUID. The registry says which; the
//! translators build them; the search compiler turns open-metadata searches
//! into catalog filter queries.

pub mod catalog;
pub mod error;
pub mod event;
pub mod guid;
pub mod mapping;
pub mod query;
pub mod repository;
pub mod translate;

pub use catalog::{
    CatalogAccess, CatalogError, CatalogObject, CatalogQuery, CatalogValue, MemoryCatalog,
    ObjectKind,
};
pub use error::{Error, Result};
pub use guid::CompositeGuid;
pub use mapping::{EndpointMapping, MappingTable, PropertyMapping, TypeMappingRegistry};
pub use query::{FilterExpr, ResultAssembler, SearchCompiler, SearchPlan};
pub use repository::{Connector, ConnectorConfig, LifecycleState, MetadataCollection};
pub use translate::{AttributeTranslator, EntityTranslator, RelationshipTranslator, TranslationContext};

// Event exports
pub use event::{EventMapper, EventPublisher, MemoryPublisher};

/// Re-export open-metadata model types.
pub use metabridge_proto as proto;
