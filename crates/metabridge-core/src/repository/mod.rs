//! The connector and its repository operations.
//!
//! - [`config`] - Connector configuration
//! - [`lifecycle`] - Lifecycle state machine and the connector itself
//! - [`collection`] - Entity, relationship, type and search operations

pub mod collection;
pub mod config;
pub mod lifecycle;

pub use collection::MetadataCollection;
pub use config::{
    ConnectorConfig, DEFAULT_BASE_URL, DEFAULT_MAX_PAGE_SIZE, DEFAULT_METADATA_COLLECTION_ID,
    DEFAULT_REPOSITORY_NAME,
};
pub use lifecycle::{Connector, LifecycleState};
