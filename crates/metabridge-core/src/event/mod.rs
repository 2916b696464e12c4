//! Catalog change notifications to repository events.
//!
//! - [`payload`] - Decoding of catalog change payloads
//! - [`mapper`] - Event mapping and publishing

pub mod mapper;
pub mod payload;

pub use mapper::{EventMapper, EventPublisher, MemoryPublisher};
pub use payload::{
    CatalogChange, CatalogEventPayload, ChangeOperation, ChangeSubject, OBJECT_TYPE_DEFINITION,
    OBJECT_TYPE_INSTANCE,
};
