//! Catalog changes to repository events.

use std::sync::Arc;

use metabridge_proto::{EntityDetail, Relationship, RepositoryEvent};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::payload::{CatalogChange, CatalogEventPayload, ChangeOperation, ChangeSubject};
use crate::catalog::CatalogObject;
use crate::error::Result;
use crate::repository::MetadataCollection;
use crate::translate::{EntityTranslator, RelationshipTranslator};

/// Receives repository events.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: RepositoryEvent);
}

/// Publisher that keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    events: Mutex<Vec<RepositoryEvent>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events published so far, oldest first.
    pub fn events(&self) -> Vec<RepositoryEvent> {
        self.events.lock().clone()
    }

    /// Remove and return the events published so far.
    pub fn drain(&self) -> Vec<RepositoryEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventPublisher for MemoryPublisher {
    fn publish(&self, event: RepositoryEvent) {
        self.events.lock().push(event);
    }
}

/// Turns catalog changes into repository events.
pub struct EventMapper {
    collection: MetadataCollection,
    publisher: Arc<dyn EventPublisher>,
}

impl EventMapper {
    pub fn new(collection: MetadataCollection, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            collection,
            publisher,
        }
    }

    /// Decode a catalog change notification and publish its events.
    ///
    /// Returns the number of events published.
    pub fn process_payload(&self, json: &str) -> Result<usize> {
        match CatalogEventPayload::from_json(json)?.into_change()? {
            Some(change) => Ok(self.process_change(&change)),
            None => Ok(0),
        }
    }

    /// Publish the events for one change. Returns the number published.
    pub fn process_change(&self, change: &CatalogChange) -> usize {
        let events = match change.subject {
            ChangeSubject::Entity => self.entity_events(change.operation, &change.object),
            ChangeSubject::Relationship => {
                self.relationship_events(change.operation, &change.object)
            }
        };
        let count = events.len();
        for event in events {
            debug!(kind = ?event.kind(), guid = %event.instance_guid(), "Publishing repository event");
            self.publisher.publish(event);
        }
        count
    }

    /// One event per mapped entity type, plus the generated relationships
    /// of prefixed entities. Relationship deletions precede the entity's.
    fn entity_events(&self, operation: ChangeOperation, entity: &CatalogObject) -> Vec<RepositoryEvent> {
        let Some(catalog_type) = entity.type_name() else {
            warn!(guid = %entity.guid(), "Changed entity has no type");
            return Vec::new();
        };
        let prefixes = self.collection.registry().all_generic_names_for(&catalog_type);
        if prefixes.is_empty() {
            info!(catalog_type = %catalog_type, "No mappings found for changed entity");
            return Vec::new();
        }

        let mut events = Vec::new();
        for prefix in prefixes.keys() {
            let Some(detail) = self.mapped_entity(entity, prefix.as_deref()) else {
                continue;
            };
            let generated = if prefix.is_some() {
                self.generated_relationships(entity, &detail)
            } else {
                Vec::new()
            };
            match operation {
                ChangeOperation::Created => {
                    events.push(RepositoryEvent::NewEntity { entity: detail });
                    events.extend(
                        generated
                            .into_iter()
                            .map(|relationship| RepositoryEvent::NewRelationship { relationship }),
                    );
                }
                ChangeOperation::Modified => {
                    events.push(RepositoryEvent::UpdatedEntity { entity: detail });
                    events.extend(
                        generated
                            .into_iter()
                            .map(|relationship| RepositoryEvent::UpdatedRelationship { relationship }),
                    );
                }
                ChangeOperation::Removed => {
                    events.extend(
                        generated
                            .into_iter()
                            .map(|relationship| RepositoryEvent::DeletedRelationship { relationship }),
                    );
                    events.push(RepositoryEvent::DeletedEntity { entity: detail });
                }
            }
        }
        events
    }

    fn relationship_events(
        &self,
        operation: ChangeOperation,
        object: &CatalogObject,
    ) -> Vec<RepositoryEvent> {
        let translated = RelationshipTranslator::new(self.collection.context())
            .from_catalog_relationship(object, None, self.collection.catalog());
        let relationship = match translated {
            Ok(Some(relationship)) => relationship,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!(guid = %object.guid(), error = %e, "Unable to map changed relationship");
                return Vec::new();
            }
        };
        vec![match operation {
            ChangeOperation::Created => RepositoryEvent::NewRelationship { relationship },
            ChangeOperation::Modified => RepositoryEvent::UpdatedRelationship { relationship },
            ChangeOperation::Removed => RepositoryEvent::DeletedRelationship { relationship },
        }]
    }

    fn mapped_entity(&self, entity: &CatalogObject, prefix: Option<&str>) -> Option<EntityDetail> {
        match EntityTranslator::new(self.collection.context(), entity, prefix).detail() {
            Ok(detail) => detail,
            Err(e) => {
                error!(guid = %entity.guid(), prefix = ?prefix, error = %e, "Unable to map changed entity");
                None
            }
        }
    }

    fn generated_relationships(&self, entity: &CatalogObject, detail: &EntityDetail) -> Vec<Relationship> {
        let Some(catalog_type) = entity.type_name() else {
            return Vec::new();
        };
        let translator = RelationshipTranslator::new(self.collection.context());
        let mut relationships = Vec::new();
        for prefix in self
            .collection
            .registry()
            .all_endpoint_mappings_for(&catalog_type)
            .into_keys()
            .flatten()
        {
            match translator.synthesize_self_referencing(entity, &prefix) {
                Ok(Some(relationship)) => relationships.push(relationship),
                Ok(None) => {
                    warn!(prefix = %prefix, guid = %detail.guid(), "Unable to create generated relationship")
                }
                Err(e) => {
                    error!(prefix = %prefix, guid = %detail.guid(), error = %e, "Unable to create generated relationship")
                }
            }
        }
        relationships
    }
}
