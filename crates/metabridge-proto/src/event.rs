//! Repository change events published to the open-metadata side.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::instance::{EntityDetail, Relationship};

/// Kind of change carried by a [`RepositoryEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    NewEntity,
    UpdatedEntity,
    DeletedEntity,
    NewRelationship,
    UpdatedRelationship,
    DeletedRelationship,
}

/// A change to an open-metadata instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RepositoryEvent {
    NewEntity { entity: EntityDetail },
    UpdatedEntity { entity: EntityDetail },
    DeletedEntity { entity: EntityDetail },
    NewRelationship { relationship: Relationship },
    UpdatedRelationship { relationship: Relationship },
    DeletedRelationship { relationship: Relationship },
}

impl RepositoryEvent {
    /// The kind of change.
    pub fn kind(&self) -> EventKind {
        match self {
            RepositoryEvent::NewEntity { .. } => EventKind::NewEntity,
            RepositoryEvent::UpdatedEntity { .. } => EventKind::UpdatedEntity,
            RepositoryEvent::DeletedEntity { .. } => EventKind::DeletedEntity,
            RepositoryEvent::NewRelationship { .. } => EventKind::NewRelationship,
            RepositoryEvent::UpdatedRelationship { .. } => EventKind::UpdatedRelationship,
            RepositoryEvent::DeletedRelationship { .. } => EventKind::DeletedRelationship,
        }
    }

    /// GUID of the instance that changed.
    pub fn instance_guid(&self) -> &str {
        match self {
            RepositoryEvent::NewEntity { entity }
            | RepositoryEvent::UpdatedEntity { entity }
            | RepositoryEvent::DeletedEntity { entity } => entity.guid(),
            RepositoryEvent::NewRelationship { relationship }
            | RepositoryEvent::UpdatedRelationship { relationship }
            | RepositoryEvent::DeletedRelationship { relationship } => relationship.guid(),
        }
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{InstanceHeader, InstanceType};
    use crate::typedef::TypeDef;
    use crate::value::InstanceProperties;

    fn entity(guid: &str) -> EntityDetail {
        let def = TypeDef::entity("g-db", "Database");
        EntityDetail {
            header: InstanceHeader::new(guid, InstanceType::from_type_def(&def, vec![]), "mc"),
            classifications: vec![],
            properties: InstanceProperties::new().with("name", "sales"),
        }
    }

    #[test]
    fn test_event_kind_and_guid() {
        let event = RepositoryEvent::DeletedEntity {
            entity: entity("db-1"),
        };
        assert_eq!(event.kind(), EventKind::DeletedEntity);
        assert_eq!(event.instance_guid(), "db-1");
    }

    #[test]
    fn test_event_json_tag() {
        let event = RepositoryEvent::NewEntity {
            entity: entity("db-2"),
        };
        let json = event.to_json().unwrap();
        assert!(json.contains(r#""event":"newEntity""#));
        assert_eq!(RepositoryEvent::from_json(&json).unwrap(), event);
    }

    #[test]
    fn test_event_bad_json() {
        assert!(matches!(
            RepositoryEvent::from_json("{\"event\":\"nope\"}"),
            Err(Error::Deserialization(_))
        ));
    }
}
