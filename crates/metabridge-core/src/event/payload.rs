//! Catalog change notifications.

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::catalog::CatalogObject;
use crate::error::Result;

/// Payload object type for instance changes.
pub const OBJECT_TYPE_INSTANCE: &str = "instance";

/// Payload object type for definition changes.
pub const OBJECT_TYPE_DEFINITION: &str = "definition";

/// A change notification as delivered by the catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEventPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub action_state: Option<String>,
    #[serde(alias = "type")]
    pub object_type: String,
    pub operation: String,
    #[serde(default)]
    pub instance: Option<serde_json::Value>,
    #[serde(default)]
    pub definition: Option<serde_json::Value>,
}

/// What happened to the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOperation {
    Created,
    Modified,
    Removed,
}

impl ChangeOperation {
    /// Parse an operation such as `createdInstance` by its leading verb.
    pub fn parse(operation: &str) -> Option<Self> {
        if operation.starts_with("created") {
            Some(ChangeOperation::Created)
        } else if operation.starts_with("modified") {
            Some(ChangeOperation::Modified)
        } else if operation.starts_with("removed") {
            Some(ChangeOperation::Removed)
        } else {
            None
        }
    }
}

/// Kind of instance that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSubject {
    Entity,
    Relationship,
}

/// A decoded instance change.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogChange {
    pub operation: ChangeOperation,
    pub subject: ChangeSubject,
    pub object: CatalogObject,
}

impl CatalogEventPayload {
    /// Decode a payload from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The instance change this payload describes.
    ///
    /// Definition changes, unknown operations and instances that are
    /// neither entities nor relationships yield `None`.
    pub fn into_change(self) -> Result<Option<CatalogChange>> {
        info!(operation = %self.operation, object_type = %self.object_type, "Received catalog change");
        match self.object_type.as_str() {
            OBJECT_TYPE_INSTANCE => {}
            OBJECT_TYPE_DEFINITION => {
                debug!(operation = %self.operation, "Ignoring definition change");
                return Ok(None);
            }
            other => {
                warn!(object_type = %other, "Invalid catalog object type");
                return Ok(None);
            }
        }

        let Some(instance) = self.instance else {
            warn!(operation = %self.operation, "Instance change without an instance");
            return Ok(None);
        };
        let object = CatalogObject::from_json(instance, self.definition)?;
        let subject = match object.get_str("instance.instanceType") {
            Some("entity") => ChangeSubject::Entity,
            Some("relationship") => ChangeSubject::Relationship,
            other => {
                info!(instance_type = ?other, operation = %self.operation, "Change not supported for instance type");
                return Ok(None);
            }
        };
        let Some(operation) = ChangeOperation::parse(&self.operation) else {
            info!(operation = %self.operation, "Change operation not supported");
            return Ok(None);
        };
        Ok(Some(CatalogChange {
            operation,
            subject,
            object,
        }))
    }
}
