//! The catalog-access capability consumed by the bridge.

use std::sync::Arc;

use thiserror::Error;

use super::object::{CatalogObject, ObjectKind};
use crate::query::{AttributeFilter, FilterExpr};

/// Failures reported by a catalog-access implementation.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog could not be reached or answered with an error.
    #[error("catalog transport error: {0}")]
    Transport(String),

    /// The catalog answered with something that could not be decoded.
    #[error("catalog response could not be decoded: {0}")]
    Decode(String),
}

/// A list query against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub filter: Option<FilterExpr>,
    /// Maximum number of objects to return.
    pub limit: Option<usize>,
    /// Number of matching objects to skip.
    pub start: Option<usize>,
}

impl CatalogQuery {
    /// Create a query with the given filter.
    pub fn new(filter: Option<FilterExpr>) -> Self {
        Self {
            filter,
            limit: None,
            start: None,
        }
    }

    /// Set the limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the start offset.
    pub fn with_start(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }

    /// Render as request parameters (`filter`, `limit`, `start`).
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(filter) = &self.filter {
            params.push(("filter", filter.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(start) = self.start {
            params.push(("start", start.to_string()));
        }
        params
    }
}

/// Read access to the catalog.
///
/// Implementations own transport concerns such as authentication and token
/// refresh. A missing object is `Ok(None)`, never an error.
pub trait CatalogAccess: Send + Sync {
    /// Fetch an object by native id.
    fn get_by_id(&self, id: &str, kind: ObjectKind) -> Result<Option<CatalogObject>, CatalogError>;

    /// List entity instances matching a query, then keep only those whose
    /// attributes satisfy `attribute_filter`.
    fn list_by_filter(
        &self,
        query: &CatalogQuery,
        attribute_filter: &AttributeFilter,
    ) -> Result<Vec<CatalogObject>, CatalogError>;

    /// Check whether a definition with this name exists.
    fn definition_exists_by_name(&self, name: &str, kind: ObjectKind)
        -> Result<bool, CatalogError>;

    /// All relationships with the given entity at either end.
    fn relationships_for_entity(&self, id: &str) -> Result<Vec<CatalogObject>, CatalogError>;
}

impl<T: CatalogAccess + ?Sized> CatalogAccess for Arc<T> {
    fn get_by_id(&self, id: &str, kind: ObjectKind) -> Result<Option<CatalogObject>, CatalogError> {
        (**self).get_by_id(id, kind)
    }

    fn list_by_filter(
        &self,
        query: &CatalogQuery,
        attribute_filter: &AttributeFilter,
    ) -> Result<Vec<CatalogObject>, CatalogError> {
        (**self).list_by_filter(query, attribute_filter)
    }

    fn definition_exists_by_name(
        &self,
        name: &str,
        kind: ObjectKind,
    ) -> Result<bool, CatalogError> {
        (**self).definition_exists_by_name(name, kind)
    }

    fn relationships_for_entity(&self, id: &str) -> Result<Vec<CatalogObject>, CatalogError> {
        (**self).relationships_for_entity(id)
    }
}
