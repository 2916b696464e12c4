//! Core error types.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::repository::LifecycleState;

/// Errors surfaced by the mapping, translation and search layers.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested entity does not exist in the catalog.
    #[error("entity not known: {guid}")]
    EntityNotKnown {
        /// GUID as requested by the caller.
        guid: String,
    },

    /// The requested relationship does not exist in the catalog.
    #[error("relationship not known: {guid}")]
    RelationshipNotKnown {
        /// GUID as requested by the caller.
        guid: String,
    },

    /// One endpoint of a catalog relationship could not be fetched.
    #[error("endpoint {endpoint} of relationship {relationship} not found")]
    EndpointNotFound {
        /// Native id of the relationship.
        relationship: String,
        /// Native id of the missing endpoint entity.
        endpoint: String,
    },

    /// The type cannot be represented by this repository.
    #[error("type definition not supported: {0}")]
    TypeDefNotSupported(String),

    /// The operation is never supported by this repository.
    #[error("function not supported: {0}")]
    NotSupported(String),

    /// Catalog data violates an assumption the translation relies on.
    #[error("malformed catalog data: {0}")]
    MalformedData(String),

    /// A relationship could not be assembled with two endpoints.
    #[error("invalid relationship ends for {0}")]
    InvalidRelationshipEnds(String),

    /// The connector is not in a state that allows the operation.
    #[error("invalid lifecycle transition: cannot {action} while {state}")]
    InvalidLifecycle {
        /// Operation attempted.
        action: &'static str,
        /// State at the time of the attempt.
        state: LifecycleState,
    },

    /// Mapping table or connector configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Catalog access failed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// JSON decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
