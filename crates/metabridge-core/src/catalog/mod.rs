//! Catalog-side model and access.
//!
//! - [`value`] - Raw catalog values
//! - [`object`] - Catalog objects with namespaced properties
//! - [`access`] - The catalog-access capability
//! - [`memory`] - In-memory catalog

mod access;
mod memory;
mod object;
mod value;

pub use access::{CatalogAccess, CatalogError, CatalogQuery};
pub use memory::MemoryCatalog;
pub use object::{
    CatalogObject, Namespace, ObjectKind, PropertyKey, REFERENCE_TYPE, REFERENCE_TYPE_PREFIX,
};
pub use value::CatalogValue;
