//! Declarative type-mapping table.
//!
//! The table is a JSON array of records:
//!
//! ```json
//! [
//!   {
//!     "catalog": "table",
//!     "generic": "RelationalTable",
//!     "propertyMappings": [
//!       { "catalog": "instance.name", "generic": "name" },
//!       { "catalog": "constant.SAS", "generic": "additionalProperties.vendor" }
//!     ]
//!   },
//!   {
//!     "catalog": "table",
//!     "generic": "AttributeForSchema",
//!     "prefix": "TA",
//!     "endpointMappings": [
//!       { "catalog": "table", "generic": "parentSchemas", "prefix": "TT" },
//!       { "catalog": "table", "generic": "attributes", "prefix": null }
//!     ]
//!   }
//! ]
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::property::{CONSTANT_MARKER, ADDITIONAL_PROPERTIES_MARKER};
use crate::catalog::PropertyKey;
use crate::error::{Error, Result};
use crate::guid::SEPARATOR;

/// One catalog property paired with one open-metadata property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub catalog: String,
    pub generic: String,
}

/// One endpoint of a relationship mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    /// Catalog endpoint field.
    pub catalog: String,
    /// Open-metadata endpoint role.
    pub generic: String,
    /// Prefix of the entity expected at this endpoint.
    #[serde(default)]
    pub prefix: Option<String>,
}

/// One catalog type mapped to one open-metadata type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRecord {
    pub catalog: String,
    pub generic: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub property_mappings: Option<Vec<PropertyRecord>>,
    #[serde(default)]
    pub endpoint_mappings: Option<Vec<EndpointRecord>>,
}

/// An ordered list of mapping records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingTable {
    records: Vec<MappingRecord>,
}

impl MappingTable {
    /// Create a table from records, validating them.
    pub fn new(records: Vec<MappingRecord>) -> Result<Self> {
        let table = Self { records };
        table.validate()?;
        Ok(table)
    }

    /// Parse a table from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<MappingRecord> = serde_json::from_str(json)?;
        Self::new(records)
    }

    /// Parse a table from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let records: Vec<MappingRecord> = serde_json::from_reader(reader)?;
        Self::new(records)
    }

    /// Load a table from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::from_reader(BufReader::new(file))?;
        debug!(path = %path.display(), records = table.len(), "Loaded type mapping table");
        Ok(table)
    }

    /// The records in declaration order.
    pub fn records(&self) -> &[MappingRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reject records the registry cannot index; warn about property keys
    /// that will never resolve.
    fn validate(&self) -> Result<()> {
        for (idx, record) in self.records.iter().enumerate() {
            if record.catalog.is_empty() || record.generic.is_empty() {
                return Err(Error::Config(format!(
                    "mapping record {} has an empty type name",
                    idx
                )));
            }
            let prefixes = record.prefix.iter().chain(
                record
                    .endpoint_mappings
                    .iter()
                    .flatten()
                    .filter_map(|e| e.prefix.as_ref()),
            );
            for prefix in prefixes {
                if prefix.is_empty() || prefix.contains(SEPARATOR) {
                    return Err(Error::Config(format!(
                        "mapping record {} ({}) has invalid prefix {:?}",
                        idx, record.catalog, prefix
                    )));
                }
            }
            for property in record.property_mappings.iter().flatten() {
                let catalog_ok = property.catalog.starts_with(CONSTANT_MARKER)
                    || PropertyKey::parse(&property.catalog).is_some();
                if !catalog_ok {
                    warn!(
                        catalog_type = %record.catalog,
                        property = %property.catalog,
                        "Catalog property is not namespaced, reading it as a free-form attribute"
                    );
                }
                if property.generic.is_empty()
                    || property.generic == ADDITIONAL_PROPERTIES_MARKER
                {
                    return Err(Error::Config(format!(
                        "mapping record {} ({}) has an empty generic property name",
                        idx, record.catalog
                    )));
                }
            }
        }
        Ok(())
    }
}
