//! Relationship endpoint mappings.

use super::table::EndpointRecord;

/// One end of a relationship mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRole {
    /// Catalog endpoint field.
    pub catalog_field: String,
    /// Open-metadata endpoint role.
    pub generic_role: String,
    /// Prefix of the open-metadata entity expected at this end.
    pub prefix: Option<String>,
}

impl From<&EndpointRecord> for EndpointRole {
    fn from(record: &EndpointRecord) -> Self {
        Self {
            catalog_field: record.catalog.clone(),
            generic_role: record.generic.clone(),
            prefix: record.prefix.clone(),
        }
    }
}

/// How a catalog relationship type (or a catalog entity type playing two
/// roles) maps onto an open-metadata relationship type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointMapping {
    pub catalog_type: String,
    pub generic_type: String,
    pub one: EndpointRole,
    pub two: EndpointRole,
}

impl EndpointMapping {
    /// Build from exactly two endpoint records; any other count yields `None`.
    pub fn from_records(
        catalog_type: &str,
        generic_type: &str,
        records: &[EndpointRecord],
    ) -> Option<Self> {
        match records {
            [one, two] => Some(Self {
                catalog_type: catalog_type.to_string(),
                generic_type: generic_type.to_string(),
                one: one.into(),
                two: two.into(),
            }),
            _ => None,
        }
    }

    /// Prefix of the entity at end one.
    pub fn prefix_one(&self) -> Option<&str> {
        self.one.prefix.as_deref()
    }

    /// Prefix of the entity at end two.
    pub fn prefix_two(&self) -> Option<&str> {
        self.two.prefix.as_deref()
    }

    /// Check whether either end expects an entity with this prefix.
    pub fn involves_prefix(&self, prefix: Option<&str>) -> bool {
        self.prefix_one() == prefix || self.prefix_two() == prefix
    }
}
