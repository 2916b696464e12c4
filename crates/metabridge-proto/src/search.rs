//! Search and listing requests against a metadata collection.

use serde::{Deserialize, Serialize};

use crate::instance::InstanceStatus;
use crate::value::InstanceProperties;

/// How multiple match properties combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchCriteria {
    /// Every property must match.
    #[default]
    All,
    /// At least one property must match.
    Any,
}

/// Ordering applied to results before paging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SequencingOrder {
    /// Keep the order the results were gathered in.
    #[default]
    Any,
    Guid,
    CreationDateRecent,
    CreationDateOldest,
    LastUpdateRecent,
    LastUpdateOldest,
    PropertyAscending,
    PropertyDescending,
}

/// Paging and ordering parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// Index of the first element to return.
    pub from_element: usize,
    /// Maximum number of elements to return; zero means unlimited.
    pub page_size: usize,
    pub sequencing_order: SequencingOrder,
    /// Property used by the property-based orders.
    pub sequencing_property: Option<String>,
}

impl Paging {
    /// Create paging with offset and page size.
    pub fn new(from_element: usize, page_size: usize) -> Self {
        Self {
            from_element,
            page_size,
            ..Default::default()
        }
    }

    /// Set the ordering.
    pub fn sequenced(mut self, order: SequencingOrder, property: Option<String>) -> Self {
        self.sequencing_order = order;
        self.sequencing_property = property;
        self
    }

    /// Slice bounds of the requested page within `len` results.
    pub fn window(&self, len: usize) -> (usize, usize) {
        let start = self.from_element.min(len);
        let end = if self.page_size == 0 {
            len
        } else {
            start.saturating_add(self.page_size).min(len)
        };
        (start, end)
    }
}

/// Criteria for an entity search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySearch {
    /// Restrict results to this entity type (and its subtypes).
    pub entity_type_guid: Option<String>,
    /// Properties to match, by open-metadata property name.
    pub match_properties: Option<InstanceProperties>,
    pub match_criteria: MatchCriteria,
    /// Free-text value matched against string properties.
    pub search_value: Option<String>,
    /// Classification names every result must carry.
    #[serde(default)]
    pub classifications: Vec<String>,
    pub limit_results_by_status: Option<Vec<InstanceStatus>>,
    /// Historical point in time, in epoch milliseconds.
    pub as_of_time: Option<i64>,
    pub paging: Paging,
}

impl EntitySearch {
    /// Create an unrestricted search.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to an entity type.
    pub fn of_type(mut self, type_guid: impl Into<String>) -> Self {
        self.entity_type_guid = Some(type_guid.into());
        self
    }

    /// Match on properties.
    pub fn matching(mut self, properties: InstanceProperties, criteria: MatchCriteria) -> Self {
        self.match_properties = Some(properties);
        self.match_criteria = criteria;
        self
    }

    /// Match a free-text value.
    pub fn matching_value(mut self, value: impl Into<String>) -> Self {
        self.search_value = Some(value.into());
        self
    }

    /// Require classifications.
    pub fn with_classifications(mut self, classifications: Vec<String>) -> Self {
        self.classifications = classifications;
        self
    }

    /// Restrict by status.
    pub fn with_statuses(mut self, statuses: Vec<InstanceStatus>) -> Self {
        self.limit_results_by_status = Some(statuses);
        self
    }

    /// Ask for a historical view.
    pub fn as_of(mut self, time: i64) -> Self {
        self.as_of_time = Some(time);
        self
    }

    /// Set paging.
    pub fn with_paging(mut self, paging: Paging) -> Self {
        self.paging = paging;
        self
    }
}

/// Parameters for listing the relationships of one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipQuery {
    /// Restrict results to this relationship type.
    pub relationship_type_guid: Option<String>,
    pub limit_results_by_status: Option<Vec<InstanceStatus>>,
    pub as_of_time: Option<i64>,
    pub paging: Paging,
}

impl RelationshipQuery {
    /// Create an unrestricted query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a relationship type.
    pub fn of_type(mut self, type_guid: impl Into<String>) -> Self {
        self.relationship_type_guid = Some(type_guid.into());
        self
    }

    /// Restrict by status.
    pub fn with_statuses(mut self, statuses: Vec<InstanceStatus>) -> Self {
        self.limit_results_by_status = Some(statuses);
        self
    }

    /// Ask for a historical view.
    pub fn as_of(mut self, time: i64) -> Self {
        self.as_of_time = Some(time);
        self
    }

    /// Set paging.
    pub fn with_paging(mut self, paging: Paging) -> Self {
        self.paging = paging;
        self
    }
}

/// Whether a status filter asks for anything beyond active instances.
pub fn is_active_only(statuses: Option<&[InstanceStatus]>) -> bool {
    match statuses {
        None => true,
        Some([]) => true,
        Some([InstanceStatus::Active]) => true,
        Some(_) => false,
    }
}
