//! Ordering of translated results.

use std::cmp::Ordering;

use metabridge_proto::{
    EntityDetail, EntitySummary, InstanceHeader, Paging, PrimitiveValue, Relationship,
    SequencingOrder,
};

use crate::translate::AttributeTranslator;

/// Something that can be placed in a sequenced result page.
pub trait Sequenced {
    fn header(&self) -> &InstanceHeader;

    /// Value of a named property, if the instance carries properties.
    fn property(&self, name: &str) -> Option<&PrimitiveValue>;
}

impl Sequenced for EntitySummary {
    fn header(&self) -> &InstanceHeader {
        &self.header
    }

    fn property(&self, _name: &str) -> Option<&PrimitiveValue> {
        None
    }
}

impl Sequenced for EntityDetail {
    fn header(&self) -> &InstanceHeader {
        &self.header
    }

    fn property(&self, name: &str) -> Option<&PrimitiveValue> {
        self.properties.primitive(name)
    }
}

impl Sequenced for Relationship {
    fn header(&self) -> &InstanceHeader {
        &self.header
    }

    fn property(&self, name: &str) -> Option<&PrimitiveValue> {
        self.properties.primitive(name)
    }
}

/// Stable sort by the requested order. `Any`, and property orders without a
/// property, leave the input order untouched.
pub fn sort_instances<T: Sequenced>(
    items: &mut [T],
    order: SequencingOrder,
    property: Option<&str>,
) {
    match (order, property) {
        (SequencingOrder::Any, _)
        | (SequencingOrder::PropertyAscending | SequencingOrder::PropertyDescending, None) => {}
        _ => items.sort_by(|a, b| compare(a, b, order, property)),
    }
}

fn compare<T: Sequenced>(
    a: &T,
    b: &T,
    order: SequencingOrder,
    property: Option<&str>,
) -> Ordering {
    let (ha, hb) = (a.header(), b.header());
    match (order, property) {
        (SequencingOrder::Guid, _) => ha.guid.cmp(&hb.guid),
        (SequencingOrder::CreationDateRecent, _) => hb.create_time.cmp(&ha.create_time),
        (SequencingOrder::CreationDateOldest, _) => ha.create_time.cmp(&hb.create_time),
        (SequencingOrder::LastUpdateRecent, _) => hb.update_time.cmp(&ha.update_time),
        (SequencingOrder::LastUpdateOldest, _) => ha.update_time.cmp(&hb.update_time),
        (SequencingOrder::PropertyAscending, Some(name)) => {
            AttributeTranslator::compare(a.property(name), b.property(name))
        }
        (SequencingOrder::PropertyDescending, Some(name)) => {
            AttributeTranslator::compare(b.property(name), a.property(name))
        }
        _ => Ordering::Equal,
    }
}

/// Apply a page window, returning `None` for an empty page.
pub fn page<T>(mut items: Vec<T>, paging: &Paging) -> Option<Vec<T>> {
    let (start, end) = paging.window(items.len());
    items.truncate(end);
    items.drain(..start);
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metabridge_proto::{InstanceProperties, InstanceType, TypeDef};

    fn detail(guid: &str, created: i64, size: Option<i64>) -> EntityDetail {
        let mut header = InstanceHeader::new(
            guid,
            InstanceType::from_type_def(&TypeDef::entity("g", "Asset"), Vec::new()),
            "mc",
        );
        header.create_time = Some(created);
        header.update_time = Some(-created);
        let mut properties = InstanceProperties::new();
        if let Some(size) = size {
            properties.set_primitive("size", PrimitiveValue::Long(size));
        }
        EntityDetail {
            header,
            classifications: Vec::new(),
            properties,
        }
    }

    fn guids(items: &[EntityDetail]) -> Vec<&str> {
        items.iter().map(|d| d.guid()).collect()
    }

    #[test]
    fn test_sort_by_guid_and_dates() {
        let mut items = vec![detail("b", 2, None), detail("c", 3, None), detail("a", 1, None)];

        sort_instances(&mut items, SequencingOrder::Guid, None);
        assert_eq!(guids(&items), vec!["a", "b", "c"]);

        sort_instances(&mut items, SequencingOrder::CreationDateRecent, None);
        assert_eq!(guids(&items), vec!["c", "b", "a"]);

        sort_instances(&mut items, SequencingOrder::CreationDateOldest, None);
        assert_eq!(guids(&items), vec!["a", "b", "c"]);

        sort_instances(&mut items, SequencingOrder::LastUpdateRecent, None);
        assert_eq!(guids(&items), vec!["a", "b", "c"]);

        sort_instances(&mut items, SequencingOrder::LastUpdateOldest, None);
        assert_eq!(guids(&items), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_by_property_puts_missing_first() {
        let mut items = vec![
            detail("a", 0, Some(5)),
            detail("b", 0, None),
            detail("c", 0, Some(1)),
        ];
        sort_instances(&mut items, SequencingOrder::PropertyAscending, Some("size"));
        assert_eq!(guids(&items), vec!["b", "c", "a"]);

        sort_instances(&mut items, SequencingOrder::PropertyDescending, Some("size"));
        assert_eq!(guids(&items), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut items = vec![detail("x", 1, None), detail("y", 1, None), detail("z", 0, None)];
        sort_instances(&mut items, SequencingOrder::CreationDateRecent, None);
        assert_eq!(guids(&items), vec!["x", "y", "z"]);

        sort_instances(&mut items, SequencingOrder::PropertyAscending, None);
        assert_eq!(guids(&items), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_page() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(page(items.clone(), &Paging::new(10, 10)), Some((10..20).collect()));
        assert_eq!(page(items.clone(), &Paging::new(20, 10)), Some((20..25).collect()));
        assert_eq!(page(items.clone(), &Paging::new(0, 0)), Some((0..25).collect()));
        assert_eq!(page(items, &Paging::new(30, 10)), None);
        assert_eq!(page(Vec::<u32>::new(), &Paging::new(0, 10)), None);
    }
}
