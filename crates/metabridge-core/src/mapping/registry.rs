//! Type mapping registry.
//!
//! Name, property and endpoint mappings are indexed once from a
//! [`MappingTable`] and never change afterwards. Type definitions are added
//! during startup negotiation; that state sits behind a lock so lookups stay
//! safe even if requests arrive before negotiation has finished.

use std::collections::{BTreeMap, HashMap, HashSet};

use metabridge_proto::{TypeDef, TypeDefAttribute, TypeDefCategory, TypeDefLink};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::endpoint::EndpointMapping;
use super::property::PropertyMapping;
use super::table::MappingTable;

/// Prefix-keyed map; `None` is the plain one-to-one mapping and sorts first.
pub type ByPrefix<T> = BTreeMap<Option<String>, T>;

fn prefix_key(prefix: Option<&str>) -> Option<String> {
    prefix.map(str::to_string)
}

/// Registered type definitions.
#[derive(Debug, Default)]
struct TypeState {
    implemented: HashMap<String, TypeDef>,
    unimplemented: HashMap<String, TypeDef>,
    guid_by_name: HashMap<String, String>,
    /// Supertypes of implemented types that have not been registered yet.
    pending_supertypes: HashSet<String>,
}

impl TypeState {
    fn def_by_guid(&self, guid: &str) -> Option<&TypeDef> {
        self.implemented
            .get(guid)
            .or_else(|| self.unimplemented.get(guid))
    }

    fn def_by_name(&self, name: &str) -> Option<&TypeDef> {
        self.guid_by_name
            .get(name)
            .and_then(|guid| self.def_by_guid(guid))
    }

    fn implemented_by_name(&self, name: &str) -> Option<&TypeDef> {
        self.guid_by_name
            .get(name)
            .and_then(|guid| self.implemented.get(guid))
    }

    /// Walk the supertype chain, nearest first, stopping at cycles or
    /// unregistered links.
    fn super_chain(&self, def: &TypeDef) -> Vec<&TypeDef> {
        let mut chain = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(def.guid.as_str());
        let mut next = def.super_type.as_ref();
        while let Some(link) = next {
            if !seen.insert(link.guid.as_str()) {
                break;
            }
            match self.def_by_guid(&link.guid) {
                Some(parent) => {
                    chain.push(parent);
                    next = parent.super_type.as_ref();
                }
                None => break,
            }
        }
        chain
    }

    /// Promote unimplemented supertypes of `start` until a fixed point is
    /// reached. Returns the names of promoted types.
    fn close_supertypes(&mut self, start: &TypeDef) -> Vec<String> {
        let mut promoted = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start.guid.clone());
        let mut worklist: Vec<TypeDefLink> = start.super_type.iter().cloned().collect();

        while let Some(link) = worklist.pop() {
            if !visited.insert(link.guid.clone()) || self.implemented.contains_key(&link.guid) {
                continue;
            }
            match self.unimplemented.remove(&link.guid) {
                Some(parent) => {
                    worklist.extend(parent.super_type.iter().cloned());
                    self.pending_supertypes.remove(&parent.guid);
                    promoted.push(parent.name.clone());
                    self.implemented.insert(parent.guid.clone(), parent);
                }
                None => {
                    self.pending_supertypes.insert(link.guid);
                }
            }
        }
        promoted
    }
}

/// Bidirectional catalog ⇄ open-metadata type mapping registry.
#[derive(Debug, Default)]
pub struct TypeMappingRegistry {
    generic_to_catalog: HashMap<String, ByPrefix<String>>,
    catalog_to_generic: HashMap<String, ByPrefix<String>>,
    generic_properties: HashMap<String, ByPrefix<PropertyMapping>>,
    catalog_properties: HashMap<String, ByPrefix<PropertyMapping>>,
    generic_endpoints: HashMap<String, ByPrefix<EndpointMapping>>,
    catalog_endpoints: HashMap<String, ByPrefix<EndpointMapping>>,
    prefix_to_generic: HashMap<String, String>,
    reserved: HashSet<String>,
    types: RwLock<TypeState>,
}

impl TypeMappingRegistry {
    /// Index a mapping table.
    ///
    /// Records with an endpoint list of any length other than two keep their
    /// name and property mappings but lose the endpoint mapping.
    pub fn from_table<I, S>(table: &MappingTable, reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = TypeMappingRegistry {
            reserved: reserved.into_iter().map(Into::into).collect(),
            ..Default::default()
        };

        for record in table.records() {
            let prefix = record.prefix.clone();
            registry
                .generic_to_catalog
                .entry(record.generic.clone())
                .or_default()
                .insert(prefix.clone(), record.catalog.clone());
            registry
                .catalog_to_generic
                .entry(record.catalog.clone())
                .or_default()
                .insert(prefix.clone(), record.generic.clone());
            if let Some(p) = &prefix {
                registry
                    .prefix_to_generic
                    .insert(p.clone(), record.generic.clone());
            }

            if let Some(properties) = &record.property_mappings {
                let mut mapping = PropertyMapping::new();
                for property in properties {
                    mapping.insert(property.generic.clone(), property.catalog.clone());
                }
                registry
                    .generic_properties
                    .entry(record.generic.clone())
                    .or_default()
                    .insert(prefix.clone(), mapping.clone());
                registry
                    .catalog_properties
                    .entry(record.catalog.clone())
                    .or_default()
                    .insert(prefix.clone(), mapping);
            }

            if let Some(endpoints) = &record.endpoint_mappings {
                match EndpointMapping::from_records(&record.catalog, &record.generic, endpoints) {
                    Some(mapping) => {
                        registry
                            .generic_endpoints
                            .entry(record.generic.clone())
                            .or_default()
                            .insert(prefix.clone(), mapping.clone());
                        registry
                            .catalog_endpoints
                            .entry(record.catalog.clone())
                            .or_default()
                            .insert(prefix.clone(), mapping);
                    }
                    None => warn!(
                        catalog_type = %record.catalog,
                        count = endpoints.len(),
                        "Skipping endpoint mapping without exactly 2 endpoints"
                    ),
                }
            }
        }

        debug!(
            generic_types = registry.generic_to_catalog.len(),
            catalog_types = registry.catalog_to_generic.len(),
            prefixes = registry.prefix_to_generic.len(),
            "Indexed type mappings"
        );
        registry
    }

    /// Check if an open-metadata type has an explicit catalog mapping.
    pub fn is_mapped(&self, generic_name: &str) -> bool {
        self.generic_to_catalog.contains_key(generic_name)
    }

    /// Check if an open-metadata type is permanently excluded.
    pub fn is_reserved(&self, generic_name: &str) -> bool {
        self.reserved.contains(generic_name)
    }

    /// Catalog type names for an open-metadata type, keyed by prefix.
    ///
    /// An implemented type with no explicit mapping maps to the catalog type
    /// of the same name.
    pub fn all_catalog_names_for(&self, generic_name: &str) -> ByPrefix<String> {
        if let Some(names) = self.generic_to_catalog.get(generic_name) {
            return names.clone();
        }
        let mut names = ByPrefix::new();
        if self.types.read().implemented_by_name(generic_name).is_some() {
            names.insert(None, generic_name.to_string());
        }
        names
    }

    /// Open-metadata type names for a catalog type, keyed by prefix.
    pub fn all_generic_names_for(&self, catalog_name: &str) -> ByPrefix<String> {
        if let Some(names) = self.catalog_to_generic.get(catalog_name) {
            return names.clone();
        }
        let mut names = ByPrefix::new();
        if self.types.read().implemented_by_name(catalog_name).is_some() {
            names.insert(None, catalog_name.to_string());
        }
        names
    }

    /// Catalog type name for an open-metadata type and prefix.
    pub fn catalog_name_for(&self, generic_name: &str, prefix: Option<&str>) -> Option<String> {
        self.all_catalog_names_for(generic_name)
            .remove(&prefix_key(prefix))
    }

    /// Open-metadata type name for a catalog type and prefix.
    pub fn generic_name_for(&self, catalog_name: &str, prefix: Option<&str>) -> Option<String> {
        self.all_generic_names_for(catalog_name)
            .remove(&prefix_key(prefix))
    }

    /// Property mapping for a catalog type and prefix.
    ///
    /// Falls back to the mapping indexed under the same name on the
    /// open-metadata side, which covers identically named types.
    pub fn property_mapping(&self, catalog_name: &str, prefix: Option<&str>) -> Option<PropertyMapping> {
        self.catalog_properties
            .get(catalog_name)
            .and_then(|by_prefix| by_prefix.get(&prefix_key(prefix)))
            .cloned()
            .or_else(|| self.declared_or_identity(catalog_name, prefix))
    }

    /// Property mapping for an open-metadata type and prefix.
    ///
    /// Falls back to the catalog-indexed mapping of the mapped catalog type.
    pub fn generic_property_mapping(
        &self,
        generic_name: &str,
        prefix: Option<&str>,
    ) -> Option<PropertyMapping> {
        self.declared_or_identity(generic_name, prefix).or_else(|| {
            let catalog_name = self.catalog_name_for(generic_name, prefix)?;
            self.catalog_properties
                .get(&catalog_name)
                .and_then(|by_prefix| by_prefix.get(&prefix_key(prefix)))
                .cloned()
        })
    }

    /// Declared generic-indexed mapping, else identity over every attribute
    /// of a registered type with no declared mapping at all.
    fn declared_or_identity(&self, generic_name: &str, prefix: Option<&str>) -> Option<PropertyMapping> {
        match self.generic_properties.get(generic_name) {
            Some(by_prefix) => by_prefix.get(&prefix_key(prefix)).cloned(),
            None if prefix.is_none() => {
                let attributes = self.all_attributes(generic_name)?;
                if attributes.is_empty() {
                    return None;
                }
                Some(PropertyMapping::identity(attributes.into_keys()))
            }
            None => None,
        }
    }

    /// Endpoint mapping for a catalog type and prefix.
    pub fn endpoint_mapping(&self, catalog_name: &str, prefix: Option<&str>) -> Option<EndpointMapping> {
        self.catalog_endpoints
            .get(catalog_name)
            .and_then(|by_prefix| by_prefix.get(&prefix_key(prefix)))
            .cloned()
    }

    /// Every endpoint mapping declared for a catalog type, keyed by prefix.
    pub fn all_endpoint_mappings_for(&self, catalog_name: &str) -> ByPrefix<EndpointMapping> {
        self.catalog_endpoints
            .get(catalog_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Endpoint mapping declared for an open-metadata relationship type.
    pub fn endpoint_mapping_for_generic(
        &self,
        generic_name: &str,
        prefix: Option<&str>,
    ) -> Option<EndpointMapping> {
        self.generic_endpoints
            .get(generic_name)
            .and_then(|by_prefix| by_prefix.get(&prefix_key(prefix)))
            .cloned()
    }

    /// Open-metadata type name generated under a prefix.
    pub fn generic_name_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.prefix_to_generic.get(prefix).map(String::as_str)
    }

    /// Implemented type definition generated under a prefix.
    pub fn type_def_for_prefix(&self, prefix: &str) -> Option<TypeDef> {
        self.generic_name_for_prefix(prefix)
            .and_then(|name| self.type_def_by_name(name))
    }

    /// Record a type as implemented and promote its unimplemented supertypes.
    pub fn register_implemented(&self, def: TypeDef) {
        let mut state = self.types.write();
        state.unimplemented.remove(&def.guid);
        state.pending_supertypes.remove(&def.guid);
        state.guid_by_name.insert(def.name.clone(), def.guid.clone());
        let promoted = state.close_supertypes(&def);
        info!(type_name = %def.name, category = %def.category, "Registered implemented type");
        for name in promoted {
            info!(type_name = %name, subtype = %def.name, "Promoted supertype to implemented");
        }
        state.implemented.insert(def.guid.clone(), def);
    }

    /// Record a type as known but not implemented.
    pub fn register_unimplemented(&self, def: TypeDef) {
        let mut state = self.types.write();
        if state.implemented.contains_key(&def.guid) {
            return;
        }
        debug!(type_name = %def.name, "Registered unimplemented type");
        state.guid_by_name.insert(def.name.clone(), def.guid.clone());
        state.unimplemented.insert(def.guid.clone(), def);
    }

    /// Check if a type is the declared supertype of an implemented type and
    /// has not itself been registered yet.
    pub fn is_pending_supertype(&self, guid: &str) -> bool {
        self.types.read().pending_supertypes.contains(guid)
    }

    /// Check if a type is implemented.
    pub fn is_implemented(&self, guid: &str) -> bool {
        self.types.read().implemented.contains_key(guid)
    }

    /// Check if a type is registered as unimplemented.
    pub fn is_unimplemented(&self, guid: &str) -> bool {
        self.types.read().unimplemented.contains_key(guid)
    }

    /// Implemented type definition by GUID.
    pub fn type_def_by_guid(&self, guid: &str) -> Option<TypeDef> {
        self.types.read().implemented.get(guid).cloned()
    }

    /// Implemented type definition by name.
    pub fn type_def_by_name(&self, name: &str) -> Option<TypeDef> {
        self.types.read().implemented_by_name(name).cloned()
    }

    /// Every implemented type definition, ordered by name.
    pub fn all_type_defs(&self) -> Vec<TypeDef> {
        let mut defs: Vec<TypeDef> = self.types.read().implemented.values().cloned().collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Names of the supertypes of a registered type, nearest first.
    pub fn super_type_names(&self, name: &str) -> Vec<String> {
        let state = self.types.read();
        match state.def_by_name(name) {
            Some(def) => state
                .super_chain(def)
                .into_iter()
                .map(|d| d.name.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Check if `name` is `ancestor` or inherits from it.
    pub fn is_subtype_of(&self, name: &str, ancestor: &str) -> bool {
        name == ancestor || self.super_type_names(name).iter().any(|s| s == ancestor)
    }

    /// Implemented types of a category that inherit from `ancestor`,
    /// excluding `ancestor` itself, ordered by name.
    pub fn implemented_subtypes_of(&self, ancestor: &str, category: TypeDefCategory) -> Vec<String> {
        let state = self.types.read();
        let mut names: Vec<String> = state
            .implemented
            .values()
            .filter(|def| def.category == category && def.name != ancestor)
            .filter(|def| state.super_chain(def).iter().any(|s| s.name == ancestor))
            .map(|def| def.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Attributes of a registered type including inherited ones. A subtype's
    /// declaration wins over a supertype's.
    pub fn all_attributes(&self, name: &str) -> Option<BTreeMap<String, TypeDefAttribute>> {
        let state = self.types.read();
        let def = state.def_by_name(name)?;
        let mut attributes = BTreeMap::new();
        for ancestor in state.super_chain(def).into_iter().rev() {
            for attribute in &ancestor.attributes {
                attributes.insert(attribute.name.clone(), attribute.clone());
            }
        }
        for attribute in &def.attributes {
            attributes.insert(attribute.name.clone(), attribute.clone());
        }
        Some(attributes)
    }
}
