//! Compilation of entity searches into catalog queries.
//!
//! A search names an open-metadata type; the registry resolves it to one or
//! more (prefix, catalog type) targets. Property searches issue one query
//! per target. Value searches fold the targets of one type into a single
//! query, except reference targets, which need their own attribute filter.

use metabridge_proto::{
    EntitySearch, MatchCriteria, Paging, PrimitiveKind, PrimitiveValue, TypeDefCategory,
};
use tracing::debug;

use super::filter::{AttributeFilter, FilterExpr};
use crate::catalog::{CatalogQuery, Namespace, PropertyKey, REFERENCE_TYPE, REFERENCE_TYPE_PREFIX};
use crate::mapping::{CatalogSource, PropertyMapping, TypeMappingRegistry};

/// Attribute holding the referenced type of a catalog reference object.
pub const REFERENCED_TYPE_ATTRIBUTE: &str = "referencedType";

/// Instance fields searched by a value search with no type.
pub const DEFAULT_VALUE_FIELDS: [&str; 3] = ["name", "label", "description"];

/// One catalog type searched under one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub prefix: Option<String>,
    pub catalog_type: String,
    pub generic_type: String,
}

impl SearchTarget {
    /// Referenced type for a `reference.<type>` catalog type.
    fn referenced_type(&self) -> Option<&str> {
        self.catalog_type.strip_prefix(REFERENCE_TYPE_PREFIX)
    }

    /// Filter clause selecting this catalog type, plus any attribute
    /// constraint the catalog cannot express in the filter.
    fn type_clause(&self) -> (FilterExpr, AttributeFilter) {
        let mut attributes = AttributeFilter::new();
        match self.referenced_type() {
            Some(referenced) => {
                attributes.insert(REFERENCED_TYPE_ATTRIBUTE.to_string(), referenced.to_string());
                (FilterExpr::eq("type", REFERENCE_TYPE), attributes)
            }
            None => (FilterExpr::eq("type", self.catalog_type.as_str()), attributes),
        }
    }
}

/// One catalog query and the targets whose results it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    pub targets: Vec<SearchTarget>,
    pub query: CatalogQuery,
    pub attribute_filter: AttributeFilter,
    /// The filter does not select by type; every result is translated under
    /// every target prefix.
    pub type_agnostic: bool,
}

impl SubQuery {
    /// Prefixes under which a result of the given catalog type is translated.
    pub fn prefixes_for(&self, catalog_type: &str) -> Vec<Option<&str>> {
        let mut prefixes: Vec<Option<&str>> = self
            .targets
            .iter()
            .filter(|t| self.type_agnostic || t.catalog_type == catalog_type)
            .map(|t| t.prefix.as_deref())
            .collect();
        prefixes.dedup();
        prefixes
    }
}

/// The queries compiled for one search.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchPlan {
    pub sub_queries: Vec<SubQuery>,
    /// Only the first sub-query is issued.
    pub first_only: bool,
    /// Open-metadata type every result must be or inherit from.
    pub expected_type: Option<String>,
}

impl SearchPlan {
    /// Sub-queries that are actually sent to the catalog.
    pub fn issued(&self) -> &[SubQuery] {
        if self.first_only {
            &self.sub_queries[..self.sub_queries.len().min(1)]
        } else {
            &self.sub_queries
        }
    }
}

/// One catalog query's worth of match-property constraints.
#[derive(Default)]
struct Branch {
    filter: Option<FilterExpr>,
    deferred: AttributeFilter,
}

/// Outcome of compiling one match property for one target.
enum Clause {
    Filter(FilterExpr),
    Deferred(String, String),
    Always,
    Never,
}

/// Compiles entity searches against a registry.
pub struct SearchCompiler<'a> {
    registry: &'a TypeMappingRegistry,
}

impl<'a> SearchCompiler<'a> {
    pub fn new(registry: &'a TypeMappingRegistry) -> Self {
        Self { registry }
    }

    /// Resolve the targets for an optional entity type GUID.
    ///
    /// A type with no explicit mapping is searched through its mapped
    /// subtypes, or as the catalog type of the same name when it has none.
    /// Without a type every entity type that is mapped or has no subtypes is
    /// a target, with unprefixed targets first.
    pub fn targets(&self, type_guid: Option<&str>) -> Vec<SearchTarget> {
        match type_guid {
            Some(guid) => {
                let Some(def) = self.registry.type_def_by_guid(guid) else {
                    debug!(type_guid = %guid, "Search type is not implemented");
                    return Vec::new();
                };
                if self.registry.is_mapped(&def.name) {
                    return self.targets_for(&def.name);
                }
                let subtypes: Vec<SearchTarget> = self
                    .registry
                    .implemented_subtypes_of(&def.name, TypeDefCategory::Entity)
                    .iter()
                    .filter(|sub| self.registry.is_mapped(sub))
                    .flat_map(|sub| self.targets_for(sub))
                    .collect();
                if subtypes.is_empty() {
                    self.targets_for(&def.name)
                } else {
                    subtypes
                }
            }
            None => {
                let mut targets: Vec<SearchTarget> = self
                    .registry
                    .all_type_defs()
                    .iter()
                    .filter(|def| def.category == TypeDefCategory::Entity)
                    .filter(|def| self.is_searched_directly(&def.name))
                    .flat_map(|def| self.targets_for(&def.name))
                    .collect();
                targets.sort_by_key(|t| t.prefix.is_some());
                targets
            }
        }
    }

    /// Mapped types, and implemented types with no entity subtypes, which
    /// stand for the catalog type of the same name. Other unmapped types are
    /// supertypes reached through their subtypes.
    fn is_searched_directly(&self, generic_type: &str) -> bool {
        self.registry.is_mapped(generic_type)
            || self
                .registry
                .implemented_subtypes_of(generic_type, TypeDefCategory::Entity)
                .is_empty()
    }

    fn targets_for(&self, generic_type: &str) -> Vec<SearchTarget> {
        self.registry
            .all_catalog_names_for(generic_type)
            .into_iter()
            .map(|(prefix, catalog_type)| SearchTarget {
                prefix,
                catalog_type,
                generic_type: generic_type.to_string(),
            })
            .collect()
    }

    fn expected_type(&self, search: &EntitySearch) -> Option<String> {
        search
            .entity_type_guid
            .as_deref()
            .and_then(|guid| self.registry.type_def_by_guid(guid))
            .map(|def| def.name)
    }

    /// Compile a search on match properties: one sub-query per target, or
    /// several when `Any` needs attribute post-filters.
    ///
    /// Targets that cannot satisfy the properties (unmapped property under
    /// `All`, constant mismatch) are left out.
    pub fn compile_properties(&self, search: &EntitySearch) -> SearchPlan {
        let limit = window_limit(&search.paging);
        let mut sub_queries = Vec::new();
        for target in self.targets(search.entity_type_guid.as_deref()) {
            let Some(branches) = self.property_branches(search, &target) else {
                continue;
            };
            for branch in branches {
                let (type_clause, mut attribute_filter) = target.type_clause();
                attribute_filter.extend(branch.deferred);
                let filter = match branch.filter {
                    Some(f) => FilterExpr::all(vec![type_clause, f]),
                    None => Some(type_clause),
                };
                sub_queries.push(SubQuery {
                    targets: vec![target.clone()],
                    query: with_window(CatalogQuery::new(filter), limit),
                    attribute_filter,
                    type_agnostic: false,
                });
            }
        }
        SearchPlan {
            sub_queries,
            first_only: false,
            expected_type: self.expected_type(search),
        }
    }

    /// Alternative queries for the match properties of one target; a result
    /// of any of them matches. `None` means the target cannot match.
    ///
    /// Post-filters always apply together with the query filter, so under
    /// `Any` each deferred attribute gets a query of its own.
    fn property_branches(&self, search: &EntitySearch, target: &SearchTarget) -> Option<Vec<Branch>> {
        let Some(properties) = &search.match_properties else {
            return Some(vec![Branch::default()]);
        };
        let mapping = self
            .registry
            .property_mapping(&target.catalog_type, target.prefix.as_deref());

        let mut filters = Vec::new();
        let mut deferred = Vec::new();
        let mut satisfied = false;
        for (name, value) in properties.iter() {
            let Some(value) = value.as_primitive() else {
                debug!(property = %name, "Skipping non-primitive match property");
                continue;
            };
            match property_clause(mapping.as_ref(), name, value) {
                Clause::Filter(f) => filters.push(f),
                Clause::Deferred(attribute, v) => deferred.push((attribute, v)),
                Clause::Always => satisfied = true,
                Clause::Never => {
                    if search.match_criteria == MatchCriteria::All {
                        debug!(target = ?target, property = %name, "Target cannot match property");
                        return None;
                    }
                }
            }
        }

        match search.match_criteria {
            MatchCriteria::All => Some(vec![Branch {
                filter: FilterExpr::all(filters),
                deferred: deferred.into_iter().collect(),
            }]),
            MatchCriteria::Any if satisfied || properties.is_empty() => {
                Some(vec![Branch::default()])
            }
            MatchCriteria::Any => {
                let mut branches = Vec::new();
                if let Some(filter) = FilterExpr::any(filters) {
                    branches.push(Branch {
                        filter: Some(filter),
                        deferred: AttributeFilter::new(),
                    });
                }
                branches.extend(deferred.into_iter().map(|(attribute, value)| Branch {
                    filter: None,
                    deferred: AttributeFilter::from([(attribute, value)]),
                }));
                if branches.is_empty() {
                    None
                } else {
                    Some(branches)
                }
            }
        }
    }

    /// Compile a free-text value search.
    ///
    /// With a type, the string properties mapped for each target are
    /// searched. Without one, only the first target's query is issued and
    /// its filter searches the default instance fields of any type.
    pub fn compile_value(&self, search: &EntitySearch, value: &str) -> SearchPlan {
        let limit = window_limit(&search.paging);
        let targets = self.targets(search.entity_type_guid.as_deref());

        if search.entity_type_guid.is_none() {
            let filter = default_value_filter(value);
            let sub_queries = targets
                .into_iter()
                .map(|target| SubQuery {
                    targets: vec![target],
                    query: with_window(CatalogQuery::new(filter.clone()), limit),
                    attribute_filter: AttributeFilter::new(),
                    type_agnostic: true,
                })
                .collect();
            return SearchPlan {
                sub_queries,
                first_only: true,
                expected_type: None,
            };
        }

        let (references, plain): (Vec<SearchTarget>, Vec<SearchTarget>) = targets
            .into_iter()
            .partition(|t| t.referenced_type().is_some());

        let mut sub_queries = Vec::new();
        let plain_clauses: Vec<FilterExpr> = plain
            .iter()
            .filter_map(|target| self.value_clause(target, value).0)
            .collect();
        if !plain.is_empty() {
            sub_queries.push(SubQuery {
                targets: plain,
                query: with_window(CatalogQuery::new(FilterExpr::any(plain_clauses)), limit),
                attribute_filter: AttributeFilter::new(),
                type_agnostic: false,
            });
        }
        for target in references {
            let (filter, attribute_filter) = self.value_clause(&target, value);
            sub_queries.push(SubQuery {
                targets: vec![target],
                query: with_window(CatalogQuery::new(filter), limit),
                attribute_filter,
                type_agnostic: false,
            });
        }

        SearchPlan {
            sub_queries,
            first_only: false,
            expected_type: self.expected_type(search),
        }
    }

    fn value_clause(&self, target: &SearchTarget, value: &str) -> (Option<FilterExpr>, AttributeFilter) {
        let (type_clause, attribute_filter) = target.type_clause();
        let fields = self.string_fields(target);
        let value_filter = if fields.is_empty() {
            default_value_filter(value)
        } else {
            FilterExpr::any(
                fields
                    .into_iter()
                    .map(|field| FilterExpr::contains(field, value))
                    .collect(),
            )
        };
        let filter = match value_filter {
            Some(f) => FilterExpr::all(vec![type_clause, f]),
            None => Some(type_clause),
        };
        (filter, attribute_filter)
    }

    /// Filterable catalog fields mapped to string attributes of a target.
    fn string_fields(&self, target: &SearchTarget) -> Vec<String> {
        let Some(mapping) = self
            .registry
            .property_mapping(&target.catalog_type, target.prefix.as_deref())
        else {
            return Vec::new();
        };
        let attributes = self
            .registry
            .all_attributes(&target.generic_type)
            .unwrap_or_default();
        let mut fields: Vec<String> = mapping
            .iter()
            .filter(|pair| {
                attributes
                    .get(&pair.generic)
                    .and_then(|a| a.primitive_kind())
                    == Some(PrimitiveKind::String)
            })
            .filter_map(|pair| filter_field(&pair.catalog))
            .collect();
        fields.dedup();
        fields
    }
}

fn property_clause(mapping: Option<&PropertyMapping>, name: &str, value: &PrimitiveValue) -> Clause {
    let Some(catalog_key) = mapping.and_then(|m| m.catalog_for(name)) else {
        debug!(property = %name, "No catalog mapping for match property");
        return Clause::Never;
    };
    let rendered = value.to_string();
    match CatalogSource::parse(catalog_key) {
        CatalogSource::Constant(literal) if literal == rendered => Clause::Always,
        CatalogSource::Constant(_) => Clause::Never,
        CatalogSource::Property(key) => match filter_field(key) {
            Some(field) => Clause::Filter(FilterExpr::contains(field, rendered)),
            None => {
                let attribute = key.strip_prefix(Namespace::Attribute.prefix()).unwrap_or(key);
                Clause::Deferred(attribute.to_string(), rendered)
            }
        },
    }
}

/// Field name for a catalog key in the filter language, or `None` for
/// free-form attributes, which the catalog cannot filter on.
fn filter_field(catalog_key: &str) -> Option<String> {
    match PropertyKey::parse(catalog_key) {
        Some(PropertyKey {
            namespace: Namespace::Instance,
            name,
        }) => Some(name.to_string()),
        Some(PropertyKey {
            namespace: Namespace::Definition,
            ..
        }) => Some(catalog_key.to_string()),
        _ => None,
    }
}

fn default_value_filter(value: &str) -> Option<FilterExpr> {
    FilterExpr::any(
        DEFAULT_VALUE_FIELDS
            .iter()
            .map(|field| FilterExpr::contains(*field, value))
            .collect(),
    )
}

/// Every sub-query starts at zero and fetches enough to fill the requested
/// page after merging.
fn window_limit(paging: &Paging) -> Option<usize> {
    match paging.page_size {
        0 => None,
        size => Some(paging.from_element.saturating_add(size)),
    }
}

fn with_window(query: CatalogQuery, limit: Option<usize>) -> CatalogQuery {
    let query = query.with_start(0);
    match limit {
        Some(limit) => query.with_limit(limit),
        None => query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{MappingRecord, MappingTable, PropertyRecord};
    use metabridge_proto::{InstanceProperties, TypeDef, TypeDefAttribute, TypeDefLink};
    use pretty_assertions::assert_eq;

    fn record(
        catalog: &str,
        generic: &str,
        prefix: Option<&str>,
        properties: &[(&str, &str)],
    ) -> MappingRecord {
        MappingRecord {
            catalog: catalog.to_string(),
            generic: generic.to_string(),
            prefix: prefix.map(str::to_string),
            property_mappings: if properties.is_empty() {
                None
            } else {
                Some(
                    properties
                        .iter()
                        .map(|(c, g)| PropertyRecord {
                            catalog: c.to_string(),
                            generic: g.to_string(),
                        })
                        .collect(),
                )
            },
            endpoint_mappings: None,
        }
    }

    fn registry() -> TypeMappingRegistry {
        let table = MappingTable::new(vec![
            record(
                "table",
                "RelationalTable",
                None,
                &[
                    ("instance.name", "qualifiedName"),
                    ("attribute.owner", "owner"),
                    ("constant.SQL", "dialect"),
                ],
            ),
            record("dataSet", "DataFile", None, &[("instance.name", "qualifiedName")]),
            record("table", "RelationalTableType", Some("TT"), &[("instance.label", "displayName")]),
            record("reference.Glossary", "Glossary", None, &[("instance.name", "qualifiedName")]),
        ])
        .unwrap();
        let registry = TypeMappingRegistry::from_table(&table, Vec::<String>::new());
        let string = |name: &str| TypeDefAttribute::primitive(name, PrimitiveKind::String);
        registry.register_implemented(
            TypeDef::entity("g-asset", "Asset").with_attribute(string("qualifiedName")),
        );
        for (guid, name) in [("g-table", "RelationalTable"), ("g-file", "DataFile")] {
            registry.register_implemented(
                TypeDef::entity(guid, name)
                    .with_super_type(TypeDefLink::new("g-asset", "Asset"))
                    .with_attribute(string("owner"))
                    .with_attribute(string("dialect")),
            );
        }
        registry.register_implemented(
            TypeDef::entity("g-tt", "RelationalTableType").with_attribute(string("displayName")),
        );
        registry.register_implemented(
            TypeDef::entity("g-glossary", "Glossary").with_attribute(string("qualifiedName")),
        );
        registry
    }

    fn filters(plan: &SearchPlan) -> Vec<String> {
        plan.sub_queries
            .iter()
            .map(|q| q.query.filter.as_ref().map(ToString::to_string).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_targets_fall_back_to_subtypes() {
        let registry = registry();
        let compiler = SearchCompiler::new(&registry);
        let targets = compiler.targets(Some("g-asset"));
        let types: Vec<&str> = targets.iter().map(|t| t.catalog_type.as_str()).collect();
        assert_eq!(types, vec!["dataSet", "table"]);
        assert!(compiler.targets(Some("g-unknown")).is_empty());
    }

    #[test]
    fn test_targets_without_type_put_unprefixed_first() {
        let registry = registry();
        let targets = SearchCompiler::new(&registry).targets(None);
        assert_eq!(targets.len(), 4);
        assert!(targets[..3].iter().all(|t| t.prefix.is_none()));
        assert_eq!(targets[3].prefix.as_deref(), Some("TT"));
    }

    #[test]
    fn test_compile_properties_all() {
        let registry = registry();
        let search = EntitySearch::new()
            .of_type("g-table")
            .matching(
                InstanceProperties::new()
                    .with("qualifiedName", "orders")
                    .with("owner", "finance"),
                MatchCriteria::All,
            )
            .with_paging(Paging::new(10, 10));
        let plan = SearchCompiler::new(&registry).compile_properties(&search);

        assert_eq!(filters(&plan), vec!["and(eq(type,table),contains(name,orders))"]);
        let sub = &plan.sub_queries[0];
        assert_eq!(sub.attribute_filter.get("owner").map(String::as_str), Some("finance"));
        assert_eq!(sub.query.start, Some(0));
        assert_eq!(sub.query.limit, Some(20));
        assert_eq!(plan.expected_type.as_deref(), Some("RelationalTable"));
    }

    #[test]
    fn test_compile_properties_any_and_constants() {
        let registry = registry();
        let compiler = SearchCompiler::new(&registry);

        let any = EntitySearch::new().of_type("g-table").matching(
            InstanceProperties::new()
                .with("qualifiedName", "orders")
                .with("displayName", "x"),
            MatchCriteria::Any,
        );
        assert_eq!(
            filters(&compiler.compile_properties(&any)),
            vec!["and(eq(type,table),contains(name,orders))"]
        );

        let constant = EntitySearch::new().of_type("g-table").matching(
            InstanceProperties::new().with("dialect", "SQL"),
            MatchCriteria::All,
        );
        assert_eq!(filters(&compiler.compile_properties(&constant)), vec!["eq(type,table)"]);

        let mismatch = EntitySearch::new().of_type("g-table").matching(
            InstanceProperties::new().with("dialect", "CSV"),
            MatchCriteria::All,
        );
        assert!(compiler.compile_properties(&mismatch).sub_queries.is_empty());
    }

    #[test]
    fn test_compile_properties_any_with_deferred_attribute() {
        let registry = registry();
        let search = EntitySearch::new().of_type("g-table").matching(
            InstanceProperties::new()
                .with("qualifiedName", "orders")
                .with("owner", "finance"),
            MatchCriteria::Any,
        );
        let plan = SearchCompiler::new(&registry).compile_properties(&search);
        assert_eq!(
            filters(&plan),
            vec!["and(eq(type,table),contains(name,orders))", "eq(type,table)"]
        );
        assert!(plan.sub_queries[0].attribute_filter.is_empty());
        assert_eq!(
            plan.sub_queries[1].attribute_filter,
            AttributeFilter::from([("owner".to_string(), "finance".to_string())])
        );

        let only_deferred = EntitySearch::new().of_type("g-table").matching(
            InstanceProperties::new()
                .with("owner", "finance")
                .with("displayName", "x"),
            MatchCriteria::Any,
        );
        let plan = SearchCompiler::new(&registry).compile_properties(&only_deferred);
        assert_eq!(filters(&plan), vec!["eq(type,table)"]);
        assert_eq!(plan.sub_queries[0].attribute_filter.len(), 1);
    }

    #[test]
    fn test_targets_without_type_include_unmapped_leaf_types() {
        let registry = registry();
        registry.register_implemented(TypeDef::entity("g-view", "view"));
        let targets = SearchCompiler::new(&registry).targets(None);
        let types: Vec<&str> = targets.iter().map(|t| t.catalog_type.as_str()).collect();
        assert!(types.contains(&"view"));
        assert!(!types.contains(&"Asset"));
        assert_eq!(targets.len(), 5);
    }

    #[test]
    fn test_compile_properties_per_subtype() {
        let registry = registry();
        let search = EntitySearch::new().of_type("g-asset").matching(
            InstanceProperties::new().with("qualifiedName", "sales data"),
            MatchCriteria::All,
        );
        let plan = SearchCompiler::new(&registry).compile_properties(&search);
        assert_eq!(
            filters(&plan),
            vec![
                "and(eq(type,dataSet),contains(name,\"sales data\"))",
                "and(eq(type,table),contains(name,\"sales data\"))",
            ]
        );
        assert_eq!(plan.sub_queries[0].query.limit, None);
    }

    #[test]
    fn test_reference_target() {
        let registry = registry();
        let search = EntitySearch::new().of_type("g-glossary");
        let plan = SearchCompiler::new(&registry).compile_properties(&search);
        assert_eq!(filters(&plan), vec!["eq(type,reference)"]);
        assert_eq!(
            plan.sub_queries[0]
                .attribute_filter
                .get(REFERENCED_TYPE_ATTRIBUTE)
                .map(String::as_str),
            Some("Glossary")
        );
    }

    #[test]
    fn test_compile_value_with_type() {
        let registry = registry();
        let search = EntitySearch::new().of_type("g-asset").matching_value("ord");
        let plan = SearchCompiler::new(&registry).compile_value(&search, "ord");
        assert_eq!(
            filters(&plan),
            vec!["or(and(eq(type,dataSet),contains(name,ord)),and(eq(type,table),contains(name,ord)))"]
        );
        assert_eq!(plan.sub_queries[0].targets.len(), 2);
        assert!(!plan.first_only);
    }

    #[test]
    fn test_compile_value_without_type_issues_first_only() {
        let registry = registry();
        let search = EntitySearch::new().matching_value("ord");
        let plan = SearchCompiler::new(&registry).compile_value(&search, "ord");
        assert!(plan.first_only);
        assert_eq!(plan.sub_queries.len(), 4);
        assert_eq!(plan.issued().len(), 1);
        assert_eq!(
            filters(&plan)[0],
            "or(contains(name,ord),contains(label,ord),contains(description,ord))"
        );
        assert_eq!(plan.issued()[0].prefixes_for("anything"), vec![None]);
    }

    #[test]
    fn test_prefixes_for() {
        let sub = SubQuery {
            targets: vec![
                SearchTarget {
                    prefix: None,
                    catalog_type: "table".to_string(),
                    generic_type: "RelationalTable".to_string(),
                },
                SearchTarget {
                    prefix: Some("TT".to_string()),
                    catalog_type: "table".to_string(),
                    generic_type: "RelationalTableType".to_string(),
                },
            ],
            query: CatalogQuery::default(),
            attribute_filter: AttributeFilter::new(),
            type_agnostic: false,
        };
        assert_eq!(sub.prefixes_for("table"), vec![None, Some("TT")]);
        assert!(sub.prefixes_for("column").is_empty());
    }
}
