//! Offline operations on a mapping table.

use std::collections::{BTreeMap, BTreeSet};

use metabridge_core::mapping::MappingTable;
use metabridge_core::query::SearchPlan;
use metabridge_core::{SearchCompiler, TypeMappingRegistry};
use metabridge_proto::{
    EntitySearch, InstanceProperties, MatchCriteria, Paging, PrimitiveValue, TypeDef,
};
use serde::Serialize;
use tracing::debug;

/// One catalog type behind an open-metadata type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
    pub prefix: Option<String>,
    pub catalog_type: String,
    pub mapped_properties: usize,
    /// Endpoint roles, when the pair maps to a relationship.
    pub endpoints: Option<[String; 2]>,
}

/// How one open-metadata type is backed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeReport {
    pub generic_type: String,
    pub category: String,
    pub targets: Vec<TargetReport>,
}

/// Summary of a validated mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingReport {
    pub records: usize,
    pub types: Vec<TypeReport>,
}

/// One catalog query as it would be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryReport {
    pub targets: Vec<String>,
    pub filter: Option<String>,
    pub limit: Option<usize>,
    pub attribute_filter: BTreeMap<String, String>,
}

/// The catalog queries compiled for a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    pub expected_type: Option<String>,
    pub queries: Vec<QueryReport>,
    /// Queries compiled but never sent.
    pub skipped: usize,
}

/// A search described on the command line.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub type_name: Option<String>,
    pub properties: Vec<(String, String)>,
    pub any: bool,
    pub value: Option<String>,
    pub from: usize,
    pub page_size: usize,
}

/// Build a registry for the table with every mapped type implemented.
///
/// Types are registered under their name as GUID. A type is a relationship
/// when any of its records carries endpoint mappings.
pub fn registry_for(table: &MappingTable) -> TypeMappingRegistry {
    let registry = TypeMappingRegistry::from_table(table, Vec::<String>::new());
    let mut relationships = BTreeSet::new();
    let mut names = BTreeSet::new();
    for record in table.records() {
        if record.endpoint_mappings.is_some() {
            relationships.insert(record.generic.clone());
        }
        names.insert(record.generic.clone());
    }
    for name in names {
        let def = if relationships.contains(&name) {
            TypeDef::relationship(name.as_str(), name.as_str())
        } else {
            TypeDef::entity(name.as_str(), name.as_str())
        };
        debug!(type_name = %name, category = ?def.category, "Registering mapped type");
        registry.register_implemented(def);
    }
    registry
}

/// Describe every mapped type of the table.
pub fn inspect(table: &MappingTable) -> MappingReport {
    let registry = registry_for(table);
    let mut defs = registry.all_type_defs();
    defs.sort_by(|a, b| a.name.cmp(&b.name));

    let types = defs
        .into_iter()
        .map(|def| {
            let targets = registry
                .all_catalog_names_for(&def.name)
                .into_iter()
                .map(|(prefix, catalog_type)| {
                    let mapped_properties = registry
                        .property_mapping(&catalog_type, prefix.as_deref())
                        .map_or(0, |m| m.len());
                    let endpoints = registry
                        .endpoint_mapping(&catalog_type, prefix.as_deref())
                        .map(|m| [m.one.generic_role, m.two.generic_role]);
                    TargetReport {
                        prefix,
                        catalog_type,
                        mapped_properties,
                        endpoints,
                    }
                })
                .collect();
            TypeReport {
                generic_type: def.name,
                category: def.category.to_string(),
                targets,
            }
        })
        .collect();

    MappingReport {
        records: table.len(),
        types,
    }
}

/// Compile a search into the catalog queries it would issue.
pub fn compile(table: &MappingTable, request: &SearchRequest) -> PlanReport {
    let registry = registry_for(table);
    let compiler = SearchCompiler::new(&registry);
    let search = request.to_search();
    let plan = match &request.value {
        Some(value) => compiler.compile_value(&search, value),
        None => compiler.compile_properties(&search),
    };
    plan_report(&plan)
}

fn plan_report(plan: &SearchPlan) -> PlanReport {
    let queries: Vec<QueryReport> = plan
        .issued()
        .iter()
        .map(|sub| QueryReport {
            targets: sub
                .targets
                .iter()
                .map(|t| match &t.prefix {
                    Some(prefix) => format!("{}:{} ({})", prefix, t.catalog_type, t.generic_type),
                    None => format!("{} ({})", t.catalog_type, t.generic_type),
                })
                .collect(),
            filter: sub.query.filter.as_ref().map(ToString::to_string),
            limit: sub.query.limit,
            attribute_filter: sub.attribute_filter.clone(),
        })
        .collect();
    PlanReport {
        expected_type: plan.expected_type.clone(),
        skipped: plan.sub_queries.len() - queries.len(),
        queries,
    }
}

impl SearchRequest {
    fn to_search(&self) -> EntitySearch {
        let mut search = EntitySearch::new().with_paging(Paging::new(self.from, self.page_size));
        if let Some(type_name) = &self.type_name {
            search = search.of_type(type_name.as_str());
        }
        if !self.properties.is_empty() {
            let mut properties = InstanceProperties::new();
            for (name, value) in &self.properties {
                properties.set_primitive(name.as_str(), parse_value(value));
            }
            let criteria = if self.any {
                MatchCriteria::Any
            } else {
                MatchCriteria::All
            };
            search = search.matching(properties, criteria);
        }
        search
    }
}

/// Parse a `name=value` match property.
pub fn parse_property(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{}'", arg)),
    }
}

/// Integers and booleans keep their type; everything else is a string.
fn parse_value(value: &str) -> PrimitiveValue {
    if let Ok(n) = value.parse::<i64>() {
        PrimitiveValue::Long(n)
    } else if let Ok(b) = value.parse::<bool>() {
        PrimitiveValue::Boolean(b)
    } else {
        PrimitiveValue::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MAPPINGS: &str = r#"[
        {"catalog": "table", "generic": "RelationalTable",
         "propertyMappings": [{"catalog": "attribute.owner", "generic": "owner"}]},
        {"catalog": "table", "generic": "TabularSchemaType", "prefix": "TT"},
        {"catalog": "table", "generic": "SchemaTypeLink", "prefix": "ST",
         "endpointMappings": [
            {"catalog": "table", "generic": "table"},
            {"catalog": "table", "generic": "schemaType", "prefix": "TT"}]}
    ]"#;

    fn table() -> MappingTable {
        MappingTable::from_json_str(MAPPINGS).unwrap()
    }

    #[test]
    fn test_parse_property() {
        assert_eq!(
            parse_property("owner=finance").unwrap(),
            ("owner".to_string(), "finance".to_string())
        );
        assert_eq!(
            parse_property("expr=a=b").unwrap(),
            ("expr".to_string(), "a=b".to_string())
        );
        assert!(parse_property("owner").is_err());
        assert!(parse_property("=x").is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), PrimitiveValue::Long(42));
        assert_eq!(parse_value("true"), PrimitiveValue::Boolean(true));
        assert_eq!(parse_value("orders"), PrimitiveValue::String("orders".to_string()));
    }

    #[test]
    fn test_inspect() {
        let report = inspect(&table());
        assert_eq!(report.records, 3);
        let names: Vec<&str> = report.types.iter().map(|t| t.generic_type.as_str()).collect();
        assert_eq!(names, vec!["RelationalTable", "SchemaTypeLink", "TabularSchemaType"]);

        let link = &report.types[1];
        assert_eq!(link.category, "relationship");
        assert_eq!(
            link.targets,
            vec![TargetReport {
                prefix: Some("ST".to_string()),
                catalog_type: "table".to_string(),
                mapped_properties: 0,
                endpoints: Some(["table".to_string(), "schemaType".to_string()]),
            }]
        );
        assert_eq!(report.types[0].targets[0].mapped_properties, 1);
    }

    #[test]
    fn test_compile_property_search() {
        let request = SearchRequest {
            type_name: Some("RelationalTable".to_string()),
            properties: vec![("owner".to_string(), "finance".to_string())],
            page_size: 10,
            ..Default::default()
        };
        let report = compile(&table(), &request);
        assert_eq!(report.expected_type.as_deref(), Some("RelationalTable"));
        assert_eq!(report.skipped, 0);
        assert_eq!(report.queries.len(), 1);
        assert_eq!(report.queries[0].targets, vec!["table (RelationalTable)".to_string()]);
        assert_eq!(report.queries[0].limit, Some(10));
        assert!(report.queries[0].filter.is_some());
    }

    #[test]
    fn test_compile_untyped_value_search_sends_one_query() {
        let request = SearchRequest {
            value: Some("orders".to_string()),
            ..Default::default()
        };
        let report = compile(&table(), &request);
        assert_eq!(report.queries.len(), 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.queries[0].limit, None);
    }
}
