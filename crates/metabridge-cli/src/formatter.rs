//! Output formatters for command reports.

use std::fmt::Write;

use clap::ValueEnum;

use crate::commands::{MappingReport, PlanReport};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// Pretty-printed JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Formats command reports.
pub trait Formatter {
    fn format_mapping(&self, report: &MappingReport) -> Result<String, serde_json::Error>;

    fn format_plan(&self, report: &PlanReport) -> Result<String, serde_json::Error>;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Indented plain text.
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_mapping(&self, report: &MappingReport) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        let _ = writeln!(out, "{} records, {} types", report.records, report.types.len());
        for ty in &report.types {
            let _ = writeln!(out, "{} [{}]", ty.generic_type, ty.category);
            for target in &ty.targets {
                let prefix = target.prefix.as_deref().unwrap_or("-");
                let _ = write!(
                    out,
                    "  {:<6} {} ({} properties)",
                    prefix, target.catalog_type, target.mapped_properties
                );
                if let Some([one, two]) = &target.endpoints {
                    let _ = write!(out, " {} <-> {}", one, two);
                }
                out.push('\n');
            }
        }
        Ok(out)
    }

    fn format_plan(&self, report: &PlanReport) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        if let Some(expected) = &report.expected_type {
            let _ = writeln!(out, "expected type: {}", expected);
        }
        if report.queries.is_empty() {
            out.push_str("no catalog queries\n");
        }
        for (i, query) in report.queries.iter().enumerate() {
            let _ = writeln!(out, "query {}: {}", i + 1, query.targets.join(", "));
            let _ = writeln!(out, "  filter: {}", query.filter.as_deref().unwrap_or("(none)"));
            if let Some(limit) = query.limit {
                let _ = writeln!(out, "  limit: {}", limit);
            }
            for (attribute, value) in &query.attribute_filter {
                let _ = writeln!(out, "  post-filter: attribute.{} = {}", attribute, value);
            }
        }
        if report.skipped > 0 {
            let _ = writeln!(out, "{} further queries compiled but not sent", report.skipped);
        }
        Ok(out)
    }
}

/// Pretty-printed JSON.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_mapping(&self, report: &MappingReport) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(report)
    }

    fn format_plan(&self, report: &PlanReport) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{QueryReport, TargetReport, TypeReport};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn plan() -> PlanReport {
        let mut attribute_filter = BTreeMap::new();
        attribute_filter.insert("owner".to_string(), "finance".to_string());
        PlanReport {
            expected_type: Some("RelationalTable".to_string()),
            queries: vec![QueryReport {
                targets: vec!["table (RelationalTable)".to_string()],
                filter: Some("eq(type,table)".to_string()),
                limit: Some(10),
                attribute_filter,
            }],
            skipped: 0,
        }
    }

    #[test]
    fn test_text_plan() {
        let text = TextFormatter.format_plan(&plan()).unwrap();
        assert_eq!(
            text,
            "expected type: RelationalTable\n\
             query 1: table (RelationalTable)\n  \
             filter: eq(type,table)\n  \
             limit: 10\n  \
             post-filter: attribute.owner = finance\n"
        );
    }

    #[test]
    fn test_text_mapping() {
        let report = MappingReport {
            records: 1,
            types: vec![TypeReport {
                generic_type: "SchemaTypeLink".to_string(),
                category: "relationship".to_string(),
                targets: vec![TargetReport {
                    prefix: Some("ST".to_string()),
                    catalog_type: "table".to_string(),
                    mapped_properties: 0,
                    endpoints: Some(["table".to_string(), "schemaType".to_string()]),
                }],
            }],
        };
        let text = TextFormatter.format_mapping(&report).unwrap();
        assert_eq!(
            text,
            "1 records, 1 types\n\
             SchemaTypeLink [relationship]\n  \
             ST     table (0 properties) table <-> schemaType\n"
        );
    }

    #[test]
    fn test_json_plan() {
        let json = JsonFormatter.format_plan(&plan()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["queries"][0]["limit"], 10);
        assert_eq!(value["queries"][0]["attribute_filter"]["owner"], "finance");
    }
}
