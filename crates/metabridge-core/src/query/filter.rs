//! Catalog filter expressions.
//!
//! The catalog's list endpoints accept a small prefix-notation language:
//! `eq(field,value)`, `contains(field,value)`, `and(a,b,...)` and
//! `or(a,b,...)`. [`FilterExpr`] renders to that text through `Display`, and
//! [`FilterEvaluator`] evaluates it against a [`CatalogObject`] for in-memory
//! catalogs.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::{CatalogObject, CatalogValue, PropertyKey};

/// Free-form attribute constraints applied after the catalog query.
///
/// Keys are bare attribute names; values must equal the attribute's string
/// rendering exactly.
pub type AttributeFilter = BTreeMap<String, String>;

/// A catalog filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    /// Field equals value.
    Eq { field: String, value: String },
    /// Field contains value, ignoring case.
    Contains { field: String, value: String },
    /// Every operand matches.
    And(Vec<FilterExpr>),
    /// At least one operand matches.
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpr::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a substring filter.
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpr::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Conjunction of the operands; `None` when there are none and the
    /// operand itself when there is only one.
    pub fn all(operands: Vec<FilterExpr>) -> Option<Self> {
        Self::combine(operands, FilterExpr::And)
    }

    /// Disjunction of the operands, collapsing like [`FilterExpr::all`].
    pub fn any(operands: Vec<FilterExpr>) -> Option<Self> {
        Self::combine(operands, FilterExpr::Or)
    }

    fn combine(mut operands: Vec<FilterExpr>, op: fn(Vec<FilterExpr>) -> FilterExpr) -> Option<Self> {
        match operands.len() {
            0 => None,
            1 => operands.pop(),
            _ => Some(op(operands)),
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Eq { field, value } => write!(f, "eq({},{})", field, quote_value(value)),
            FilterExpr::Contains { field, value } => {
                write!(f, "contains({},{})", field, quote_value(value))
            }
            FilterExpr::And(operands) => write_operator(f, "and", operands),
            FilterExpr::Or(operands) => write_operator(f, "or", operands),
        }
    }
}

fn write_operator(f: &mut fmt::Formatter<'_>, name: &str, operands: &[FilterExpr]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", operand)?;
    }
    f.write_str(")")
}

/// Quote a value if it is empty or contains characters significant to the
/// filter language.
pub fn quote_value(value: &str) -> Cow<'_, str> {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | ',' | '"' | '\\'));
    if !needs_quotes {
        return Cow::Borrowed(value);
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

/// Evaluates filter expressions against catalog objects.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Evaluate a filter expression against an object.
    ///
    /// Bare field names address the instance namespace; `type` falls back to
    /// the definition name when the instance carries no `type` field.
    pub fn evaluate(filter: &FilterExpr, object: &CatalogObject) -> bool {
        match filter {
            FilterExpr::Eq { field, value } => Self::field_value(object, field)
                .map(|v| v.to_string() == *value)
                .unwrap_or(false),
            FilterExpr::Contains { field, value } => Self::field_value(object, field)
                .map(|v| v.to_string().to_lowercase().contains(&value.to_lowercase()))
                .unwrap_or(false),
            FilterExpr::And(operands) => operands.iter().all(|op| Self::evaluate(op, object)),
            FilterExpr::Or(operands) => operands.iter().any(|op| Self::evaluate(op, object)),
        }
    }

    /// Check free-form attributes against an attribute filter.
    pub fn matches_attributes(filter: &AttributeFilter, object: &CatalogObject) -> bool {
        filter.iter().all(|(name, expected)| {
            object
                .attribute(name)
                .map(|actual| actual.to_string() == *expected)
                .unwrap_or(false)
        })
    }

    fn field_value<'a>(object: &'a CatalogObject, field: &str) -> Option<&'a CatalogValue> {
        if PropertyKey::parse(field).is_some() {
            return object.get(field);
        }
        let key = format!("instance.{}", field);
        match object.get(&key) {
            Some(value) => Some(value),
            None if field == "type" => object.get("definition.name"),
            None => None,
        }
    }
}
