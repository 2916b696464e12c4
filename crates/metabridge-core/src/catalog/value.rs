//! Raw values as returned by the catalog.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// A raw catalog value.
///
/// Catalog responses are loosely typed JSON; this keeps their shape while
/// letting a decoded timestamp travel as a native date.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    List(Vec<CatalogValue>),
    Map(BTreeMap<String, CatalogValue>),
}

impl CatalogValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, CatalogValue::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CatalogValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64. Floats with no fractional part convert.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CatalogValue::Int(i) => Some(*i),
            CatalogValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CatalogValue::Int(i) => Some(*i as f64),
            CatalogValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CatalogValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a native timestamp.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            CatalogValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for CatalogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogValue::Null => f.write_str("null"),
            CatalogValue::Bool(b) => write!(f, "{}", b),
            CatalogValue::Int(i) => write!(f, "{}", i),
            CatalogValue::Float(v) => write!(f, "{}", v),
            CatalogValue::String(s) => f.write_str(s),
            CatalogValue::Timestamp(t) => {
                f.write_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            CatalogValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            CatalogValue::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<serde_json::Value> for CatalogValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CatalogValue::Null,
            serde_json::Value::Bool(b) => CatalogValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => CatalogValue::Int(i),
                None => CatalogValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => CatalogValue::String(s),
            serde_json::Value::Array(items) => {
                CatalogValue::List(items.into_iter().map(CatalogValue::from).collect())
            }
            serde_json::Value::Object(map) => CatalogValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, CatalogValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for CatalogValue {
    fn from(v: bool) -> Self {
        CatalogValue::Bool(v)
    }
}

impl From<i64> for CatalogValue {
    fn from(v: i64) -> Self {
        CatalogValue::Int(v)
    }
}

impl From<i32> for CatalogValue {
    fn from(v: i32) -> Self {
        CatalogValue::Int(v as i64)
    }
}

impl From<f64> for CatalogValue {
    fn from(v: f64) -> Self {
        CatalogValue::Float(v)
    }
}

impl From<&str> for CatalogValue {
    fn from(v: &str) -> Self {
        CatalogValue::String(v.to_string())
    }
}

impl From<String> for CatalogValue {
    fn from(v: String) -> Self {
        CatalogValue::String(v)
    }
}

impl From<DateTime<Utc>> for CatalogValue {
    fn from(v: DateTime<Utc>) -> Self {
        CatalogValue::Timestamp(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = CatalogValue::from(json!({"a": 1, "b": [true, "x"], "c": 2.5, "d": null}));
        let CatalogValue::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(map["a"], CatalogValue::Int(1));
        assert_eq!(
            map["b"],
            CatalogValue::List(vec![CatalogValue::Bool(true), CatalogValue::from("x")])
        );
        assert_eq!(map["c"].as_f64(), Some(2.5));
        assert!(map["d"].is_null());
    }

    #[test]
    fn test_display() {
        assert_eq!(CatalogValue::from("plain").to_string(), "plain");
        assert_eq!(CatalogValue::Int(42).to_string(), "42");
        assert_eq!(
            CatalogValue::List(vec![CatalogValue::Int(1), CatalogValue::Int(2)]).to_string(),
            "[1, 2]"
        );
        let ts = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            CatalogValue::Timestamp(ts).to_string(),
            "2020-01-02T03:04:05.000Z"
        );
    }

    #[test]
    fn test_integral_float_as_i64() {
        assert_eq!(CatalogValue::Float(3.0).as_i64(), Some(3));
        assert_eq!(CatalogValue::Float(3.5).as_i64(), None);
    }
}
