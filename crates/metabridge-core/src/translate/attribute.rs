//! Conversion of single catalog values into typed property values.

use std::cmp::Ordering;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use metabridge_proto::{InstanceProperties, PrimitiveKind, PrimitiveValue, TypeDefAttribute};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::catalog::CatalogValue;

/// ISO-8601 instants with millisecond (or centisecond) precision.
fn is_iso_instant(s: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{2,3}Z$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(s))
}

/// Why a value could not be converted.
#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("primitive kind {0} is not supported")]
    Unsupported(PrimitiveKind),

    #[error("cannot convert {value} to {kind}")]
    Invalid { kind: PrimitiveKind, value: String },
}

fn invalid(kind: PrimitiveKind, raw: &CatalogValue) -> ConversionError {
    ConversionError::Invalid {
        kind,
        value: raw.to_string(),
    }
}

/// Parse a catalog timestamp: a native date or an RFC 3339 string.
pub fn parse_timestamp(raw: &CatalogValue) -> Option<DateTime<Utc>> {
    match raw {
        CatalogValue::Timestamp(t) => Some(*t),
        CatalogValue::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    }
}

/// Converts between catalog values and typed open-metadata values.
pub struct AttributeTranslator;

impl AttributeTranslator {
    /// Convert a raw value to the given primitive kind.
    pub fn convert(kind: PrimitiveKind, raw: &CatalogValue) -> Result<PrimitiveValue, ConversionError> {
        match kind {
            PrimitiveKind::Boolean => Ok(PrimitiveValue::Boolean(match raw {
                CatalogValue::Bool(b) => *b,
                other => other.to_string().eq_ignore_ascii_case("true"),
            })),
            PrimitiveKind::Int => {
                let value = match raw {
                    CatalogValue::Int(i) => i32::try_from(*i).map_err(|_| invalid(kind, raw))?,
                    CatalogValue::Float(f) => *f as i32,
                    other => other
                        .to_string()
                        .trim()
                        .parse::<i32>()
                        .map_err(|_| invalid(kind, raw))?,
                };
                Ok(PrimitiveValue::Int(value))
            }
            PrimitiveKind::Long => {
                let value = match raw {
                    CatalogValue::Int(i) => *i,
                    CatalogValue::Float(f) => *f as i64,
                    other => other
                        .to_string()
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| invalid(kind, raw))?,
                };
                Ok(PrimitiveValue::Long(value))
            }
            PrimitiveKind::Float => {
                let value = match raw {
                    CatalogValue::Int(i) => *i as f32,
                    CatalogValue::Float(f) => *f as f32,
                    other => other
                        .to_string()
                        .trim()
                        .parse::<f32>()
                        .map_err(|_| invalid(kind, raw))?,
                };
                Ok(PrimitiveValue::Float(value))
            }
            PrimitiveKind::String => Ok(PrimitiveValue::String(raw.to_string())),
            PrimitiveKind::Date => {
                let millis = match raw {
                    CatalogValue::Timestamp(t) => t.timestamp_millis(),
                    CatalogValue::String(s) if is_iso_instant(s) => parse_timestamp(raw)
                        .map(|t| t.timestamp_millis())
                        .ok_or_else(|| invalid(kind, raw))?,
                    CatalogValue::Int(i) => *i,
                    _ => return Err(invalid(kind, raw)),
                };
                Ok(PrimitiveValue::Date(millis))
            }
            other => Err(ConversionError::Unsupported(other)),
        }
    }

    /// Convert a raw value for an attribute, logging and returning `None`
    /// when the attribute kind is unsupported or the value does not convert.
    pub fn to_generic_value(attribute: &TypeDefAttribute, raw: &CatalogValue) -> Option<PrimitiveValue> {
        if raw.is_null() {
            debug!(attribute = %attribute.name, "Null property");
            return None;
        }
        let Some(kind) = attribute.primitive_kind() else {
            error!(attribute = %attribute.name, kind = ?attribute.kind, "Cannot translate non-primitive property");
            return None;
        };
        match Self::convert(kind, raw) {
            Ok(value) => Some(value),
            Err(err @ ConversionError::Unsupported(_)) => {
                error!(attribute = %attribute.name, error = %err, "Unhandled primitive type");
                None
            }
            Err(err) => {
                warn!(attribute = %attribute.name, error = %err, "Unable to convert property value");
                None
            }
        }
    }

    /// Convert and add a property; returns whether it was added.
    pub fn add_property(
        properties: &mut InstanceProperties,
        attribute: &TypeDefAttribute,
        raw: &CatalogValue,
    ) -> bool {
        match Self::to_generic_value(attribute, raw) {
            Some(value) => {
                properties.set_primitive(attribute.name.clone(), value);
                true
            }
            None => false,
        }
    }

    /// Check a typed value against a raw catalog value.
    ///
    /// Strings match as a regular expression over the whole raw string, so
    /// `^AB.*` matches `ABC123`. Dates compare as epoch milliseconds.
    pub fn values_match(generic: Option<&PrimitiveValue>, raw: Option<&CatalogValue>) -> bool {
        let (generic, raw) = match (generic, raw) {
            (None, None) => return true,
            (Some(g), Some(r)) => (g, r),
            _ => return false,
        };
        match generic {
            PrimitiveValue::Boolean(b) => raw.as_bool() == Some(*b),
            PrimitiveValue::Int(i) => raw.as_i64() == Some(*i as i64),
            PrimitiveValue::Long(l) => raw.as_i64() == Some(*l),
            PrimitiveValue::Float(f) => raw.as_f64() == Some(*f as f64),
            PrimitiveValue::Double(d) => raw.as_f64() == Some(*d),
            PrimitiveValue::String(pattern) => match raw.as_str() {
                Some(candidate) => Self::pattern_matches(pattern, candidate),
                None => false,
            },
            PrimitiveValue::Date(millis) => match raw {
                CatalogValue::Timestamp(t) => t.timestamp_millis() == *millis,
                CatalogValue::Int(i) => i == millis,
                _ => false,
            },
        }
    }

    fn pattern_matches(pattern: &str, candidate: &str) -> bool {
        match Regex::new(&format!("^(?:{})$", pattern)) {
            Ok(re) => re.is_match(candidate),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Invalid match pattern");
                false
            }
        }
    }

    /// Order two typed values; absent values sort first.
    pub fn compare(a: Option<&PrimitiveValue>, b: Option<&PrimitiveValue>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (Some(a), Some(b)) if std::ptr::eq(a, b) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => Self::compare_values(a, b),
        }
    }

    fn compare_values(a: &PrimitiveValue, b: &PrimitiveValue) -> Ordering {
        use PrimitiveValue as V;
        match (a, b) {
            (V::Boolean(x), V::Boolean(y)) => x.cmp(y),
            (V::String(x), V::String(y)) => x.cmp(y),
            (V::Date(x), V::Date(y)) => x.cmp(y),
            (V::Int(_) | V::Long(_), V::Int(_) | V::Long(_)) => a.as_i64().cmp(&b.as_i64()),
            _ => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => a.kind().name().cmp(b.kind().name()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn attr(kind: PrimitiveKind) -> TypeDefAttribute {
        TypeDefAttribute::primitive("p", kind)
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(
            AttributeTranslator::convert(PrimitiveKind::Boolean, &CatalogValue::Bool(true)),
            Ok(PrimitiveValue::Boolean(true))
        );
        assert_eq!(
            AttributeTranslator::convert(PrimitiveKind::Boolean, &CatalogValue::from("TRUE")),
            Ok(PrimitiveValue::Boolean(true))
        );
        assert_eq!(
            AttributeTranslator::convert(PrimitiveKind::Boolean, &CatalogValue::from("yes")),
            Ok(PrimitiveValue::Boolean(false))
        );
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(
            AttributeTranslator::convert(PrimitiveKind::Int, &CatalogValue::from("42")),
            Ok(PrimitiveValue::Int(42))
        );
        assert_eq!(
            AttributeTranslator::convert(PrimitiveKind::Int, &CatalogValue::Float(7.9)),
            Ok(PrimitiveValue::Int(7))
        );
        assert_eq!(
            AttributeTranslator::convert(PrimitiveKind::Long, &CatalogValue::Int(1 << 40)),
            Ok(PrimitiveValue::Long(1 << 40))
        );
        assert_eq!(
            AttributeTranslator::convert(PrimitiveKind::Float, &CatalogValue::from("1.5")),
            Ok(PrimitiveValue::Float(1.5))
        );
        assert!(matches!(
            AttributeTranslator::convert(PrimitiveKind::Int, &CatalogValue::from("abc")),
            Err(ConversionError::Invalid { .. })
        ));
        assert!(AttributeTranslator::convert(PrimitiveKind::Int, &CatalogValue::Int(1 << 40)).is_err());
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(
            AttributeTranslator::convert(PrimitiveKind::String, &CatalogValue::Int(5)),
            Ok(PrimitiveValue::String("5".into()))
        );
    }

    #[test]
    fn test_date_coercion() {
        let ts = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        let millis = ts.timestamp_millis();
        assert_eq!(
            AttributeTranslator::convert(PrimitiveKind::Date, &CatalogValue::Timestamp(ts)),
            Ok(PrimitiveValue::Date(millis))
        );
        assert_eq!(
            AttributeTranslator::convert(
                PrimitiveKind::Date,
                &CatalogValue::from("2021-03-04T05:06:07.000Z")
            ),
            Ok(PrimitiveValue::Date(millis))
        );
        assert_eq!(
            AttributeTranslator::convert(PrimitiveKind::Date, &CatalogValue::Int(millis)),
            Ok(PrimitiveValue::Date(millis))
        );
        assert!(AttributeTranslator::convert(PrimitiveKind::Date, &CatalogValue::from("yesterday")).is_err());
    }

    #[test]
    fn test_unsupported_kind_is_skipped() {
        assert_eq!(
            AttributeTranslator::convert(PrimitiveKind::Double, &CatalogValue::Float(1.0)),
            Err(ConversionError::Unsupported(PrimitiveKind::Double))
        );
        let mut props = InstanceProperties::new();
        assert!(!AttributeTranslator::add_property(
            &mut props,
            &attr(PrimitiveKind::Char),
            &CatalogValue::from("c")
        ));
        assert!(props.is_empty());
    }

    #[test]
    fn test_add_property() {
        let mut props = InstanceProperties::new();
        assert!(AttributeTranslator::add_property(
            &mut props,
            &attr(PrimitiveKind::Long),
            &CatalogValue::Int(9)
        ));
        assert!(!AttributeTranslator::add_property(
            &mut props,
            &attr(PrimitiveKind::Long),
            &CatalogValue::Null
        ));
        assert_eq!(props.primitive("p"), Some(&PrimitiveValue::Long(9)));
    }

    #[test]
    fn test_values_match_pattern_semantics() {
        let pattern = PrimitiveValue::from("^AB.*");
        assert!(AttributeTranslator::values_match(
            Some(&pattern),
            Some(&CatalogValue::from("ABC123"))
        ));
        assert!(!AttributeTranslator::values_match(
            Some(&PrimitiveValue::from("AB")),
            Some(&CatalogValue::from("ABC123"))
        ));
        assert!(!AttributeTranslator::values_match(
            Some(&PrimitiveValue::from("(")),
            Some(&CatalogValue::from("("))
        ));
    }

    #[test]
    fn test_values_match_nulls_and_numbers() {
        assert!(AttributeTranslator::values_match(None, None));
        assert!(!AttributeTranslator::values_match(None, Some(&CatalogValue::Int(1))));
        assert!(AttributeTranslator::values_match(
            Some(&PrimitiveValue::Int(3)),
            Some(&CatalogValue::Int(3))
        ));
        assert!(!AttributeTranslator::values_match(
            Some(&PrimitiveValue::Boolean(true)),
            Some(&CatalogValue::from("true"))
        ));
        let ts = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert!(AttributeTranslator::values_match(
            Some(&PrimitiveValue::Date(ts.timestamp_millis())),
            Some(&CatalogValue::Timestamp(ts))
        ));
    }

    #[test]
    fn test_compare() {
        let one = PrimitiveValue::Int(1);
        let two = PrimitiveValue::Long(2);
        assert_eq!(AttributeTranslator::compare(None, Some(&one)), Ordering::Less);
        assert_eq!(AttributeTranslator::compare(Some(&one), None), Ordering::Greater);
        assert_eq!(AttributeTranslator::compare(None, None), Ordering::Equal);
        assert_eq!(AttributeTranslator::compare(Some(&one), Some(&one)), Ordering::Equal);
        assert_eq!(AttributeTranslator::compare(Some(&one), Some(&two)), Ordering::Less);
        assert_eq!(
            AttributeTranslator::compare(
                Some(&PrimitiveValue::from("b")),
                Some(&PrimitiveValue::from("a"))
            ),
            Ordering::Greater
        );
        assert_eq!(
            AttributeTranslator::compare(
                Some(&PrimitiveValue::Float(1.5)),
                Some(&PrimitiveValue::Int(2))
            ),
            Ordering::Less
        );
    }

    #[test]
    fn test_parse_timestamp() {
        let parsed = parse_timestamp(&CatalogValue::from("2020-05-06T07:08:09.123456Z")).unwrap();
        assert_eq!(parsed.timestamp_subsec_micros(), 123456);
        assert!(parse_timestamp(&CatalogValue::from("not a date")).is_none());
        assert!(parse_timestamp(&CatalogValue::Int(5)).is_none());
    }
}
