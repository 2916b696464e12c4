//! Typed property values for open-metadata instances.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the free-form string map that carries properties with no typed home.
pub const ADDITIONAL_PROPERTIES: &str = "additionalProperties";

/// Declared primitive kind of a type-definition attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    String,
    Date,
    Unknown,
}

impl PrimitiveKind {
    /// Get the kind name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::BigInteger => "biginteger",
            PrimitiveKind::BigDecimal => "bigdecimal",
            PrimitiveKind::String => "string",
            PrimitiveKind::Date => "date",
            PrimitiveKind::Unknown => "unknown",
        }
    }

    /// Check if this is a numeric kind.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Int
                | PrimitiveKind::Long
                | PrimitiveKind::Float
                | PrimitiveKind::Double
                | PrimitiveKind::BigInteger
                | PrimitiveKind::BigDecimal
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed primitive value.
///
/// Dates are carried as milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PrimitiveValue {
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Date(i64),
}

impl PrimitiveValue {
    /// The primitive kind of this value.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveValue::Boolean(_) => PrimitiveKind::Boolean,
            PrimitiveValue::Int(_) => PrimitiveKind::Int,
            PrimitiveValue::Long(_) => PrimitiveKind::Long,
            PrimitiveValue::Float(_) => PrimitiveKind::Float,
            PrimitiveValue::Double(_) => PrimitiveKind::Double,
            PrimitiveValue::String(_) => PrimitiveKind::String,
            PrimitiveValue::Date(_) => PrimitiveKind::Date,
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrimitiveValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64, widening smaller integers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrimitiveValue::Int(i) => Some(*i as i64),
            PrimitiveValue::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Try to get as f64, widening any numeric kind.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PrimitiveValue::Int(i) => Some(*i as f64),
            PrimitiveValue::Long(l) => Some(*l as f64),
            PrimitiveValue::Float(f) => Some(*f as f64),
            PrimitiveValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrimitiveValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a date (epoch milliseconds).
    pub fn as_date(&self) -> Option<i64> {
        match self {
            PrimitiveValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Boolean(b) => write!(f, "{}", b),
            PrimitiveValue::Int(i) => write!(f, "{}", i),
            PrimitiveValue::Long(l) => write!(f, "{}", l),
            PrimitiveValue::Float(v) => write!(f, "{}", v),
            PrimitiveValue::Double(v) => write!(f, "{}", v),
            PrimitiveValue::String(s) => f.write_str(s),
            PrimitiveValue::Date(d) => write!(f, "{}", d),
        }
    }
}

impl From<bool> for PrimitiveValue {
    fn from(v: bool) -> Self {
        PrimitiveValue::Boolean(v)
    }
}

impl From<i32> for PrimitiveValue {
    fn from(v: i32) -> Self {
        PrimitiveValue::Int(v)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(v: i64) -> Self {
        PrimitiveValue::Long(v)
    }
}

impl From<f32> for PrimitiveValue {
    fn from(v: f32) -> Self {
        PrimitiveValue::Float(v)
    }
}

impl From<f64> for PrimitiveValue {
    fn from(v: f64) -> Self {
        PrimitiveValue::Double(v)
    }
}

impl From<String> for PrimitiveValue {
    fn from(v: String) -> Self {
        PrimitiveValue::String(v)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(v: &str) -> Self {
        PrimitiveValue::String(v.to_string())
    }
}

/// Value of a single instance property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyValue {
    /// A typed primitive.
    Primitive(PrimitiveValue),
    /// A string-to-string map.
    Map(BTreeMap<String, String>),
}

impl PropertyValue {
    /// Try to get the primitive inside this value.
    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            PropertyValue::Primitive(p) => Some(p),
            PropertyValue::Map(_) => None,
        }
    }

    /// Try to get the map inside this value.
    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            PropertyValue::Map(m) => Some(m),
            PropertyValue::Primitive(_) => None,
        }
    }
}

impl From<PrimitiveValue> for PropertyValue {
    fn from(v: PrimitiveValue) -> Self {
        PropertyValue::Primitive(v)
    }
}

/// Named property values of an instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceProperties {
    properties: BTreeMap<String, PropertyValue>,
}

impl InstanceProperties {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of a primitive property.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PrimitiveValue>) -> Self {
        self.set_primitive(name, value.into());
        self
    }

    /// Set a property.
    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.properties.insert(name.into(), value);
    }

    /// Set a primitive property.
    pub fn set_primitive(&mut self, name: impl Into<String>, value: PrimitiveValue) {
        self.set(name, PropertyValue::Primitive(value));
    }

    /// Get a property by name.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Get a primitive property by name.
    pub fn primitive(&self, name: &str) -> Option<&PrimitiveValue> {
        self.get(name).and_then(PropertyValue::as_primitive)
    }

    /// Get a string property by name, failing if it holds another kind.
    pub fn string(&self, name: &str) -> crate::Result<Option<&str>> {
        match self.primitive(name) {
            None => Ok(None),
            Some(PrimitiveValue::String(s)) => Ok(Some(s)),
            Some(_) => Err(crate::Error::KindMismatch {
                name: name.to_string(),
                expected: "string",
            }),
        }
    }

    /// Fold a value into the additional-properties map.
    pub fn add_additional_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let entry = self
            .properties
            .entry(ADDITIONAL_PROPERTIES.to_string())
            .or_insert_with(|| PropertyValue::Map(BTreeMap::new()));
        if let PropertyValue::Map(map) = entry {
            map.insert(key.into(), value.into());
        }
    }

    /// The additional-properties map, if any value was folded into it.
    pub fn additional_properties(&self) -> Option<&BTreeMap<String, String>> {
        self.get(ADDITIONAL_PROPERTIES).and_then(PropertyValue::as_map)
    }

    /// Iterate properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.properties.iter()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
