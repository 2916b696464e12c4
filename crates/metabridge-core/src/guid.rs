//! Composite GUIDs.
//!
//! A single catalog object can surface as several open-metadata instances.
//! Each one is told apart by a short prefix carried in its GUID:
//! `prefix!nativeId`. A GUID without a separator is the plain, one-to-one
//! reflection of a catalog object.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Separator between prefix and native id.
pub const SEPARATOR: char = '!';

/// A catalog native id with an optional generated-type prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeGuid {
    native_id: String,
    prefix: Option<String>,
}

impl CompositeGuid {
    /// Create a GUID with an optional prefix.
    pub fn new(native_id: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            native_id: native_id.into(),
            prefix,
        }
    }

    /// Create an unprefixed GUID.
    pub fn plain(native_id: impl Into<String>) -> Self {
        Self::new(native_id, None)
    }

    /// Create a prefixed GUID.
    pub fn prefixed(native_id: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::new(native_id, Some(prefix.into()))
    }

    /// Decode a GUID string, splitting on the first separator.
    ///
    /// A separator in leading position does not start a prefix; the whole
    /// string is then the native id.
    pub fn decode(guid: &str) -> Self {
        match guid.find(SEPARATOR) {
            Some(idx) if idx > 0 => Self {
                prefix: Some(guid[..idx].to_string()),
                native_id: guid[idx + SEPARATOR.len_utf8()..].to_string(),
            },
            _ => Self::plain(guid),
        }
    }

    /// Decode an optional GUID string, propagating absence.
    pub fn decode_opt(guid: Option<&str>) -> Option<Self> {
        guid.map(Self::decode)
    }

    /// Encode to the string form.
    pub fn encode(native_id: &str, prefix: Option<&str>) -> String {
        match prefix {
            Some(prefix) => format!("{}{}{}", prefix, SEPARATOR, native_id),
            None => native_id.to_string(),
        }
    }

    /// The catalog's native id.
    pub fn native_id(&self) -> &str {
        &self.native_id
    }

    /// The generated-type prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Check if this GUID identifies a generated instance.
    pub fn is_generated(&self) -> bool {
        self.prefix.is_some()
    }
}

impl fmt::Display for CompositeGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}{}{}", prefix, SEPARATOR, self.native_id),
            None => f.write_str(&self.native_id),
        }
    }
}

impl FromStr for CompositeGuid {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::decode(s))
    }
}
