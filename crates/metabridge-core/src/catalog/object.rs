//! Catalog objects and their namespaced property bag.
//!
//! Every object fetched from the catalog carries three property maps:
//! instance-level fields, fields of its definition, and free-form user
//! attributes. Keys are addressed as `instance.name`, `definition.baseType`
//! or `attribute.referencedType`.

use std::collections::BTreeMap;
use std::fmt;

use super::value::CatalogValue;
use crate::error::{Error, Result};

/// Definition name under which the catalog stores every reference kind.
pub const REFERENCE_TYPE: &str = "reference";

/// Prefix of type names resolved for reference objects.
pub const REFERENCE_TYPE_PREFIX: &str = "reference.";

const RELATED_OBJECTS_TYPE: &str = "relatedObjects";

/// What a catalog id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Entity,
    Relationship,
    Definition,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Entity => write!(f, "entity"),
            ObjectKind::Relationship => write!(f, "relationship"),
            ObjectKind::Definition => write!(f, "definition"),
        }
    }
}

/// One of the three property namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Instance,
    Definition,
    Attribute,
}

impl Namespace {
    /// Key prefix for this namespace, including the dot.
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Instance => "instance.",
            Namespace::Definition => "definition.",
            Namespace::Attribute => "attribute.",
        }
    }
}

/// A parsed `namespace.name` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyKey<'a> {
    pub namespace: Namespace,
    pub name: &'a str,
}

impl<'a> PropertyKey<'a> {
    /// Parse a namespaced key, returning `None` for unknown namespaces.
    pub fn parse(key: &'a str) -> Option<Self> {
        [Namespace::Instance, Namespace::Definition, Namespace::Attribute]
            .into_iter()
            .find_map(|namespace| {
                key.strip_prefix(namespace.prefix())
                    .filter(|name| !name.is_empty())
                    .map(|name| PropertyKey { namespace, name })
            })
    }
}

/// An entity, relationship or definition fetched from the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogObject {
    guid: String,
    definition_id: Option<String>,
    instance: BTreeMap<String, CatalogValue>,
    definition: BTreeMap<String, CatalogValue>,
    attributes: BTreeMap<String, CatalogValue>,
}

impl CatalogObject {
    /// Create an empty object with the given native id.
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            ..Default::default()
        }
    }

    /// Build from catalog JSON for an instance and, optionally, its definition.
    ///
    /// The instance's `id` becomes the native id and its `attributes` object
    /// becomes the attribute namespace; every other top-level field lands in
    /// the instance namespace.
    pub fn from_json(
        instance: serde_json::Value,
        definition: Option<serde_json::Value>,
    ) -> Result<Self> {
        let serde_json::Value::Object(fields) = instance else {
            return Err(Error::MalformedData(
                "catalog instance is not a JSON object".to_string(),
            ));
        };

        let mut object = CatalogObject::default();
        for (key, value) in fields {
            match key.as_str() {
                "attributes" => {
                    if let serde_json::Value::Object(attrs) = value {
                        for (name, v) in attrs {
                            object.attributes.insert(name, CatalogValue::from(v));
                        }
                    }
                }
                _ => {
                    object.instance.insert(key, CatalogValue::from(value));
                }
            }
        }

        object.guid = object
            .instance
            .get("id")
            .and_then(CatalogValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::MalformedData("catalog instance has no id".to_string()))?;
        object.definition_id = object
            .instance
            .get("definitionId")
            .and_then(CatalogValue::as_str)
            .map(str::to_string);

        if let Some(serde_json::Value::Object(fields)) = definition {
            for (key, value) in fields {
                object.definition.insert(key, CatalogValue::from(value));
            }
        }

        Ok(object)
    }

    /// Set the definition id.
    pub fn with_definition_id(mut self, id: impl Into<String>) -> Self {
        self.definition_id = Some(id.into());
        self
    }

    /// Set an instance-level field.
    pub fn with_instance(mut self, name: impl Into<String>, value: impl Into<CatalogValue>) -> Self {
        self.instance.insert(name.into(), value.into());
        self
    }

    /// Set a definition-level field.
    pub fn with_definition(
        mut self,
        name: impl Into<String>,
        value: impl Into<CatalogValue>,
    ) -> Self {
        self.definition.insert(name.into(), value.into());
        self
    }

    /// Set a free-form attribute.
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<CatalogValue>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Native catalog id.
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Id of the object's definition.
    pub fn definition_id(&self) -> Option<&str> {
        self.definition_id.as_deref()
    }

    /// Look up a namespaced key such as `instance.name`.
    pub fn get(&self, key: &str) -> Option<&CatalogValue> {
        let key = PropertyKey::parse(key)?;
        self.namespace(key.namespace).get(key.name)
    }

    /// Look up a mapped catalog property. Keys without a namespace name a
    /// free-form attribute.
    pub fn lookup(&self, key: &str) -> Option<&CatalogValue> {
        match PropertyKey::parse(key) {
            Some(key) => self.namespace(key.namespace).get(key.name),
            None => self.attributes.get(key),
        }
    }

    /// Look up a namespaced key holding a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(CatalogValue::as_str)
    }

    /// All values of one namespace.
    pub fn namespace(&self, namespace: Namespace) -> &BTreeMap<String, CatalogValue> {
        match namespace {
            Namespace::Instance => &self.instance,
            Namespace::Definition => &self.definition,
            Namespace::Attribute => &self.attributes,
        }
    }

    /// Free-form attributes.
    pub fn attributes(&self) -> &BTreeMap<String, CatalogValue> {
        &self.attributes
    }

    /// Look up a free-form attribute.
    pub fn attribute(&self, name: &str) -> Option<&CatalogValue> {
        self.attributes.get(name)
    }

    /// The catalog type name this object is mapped by.
    ///
    /// This is the definition name, except that a `reference` definition
    /// resolves to `reference.<referencedType>` and a `relatedObjects`
    /// definition resolves to the instance's own `type` field.
    pub fn type_name(&self) -> Option<String> {
        let name = self.definition.get("name").and_then(CatalogValue::as_str)?;
        if name.eq_ignore_ascii_case(REFERENCE_TYPE) {
            let referenced = self
                .attributes
                .get("referencedType")
                .map(CatalogValue::to_string)
                .unwrap_or_else(|| "null".to_string());
            return Some(format!("{}{}", REFERENCE_TYPE_PREFIX, referenced));
        }
        if name.eq_ignore_ascii_case(RELATED_OBJECTS_TYPE) {
            return self.get_str("instance.type").map(str::to_string);
        }
        Some(name.to_string())
    }
}
