//! Open-metadata type definitions.
//!
//! A [`TypeDef`] describes an entity, relationship or classification type,
//! its single optional supertype and its own (non-inherited) attributes.

use serde::{Deserialize, Serialize};

use crate::value::PrimitiveKind;

/// Category of a type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeDefCategory {
    Entity,
    Relationship,
    Classification,
}

impl std::fmt::Display for TypeDefCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeDefCategory::Entity => write!(f, "entity"),
            TypeDefCategory::Relationship => write!(f, "relationship"),
            TypeDefCategory::Classification => write!(f, "classification"),
        }
    }
}

/// Reference to another type definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDefLink {
    pub guid: String,
    pub name: String,
}

impl TypeDefLink {
    /// Create a new link.
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
        }
    }
}

/// Declared kind of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeKind {
    /// A primitive value.
    Primitive(PrimitiveKind),
    /// An enumeration, by enum type name.
    Enum(String),
    /// A string-to-string map.
    StringMap,
    /// An array of primitives.
    Array(PrimitiveKind),
}

/// An attribute declared on a type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefAttribute {
    pub name: String,
    pub kind: AttributeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TypeDefAttribute {
    /// Create a primitive attribute.
    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Primitive(kind),
            description: None,
        }
    }

    /// Create an attribute of any kind.
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The primitive kind, if this is a primitive attribute.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match &self.kind {
            AttributeKind::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// An open-metadata type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDef {
    pub guid: String,
    pub name: String,
    pub category: TypeDefCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_type: Option<TypeDefLink>,
    #[serde(default)]
    pub attributes: Vec<TypeDefAttribute>,
}

impl TypeDef {
    /// Create a type definition of the given category.
    pub fn new(
        guid: impl Into<String>,
        name: impl Into<String>,
        category: TypeDefCategory,
    ) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            category,
            super_type: None,
            attributes: Vec::new(),
        }
    }

    /// Create an entity type definition.
    pub fn entity(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(guid, name, TypeDefCategory::Entity)
    }

    /// Create a relationship type definition.
    pub fn relationship(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(guid, name, TypeDefCategory::Relationship)
    }

    /// Set the supertype.
    pub fn with_super_type(mut self, super_type: TypeDefLink) -> Self {
        self.super_type = Some(super_type);
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: TypeDefAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// A link pointing at this type definition.
    pub fn link(&self) -> TypeDefLink {
        TypeDefLink::new(&self.guid, &self.name)
    }

    /// Look up one of this type's own attributes.
    pub fn attribute(&self, name: &str) -> Option<&TypeDefAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typedef_builder() {
        let referenceable = TypeDef::entity("guid-ref", "Referenceable");
        let asset = TypeDef::entity("guid-asset", "Asset")
            .with_super_type(referenceable.link())
            .with_attribute(TypeDefAttribute::primitive("name", PrimitiveKind::String))
            .with_attribute(TypeDefAttribute::new("owners", AttributeKind::StringMap));

        assert_eq!(asset.category, TypeDefCategory::Entity);
        assert_eq!(asset.super_type.as_ref().unwrap().name, "Referenceable");
        assert_eq!(
            asset.attribute("name").unwrap().primitive_kind(),
            Some(PrimitiveKind::String)
        );
        assert_eq!(asset.attribute("owners").unwrap().primitive_kind(), None);
        assert!(asset.attribute("missing").is_none());
    }

    #[test]
    fn test_typedef_json() {
        let json = r#"{
            "guid": "g1",
            "name": "DataSet",
            "category": "entity",
            "superType": {"guid": "g0", "name": "Asset"},
            "attributes": [{"name": "name", "kind": {"primitive": "string"}}]
        }"#;
        let def: TypeDef = serde_json::from_str(json).unwrap();
        assert_eq!(def.name, "DataSet");
        assert_eq!(def.super_type.unwrap().guid, "g0");
        assert_eq!(def.attributes[0].kind, AttributeKind::Primitive(PrimitiveKind::String));
    }
}
