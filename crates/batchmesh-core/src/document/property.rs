//! Typed properties stored on document objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    Float,
    Bool,
}

impl PropertyKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

/// A stored property value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Float(f64),
    Bool(bool),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Float(_) => PropertyKind::Float,
            Self::Bool(_) => PropertyKind::Bool,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Float(_) => None,
        }
    }

    /// Parse a user-supplied string as a value of `kind`
    pub fn parse(kind: PropertyKind, text: &str) -> Option<Self> {
        match kind {
            PropertyKind::Float => text.trim().parse().ok().map(Self::Float),
            PropertyKind::Bool => match text.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(Self::Bool(true)),
                "false" | "no" | "off" | "0" => Some(Self::Bool(false)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// A named property with its editor group and tooltip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub group: String,
    pub doc: String,
    pub value: PropertyValue,
}

/// Ordered property store of one object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(Vec<Property>);

impl Properties {
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Current value of `name`, if declared
    pub fn value(&self, name: &str) -> Option<PropertyValue> {
        self.get(name).map(|p| p.value)
    }

    /// Declare a new property. Returns `false` and leaves the store untouched
    /// if the name is already declared.
    pub fn declare(&mut self, property: Property) -> bool {
        if self.contains(&property.name) {
            return false;
        }
        self.0.push(property);
        true
    }

    /// Overwrite the value of a declared property
    pub fn set(&mut self, name: &str, value: PropertyValue) -> bool {
        match self.0.iter_mut().find(|p| p.name == name) {
            Some(p) => {
                p.value = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
