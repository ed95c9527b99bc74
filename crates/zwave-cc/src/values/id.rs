//! Value identifiers.

use crate::frame::CcId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A property or property key: either a number or a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Property {
    /// Numeric property, e.g. a configuration parameter number.
    Number(u32),
    /// Named property, e.g. `"currentValue"`.
    Name(String),
}

impl Property {
    /// Named property.
    pub fn name(name: &str) -> Self {
        Property::Name(name.to_string())
    }

    /// The number, if this is a numeric property.
    pub fn as_number(&self) -> Option<u32> {
        match self {
            Property::Number(n) => Some(*n),
            Property::Name(_) => None,
        }
    }

    /// The name, if this is a named property.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Property::Name(n) => Some(n),
            Property::Number(_) => None,
        }
    }
}

impl From<u32> for Property {
    fn from(n: u32) -> Self {
        Property::Number(n)
    }
}

impl From<&str> for Property {
    fn from(n: &str) -> Self {
        Property::name(n)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Number(n) => write!(f, "{}", n),
            Property::Name(n) => f.write_str(n),
        }
    }
}

/// Identifies one stored value of one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueId {
    /// Command class the value belongs to.
    pub command_class: CcId,
    /// Endpoint; 0 is the root device.
    pub endpoint: u8,
    /// Property.
    pub property: Property,
    /// Optional sub-key of the property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_key: Option<Property>,
}

impl ValueId {
    /// Create an id on the root endpoint without a property key.
    pub fn new(command_class: CcId, property: impl Into<Property>) -> Self {
        Self {
            command_class,
            endpoint: 0,
            property: property.into(),
            property_key: None,
        }
    }

    /// Set the property key.
    pub fn with_key(mut self, key: impl Into<Property>) -> Self {
        self.property_key = Some(key.into());
        self
    }

    /// Move the id to another endpoint.
    pub fn at_endpoint(mut self, endpoint: u8) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Whether the id names `property` of `command_class`, ignoring the key.
    pub fn is(&self, command_class: CcId, property: &str) -> bool {
        self.command_class == command_class && self.property.as_name() == Some(property)
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}-{}-{}", self.command_class.0, self.endpoint, self.property)?;
        if let Some(key) = &self.property_key {
            write!(f, "-{}", key)?;
        }
        Ok(())
    }
}
