//! The dynamic value type held by the value store.

use crate::numeric::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Value Enum
// ============================================================================

/// A stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer value.
    Number(i64),
    /// Boolean value.
    Bool(bool),
    /// String value.
    String(String),
    /// Transition duration.
    Duration(Duration),
    /// Raw bytes.
    Buffer(Vec<u8>),
    /// Integers keyed by number, e.g. a batch of parameter values.
    Map(BTreeMap<u32, i64>),
    /// List value.
    List(Vec<Value>),
    /// No value / unknown.
    Null,
}

impl Value {
    /// Convert to i64 if possible.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to u8 if possible.
    pub fn as_u8(&self) -> Option<u8> {
        self.as_i64().and_then(|v| u8::try_from(v).ok())
    }

    /// Convert to bool if possible.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Convert to a duration if possible.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Value::Duration(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to a list if possible.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::Duration(v) => write!(f, "{}", v),
            Value::Buffer(v) => write!(f, "0x{}", hex::encode(v)),
            Value::Map(map) => {
                let items: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Null => f.write_str("null"),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Number(i64::from(v))
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Number(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
