//! Value store interface and the in-memory implementation.

use super::{Value, ValueId, ValueMetadata};
use std::collections::HashMap;

/// Storage for values and their metadata, keyed by [`ValueId`].
///
/// Writes are last-write-wins per id.
pub trait ValueStore {
    /// Get a value.
    fn value(&self, id: &ValueId) -> Option<Value>;

    /// Set a value.
    fn set_value(&mut self, id: ValueId, value: Value);

    /// Get the metadata of a value.
    fn metadata(&self, id: &ValueId) -> Option<ValueMetadata>;

    /// Set the metadata of a value.
    fn set_metadata(&mut self, id: ValueId, metadata: ValueMetadata);

    /// All values whose id satisfies `predicate`.
    fn find_values(&self, predicate: &dyn Fn(&ValueId) -> bool) -> Vec<(ValueId, Value)>;
}

/// A [`ValueStore`] held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryValueStore {
    values: HashMap<ValueId, Value>,
    metadata: HashMap<ValueId, ValueMetadata>,
}

impl MemoryValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all stored values.
    pub fn iter(&self) -> impl Iterator<Item = (&ValueId, &Value)> {
        self.values.iter()
    }
}

impl ValueStore for MemoryValueStore {
    fn value(&self, id: &ValueId) -> Option<Value> {
        self.values.get(id).cloned()
    }

    fn set_value(&mut self, id: ValueId, value: Value) {
        self.values.insert(id, value);
    }

    fn metadata(&self, id: &ValueId) -> Option<ValueMetadata> {
        self.metadata.get(id).cloned()
    }

    fn set_metadata(&mut self, id: ValueId, metadata: ValueMetadata) {
        self.metadata.insert(id, metadata);
    }

    fn find_values(&self, predicate: &dyn Fn(&ValueId) -> bool) -> Vec<(ValueId, Value)> {
        let mut found: Vec<_> = self
            .values
            .iter()
            .filter(|(id, _)| predicate(id))
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CcId;

    #[test]
    fn test_last_write_wins() {
        let mut store = MemoryValueStore::new();
        let id = ValueId::new(CcId::BASIC, "currentValue");
        store.set_value(id.clone(), Value::Number(1));
        store.set_value(id.clone(), Value::Number(2));
        assert_eq!(store.value(&id), Some(Value::Number(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_find_values_sorted() {
        let mut store = MemoryValueStore::new();
        for param in [3u32, 1, 2] {
            store.set_value(ValueId::new(CcId::CONFIGURATION, param), Value::Number(0));
        }
        store.set_value(ValueId::new(CcId::BASIC, "currentValue"), Value::Number(0));

        let found = store.find_values(&|id| id.command_class == CcId::CONFIGURATION);
        let params: Vec<_> = found.iter().filter_map(|(id, _)| id.property.as_number()).collect();
        assert_eq!(params, vec![1, 2, 3]);
    }
}
