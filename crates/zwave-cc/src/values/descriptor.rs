//! Declarative value kinds.
//!
//! Each command class declares the values it persists as [`ValueKind`]
//! statics: a pure function from the kind's parameters (scene id, color
//! component, parameter number, ...) to a [`ValueDescriptor`], plus a
//! predicate recognising ids of that kind.

use super::{ValueId, ValueMetadata};

/// A fully resolved value: its id and default metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDescriptor {
    /// Value id on the root endpoint.
    pub id: ValueId,
    /// Metadata stored alongside the first write.
    pub metadata: ValueMetadata,
}

impl ValueDescriptor {
    /// Create a descriptor.
    pub fn new(id: ValueId, metadata: ValueMetadata) -> Self {
        Self { id, metadata }
    }
}

/// A family of values sharing a shape.
pub struct ValueKind<P> {
    /// Name for diagnostics.
    pub name: &'static str,
    /// Builds the descriptor for one set of parameters.
    pub build: fn(P) -> ValueDescriptor,
    /// Whether an id belongs to this kind.
    pub matches: fn(&ValueId) -> bool,
}

impl<P> ValueKind<P> {
    /// Descriptor for `params`.
    pub fn descriptor(&self, params: P) -> ValueDescriptor {
        (self.build)(params)
    }

    /// Value id for `params`.
    pub fn id(&self, params: P) -> ValueId {
        (self.build)(params).id
    }

    /// Whether `id` belongs to this kind.
    pub fn is(&self, id: &ValueId) -> bool {
        (self.matches)(id)
    }
}

impl<P> std::fmt::Debug for ValueKind<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueKind").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CcId;

    fn slot(index: u8) -> ValueDescriptor {
        ValueDescriptor::new(
            ValueId::new(CcId::BASIC, "slot").with_key(u32::from(index)),
            ValueMetadata::number().with_label(format!("Slot {}", index)),
        )
    }

    fn is_slot(id: &ValueId) -> bool {
        id.is(CcId::BASIC, "slot") && id.property_key.is_some()
    }

    static SLOT: ValueKind<u8> = ValueKind {
        name: "slot",
        build: slot,
        matches: is_slot,
    };

    #[test]
    fn test_kind_builds_and_matches() {
        let desc = SLOT.descriptor(4);
        assert_eq!(desc.metadata.label.as_deref(), Some("Slot 4"));
        assert!(SLOT.is(&desc.id));
        assert!(SLOT.is(&SLOT.id(9).at_endpoint(2)));
        assert!(!SLOT.is(&ValueId::new(CcId::BASIC, "slot")));
    }
}
