//! Writing parsed commands into the value store.
//!
//! Persisting runs after a command is fully parsed and, for partial
//! sessions, merged. It is idempotent: metadata is only written when the id
//! has none yet, and values are last-write-wins.

use crate::device_config::DeviceConfig;
use crate::frame::PeerAddress;
use crate::values::{Value, ValueDescriptor, ValueId, ValueMetadata, ValueStore};

/// Where and with what context a command persists its values.
pub struct PersistContext<'a> {
    store: &'a mut dyn ValueStore,
    device_config: Option<&'a DeviceConfig>,
    peer: PeerAddress,
    persisted: usize,
}

impl<'a> PersistContext<'a> {
    /// Persist values of `peer` into `store`.
    pub fn new(store: &'a mut dyn ValueStore, peer: PeerAddress) -> Self {
        Self {
            store,
            device_config: None,
            peer,
            persisted: 0,
        }
    }

    /// Use the device configuration file of the peer.
    pub fn with_device_config(mut self, config: &'a DeviceConfig) -> Self {
        self.device_config = Some(config);
        self
    }

    /// The peer, with the endpoint values are written to.
    pub fn peer(&self) -> PeerAddress {
        self.peer
    }

    /// The device configuration file, if any.
    pub fn device_config(&self) -> Option<&'a DeviceConfig> {
        self.device_config
    }

    /// Number of values written so far.
    pub fn persisted(&self) -> usize {
        self.persisted
    }

    /// `id` moved to the current endpoint.
    pub fn local(&self, id: ValueId) -> ValueId {
        id.at_endpoint(self.peer.endpoint)
    }

    /// Stored value of `id` on the current endpoint.
    pub fn value(&self, id: &ValueId) -> Option<Value> {
        self.store.value(&self.local(id.clone()))
    }

    /// Stored metadata of `id` on the current endpoint.
    pub fn metadata(&self, id: &ValueId) -> Option<ValueMetadata> {
        self.store.metadata(&self.local(id.clone()))
    }

    /// Write a value, and its default metadata if none is stored yet.
    pub fn set(&mut self, descriptor: ValueDescriptor, value: impl Into<Value>) {
        let id = self.local(descriptor.id);
        if self.store.metadata(&id).is_none() {
            self.store.set_metadata(id.clone(), descriptor.metadata);
        }
        self.store.set_value(id, value.into());
        self.persisted += 1;
    }

    /// Replace the metadata of `id` on the current endpoint.
    pub fn set_metadata(&mut self, id: ValueId, metadata: ValueMetadata) {
        let id = self.local(id);
        self.store.set_metadata(id, metadata);
    }

    /// Run `f` with values going to `endpoint`.
    pub fn in_endpoint<R>(&mut self, endpoint: u8, f: impl FnOnce(&mut Self) -> R) -> R {
        let outer = self.peer;
        self.peer = outer.with_endpoint(endpoint);
        let result = f(self);
        self.peer = outer;
        result
    }
}

/// A command that writes values when received.
///
/// The default writes nothing, which is right for requests.
pub trait Persist {
    /// Write the command's values.
    fn persist(&mut self, _ctx: &mut PersistContext<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CcId;
    use crate::values::MemoryValueStore;

    fn level() -> ValueDescriptor {
        ValueDescriptor::new(
            ValueId::new(CcId::BASIC, "currentValue"),
            ValueMetadata::level().read_only(),
        )
    }

    #[test]
    fn test_set_writes_metadata_once() {
        let mut store = MemoryValueStore::new();
        let mut ctx = PersistContext::new(&mut store, PeerAddress::new(4));
        ctx.set(level(), 10u8);

        let custom = ValueMetadata::level().with_label("custom");
        ctx.set_metadata(level().id, custom.clone());
        ctx.set(level(), 20u8);
        assert_eq!(ctx.persisted(), 2);
        assert_eq!(ctx.metadata(&level().id), Some(custom));
        assert_eq!(ctx.value(&level().id), Some(Value::Number(20)));
    }

    #[test]
    fn test_in_endpoint_restores_peer() {
        let mut store = MemoryValueStore::new();
        {
            let mut ctx = PersistContext::new(&mut store, PeerAddress::new(4));
            ctx.in_endpoint(3, |ctx| ctx.set(level(), 1u8));
            assert_eq!(ctx.peer().endpoint, 0);
        }
        assert_eq!(store.value(&level().id.at_endpoint(3)), Some(Value::Number(1)));
        assert_eq!(store.value(&level().id), None);
    }
}
