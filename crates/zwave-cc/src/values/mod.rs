//! Value identifiers, metadata and storage.

mod descriptor;
mod id;
mod metadata;
mod store;
mod value;

pub use descriptor::{ValueDescriptor, ValueKind};
pub use id::{Property, ValueId};
pub use metadata::{ValueMetadata, ValueType};
pub use store::{MemoryValueStore, ValueStore};
pub use value::Value;
