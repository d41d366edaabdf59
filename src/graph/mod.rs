//! Object graph: objects, fields, ownership and pointers
//!
//! Objects live in an [`ObjectGraph`] arena and are addressed by
//! [`ObjectId`](crate::types::ObjectId). Each object carries ordered fields
//! declared by its [`ObjectClass`]; child fields own objects, pointer fields
//! observe them.

pub mod accessor;
pub mod arena;
pub mod capability;
pub mod class;
pub mod field;
pub mod object;
pub mod pointer;
pub mod reorder;
pub mod signal;
pub mod store;

#[cfg(test)]
pub(crate) mod test_objects;

// Re-export commonly used items
pub use accessor::{DirectAccessor, ProxyAccessor, RegisterAccessor, RegisterBank, ValueAccessor, ValueSlot};
pub use capability::{Capability, CapabilitySet};
pub use class::{AnyObject, ClassDescriptor, FieldDeclarations, ObjectClass, BASE_CLASS_KEYWORD};
pub use field::{
    ChildArrayField, ChildField, FieldHandle, FieldKind, FieldKindTag, PtrArrayField, PtrField, ValueField,
};
pub use object::{FieldChanged, ObjectHandle};
pub use pointer::GuardedPtr;
pub use reorder::{FieldReorderCapability, OrderChanged};
pub use signal::{Signal, SignalObserver};
pub use store::ObjectGraph;
