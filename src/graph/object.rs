//! Object handles
//!
//! An [`ObjectHandle`] is the per-object record stored in the graph arena: its
//! class, identity, ordered fields, parent link, the pointer fields that refer
//! to it and its capabilities. Structural changes go through
//! [`ObjectGraph`](crate::graph::ObjectGraph), which keeps both sides of every
//! link consistent.

use crate::graph::capability::{Capability, CapabilitySet};
use crate::graph::class::ClassDescriptor;
use crate::graph::field::FieldHandle;
use crate::graph::pointer::{GuardedPtr, Liveness};
use crate::graph::signal::{Signal, SignalObserver};
use crate::types::{FieldRef, ObjectId};
use serde_json::Value as Json;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Payload of an object's field-changed signal
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChanged {
    /// The field that changed
    pub field: FieldRef,
    /// Its keyword
    pub keyword: String,
    /// Name of the capability that made the change, if any
    pub capability: Option<String>,
    /// Value before the change
    pub old_value: Json,
    /// Value after the change
    pub new_value: Json,
}

impl FieldChanged {
    /// The object owning the changed field
    pub fn object(&self) -> ObjectId {
        self.field.object
    }
}

/// Per-object record in the graph
pub struct ObjectHandle {
    class: Rc<ClassDescriptor>,
    uuid: Option<Uuid>,
    fields: Vec<FieldHandle>,
    parent_field: Option<FieldRef>,
    referring_ptr_fields: Vec<FieldRef>,
    capabilities: CapabilitySet,
    liveness: Option<Liveness>,
    field_changed: Signal<FieldChanged>,
    observer: SignalObserver,
}

impl ObjectHandle {
    pub(crate) fn new(class: Rc<ClassDescriptor>, uuid: Option<Uuid>) -> Self {
        Self {
            class,
            uuid,
            fields: Vec::new(),
            parent_field: None,
            referring_ptr_fields: Vec::new(),
            capabilities: CapabilitySet::new(),
            liveness: Some(Rc::new(())),
            field_changed: Signal::new(),
            observer: SignalObserver::new(),
        }
    }

    /// Class keyword
    pub fn class_keyword(&self) -> &str {
        self.class.keyword()
    }

    /// Shared class descriptor
    pub fn class(&self) -> &Rc<ClassDescriptor> {
        &self.class
    }

    /// Class keyword followed by ancestor keywords
    pub fn class_inheritance_stack(&self) -> &[String] {
        self.class.inheritance_stack()
    }

    /// True if the object's class is `keyword` or derives from it
    pub fn inherits_class_with_keyword(&self, keyword: &str) -> bool {
        self.class.inherits_class_with_keyword(keyword)
    }

    /// Persistent identity, if assigned
    pub fn uuid(&self) -> Option<Uuid> {
        self.uuid
    }

    /// Replace the persistent identity
    pub fn set_uuid(&mut self, uuid: Option<Uuid>) {
        self.uuid = uuid;
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldHandle] {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Vec<FieldHandle> {
        &mut self.fields
    }

    pub(crate) fn set_fields(&mut self, fields: Vec<FieldHandle>) {
        self.fields = fields;
    }

    /// Field at `index`
    pub fn field(&self, index: usize) -> Option<&FieldHandle> {
        self.fields.get(index)
    }

    pub(crate) fn field_mut(&mut self, index: usize) -> Option<&mut FieldHandle> {
        self.fields.get_mut(index)
    }

    /// Position of the field named `keyword`, aliases included
    pub fn field_index(&self, keyword: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.matches_keyword(keyword))
    }

    /// The child field owning this object
    pub fn parent_field(&self) -> Option<FieldRef> {
        self.parent_field
    }

    /// Pointer fields currently referring to this object, one entry per reference
    pub fn referring_ptr_fields(&self) -> &[FieldRef] {
        &self.referring_ptr_fields
    }

    /// Attached capabilities
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Attached capabilities, mutably
    pub fn capabilities_mut(&mut self) -> &mut CapabilitySet {
        &mut self.capabilities
    }

    /// First capability of type `C`
    pub fn capability<C: Capability>(&self) -> Option<&C> {
        self.capabilities.get::<C>()
    }

    /// First owned capability of type `C`, mutably
    pub fn capability_mut<C: Capability>(&mut self) -> Option<&mut C> {
        self.capabilities.get_mut::<C>()
    }

    /// Signal fired after any field of this object changes value
    pub fn field_changed(&self) -> &Signal<FieldChanged> {
        &self.field_changed
    }

    /// This object's own observer, used to watch other objects
    pub fn observer(&self) -> &SignalObserver {
        &self.observer
    }

    /// Disconnect `observer` from every signal this object emits
    pub fn disconnect_observer_from_all_signals(&self, observer: &SignalObserver) {
        self.field_changed.disconnect(observer);
    }

    /// False once the object has been prepared for deletion
    pub fn is_alive(&self) -> bool {
        self.liveness.is_some()
    }

    pub(crate) fn guard(&self, id: ObjectId) -> GuardedPtr {
        GuardedPtr::new(id, self.liveness.as_ref())
    }

    pub(crate) fn set_as_parent_field(&mut self, field: FieldRef) {
        debug_assert!(self.parent_field.is_none(), "object already has a parent field");
        self.parent_field = Some(field);
    }

    pub(crate) fn remove_as_parent_field(&mut self, field: FieldRef) {
        if self.parent_field == Some(field) {
            self.parent_field = None;
        }
    }

    pub(crate) fn add_referring_ptr_field(&mut self, field: FieldRef) {
        self.referring_ptr_fields.push(field);
    }

    pub(crate) fn remove_referring_ptr_field(&mut self, field: FieldRef) {
        if let Some(position) = self.referring_ptr_fields.iter().position(|f| *f == field) {
            self.referring_ptr_fields.remove(position);
        }
    }

    pub(crate) fn take_referring_ptr_fields(&mut self) -> Vec<FieldRef> {
        std::mem::take(&mut self.referring_ptr_fields)
    }

    /// Local part of deletion: drops capabilities, nulls guarded pointers and
    /// tears down signal connections. Idempotent.
    pub(crate) fn release(&mut self) {
        self.parent_field = None;
        self.capabilities.clear();
        self.liveness = None;
        self.field_changed.disconnect_all();
        self.observer.disconnect_all();
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("class", &self.class.keyword())
            .field("uuid", &self.uuid)
            .field("fields", &self.fields.len())
            .field("parent_field", &self.parent_field)
            .finish()
    }
}
