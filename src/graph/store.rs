//! The object graph
//!
//! [`ObjectGraph`] owns every object in a generational arena and is the only
//! place where ownership and pointer links change. Each structural operation
//! updates both sides of a link: a child's parent field and its container, a
//! pointer field and the target's list of referring fields.

use crate::core::config::GraphConfig;
use crate::core::error::{Error, GraphError, GraphResult, Result};
use crate::graph::accessor::{ValueAccessor, ValueSlot};
use crate::graph::arena::Arena;
use crate::graph::capability::Capability;
use crate::graph::class::{
    validate_field_keyword, ClassDescriptor, FieldDeclarations, ObjectClass, BASE_CLASS_KEYWORD,
};
use crate::graph::field::{
    ChildArrayField, ChildField, FieldHandle, FieldKind, FieldKindTag, PtrArrayField, PtrField,
    ValueField,
};
use crate::graph::object::{FieldChanged, ObjectHandle};
use crate::graph::pointer::GuardedPtr;
use crate::io::capability::FieldIoCapability;
use crate::io::keyword::is_valid_element_name;
use crate::types::{FieldRef, FieldValue, ObjectId};
use serde_json::Value as Json;
use std::rc::Rc;
use uuid::Uuid;

/// Arena-backed store of objects and their links
pub struct ObjectGraph {
    objects: Arena<ObjectHandle>,
    config: GraphConfig,
}

impl Default for ObjectGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectGraph {
    /// Create an empty graph with default settings
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Create an empty graph
    pub fn with_config(config: GraphConfig) -> Self {
        Self { objects: Arena::new(), config }
    }

    /// Graph settings
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Number of objects, including ones prepared for deletion
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when the graph holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// True if `object` is stored in the graph
    pub fn contains(&self, object: ObjectId) -> bool {
        self.objects.contains(object)
    }

    /// Shared access to an object
    pub fn object(&self, object: ObjectId) -> Option<&ObjectHandle> {
        self.objects.get(object)
    }

    /// Mutable access to an object
    pub fn object_mut(&mut self, object: ObjectId) -> Option<&mut ObjectHandle> {
        self.objects.get_mut(object)
    }

    /// Ids of every stored object
    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.ids()
    }

    /// Objects without a parent field
    pub fn roots(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, o)| o.parent_field().is_none())
            .map(|(id, _)| id)
            .collect()
    }

    fn get(&self, object: ObjectId) -> GraphResult<&ObjectHandle> {
        self.objects.get(object).ok_or_else(|| GraphError::object_not_found(object))
    }

    fn get_mut(&mut self, object: ObjectId) -> GraphResult<&mut ObjectHandle> {
        self.objects.get_mut(object).ok_or_else(|| GraphError::object_not_found(object))
    }

    fn missing_field(object: &ObjectHandle, field: FieldRef) -> GraphError {
        GraphError::FieldNotFound {
            keyword: format!("#{}", field.index),
            class: object.class_keyword().to_string(),
        }
    }

    fn field_handle(&self, field: FieldRef) -> GraphResult<&FieldHandle> {
        let object = self.get(field.object)?;
        object.field(field.index).ok_or_else(|| Self::missing_field(object, field))
    }

    fn field_handle_mut(&mut self, field: FieldRef) -> GraphResult<&mut FieldHandle> {
        let object = self.get_mut(field.object)?;
        if field.index >= object.fields().len() {
            return Err(Self::missing_field(object, field));
        }
        object.field_mut(field.index).ok_or_else(|| GraphError::object_not_found(field.object))
    }

    fn wrong_kind(field: &FieldHandle, expected: &str) -> GraphError {
        GraphError::WrongFieldKind {
            keyword: field.keyword().to_string(),
            expected: expected.to_string(),
            actual: field.kind_tag().to_string(),
        }
    }

    // ---------------------------------------------------------------------
    // Creation and fields
    // ---------------------------------------------------------------------

    /// Create an object of class `T`
    pub fn create<T: ObjectClass>(&mut self) -> GraphResult<ObjectId> {
        self.create_from_class(Rc::new(ClassDescriptor::of::<T>()))
    }

    /// Create an object from a class descriptor.
    ///
    /// Fails without leaving anything behind if the class keyword or any
    /// declared field keyword is invalid or duplicated.
    pub fn create_from_class(&mut self, class: Rc<ClassDescriptor>) -> GraphResult<ObjectId> {
        if !is_valid_element_name(class.keyword()) {
            return Err(GraphError::InvalidKeyword(class.keyword().to_string()));
        }

        let uuid = self.config.assign_uuids.then(Uuid::new_v4);
        let id = self.objects.insert(ObjectHandle::new(Rc::clone(&class), uuid));

        let mut fields = Vec::new();
        let mut errors = Vec::new();
        {
            let mut declarations = FieldDeclarations::new(id, class.keyword(), &mut fields, &mut errors);
            class.declare_fields(&mut declarations);
        }

        if let Some(error) = errors.into_iter().next() {
            self.objects.remove(id);
            return Err(error);
        }

        if let Some(object) = self.objects.get_mut(id) {
            object.set_fields(fields);
        }
        crate::log_trace!("Created {} {}", class.keyword(), id);
        Ok(id)
    }

    /// Register an extra field on an existing object.
    ///
    /// Object-holding kinds must start empty. The field gets a
    /// [`FieldIoCapability`] like declared fields do.
    pub fn add_field(&mut self, object: ObjectId, keyword: &str, kind: FieldKind) -> GraphResult<FieldRef> {
        if !kind.child_objects().is_empty() || !kind.ptr_targets().is_empty() {
            return Err(GraphError::TypeMismatch {
                expected: "empty field".to_string(),
                actual: "populated field".to_string(),
            });
        }

        let handle = self.get_mut(object)?;
        let class = handle.class_keyword().to_string();
        validate_field_keyword(keyword, handle.fields(), &class)?;

        let index = handle.fields().len();
        let mut field = FieldHandle::new(object, index, keyword, kind);
        field.add_capability(FieldIoCapability::new());
        handle.fields_mut().push(field);
        Ok(FieldRef::new(object, index))
    }

    /// Shared access to a field
    pub fn field(&self, field: FieldRef) -> Option<&FieldHandle> {
        self.objects.get(field.object)?.field(field.index)
    }

    /// Mutable access to a field's capabilities and metadata
    pub fn field_mut(&mut self, field: FieldRef) -> Option<&mut FieldHandle> {
        self.objects.get_mut(field.object)?.field_mut(field.index)
    }

    /// Find a field by keyword or alias
    pub fn find_field(&self, object: ObjectId, keyword: &str) -> Option<FieldRef> {
        let index = self.objects.get(object)?.field_index(keyword)?;
        Some(FieldRef::new(object, index))
    }

    /// All fields of an object, in declaration order
    pub fn fields(&self, object: ObjectId) -> Vec<FieldRef> {
        self.objects
            .get(object)
            .map(|o| (0..o.fields().len()).map(|i| FieldRef::new(object, i)).collect())
            .unwrap_or_default()
    }

    fn typed_field(&self, object: ObjectId, keyword: &str, expected: FieldKindTag) -> GraphResult<FieldRef> {
        let handle = self.get(object)?;
        let index = handle.field_index(keyword).ok_or_else(|| GraphError::FieldNotFound {
            keyword: keyword.to_string(),
            class: handle.class_keyword().to_string(),
        })?;
        let field = &handle.fields()[index];
        if field.kind_tag() != expected {
            return Err(Self::wrong_kind(field, &expected.to_string()));
        }
        Ok(FieldRef::new(object, index))
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    /// The child field owning `object`
    pub fn parent_field(&self, object: ObjectId) -> Option<FieldRef> {
        self.objects.get(object)?.parent_field()
    }

    /// The object owning `object`
    pub fn parent_object(&self, object: ObjectId) -> Option<ObjectId> {
        self.parent_field(object).map(|f| f.object)
    }

    /// Owners of `object`, nearest first
    pub fn ancestors(&self, object: ObjectId) -> Vec<ObjectId> {
        let mut ancestors = Vec::new();
        let mut current = object;
        while let Some(parent) = self.parent_object(current) {
            ancestors.push(parent);
            current = parent;
        }
        ancestors
    }

    /// Topmost owner of `object`, or the object itself when it has no parent
    pub fn find_root(&self, object: ObjectId) -> Option<ObjectId> {
        if !self.contains(object) {
            return None;
        }
        Some(self.ancestors(object).last().copied().unwrap_or(object))
    }

    /// True if `ancestor` owns `object` directly or indirectly
    pub fn is_ancestor_of(&self, ancestor: ObjectId, object: ObjectId) -> bool {
        let mut current = object;
        while let Some(parent) = self.parent_object(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Ancestors satisfying `predicate`, nearest first
    pub fn matching_ancestors(&self, object: ObjectId, predicate: impl Fn(&ObjectHandle) -> bool) -> Vec<ObjectId> {
        self.ancestors(object)
            .into_iter()
            .filter(|id| self.objects.get(*id).map_or(false, &predicate))
            .collect()
    }

    /// Nearest ancestor whose class derives from `class_keyword`
    pub fn first_ancestor_of_class(&self, object: ObjectId, class_keyword: &str) -> Option<ObjectId> {
        self.ancestors(object).into_iter().find(|id| {
            self.objects.get(*id).map_or(false, |o| o.inherits_class_with_keyword(class_keyword))
        })
    }

    /// Objects owned directly by `object`, field by field
    pub fn children(&self, object: ObjectId) -> Vec<ObjectId> {
        self.objects
            .get(object)
            .map(|o| o.fields().iter().flat_map(|f| f.child_objects()).collect())
            .unwrap_or_default()
    }

    /// Objects owned by one field
    pub fn child_objects(&self, field: FieldRef) -> Vec<ObjectId> {
        self.field(field).map(|f| f.child_objects()).unwrap_or_default()
    }

    /// Every object owned directly or indirectly by `object`, depth first
    pub fn descendants(&self, object: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        self.collect_descendants(object, &mut out);
        out
    }

    fn collect_descendants(&self, object: ObjectId, out: &mut Vec<ObjectId>) {
        for child in self.children(object) {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    /// Descendants satisfying `predicate`, depth first
    pub fn matching_descendants(&self, object: ObjectId, predicate: impl Fn(&ObjectHandle) -> bool) -> Vec<ObjectId> {
        self.descendants(object)
            .into_iter()
            .filter(|id| self.objects.get(*id).map_or(false, &predicate))
            .collect()
    }

    /// Descendants whose class derives from `T`
    pub fn descendants_of_type<T: ObjectClass>(&self, object: ObjectId) -> Vec<ObjectId> {
        self.matching_descendants(object, |o| o.inherits_class_with_keyword(T::CLASS_KEYWORD))
    }

    /// Pointer fields referring to `object`, one entry per reference
    pub fn referring_ptr_fields(&self, object: ObjectId) -> Vec<FieldRef> {
        self.objects
            .get(object)
            .map(|o| o.referring_ptr_fields().to_vec())
            .unwrap_or_default()
    }

    /// Distinct owners of the pointer fields referring to `object`
    pub fn objects_with_referring_ptr_fields(&self, object: ObjectId) -> Vec<ObjectId> {
        let mut owners = Vec::new();
        for field in self.referring_ptr_fields(object) {
            if !owners.contains(&field.object) {
                owners.push(field.object);
            }
        }
        owners
    }

    /// Guarded pointer observing `object`; null if it is gone
    pub fn guard(&self, object: ObjectId) -> GuardedPtr {
        self.objects.get(object).map(|o| o.guard(object)).unwrap_or_default()
    }

    // ---------------------------------------------------------------------
    // Capabilities
    // ---------------------------------------------------------------------

    /// Attach an owned capability to an object
    pub fn add_capability<C: Capability>(&mut self, object: ObjectId, capability: C) -> GraphResult<()> {
        self.get_mut(object)?.capabilities_mut().add(capability);
        Ok(())
    }

    /// Attach a shared capability to an object
    pub fn add_shared_capability(&mut self, object: ObjectId, capability: Rc<dyn Capability>) -> GraphResult<()> {
        self.get_mut(object)?.capabilities_mut().add_shared(capability);
        Ok(())
    }

    /// First capability of type `C` on an object
    pub fn capability<C: Capability>(&self, object: ObjectId) -> Option<&C> {
        self.objects.get(object)?.capability::<C>()
    }

    /// First owned capability of type `C` on an object, mutably
    pub fn capability_mut<C: Capability>(&mut self, object: ObjectId) -> Option<&mut C> {
        self.objects.get_mut(object)?.capability_mut::<C>()
    }

    /// Attach an owned capability to a field
    pub fn add_field_capability<C: Capability>(&mut self, field: FieldRef, capability: C) -> GraphResult<()> {
        self.field_handle_mut(field)?.add_capability(capability);
        Ok(())
    }

    /// First capability of type `C` on a field
    pub fn field_capability<C: Capability>(&self, field: FieldRef) -> Option<&C> {
        self.field(field)?.capability::<C>()
    }

    /// First owned capability of type `C` on a field, mutably
    pub fn field_capability_mut<C: Capability>(&mut self, field: FieldRef) -> Option<&mut C> {
        self.field_mut(field)?.capability_mut::<C>()
    }

    // ---------------------------------------------------------------------
    // Data values
    // ---------------------------------------------------------------------

    fn value_slot(&self, field: FieldRef) -> GraphResult<&ValueSlot> {
        let handle = self.field_handle(field)?;
        match handle.kind() {
            FieldKind::Value(slot) => Ok(slot),
            _ => Err(Self::wrong_kind(handle, "value")),
        }
    }

    pub(crate) fn value_slot_mut(&mut self, field: FieldRef) -> GraphResult<&mut ValueSlot> {
        let handle = self.field_handle_mut(field)?;
        if handle.kind_tag() != FieldKindTag::Value {
            return Err(Self::wrong_kind(handle, "value"));
        }
        match handle.kind_mut() {
            FieldKind::Value(slot) => Ok(slot),
            _ => Err(GraphError::object_not_found(field.object)),
        }
    }

    /// Read a data field
    pub fn value<T: FieldValue>(&self, object: ObjectId, field: ValueField<T>) -> GraphResult<T> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::Value)?;
        self.value_slot(field)?.get::<T>()
    }

    /// Write a data field and fire the owner's field-changed notification
    pub fn set_value<T: FieldValue>(&mut self, object: ObjectId, field: ValueField<T>, value: T) -> GraphResult<()> {
        let keyword = field.keyword();
        let field = self.typed_field(object, keyword, FieldKindTag::Value)?;
        let (old_value, new_value) = {
            let slot = self.value_slot_mut(field)?;
            if !slot.is_settable() {
                return Err(GraphError::ReadOnly(keyword.to_string()));
            }
            let old_value = slot.to_json().unwrap_or(Json::Null);
            slot.set(value)?;
            (old_value, slot.to_json().unwrap_or(Json::Null))
        };
        self.field_changed_by_capability(field, None, old_value, new_value);
        Ok(())
    }

    /// Read any data field as JSON
    pub fn value_json(&self, field: FieldRef) -> Result<Json> {
        Ok(self.value_slot(field)?.to_json()?)
    }

    /// Write any data field from JSON, notifying as a change made by `capability`
    pub fn set_value_json(&mut self, field: FieldRef, value: &Json, capability: Option<&str>) -> Result<()> {
        let (old_value, new_value) = {
            let slot = self.value_slot_mut(field)?;
            if !slot.is_settable() {
                return Err(Error::invalid_input(format!("field {} is read-only", field)));
            }
            let old_value = slot.to_json()?;
            slot.set_json(value)?;
            (old_value, slot.to_json()?)
        };
        self.field_changed_by_capability(field, capability, old_value, new_value);
        Ok(())
    }

    /// Swap the accessor behind a data field
    pub fn set_value_accessor<T: FieldValue, A: ValueAccessor<T>>(
        &mut self,
        object: ObjectId,
        field: ValueField<T>,
        accessor: A,
    ) -> GraphResult<()> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::Value)?;
        self.value_slot_mut(field)?.set_accessor(accessor)
    }

    /// Notify observers and the owner's class that a field changed
    pub fn field_changed_by_capability(
        &mut self,
        field: FieldRef,
        capability: Option<&str>,
        old_value: Json,
        new_value: Json,
    ) {
        let Some(object) = self.objects.get(field.object) else {
            return;
        };
        let change = FieldChanged {
            field,
            keyword: object.field(field.index).map(|f| f.keyword().to_string()).unwrap_or_default(),
            capability: capability.map(str::to_string),
            old_value,
            new_value,
        };
        object.field_changed().emit(&change);

        let class = Rc::clone(object.class());
        class.run_on_field_changed(self, &change);
    }

    // ---------------------------------------------------------------------
    // Ownership
    // ---------------------------------------------------------------------

    fn check_attachable(&self, field: FieldRef, child: ObjectId) -> GraphResult<()> {
        let handle = self.get(child)?;
        if !handle.is_alive() {
            return Err(GraphError::object_not_found(child));
        }
        if handle.parent_field().is_some() {
            return Err(GraphError::AlreadyParented { id: child.to_string() });
        }
        if child == field.object || self.is_ancestor_of(child, field.object) {
            return Err(GraphError::CycleDetected { id: child.to_string() });
        }
        let class_keyword = self.field_handle(field)?.kind().class_keyword().unwrap_or(BASE_CLASS_KEYWORD);
        if !handle.inherits_class_with_keyword(class_keyword) {
            return Err(GraphError::ClassMismatch {
                source_class: handle.class_keyword().to_string(),
                destination: class_keyword.to_string(),
            });
        }
        Ok(())
    }

    fn link_child(&mut self, field: FieldRef, child: ObjectId) {
        if let Some(handle) = self.objects.get_mut(child) {
            handle.set_as_parent_field(field);
        }
    }

    fn unlink_child(&mut self, field: FieldRef, child: ObjectId) {
        if let (Some(owner), Some(handle)) = (self.objects.get(field.object), self.objects.get(child)) {
            handle.disconnect_observer_from_all_signals(owner.observer());
        }
        if let Some(handle) = self.objects.get_mut(child) {
            handle.remove_as_parent_field(field);
        }
    }

    /// Owned object of a child field
    pub fn child<T: ObjectClass>(&self, object: ObjectId, field: ChildField<T>) -> GraphResult<Option<ObjectId>> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::Child)?;
        Ok(self.field_handle(field)?.child_objects().first().copied())
    }

    /// Replace the object owned by a child field, returning the detached previous child
    pub fn set_child<T: ObjectClass>(
        &mut self,
        object: ObjectId,
        field: ChildField<T>,
        child: Option<ObjectId>,
    ) -> GraphResult<Option<ObjectId>> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::Child)?;
        self.set_child_at_field(field, child)
    }

    /// Detach and return the object owned by a child field
    pub fn take_child<T: ObjectClass>(&mut self, object: ObjectId, field: ChildField<T>) -> GraphResult<Option<ObjectId>> {
        self.set_child(object, field, None)
    }

    pub(crate) fn set_child_at_field(&mut self, field: FieldRef, child: Option<ObjectId>) -> GraphResult<Option<ObjectId>> {
        let current = self.field_handle(field)?.child_objects().first().copied();
        if current == child {
            return Ok(None);
        }
        if let Some(child) = child {
            self.check_attachable(field, child)?;
        }
        if let Some(previous) = current {
            self.unlink_child(field, previous);
        }
        if let FieldKind::Child { child: slot, .. } = self.field_handle_mut(field)?.kind_mut() {
            *slot = child;
        }
        if let Some(child) = child {
            self.link_child(field, child);
        }
        Ok(current)
    }

    /// Objects owned by a child array field
    pub fn children_of<T: ObjectClass>(&self, object: ObjectId, field: ChildArrayField<T>) -> GraphResult<Vec<ObjectId>> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::ChildArray)?;
        Ok(self.field_handle(field)?.child_objects())
    }

    /// Number of objects in a child array field
    pub fn child_count<T: ObjectClass>(&self, object: ObjectId, field: ChildArrayField<T>) -> GraphResult<usize> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::ChildArray)?;
        self.array_len(field)
    }

    /// Object at `index` in a child array field
    pub fn child_at<T: ObjectClass>(
        &self,
        object: ObjectId,
        field: ChildArrayField<T>,
        index: usize,
    ) -> GraphResult<Option<ObjectId>> {
        Ok(self.children_of(object, field)?.get(index).copied())
    }

    /// Index of `child` in a child array field
    pub fn index_of_child<T: ObjectClass>(
        &self,
        object: ObjectId,
        field: ChildArrayField<T>,
        child: ObjectId,
    ) -> GraphResult<Option<usize>> {
        Ok(self.children_of(object, field)?.iter().position(|c| *c == child))
    }

    /// Append an object to a child array field
    pub fn push_child<T: ObjectClass>(&mut self, object: ObjectId, field: ChildArrayField<T>, child: ObjectId) -> GraphResult<()> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::ChildArray)?;
        let len = self.array_len(field)?;
        self.insert_child_at_field(field, len, child)
    }

    /// Insert an object into a child array field at `index` (`0..=len`)
    pub fn insert_child<T: ObjectClass>(
        &mut self,
        object: ObjectId,
        field: ChildArrayField<T>,
        index: usize,
        child: ObjectId,
    ) -> GraphResult<()> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::ChildArray)?;
        self.insert_child_at_field(field, index, child)
    }

    pub(crate) fn insert_child_at_field(&mut self, field: FieldRef, index: usize, child: ObjectId) -> GraphResult<()> {
        self.check_index(field, index, true)?;
        self.check_attachable(field, child)?;
        if let FieldKind::ChildArray { children, .. } = self.field_handle_mut(field)?.kind_mut() {
            children.insert(index, child);
        }
        self.link_child(field, child);
        Ok(())
    }

    /// Detach `child` from a child array field. Returns `None` if it was not there.
    pub fn remove_child<T: ObjectClass>(
        &mut self,
        object: ObjectId,
        field: ChildArrayField<T>,
        child: ObjectId,
    ) -> GraphResult<Option<ObjectId>> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::ChildArray)?;
        match self.field_handle(field)?.child_objects().iter().position(|c| *c == child) {
            Some(index) => self.take_child_at_field(field, index),
            None => Ok(None),
        }
    }

    /// Detach and return the object at `index` of a child array field
    pub fn take_child_at<T: ObjectClass>(
        &mut self,
        object: ObjectId,
        field: ChildArrayField<T>,
        index: usize,
    ) -> GraphResult<Option<ObjectId>> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::ChildArray)?;
        self.take_child_at_field(field, index)
    }

    pub(crate) fn take_child_at_field(&mut self, field: FieldRef, index: usize) -> GraphResult<Option<ObjectId>> {
        let removed = match self.field_handle_mut(field)?.kind_mut() {
            FieldKind::ChildArray { children, .. } if index < children.len() => Some(children.remove(index)),
            _ => None,
        };
        if let Some(child) = removed {
            self.unlink_child(field, child);
        }
        Ok(removed)
    }

    /// Remove and destroy the object at `index` of a child array field
    pub fn erase_child<T: ObjectClass>(&mut self, object: ObjectId, field: ChildArrayField<T>, index: usize) -> GraphResult<bool> {
        match self.take_child_at(object, field, index)? {
            Some(child) => Ok(self.destroy(child)),
            None => Ok(false),
        }
    }

    /// Detach every object of a child array field, returning them in order
    pub fn remove_all_children<T: ObjectClass>(&mut self, object: ObjectId, field: ChildArrayField<T>) -> GraphResult<Vec<ObjectId>> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::ChildArray)?;
        self.remove_all_children_at_field(field)
    }

    pub(crate) fn remove_all_children_at_field(&mut self, field: FieldRef) -> GraphResult<Vec<ObjectId>> {
        let removed = match self.field_handle_mut(field)?.kind_mut() {
            FieldKind::ChildArray { children, .. } => std::mem::take(children),
            _ => Vec::new(),
        };
        for child in &removed {
            self.unlink_child(field, *child);
        }
        Ok(removed)
    }

    /// Destroy every object of a child array field
    pub fn delete_all_children<T: ObjectClass>(&mut self, object: ObjectId, field: ChildArrayField<T>) -> GraphResult<()> {
        for child in self.remove_all_children(object, field)? {
            self.destroy(child);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Pointers
    // ---------------------------------------------------------------------

    fn check_pointable(&self, field: FieldRef, target: ObjectId) -> GraphResult<()> {
        let handle = self.get(target)?;
        if !handle.is_alive() {
            return Err(GraphError::object_not_found(target));
        }
        let class_keyword = self.field_handle(field)?.kind().class_keyword().unwrap_or(BASE_CLASS_KEYWORD);
        if !handle.inherits_class_with_keyword(class_keyword) {
            return Err(GraphError::ClassMismatch {
                source_class: handle.class_keyword().to_string(),
                destination: class_keyword.to_string(),
            });
        }
        Ok(())
    }

    fn register_ptr(&mut self, field: FieldRef, target: ObjectId) {
        if let Some(handle) = self.objects.get_mut(target) {
            handle.add_referring_ptr_field(field);
        }
    }

    fn deregister_ptr(&mut self, field: FieldRef, target: ObjectId) {
        if let Some(handle) = self.objects.get_mut(target) {
            handle.remove_referring_ptr_field(field);
        }
        if let (Some(owner), Some(handle)) = (self.objects.get(field.object), self.objects.get(target)) {
            let still_pointing = handle.referring_ptr_fields().iter().any(|f| f.object == field.object);
            if !still_pointing {
                handle.disconnect_observer_from_all_signals(owner.observer());
            }
        }
    }

    /// Drop a reference left over from a read; the caller's pointers win from here on
    fn forget_pending_reference(&mut self, field: FieldRef) {
        if let Some(io) = self.field_capability_mut::<FieldIoCapability>(field) {
            if io.pending_reference().is_some() {
                crate::log_debug!("Discarding unresolved reference of {}", field);
                io.clear_pending_reference();
            }
        }
    }

    /// Target of a pointer field
    pub fn ptr<T: ObjectClass>(&self, object: ObjectId, field: PtrField<T>) -> GraphResult<Option<ObjectId>> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::Ptr)?;
        Ok(self.field_handle(field)?.kind().ptr_targets().first().copied())
    }

    /// Point a pointer field at `target`, or clear it with `None`
    pub fn set_ptr<T: ObjectClass>(&mut self, object: ObjectId, field: PtrField<T>, target: Option<ObjectId>) -> GraphResult<()> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::Ptr)?;
        self.set_ptr_at_field(field, target)?;
        self.forget_pending_reference(field);
        Ok(())
    }

    pub(crate) fn set_ptr_at_field(&mut self, field: FieldRef, target: Option<ObjectId>) -> GraphResult<()> {
        if let Some(target) = target {
            self.check_pointable(field, target)?;
        }
        let handle = self.field_handle_mut(field)?;
        let previous = match handle.kind_mut() {
            FieldKind::Ptr { target: slot, .. } => {
                if *slot == target {
                    return Ok(());
                }
                std::mem::replace(slot, target)
            }
            _ => return Err(Self::wrong_kind(handle, "pointer")),
        };
        if let Some(previous) = previous {
            self.deregister_ptr(field, previous);
        }
        if let Some(target) = target {
            self.register_ptr(field, target);
        }
        Ok(())
    }

    /// Slots of a pointer array field, `None` for null slots
    pub fn ptrs<T: ObjectClass>(&self, object: ObjectId, field: PtrArrayField<T>) -> GraphResult<Vec<Option<ObjectId>>> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::PtrArray)?;
        match self.field_handle(field)?.kind() {
            FieldKind::PtrArray { targets, .. } => Ok(targets.clone()),
            _ => Ok(Vec::new()),
        }
    }

    /// Slot at `index` of a pointer array field
    pub fn ptr_at<T: ObjectClass>(&self, object: ObjectId, field: PtrArrayField<T>, index: usize) -> GraphResult<Option<ObjectId>> {
        Ok(self.ptrs(object, field)?.get(index).copied().flatten())
    }

    /// Number of slots in a pointer array field, null slots included
    pub fn ptr_count<T: ObjectClass>(&self, object: ObjectId, field: PtrArrayField<T>) -> GraphResult<usize> {
        Ok(self.ptrs(object, field)?.len())
    }

    /// Append a pointer to a pointer array field
    pub fn push_ptr<T: ObjectClass>(&mut self, object: ObjectId, field: PtrArrayField<T>, target: ObjectId) -> GraphResult<()> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::PtrArray)?;
        let len = self.array_len(field)?;
        self.insert_ptr_at_field(field, len, Some(target))?;
        self.forget_pending_reference(field);
        Ok(())
    }

    /// Insert a pointer into a pointer array field at `index` (`0..=len`)
    pub fn insert_ptr<T: ObjectClass>(
        &mut self,
        object: ObjectId,
        field: PtrArrayField<T>,
        index: usize,
        target: ObjectId,
    ) -> GraphResult<()> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::PtrArray)?;
        self.insert_ptr_at_field(field, index, Some(target))?;
        self.forget_pending_reference(field);
        Ok(())
    }

    pub(crate) fn insert_ptr_at_field(&mut self, field: FieldRef, index: usize, target: Option<ObjectId>) -> GraphResult<()> {
        self.check_index(field, index, true)?;
        if let Some(target) = target {
            self.check_pointable(field, target)?;
        }
        if let FieldKind::PtrArray { targets, .. } = self.field_handle_mut(field)?.kind_mut() {
            targets.insert(index, target);
        }
        if let Some(target) = target {
            self.register_ptr(field, target);
        }
        Ok(())
    }

    /// Remove every slot pointing at `target`, returning how many were removed
    pub fn remove_ptr<T: ObjectClass>(&mut self, object: ObjectId, field: PtrArrayField<T>, target: ObjectId) -> GraphResult<usize> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::PtrArray)?;
        let removed = match self.field_handle_mut(field)?.kind_mut() {
            FieldKind::PtrArray { targets, .. } => {
                let before = targets.len();
                targets.retain(|t| *t != Some(target));
                before - targets.len()
            }
            _ => 0,
        };
        for _ in 0..removed {
            self.deregister_ptr(field, target);
        }
        self.forget_pending_reference(field);
        Ok(removed)
    }

    /// Remove the slot at `index`, returning the object it pointed at
    pub fn erase_ptr<T: ObjectClass>(&mut self, object: ObjectId, field: PtrArrayField<T>, index: usize) -> GraphResult<Option<ObjectId>> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::PtrArray)?;
        self.check_index(field, index, false)?;
        let removed = match self.field_handle_mut(field)?.kind_mut() {
            FieldKind::PtrArray { targets, .. } => targets.remove(index),
            _ => None,
        };
        if let Some(target) = removed {
            self.deregister_ptr(field, target);
        }
        self.forget_pending_reference(field);
        Ok(removed)
    }

    /// Remove every slot of a pointer array field
    pub fn clear_ptrs<T: ObjectClass>(&mut self, object: ObjectId, field: PtrArrayField<T>) -> GraphResult<()> {
        let field = self.typed_field(object, field.keyword(), FieldKindTag::PtrArray)?;
        self.clear_ptrs_at_field(field)?;
        self.forget_pending_reference(field);
        Ok(())
    }

    pub(crate) fn clear_ptrs_at_field(&mut self, field: FieldRef) -> GraphResult<()> {
        let removed = match self.field_handle_mut(field)?.kind_mut() {
            FieldKind::PtrArray { targets, .. } => std::mem::take(targets),
            _ => Vec::new(),
        };
        for target in removed.into_iter().flatten() {
            self.deregister_ptr(field, target);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Arrays
    // ---------------------------------------------------------------------

    /// Length of a child array or pointer array field
    pub fn array_len(&self, field: FieldRef) -> GraphResult<usize> {
        let handle = self.field_handle(field)?;
        handle.kind().array_len().ok_or_else(|| Self::wrong_kind(handle, "array"))
    }

    /// Entry at `index` of an array field; `None` for null pointer slots
    pub fn array_item(&self, field: FieldRef, index: usize) -> GraphResult<Option<ObjectId>> {
        self.check_index(field, index, false)?;
        let handle = self.field_handle(field)?;
        Ok(match handle.kind() {
            FieldKind::ChildArray { children, .. } => children.get(index).copied(),
            FieldKind::PtrArray { targets, .. } => targets.get(index).copied().flatten(),
            _ => None,
        })
    }

    /// Move an array entry from `from` to `to` without touching ownership or pointer links
    pub fn move_array_item(&mut self, field: FieldRef, from: usize, to: usize) -> GraphResult<()> {
        self.check_index(field, from, false)?;
        self.check_index(field, to, false)?;
        let moved_ptr = match self.field_handle_mut(field)?.kind_mut() {
            FieldKind::ChildArray { children, .. } => {
                let item = children.remove(from);
                children.insert(to, item);
                false
            }
            FieldKind::PtrArray { targets, .. } => {
                let item = targets.remove(from);
                targets.insert(to, item);
                true
            }
            _ => false,
        };
        if moved_ptr {
            self.forget_pending_reference(field);
        }
        Ok(())
    }

    fn check_index(&self, field: FieldRef, index: usize, inclusive_end: bool) -> GraphResult<()> {
        let len = self.array_len(field)?;
        let in_range = if inclusive_end { index <= len } else { index < len };
        if in_range {
            Ok(())
        } else {
            Err(GraphError::IndexOutOfRange {
                keyword: self.field_handle(field)?.keyword().to_string(),
                index,
                len,
            })
        }
    }

    // ---------------------------------------------------------------------
    // Deletion
    // ---------------------------------------------------------------------

    /// Cut every link to and from `object` ahead of its deletion.
    ///
    /// The object leaves its parent container, its own pointers are cleared,
    /// pointer fields referring to it become null, its capabilities are
    /// dropped and guarded pointers observing it read null. Idempotent.
    pub fn prepare_for_delete(&mut self, object: ObjectId) {
        if !self.contains(object) {
            return;
        }
        if let Some(parent) = self.parent_field(object) {
            self.detach_from_container(parent, object);
        }
        self.clear_outgoing_ptrs(object);
        self.null_referring_ptrs(object);
        if let Some(handle) = self.objects.get_mut(object) {
            handle.release();
        }
    }

    /// Delete `object` and everything it owns. Returns false if it was not stored.
    pub fn destroy(&mut self, object: ObjectId) -> bool {
        if !self.contains(object) {
            return false;
        }
        for child in self.children(object) {
            self.destroy(child);
        }
        self.prepare_for_delete(object);
        self.objects.remove(object);
        crate::log_trace!("Destroyed {}", object);
        true
    }

    fn detach_from_container(&mut self, parent: FieldRef, child: ObjectId) {
        if let Some(field) = self.field_mut(parent) {
            match field.kind_mut() {
                FieldKind::Child { child: slot, .. } if *slot == Some(child) => *slot = None,
                FieldKind::ChildArray { children, .. } => children.retain(|c| *c != child),
                _ => {}
            }
        }
        self.unlink_child(parent, child);
    }

    fn clear_outgoing_ptrs(&mut self, object: ObjectId) {
        for field in self.fields(object) {
            let targets: Vec<ObjectId> = match self.field_mut(field).map(|f| f.kind_mut()) {
                Some(FieldKind::Ptr { target, .. }) => target.take().into_iter().collect(),
                Some(FieldKind::PtrArray { targets, .. }) => std::mem::take(targets).into_iter().flatten().collect(),
                _ => continue,
            };
            for target in targets {
                self.deregister_ptr(field, target);
            }
        }
    }

    fn null_referring_ptrs(&mut self, object: ObjectId) {
        let referring = match self.objects.get_mut(object) {
            Some(handle) => handle.take_referring_ptr_fields(),
            None => return,
        };
        let mut visited: Vec<FieldRef> = Vec::new();
        for field in referring {
            if visited.contains(&field) {
                continue;
            }
            visited.push(field);
            if let Some(handle) = self.field_mut(field) {
                match handle.kind_mut() {
                    FieldKind::Ptr { target, .. } if *target == Some(object) => *target = None,
                    FieldKind::PtrArray { targets, .. } => {
                        for slot in targets.iter_mut().filter(|t| **t == Some(object)) {
                            *slot = None;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::signal::SignalObserver;
    use crate::graph::test_objects::{Container, Document, Item, SpecialItem, Unrelated};
    use std::cell::RefCell;

    fn container_with_items(graph: &mut ObjectGraph, count: usize) -> (ObjectId, Vec<ObjectId>) {
        let container = graph.create::<Container>().unwrap();
        let items: Vec<_> = (0..count)
            .map(|i| {
                let item = graph.create::<Item>().unwrap();
                graph.set_value(item, Item::NAME, format!("item{}", i)).unwrap();
                graph.push_child(container, Container::ITEMS, item).unwrap();
                item
            })
            .collect();
        (container, items)
    }

    #[test]
    fn test_create_declares_fields_in_order() {
        let mut graph = ObjectGraph::new();
        let container = graph.create::<Container>().unwrap();
        let keywords: Vec<_> = graph
            .object(container)
            .unwrap()
            .fields()
            .iter()
            .map(|f| f.keyword().to_string())
            .collect();
        assert_eq!(keywords, vec!["title", "items", "selected", "favourites", "sub"]);
        assert!(graph.object(container).unwrap().uuid().is_some());
    }

    #[test]
    fn test_uuid_assignment_is_configurable() {
        let mut graph = ObjectGraph::with_config(GraphConfig { assign_uuids: false });
        let item = graph.create::<Item>().unwrap();
        assert_eq!(graph.object(item).unwrap().uuid(), None);
    }

    #[test]
    fn test_add_field_validates_keyword() {
        let mut graph = ObjectGraph::new();
        let item = graph.create::<Item>().unwrap();

        let extra = graph.add_field(item, "extra", FieldKind::Value(ValueSlot::new(5i64))).unwrap();
        assert_eq!(graph.value_json(extra).unwrap(), serde_json::json!(5));

        assert!(matches!(
            graph.add_field(item, "name", FieldKind::Value(ValueSlot::new(0i32))),
            Err(GraphError::DuplicateFieldKeyword { .. })
        ));
        assert!(matches!(
            graph.add_field(item, "label", FieldKind::Value(ValueSlot::new(0i32))),
            Err(GraphError::DuplicateFieldKeyword { .. })
        ));
        for bad in ["", "1st", ".hidden", "XmlThing", "two words"] {
            assert_eq!(
                graph.add_field(item, bad, FieldKind::Value(ValueSlot::new(0i32))),
                Err(GraphError::InvalidKeyword(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_values_and_aliases() {
        let mut graph = ObjectGraph::new();
        let item = graph.create::<Item>().unwrap();
        graph.set_value(item, Item::NAME, "first".to_string()).unwrap();
        graph.set_value(item, Item::VALUE, 2.5).unwrap();

        assert_eq!(graph.value(item, Item::NAME).unwrap(), "first");
        assert_eq!(graph.find_field(item, "label"), graph.find_field(item, "name"));
        assert!(matches!(
            graph.value(item, ValueField::<i32>::new("name")),
            Err(GraphError::TypeMismatch { .. })
        ));
        assert!(matches!(
            graph.value(item, ValueField::<i32>::new("missing")),
            Err(GraphError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_field_changed_signal() {
        // Goal: every value mutation reports old and new values to observers
        let mut graph = ObjectGraph::new();
        let item = graph.create::<Item>().unwrap();
        let observer = SignalObserver::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = seen.clone();
        graph.object(item).unwrap().field_changed().connect(&observer, move |change: &FieldChanged| {
            log.borrow_mut().push((change.keyword.clone(), change.old_value.clone(), change.new_value.clone()));
        });

        graph.set_value(item, Item::VALUE, 1.5).unwrap();
        let name = graph.find_field(item, "name").unwrap();
        graph.set_value_json(name, &serde_json::json!("ui"), Some("ui")).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                ("value".to_string(), serde_json::json!(0.0), serde_json::json!(1.5)),
                ("name".to_string(), serde_json::json!(""), serde_json::json!("ui")),
            ]
        );
    }

    #[test]
    fn test_class_field_changed_hook() {
        let mut graph = ObjectGraph::new();
        let document = graph.create::<Document>().unwrap();
        graph.set_value(document, Document::NOTE, "a".to_string()).unwrap();
        graph.set_value(document, Document::NOTE, "b".to_string()).unwrap();
        assert_eq!(graph.value(document, Document::NOTE_EDITS).unwrap(), 2);
    }

    #[test]
    fn test_child_array_parent_links() {
        let mut graph = ObjectGraph::new();
        let (container, items) = container_with_items(&mut graph, 3);
        let items_field = graph.find_field(container, "items").unwrap();

        for item in &items {
            assert_eq!(graph.parent_field(*item), Some(items_field));
            assert_eq!(graph.parent_object(*item), Some(container));
        }
        assert_eq!(graph.children_of(container, Container::ITEMS).unwrap(), items);
        assert_eq!(graph.index_of_child(container, Container::ITEMS, items[2]).unwrap(), Some(2));

        let removed = graph.remove_child(container, Container::ITEMS, items[1]).unwrap();
        assert_eq!(removed, Some(items[1]));
        assert_eq!(graph.parent_field(items[1]), None);
        assert!(graph.contains(items[1]));
        assert_eq!(graph.remove_child(container, Container::ITEMS, items[1]).unwrap(), None);
    }

    #[test]
    fn test_child_insertion_rules() {
        let mut graph = ObjectGraph::new();
        let (container, items) = container_with_items(&mut graph, 1);
        let other = graph.create::<Container>().unwrap();

        assert!(matches!(
            graph.push_child(other, Container::ITEMS, items[0]),
            Err(GraphError::AlreadyParented { .. })
        ));

        let loose = graph.create::<Item>().unwrap();
        assert!(matches!(
            graph.insert_child(container, Container::ITEMS, 5, loose),
            Err(GraphError::IndexOutOfRange { index: 5, len: 1, .. })
        ));
        graph.insert_child(container, Container::ITEMS, 0, loose).unwrap();
        assert_eq!(graph.child_at(container, Container::ITEMS, 0).unwrap(), Some(loose));

        let special = graph.create::<SpecialItem>().unwrap();
        graph.push_child(container, Container::ITEMS, special).unwrap();

        let stranger = graph.create::<Unrelated>().unwrap();
        assert!(matches!(
            graph.push_child(container, Container::ITEMS, stranger),
            Err(GraphError::ClassMismatch { .. })
        ));
    }

    #[test]
    fn test_cycles_rejected() {
        let mut graph = ObjectGraph::new();
        let outer = graph.create::<Container>().unwrap();
        let inner = graph.create::<Container>().unwrap();
        graph.set_child(outer, Container::SUB, Some(inner)).unwrap();

        assert!(matches!(
            graph.set_child(inner, Container::SUB, Some(outer)),
            Err(GraphError::CycleDetected { .. })
        ));
        assert!(matches!(
            graph.set_child(inner, Container::SUB, Some(inner)),
            Err(GraphError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_set_child_returns_previous() {
        let mut graph = ObjectGraph::new();
        let outer = graph.create::<Container>().unwrap();
        let first = graph.create::<Container>().unwrap();
        let second = graph.create::<Container>().unwrap();

        assert_eq!(graph.set_child(outer, Container::SUB, Some(first)).unwrap(), None);
        assert_eq!(graph.set_child(outer, Container::SUB, Some(second)).unwrap(), Some(first));
        assert_eq!(graph.parent_field(first), None);
        assert_eq!(graph.child(outer, Container::SUB).unwrap(), Some(second));
        assert_eq!(graph.take_child(outer, Container::SUB).unwrap(), Some(second));
        assert_eq!(graph.child(outer, Container::SUB).unwrap(), None);
    }

    #[test]
    fn test_detach_disconnects_owner_observer() {
        let mut graph = ObjectGraph::new();
        let (container, items) = container_with_items(&mut graph, 1);
        {
            let owner = graph.object(container).unwrap();
            graph.object(items[0]).unwrap().field_changed().connect(owner.observer(), |_| {});
        }
        assert_eq!(graph.object(items[0]).unwrap().field_changed().observer_count(), 1);

        graph.take_child_at(container, Container::ITEMS, 0).unwrap();
        assert_eq!(graph.object(items[0]).unwrap().field_changed().observer_count(), 0);
    }

    #[test]
    fn test_ptr_bookkeeping() {
        let mut graph = ObjectGraph::new();
        let (container, items) = container_with_items(&mut graph, 2);

        graph.set_ptr(container, Container::SELECTED, Some(items[0])).unwrap();
        graph.push_ptr(container, Container::FAVOURITES, items[0]).unwrap();
        graph.push_ptr(container, Container::FAVOURITES, items[1]).unwrap();

        let selected = graph.find_field(container, "selected").unwrap();
        let favourites = graph.find_field(container, "favourites").unwrap();
        assert_eq!(graph.referring_ptr_fields(items[0]), vec![selected, favourites]);
        assert_eq!(graph.objects_with_referring_ptr_fields(items[0]), vec![container]);

        graph.set_ptr(container, Container::SELECTED, Some(items[1])).unwrap();
        assert_eq!(graph.referring_ptr_fields(items[0]), vec![favourites]);

        assert_eq!(graph.remove_ptr(container, Container::FAVOURITES, items[0]).unwrap(), 1);
        assert!(graph.referring_ptr_fields(items[0]).is_empty());
        assert_eq!(graph.erase_ptr(container, Container::FAVOURITES, 0).unwrap(), Some(items[1]));
        assert_eq!(graph.referring_ptr_fields(items[1]), vec![selected]);

        let stranger = graph.create::<Unrelated>().unwrap();
        assert!(matches!(
            graph.set_ptr(container, Container::SELECTED, Some(stranger)),
            Err(GraphError::ClassMismatch { .. })
        ));
        assert_eq!(graph.ptr(container, Container::SELECTED).unwrap(), Some(items[1]));
    }

    #[test]
    fn test_destroy_nulls_pointers_and_guards() {
        // Goal: deleting a target nulls single pointers, keeps null array slots, and nulls guards
        let mut graph = ObjectGraph::new();
        let (container, items) = container_with_items(&mut graph, 3);
        for item in &items {
            graph.push_ptr(container, Container::FAVOURITES, *item).unwrap();
        }
        graph.set_ptr(container, Container::SELECTED, Some(items[1])).unwrap();
        let guard = graph.guard(items[1]);
        assert_eq!(guard, items[1]);

        assert!(graph.erase_child(container, Container::ITEMS, 1).unwrap());

        assert!(!graph.contains(items[1]));
        assert!(guard.is_null());
        assert_eq!(graph.ptr(container, Container::SELECTED).unwrap(), None);
        assert_eq!(graph.ptr_count(container, Container::FAVOURITES).unwrap(), 3);
        assert_eq!(graph.ptr_at(container, Container::FAVOURITES, 1).unwrap(), None);
        assert_eq!(graph.ptr_at(container, Container::FAVOURITES, 2).unwrap(), Some(items[2]));
        assert_eq!(graph.child_count(container, Container::ITEMS).unwrap(), 2);
    }

    #[test]
    fn test_destroy_is_recursive() {
        let mut graph = ObjectGraph::new();
        let outer = graph.create::<Container>().unwrap();
        let (inner, items) = container_with_items(&mut graph, 2);
        graph.set_child(outer, Container::SUB, Some(inner)).unwrap();
        graph.set_ptr(outer, Container::SELECTED, Some(items[0])).unwrap();

        assert_eq!(graph.descendants(outer), vec![inner, items[0], items[1]]);
        assert_eq!(graph.descendants_of_type::<Item>(outer), items);

        assert!(graph.destroy(inner));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.child(outer, Container::SUB).unwrap(), None);
        assert_eq!(graph.ptr(outer, Container::SELECTED).unwrap(), None);
        assert!(!graph.destroy(inner));
    }

    #[test]
    fn test_prepare_for_delete_is_idempotent() {
        let mut graph = ObjectGraph::new();
        let (container, items) = container_with_items(&mut graph, 1);
        graph.add_capability(items[0], crate::graph::test_objects::Tag("x")).unwrap();
        let guard = graph.guard(items[0]);

        graph.prepare_for_delete(items[0]);
        graph.prepare_for_delete(items[0]);

        assert!(guard.is_null());
        assert_eq!(graph.child_count(container, Container::ITEMS).unwrap(), 0);
        assert!(graph.object(items[0]).unwrap().capabilities().is_empty());
        assert!(matches!(
            graph.push_child(container, Container::ITEMS, items[0]),
            Err(GraphError::ObjectNotFound { .. })
        ));
    }

    #[test]
    fn test_navigation() {
        let mut graph = ObjectGraph::new();
        let outer = graph.create::<Container>().unwrap();
        let (inner, items) = container_with_items(&mut graph, 1);
        graph.set_child(outer, Container::SUB, Some(inner)).unwrap();

        assert_eq!(graph.ancestors(items[0]), vec![inner, outer]);
        assert_eq!(graph.find_root(items[0]), Some(outer));
        assert_eq!(graph.find_root(outer), Some(outer));
        assert_eq!(graph.first_ancestor_of_class(items[0], "Container"), Some(inner));
        assert_eq!(
            graph.matching_ancestors(items[0], |o| o.class_keyword() == "Container"),
            vec![inner, outer]
        );
        assert_eq!(graph.roots(), vec![outer]);
    }

    #[test]
    fn test_move_array_item() {
        let mut graph = ObjectGraph::new();
        let (container, items) = container_with_items(&mut graph, 3);
        let field = graph.find_field(container, "items").unwrap();

        graph.move_array_item(field, 2, 0).unwrap();
        assert_eq!(graph.children_of(container, Container::ITEMS).unwrap(), vec![items[2], items[0], items[1]]);
        assert_eq!(graph.parent_field(items[2]), Some(field));
        assert!(graph.move_array_item(field, 3, 0).is_err());
    }
}
