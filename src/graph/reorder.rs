//! Reordering of array fields
//!
//! [`FieldReorderCapability`] marks a child array or pointer array as
//! reorderable by the user and announces every move on its `order_changed`
//! signal. Moves change only the position of an entry; ownership and pointer
//! links stay as they are.

use crate::core::error::{GraphError, GraphResult};
use crate::graph::capability::Capability;
use crate::graph::signal::Signal;
use crate::graph::store::ObjectGraph;
use crate::types::{FieldRef, ObjectId};

/// Payload of the `order_changed` signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderChanged {
    /// The reordered field
    pub field: FieldRef,
    /// Previous index of the moved entry
    pub from: usize,
    /// New index of the moved entry
    pub to: usize,
}

/// Marks an array field as reorderable
#[derive(Debug, Default)]
pub struct FieldReorderCapability {
    order_changed: Signal<OrderChanged>,
}

impl Capability for FieldReorderCapability {}

impl FieldReorderCapability {
    /// Create a capability with no observers
    pub fn new() -> Self {
        Self::default()
    }

    /// Fired after every successful move
    pub fn order_changed(&self) -> &Signal<OrderChanged> {
        &self.order_changed
    }

    /// Attach the capability to an array field unless it already has one
    pub fn add_to_field(graph: &mut ObjectGraph, field: FieldRef) -> GraphResult<()> {
        let handle = graph
            .field(field)
            .ok_or_else(|| GraphError::object_not_found(field.object))?;
        if !handle.kind().is_array() {
            return Err(GraphError::WrongFieldKind {
                keyword: handle.keyword().to_string(),
                expected: "array".to_string(),
                actual: handle.kind_tag().to_string(),
            });
        }
        if handle.capability::<FieldReorderCapability>().is_none() {
            graph.add_field_capability(field, FieldReorderCapability::new())?;
        }
        Ok(())
    }

    /// True if the field carries the capability
    pub fn field_is_reorderable(graph: &ObjectGraph, field: FieldRef) -> bool {
        graph.field_capability::<FieldReorderCapability>(field).is_some()
    }

    /// Any entry but the first can move up
    pub fn can_item_be_moved_up(index: usize) -> bool {
        index != 0
    }

    /// Any entry but the last can move down
    pub fn can_item_be_moved_down(graph: &ObjectGraph, field: FieldRef, index: usize) -> bool {
        let len = graph.array_len(field).unwrap_or(0);
        len > 1 && index < len - 1
    }

    /// Swap the entry at `index` with the one above it
    pub fn move_item_up(graph: &mut ObjectGraph, field: FieldRef, index: usize) -> bool {
        if !Self::can_item_be_moved_up(index) {
            return false;
        }
        Self::move_item(graph, field, index, index - 1)
    }

    /// Swap the entry at `index` with the one below it
    pub fn move_item_down(graph: &mut ObjectGraph, field: FieldRef, index: usize) -> bool {
        if !Self::can_item_be_moved_down(graph, field, index) {
            return false;
        }
        Self::move_item(graph, field, index, index + 1)
    }

    /// Move the entry at `index` to the front
    pub fn move_item_to_top(graph: &mut ObjectGraph, field: FieldRef, index: usize) -> bool {
        if !Self::can_item_be_moved_up(index) {
            return false;
        }
        Self::move_item(graph, field, index, 0)
    }

    /// Reorderable field owning `object`, if any
    pub fn reorder_capability_of_parent_container(graph: &ObjectGraph, object: ObjectId) -> Option<FieldRef> {
        graph
            .parent_field(object)
            .filter(|field| Self::field_is_reorderable(graph, *field))
    }

    fn move_item(graph: &mut ObjectGraph, field: FieldRef, from: usize, to: usize) -> bool {
        if !Self::field_is_reorderable(graph, field) {
            return false;
        }
        // Null pointer slots stay where they are.
        match graph.array_item(field, from) {
            Ok(Some(_)) => {}
            _ => return false,
        }
        if let Err(e) = graph.move_array_item(field, from, to) {
            crate::log_warn!("Reorder of {} failed: {}", field, e);
            return false;
        }
        if let Some(capability) = graph.field_capability::<FieldReorderCapability>(field) {
            capability.order_changed.emit(&OrderChanged { field, from, to });
        }
        true
    }
}
