//! Per-field-kind serialization
//!
//! Each field kind maps to a write, read and resolve routine. Values convert
//! straight to JSON, child fields recurse into the serializer, and pointer
//! fields go through textual references: written relative to the pointing
//! field, parked on the field's [`FieldIoCapability`] when read and turned
//! into live pointers by the resolve pass.

use crate::core::error::{GraphError, Result, SerializationError};
use crate::graph::field::{FieldKind, FieldKindTag};
use crate::graph::store::ObjectGraph;
use crate::io::capability::{FieldIoCapability, PendingReference};
use crate::io::json::{JsonSerializer, ReadMode};
use crate::reference::{object_from_field_reference_within, reference_from_field_within};
use crate::types::{FieldRef, ObjectId};
use serde_json::Value as Json;

/// JSON value of a field inside the document rooted at `document_root`
pub(crate) fn write_field(
    serializer: &JsonSerializer<'_>,
    graph: &ObjectGraph,
    field: FieldRef,
    document_root: ObjectId,
) -> Result<Json> {
    let handle = graph.field(field).ok_or_else(|| GraphError::object_not_found(field))?;
    let value = match handle.kind() {
        FieldKind::Value(slot) => slot.to_json()?,
        FieldKind::Child { child, .. } => match child {
            Some(child) => serializer.write_object(graph, *child, document_root)?,
            None => Json::Null,
        },
        FieldKind::ChildArray { children, .. } => Json::Array(
            children
                .iter()
                .map(|child| serializer.write_object(graph, *child, document_root))
                .collect::<Result<Vec<_>>>()?,
        ),
        FieldKind::Ptr { target, .. } => Json::String(pointer_reference(graph, field, *target, document_root)),
        FieldKind::PtrArray { targets, .. } => Json::Array(
            targets
                .iter()
                .map(|target| Json::String(pointer_reference(graph, field, *target, document_root)))
                .collect(),
        ),
    };
    Ok(value)
}

fn pointer_reference(graph: &ObjectGraph, field: FieldRef, target: Option<ObjectId>, document_root: ObjectId) -> String {
    let Some(target) = target else {
        return String::new();
    };
    let reference = reference_from_field_within(graph, field, target, Some(document_root));
    if reference.is_empty() {
        crate::log_debug!("Pointer {} -> {} is unreachable, writing empty reference", field, target);
    }
    reference
}

/// Populate a field from its JSON value.
///
/// Values are set without change notifications. Pointer references are only
/// stored; [`resolve_field_references`] connects them later.
pub(crate) fn read_field(
    serializer: &JsonSerializer<'_>,
    graph: &mut ObjectGraph,
    field: FieldRef,
    value: &Json,
    mode: ReadMode,
) -> Result<()> {
    let tag = graph.field(field).ok_or_else(|| GraphError::object_not_found(field))?.kind_tag();
    match tag {
        FieldKindTag::Value => {
            let slot = graph.value_slot_mut(field)?;
            if !slot.is_settable() {
                crate::log_debug!("Skipping read-only field {}", field);
                return Ok(());
            }
            slot.set_json(value)?;
        }
        FieldKindTag::Child => {
            let child = serializer.create_object_from_json(graph, value, mode)?;
            match graph.set_child_at_field(field, Some(child)) {
                Ok(Some(previous)) => {
                    graph.destroy(previous);
                }
                Ok(None) => {}
                Err(e) => {
                    graph.destroy(child);
                    return Err(e.into());
                }
            }
        }
        FieldKindTag::ChildArray => {
            let items = value.as_array().ok_or_else(|| expected("an array of objects", field))?;
            for previous in graph.remove_all_children_at_field(field)? {
                graph.destroy(previous);
            }
            for item in items.iter().filter(|item| !item.is_null()) {
                let child = match serializer.create_object_from_json(graph, item, mode) {
                    Ok(child) => child,
                    Err(e) => {
                        crate::log_warn!("Skipping element of {}: {}", field, e);
                        continue;
                    }
                };
                let index = graph.array_len(field)?;
                if let Err(e) = graph.insert_child_at_field(field, index, child) {
                    crate::log_warn!("Skipping element of {}: {}", field, e);
                    graph.destroy(child);
                }
            }
        }
        FieldKindTag::Ptr => {
            let reference = value.as_str().ok_or_else(|| expected("a reference string", field))?;
            graph.set_ptr_at_field(field, None)?;
            set_pending(graph, field, PendingReference::Single(reference.to_string()));
        }
        FieldKindTag::PtrArray => {
            let references = value
                .as_array()
                .ok_or_else(|| expected("an array of reference strings", field))?
                .iter()
                .map(|reference| reference.as_str().unwrap_or_default().to_string())
                .collect();
            graph.clear_ptrs_at_field(field)?;
            set_pending(graph, field, PendingReference::Array(references));
        }
    }
    Ok(())
}

fn expected(what: &str, field: FieldRef) -> SerializationError {
    SerializationError::InvalidDocument(format!("expected {} for field {}", what, field))
}

fn set_pending(graph: &mut ObjectGraph, field: FieldRef, pending: PendingReference) {
    if let Some(io) = graph.field_capability_mut::<FieldIoCapability>(field) {
        io.set_pending_reference(pending);
    }
}

enum Resolution {
    Null,
    Target(ObjectId),
    Failed,
}

fn resolve_reference(graph: &ObjectGraph, field: FieldRef, reference: &str, anchor: ObjectId) -> Resolution {
    if reference.trim().is_empty() {
        return Resolution::Null;
    }
    match object_from_field_reference_within(graph, field, reference, Some(anchor)) {
        Some(target) => Resolution::Target(target),
        None => {
            crate::log_debug!("Could not resolve '{}' for {}", reference, field);
            Resolution::Failed
        }
    }
}

/// Connect the references parked on a pointer field.
///
/// Returns false if any reference failed to resolve; those stay parked so a
/// later pass can retry. Fields with nothing parked succeed trivially.
pub(crate) fn resolve_field_references(graph: &mut ObjectGraph, field: FieldRef, anchor: ObjectId) -> bool {
    let Some(pending) = graph
        .field_capability::<FieldIoCapability>(field)
        .and_then(|io| io.pending_reference().cloned())
    else {
        return true;
    };

    let resolved = match pending {
        PendingReference::Single(reference) => resolve_single(graph, field, &reference, anchor),
        PendingReference::Array(references) => resolve_array(graph, field, &references, anchor),
    };
    if resolved {
        if let Some(io) = graph.field_capability_mut::<FieldIoCapability>(field) {
            io.clear_pending_reference();
        }
    }
    resolved
}

fn resolve_single(graph: &mut ObjectGraph, field: FieldRef, reference: &str, anchor: ObjectId) -> bool {
    let target = match resolve_reference(graph, field, reference, anchor) {
        Resolution::Null => None,
        Resolution::Target(target) => Some(target),
        Resolution::Failed => return false,
    };
    match graph.set_ptr_at_field(field, target) {
        Ok(()) => true,
        Err(e) => {
            crate::log_warn!("Resolved '{}' for {} but could not point at it: {}", reference, field, e);
            false
        }
    }
}

fn resolve_array(graph: &mut ObjectGraph, field: FieldRef, references: &[String], anchor: ObjectId) -> bool {
    if graph.clear_ptrs_at_field(field).is_err() {
        return false;
    }
    let mut complete = true;
    for (index, reference) in references.iter().enumerate() {
        let target = match resolve_reference(graph, field, reference, anchor) {
            Resolution::Null => None,
            Resolution::Target(target) => Some(target),
            Resolution::Failed => {
                complete = false;
                None
            }
        };
        if let Err(e) = graph.insert_ptr_at_field(field, index, target) {
            crate::log_warn!("Resolved '{}' for {} but could not point at it: {}", reference, field, e);
            complete = false;
            if graph.insert_ptr_at_field(field, index, None).is_err() {
                return false;
            }
        }
    }
    complete
}
