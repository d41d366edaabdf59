//! Per-field I/O capability
//!
//! Every declared field carries a [`FieldIoCapability`] telling the
//! serializer whether to write it, read it and carry it over on copies.
//! Pointer fields also park the references read from a document here until
//! the resolve pass turns them into live pointers.

use crate::core::error::GraphResult;
use crate::graph::capability::Capability;
use crate::graph::store::ObjectGraph;
use crate::types::FieldRef;

/// References read for a pointer field, waiting for resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingReference {
    /// Reference of a single pointer field
    Single(String),
    /// References of a pointer array field, one per slot
    Array(Vec<String>),
}

/// Serialization switches and pending references of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIoCapability {
    readable: bool,
    writable: bool,
    copyable: bool,
    pending: Option<PendingReference>,
}

impl Default for FieldIoCapability {
    fn default() -> Self {
        Self { readable: true, writable: true, copyable: true, pending: None }
    }
}

impl Capability for FieldIoCapability {}

impl FieldIoCapability {
    /// Readable, writable and copyable
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the reader populates the field
    pub fn is_io_readable(&self) -> bool {
        self.readable
    }

    /// Whether the writer emits the field
    pub fn is_io_writable(&self) -> bool {
        self.writable
    }

    /// Whether copy operations carry the field over
    pub fn is_copyable(&self) -> bool {
        self.copyable
    }

    /// Set whether the reader populates the field
    pub fn set_io_readable(&mut self, readable: bool) {
        self.readable = readable;
    }

    /// Set whether the writer emits the field
    pub fn set_io_writable(&mut self, writable: bool) {
        self.writable = writable;
    }

    /// Set whether copy operations carry the field over
    pub fn set_copyable(&mut self, copyable: bool) {
        self.copyable = copyable;
    }

    /// References read but not yet resolved
    pub fn pending_reference(&self) -> Option<&PendingReference> {
        self.pending.as_ref()
    }

    pub(crate) fn set_pending_reference(&mut self, pending: PendingReference) {
        self.pending = Some(pending);
    }

    pub(crate) fn clear_pending_reference(&mut self) {
        self.pending = None;
    }
}

/// Attach the default I/O capability unless the field already has one.
///
/// Returns true if a capability was added.
pub fn add_io_capability_to_field(graph: &mut ObjectGraph, field: FieldRef) -> GraphResult<bool> {
    if graph.field_capability::<FieldIoCapability>(field).is_some() {
        return Ok(false);
    }
    graph.add_field_capability(field, FieldIoCapability::new())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_objects::Document;

    #[test]
    fn test_flags_default_on() {
        let io = FieldIoCapability::new();
        assert!(io.is_io_readable());
        assert!(io.is_io_writable());
        assert!(io.is_copyable());
        assert!(io.pending_reference().is_none());
    }

    #[test]
    fn test_add_io_capability_only_when_absent() {
        // Goal: fields declared without I/O can opt back in exactly once
        let mut graph = ObjectGraph::new();
        let doc = graph.create::<Document>().unwrap();
        let loaded = graph.find_field(doc, "loaded").unwrap();
        let note = graph.find_field(doc, "note").unwrap();

        assert!(graph.field_capability::<FieldIoCapability>(loaded).is_none());
        assert!(add_io_capability_to_field(&mut graph, loaded).unwrap());
        assert!(!add_io_capability_to_field(&mut graph, loaded).unwrap());
        assert!(!add_io_capability_to_field(&mut graph, note).unwrap());

        let io = graph.field_capability::<FieldIoCapability>(note).unwrap();
        assert!(!io.is_copyable());
    }
}
