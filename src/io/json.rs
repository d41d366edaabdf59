//! JSON serializer for object trees
//!
//! Documents have one JSON object per graph object:
//!
//! ```json
//! {
//!   "classKeyword": "Container",
//!   "uuid": "...",
//!   "fields": [
//!     { "keyword": "title", "type": "string", "value": "Inbox" },
//!     { "keyword": "items", "type": "Item[]", "value": [ { "classKeyword": "Item", ... } ] },
//!     { "keyword": "selected", "type": "Item*", "value": "$ROOT$ items 0" }
//!   ]
//! }
//! ```
//!
//! Reading runs in three passes over the tree: populate fields (pointer
//! references are only stored), resolve references, then run the
//! `init_after_read` hooks.

use crate::core::config::SerializerConfig;
use crate::core::error::{GraphError, Result, SerializationError};
use crate::graph::field::FieldHandle;
use crate::graph::store::ObjectGraph;
use crate::io::capability::FieldIoCapability;
use crate::io::factory::ObjectFactory;
use crate::io::field_io;
use crate::types::{FieldRef, ObjectId};
use serde_json::{Map, Value as Json};
use std::fs;
use std::path::Path;
use std::rc::Rc;
use uuid::Uuid;

/// Key holding an object's class keyword
pub const CLASS_KEYWORD_KEY: &str = "classKeyword";
/// Key holding an object's uuid
pub const UUID_KEY: &str = "uuid";
/// Key holding the in-process id of the written object
pub const SERVER_ADDRESS_KEY: &str = "serverAddress";
/// Key holding an object's field entries
pub const FIELDS_KEY: &str = "fields";
/// Key holding a field entry's keyword
pub const KEYWORD_KEY: &str = "keyword";
/// Key holding a field entry's portable data type
pub const TYPE_KEY: &str = "type";
/// Key holding a field entry's value
pub const VALUE_KEY: &str = "value";

/// Predicate restricting which fields are written and read
pub type FieldSelector = Rc<dyn Fn(&FieldHandle) -> bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadMode {
    /// Reading a document: uuids are taken over
    Document,
    /// Reading a copy: uuids stay fresh and non-copyable fields are skipped
    Copy,
}

/// Writes and reads object trees as JSON
pub struct JsonSerializer<'f> {
    factory: &'f ObjectFactory,
    config: SerializerConfig,
    field_selector: Option<FieldSelector>,
}

impl<'f> JsonSerializer<'f> {
    /// Serializer with default settings
    pub fn new(factory: &'f ObjectFactory) -> Self {
        Self::with_config(factory, SerializerConfig::default())
    }

    /// Serializer with explicit settings
    pub fn with_config(factory: &'f ObjectFactory, config: SerializerConfig) -> Self {
        Self { factory, config, field_selector: None }
    }

    /// Only write and read fields accepted by `selector`
    pub fn with_field_selector(mut self, selector: impl Fn(&FieldHandle) -> bool + 'static) -> Self {
        self.field_selector = Some(Rc::new(selector));
        self
    }

    /// Factory used to create objects named in documents
    pub fn factory(&self) -> &'f ObjectFactory {
        self.factory
    }

    /// Active settings
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    fn selects(&self, field: &FieldHandle) -> bool {
        self.field_selector.as_ref().map_or(true, |select| select(field))
    }

    // ---------------------------------------------------------------------
    // Writing
    // ---------------------------------------------------------------------

    /// Document for `object` and its subtree. Does not run save hooks.
    pub fn write_object_to_json(&self, graph: &ObjectGraph, object: ObjectId) -> Result<Json> {
        self.write_object(graph, object, object)
    }

    pub(crate) fn write_object(&self, graph: &ObjectGraph, object: ObjectId, document_root: ObjectId) -> Result<Json> {
        let handle = graph.object(object).ok_or_else(|| GraphError::object_not_found(object))?;

        let mut map = Map::new();
        map.insert(CLASS_KEYWORD_KEY.to_string(), Json::String(handle.class_keyword().to_string()));
        if self.config.write_uuids {
            if let Some(uuid) = handle.uuid() {
                map.insert(UUID_KEY.to_string(), Json::String(uuid.to_string()));
            }
        }
        if self.config.write_server_address {
            map.insert(SERVER_ADDRESS_KEY.to_string(), Json::String(object.to_string()));
        }

        let mut fields = Vec::new();
        for field in handle.fields() {
            let writable = field.capability::<FieldIoCapability>().is_some_and(|io| io.is_io_writable());
            if !writable || !self.selects(field) {
                continue;
            }
            let mut entry = Map::new();
            entry.insert(KEYWORD_KEY.to_string(), Json::String(field.keyword().to_string()));
            if self.config.write_type_tags {
                entry.insert(TYPE_KEY.to_string(), Json::String(field.data_type()));
            }
            let value = field_io::write_field(self, graph, field.field_ref(), document_root)?;
            entry.insert(VALUE_KEY.to_string(), value);
            fields.push(Json::Object(entry));
        }
        map.insert(FIELDS_KEY.to_string(), Json::Array(fields));
        Ok(Json::Object(map))
    }

    /// Run save hooks over the subtree, then write it as text
    pub fn write_object_to_string(&self, graph: &mut ObjectGraph, object: ObjectId) -> Result<String> {
        let json = self.prepare_and_write(graph, object)?;
        let text = if self.config.pretty {
            serde_json::to_string_pretty(&json)?
        } else {
            serde_json::to_string(&json)?
        };
        Ok(text)
    }

    /// Write the subtree of `object` to a file
    pub fn write_file(&self, graph: &mut ObjectGraph, object: ObjectId, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self.write_object_to_string(graph, object)?;
        fs::write(path, text)?;
        crate::log_info!("Wrote {} to {}", object, path.display());
        Ok(())
    }

    fn prepare_and_write(&self, graph: &mut ObjectGraph, object: ObjectId) -> Result<Json> {
        if !graph.contains(object) {
            return Err(GraphError::object_not_found(object).into());
        }
        setup_before_save_recursively(graph, object);
        self.write_object_to_json(graph, object)
    }

    // ---------------------------------------------------------------------
    // Reading
    // ---------------------------------------------------------------------

    /// Populate `object` from a document of the same class.
    ///
    /// Returns the pointer fields whose references could not be resolved.
    pub fn read_object_from_json(&self, graph: &mut ObjectGraph, object: ObjectId, json: &Json) -> Result<Vec<FieldRef>> {
        let expected = graph
            .object(object)
            .ok_or_else(|| GraphError::object_not_found(object))?
            .class_keyword()
            .to_string();
        let found = class_keyword_of(json)?;
        if found != expected {
            return Err(SerializationError::ClassMismatch { expected, found: found.to_string() }.into());
        }
        self.read_fields(graph, object, json, ReadMode::Document)?;
        Ok(self.finish_read(graph, object))
    }

    /// Populate `object` from document text
    pub fn read_object_from_str(&self, graph: &mut ObjectGraph, object: ObjectId, text: &str) -> Result<Vec<FieldRef>> {
        let json: Json = serde_json::from_str(text)?;
        self.read_object_from_json(graph, object, &json)
    }

    /// Populate `object` from a document file
    pub fn read_file(&self, graph: &mut ObjectGraph, object: ObjectId, path: impl AsRef<Path>) -> Result<Vec<FieldRef>> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let unresolved = self.read_object_from_str(graph, object, &text)?;
        crate::log_info!("Read {} from {}", object, path.display());
        Ok(unresolved)
    }

    /// Create the document's root object through the factory and populate it.
    ///
    /// Also returns the pointer fields whose references could not be resolved.
    pub fn create_object_from_str(&self, graph: &mut ObjectGraph, text: &str) -> Result<(ObjectId, Vec<FieldRef>)> {
        let json: Json = serde_json::from_str(text)?;
        let object = self.create_object_from_json(graph, &json, ReadMode::Document)?;
        let unresolved = self.finish_read(graph, object);
        Ok((object, unresolved))
    }

    /// Create an object from a document file
    pub fn create_object_from_file(
        &self,
        graph: &mut ObjectGraph,
        path: impl AsRef<Path>,
    ) -> Result<(ObjectId, Vec<FieldRef>)> {
        let text = fs::read_to_string(path.as_ref())?;
        self.create_object_from_str(graph, &text)
    }

    /// Uuid written at the top of a document, if any
    pub fn read_uuid_from_str(text: &str) -> Result<Option<Uuid>> {
        let json: Json = serde_json::from_str(text)?;
        Ok(json
            .get(UUID_KEY)
            .and_then(Json::as_str)
            .and_then(|uuid| Uuid::parse_str(uuid).ok()))
    }

    pub(crate) fn create_object_from_json(&self, graph: &mut ObjectGraph, json: &Json, mode: ReadMode) -> Result<ObjectId> {
        let keyword = class_keyword_of(json)?;
        let object = self
            .factory
            .create(graph, keyword)
            .ok_or_else(|| SerializationError::UnknownClass(keyword.to_string()))?;
        if let Err(e) = self.read_fields(graph, object, json, mode) {
            graph.destroy(object);
            return Err(e);
        }
        Ok(object)
    }

    fn read_fields(&self, graph: &mut ObjectGraph, object: ObjectId, json: &Json, mode: ReadMode) -> Result<()> {
        let map = json
            .as_object()
            .ok_or_else(|| SerializationError::InvalidDocument("expected a JSON object".to_string()))?;

        if mode == ReadMode::Document {
            let uuid = map.get(UUID_KEY).and_then(Json::as_str).and_then(|uuid| Uuid::parse_str(uuid).ok());
            if let (Some(uuid), Some(handle)) = (uuid, graph.object_mut(object)) {
                handle.set_uuid(Some(uuid));
            }
        }

        let Some(entries) = map.get(FIELDS_KEY) else {
            return Ok(());
        };
        let entries = entries
            .as_array()
            .ok_or_else(|| SerializationError::InvalidDocument(format!("'{}' must be an array", FIELDS_KEY)))?;

        for entry in entries {
            let Some(keyword) = entry.get(KEYWORD_KEY).and_then(Json::as_str) else {
                crate::log_debug!("Ignoring field entry without keyword on {}", object);
                continue;
            };
            let value = match entry.get(VALUE_KEY) {
                None | Some(Json::Null) => continue,
                Some(value) => value,
            };
            let Some(field) = graph.find_field(object, keyword) else {
                crate::log_debug!("Ignoring unknown field '{}' on {}", keyword, object);
                continue;
            };
            if !self.accepts(graph, field, mode) {
                continue;
            }
            if let Err(e) = field_io::read_field(self, graph, field, value, mode) {
                crate::log_warn!("Could not read field '{}' of {}: {}", keyword, object, e);
            }
        }
        Ok(())
    }

    fn accepts(&self, graph: &ObjectGraph, field: FieldRef, mode: ReadMode) -> bool {
        let Some(handle) = graph.field(field) else {
            return false;
        };
        let Some(io) = handle.capability::<FieldIoCapability>() else {
            return false;
        };
        io.is_io_readable() && (mode == ReadMode::Document || io.is_copyable()) && self.selects(handle)
    }

    fn finish_read(&self, graph: &mut ObjectGraph, root: ObjectId) -> Vec<FieldRef> {
        let unresolved = resolve_references_recursively(graph, root);
        if !unresolved.is_empty() {
            crate::log_warn!("{} pointer field(s) under {} could not be resolved", unresolved.len(), root);
        }
        init_after_read_recursively(graph, root);
        unresolved
    }

    // ---------------------------------------------------------------------
    // Copying
    // ---------------------------------------------------------------------

    /// Copy `object` and its subtree into a new root of the same class.
    ///
    /// Pointers leaving the copied subtree come back null and their fields are
    /// returned alongside the copy.
    pub fn copy_by_serialization(&self, graph: &mut ObjectGraph, object: ObjectId) -> Result<(ObjectId, Vec<FieldRef>)> {
        let keyword = graph
            .object(object)
            .ok_or_else(|| GraphError::object_not_found(object))?
            .class_keyword()
            .to_string();
        self.copy_as(graph, object, &keyword)
    }

    /// Copy `object` into a new root of class `destination_keyword`.
    ///
    /// Returns `None` unless one class derives from the other.
    pub fn copy_and_cast_by_serialization(
        &self,
        graph: &mut ObjectGraph,
        object: ObjectId,
        destination_keyword: &str,
    ) -> Result<Option<(ObjectId, Vec<FieldRef>)>> {
        let source = graph.object(object).ok_or_else(|| GraphError::object_not_found(object))?;
        let Some(destination) = self.factory.class(destination_keyword) else {
            crate::log_warn!("Cannot cast {} to unregistered class '{}'", object, destination_keyword);
            return Ok(None);
        };
        let related = destination.inherits_class_with_keyword(source.class_keyword())
            || source.inherits_class_with_keyword(destination_keyword);
        if !related {
            crate::log_warn!("Cannot cast {} to unrelated class '{}'", source.class_keyword(), destination_keyword);
            return Ok(None);
        }
        self.copy_as(graph, object, destination_keyword).map(Some)
    }

    fn copy_as(&self, graph: &mut ObjectGraph, object: ObjectId, keyword: &str) -> Result<(ObjectId, Vec<FieldRef>)> {
        let json = self.prepare_and_write(graph, object)?;
        let copy = self
            .factory
            .create(graph, keyword)
            .ok_or_else(|| SerializationError::UnknownClass(keyword.to_string()))?;
        if let Err(e) = self.read_fields(graph, copy, &json, ReadMode::Copy) {
            graph.destroy(copy);
            return Err(e);
        }
        let unresolved = self.finish_read(graph, copy);
        Ok((copy, unresolved))
    }
}

fn class_keyword_of(json: &Json) -> std::result::Result<&str, SerializationError> {
    json.get(CLASS_KEYWORD_KEY)
        .and_then(Json::as_str)
        .ok_or(SerializationError::MissingClassKeyword)
}

/// Resolve parked pointer references under `root`, with `root` as the
/// document root. Returns the fields that still fail.
pub fn resolve_references_recursively(graph: &mut ObjectGraph, root: ObjectId) -> Vec<FieldRef> {
    let mut objects = vec![root];
    objects.extend(graph.descendants(root));

    let mut unresolved = Vec::new();
    for object in objects {
        for field in graph.fields(object) {
            if !field_io::resolve_field_references(graph, field, root) {
                unresolved.push(field);
            }
        }
    }
    unresolved
}

/// Run `init_after_read` on every object under `root`, children first
pub fn init_after_read_recursively(graph: &mut ObjectGraph, root: ObjectId) {
    for child in graph.children(root) {
        init_after_read_recursively(graph, child);
    }
    if let Some(class) = graph.object(root).map(|o| Rc::clone(o.class())) {
        class.run_init_after_read(graph, root);
    }
}

/// Run `setup_before_save` on every object under `root`, children first
pub fn setup_before_save_recursively(graph: &mut ObjectGraph, root: ObjectId) {
    for child in graph.children(root) {
        setup_before_save_recursively(graph, child);
    }
    if let Some(class) = graph.object(root).map(|o| Rc::clone(o.class())) {
        class.run_setup_before_save(graph, root);
    }
}
