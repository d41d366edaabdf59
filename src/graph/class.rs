//! Object classes and field declarations
//!
//! A class is a Rust type implementing [`ObjectClass`]. It names itself with a
//! keyword, lists its ancestor keywords and declares its fields into a
//! [`FieldDeclarations`] builder when an object is created. The graph keeps a
//! shared [`ClassDescriptor`] per object so instances can be created and
//! inspected without knowing the Rust type.

use crate::core::error::GraphError;
use crate::graph::accessor::{ValueAccessor, ValueSlot};
use crate::graph::capability::Capability;
use crate::graph::field::{
    ChildArrayField, ChildField, FieldHandle, FieldKind, PtrArrayField, PtrField, ValueField,
};
use crate::graph::object::FieldChanged;
use crate::graph::store::ObjectGraph;
use crate::io::capability::FieldIoCapability;
use crate::io::keyword::is_valid_element_name;
use crate::types::{FieldValue, ObjectId};
use std::fmt;

/// Keyword every class inherits from
pub const BASE_CLASS_KEYWORD: &str = "Object";

/// A class of objects that can live in an [`ObjectGraph`]
pub trait ObjectClass: 'static {
    /// Unique, valid element name identifying the class in documents
    const CLASS_KEYWORD: &'static str;

    /// Ancestor class keywords, nearest first
    fn parent_class_keywords() -> Vec<&'static str> {
        Vec::new()
    }

    /// Declare the fields of a new instance, in order
    fn define_fields(fields: &mut FieldDeclarations<'_>);

    /// Called on every object of a tree, children first, before it is written
    fn setup_before_save(_graph: &mut ObjectGraph, _object: ObjectId) {}

    /// Called on every object of a tree, children first, after it is read
    fn init_after_read(_graph: &mut ObjectGraph, _object: ObjectId) {}

    /// Called after a field of the object changed value
    fn on_field_changed(_graph: &mut ObjectGraph, _change: &FieldChanged) {}
}

/// The root class. A field typed with it accepts any object.
pub struct AnyObject;

impl ObjectClass for AnyObject {
    const CLASS_KEYWORD: &'static str = BASE_CLASS_KEYWORD;

    fn define_fields(_fields: &mut FieldDeclarations<'_>) {}
}

/// Hook run on a single object
pub type ObjectHook = fn(&mut ObjectGraph, ObjectId);
/// Hook run after a field change
pub type FieldChangedHook = fn(&mut ObjectGraph, &FieldChanged);
/// Field declaration routine
pub type DefineFields = fn(&mut FieldDeclarations<'_>);

/// Runtime description of a class
#[derive(Clone)]
pub struct ClassDescriptor {
    keyword: String,
    inheritance_stack: Vec<String>,
    define_fields: DefineFields,
    setup_before_save: ObjectHook,
    init_after_read: ObjectHook,
    on_field_changed: FieldChangedHook,
}

fn no_hook(_graph: &mut ObjectGraph, _object: ObjectId) {}

fn no_change_hook(_graph: &mut ObjectGraph, _change: &FieldChanged) {}

impl ClassDescriptor {
    /// Descriptor for a Rust class type
    pub fn of<T: ObjectClass>() -> Self {
        Self {
            keyword: T::CLASS_KEYWORD.to_string(),
            inheritance_stack: build_inheritance_stack(T::CLASS_KEYWORD, &T::parent_class_keywords()),
            define_fields: T::define_fields,
            setup_before_save: T::setup_before_save,
            init_after_read: T::init_after_read,
            on_field_changed: T::on_field_changed,
        }
    }

    /// Descriptor for a class assembled at runtime, with no hooks
    pub fn new(keyword: impl Into<String>, parents: &[&str], define_fields: DefineFields) -> Self {
        let keyword = keyword.into();
        Self {
            inheritance_stack: build_inheritance_stack(&keyword, parents),
            keyword,
            define_fields,
            setup_before_save: no_hook,
            init_after_read: no_hook,
            on_field_changed: no_change_hook,
        }
    }

    /// The class keyword
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// This class keyword followed by ancestor keywords, ending with the base class
    pub fn inheritance_stack(&self) -> &[String] {
        &self.inheritance_stack
    }

    /// True if `keyword` is this class or one of its ancestors
    pub fn inherits_class_with_keyword(&self, keyword: &str) -> bool {
        matches_class_keyword(keyword, &self.inheritance_stack)
    }

    pub(crate) fn declare_fields(&self, declarations: &mut FieldDeclarations<'_>) {
        (self.define_fields)(declarations)
    }

    pub(crate) fn run_setup_before_save(&self, graph: &mut ObjectGraph, object: ObjectId) {
        (self.setup_before_save)(graph, object)
    }

    pub(crate) fn run_init_after_read(&self, graph: &mut ObjectGraph, object: ObjectId) {
        (self.init_after_read)(graph, object)
    }

    pub(crate) fn run_on_field_changed(&self, graph: &mut ObjectGraph, change: &FieldChanged) {
        (self.on_field_changed)(graph, change)
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("keyword", &self.keyword)
            .field("inheritance_stack", &self.inheritance_stack)
            .finish()
    }
}

fn build_inheritance_stack(keyword: &str, parents: &[&str]) -> Vec<String> {
    let mut stack = vec![keyword.to_string()];
    for parent in parents.iter().chain(std::iter::once(&BASE_CLASS_KEYWORD)) {
        if !stack.iter().any(|k| k == parent) {
            stack.push(parent.to_string());
        }
    }
    stack
}

/// True if `keyword` appears in an inheritance stack
pub fn matches_class_keyword(keyword: &str, inheritance_stack: &[String]) -> bool {
    inheritance_stack.iter().any(|k| k == keyword)
}

pub(crate) fn validate_field_keyword(
    keyword: &str,
    existing: &[FieldHandle],
    class_keyword: &str,
) -> Result<(), GraphError> {
    if !is_valid_element_name(keyword) {
        return Err(GraphError::InvalidKeyword(keyword.to_string()));
    }
    if existing.iter().any(|f| f.matches_keyword(keyword)) {
        return Err(GraphError::DuplicateFieldKeyword {
            keyword: keyword.to_string(),
            class: class_keyword.to_string(),
        });
    }
    Ok(())
}

/// Builder receiving a new object's field declarations.
///
/// Declared fields get a [`FieldIoCapability`] so they take part in
/// serialization unless configured otherwise.
pub struct FieldDeclarations<'a> {
    owner: ObjectId,
    class_keyword: &'a str,
    fields: &'a mut Vec<FieldHandle>,
    errors: &'a mut Vec<GraphError>,
}

impl<'a> FieldDeclarations<'a> {
    pub(crate) fn new(
        owner: ObjectId,
        class_keyword: &'a str,
        fields: &'a mut Vec<FieldHandle>,
        errors: &'a mut Vec<GraphError>,
    ) -> Self {
        Self { owner, class_keyword, fields, errors }
    }

    /// Declare a data field stored in place
    pub fn value<T: FieldValue>(&mut self, field: ValueField<T>, default: T) -> FieldDeclaration<'_> {
        self.declare(field.keyword(), FieldKind::Value(ValueSlot::new(default)))
    }

    /// Declare a data field backed by a custom accessor
    pub fn value_with_accessor<T: FieldValue, A: ValueAccessor<T>>(
        &mut self,
        field: ValueField<T>,
        accessor: A,
    ) -> FieldDeclaration<'_> {
        self.declare(field.keyword(), FieldKind::Value(ValueSlot::with_accessor(accessor)))
    }

    /// Declare a single-child field
    pub fn child<T: ObjectClass>(&mut self, field: ChildField<T>) -> FieldDeclaration<'_> {
        let kind = FieldKind::Child { class_keyword: T::CLASS_KEYWORD.to_string(), child: None };
        self.declare(field.keyword(), kind)
    }

    /// Declare a child array field
    pub fn child_array<T: ObjectClass>(&mut self, field: ChildArrayField<T>) -> FieldDeclaration<'_> {
        let kind = FieldKind::ChildArray { class_keyword: T::CLASS_KEYWORD.to_string(), children: Vec::new() };
        self.declare(field.keyword(), kind)
    }

    /// Declare a pointer field
    pub fn ptr<T: ObjectClass>(&mut self, field: PtrField<T>) -> FieldDeclaration<'_> {
        let kind = FieldKind::Ptr { class_keyword: T::CLASS_KEYWORD.to_string(), target: None };
        self.declare(field.keyword(), kind)
    }

    /// Declare a pointer array field
    pub fn ptr_array<T: ObjectClass>(&mut self, field: PtrArrayField<T>) -> FieldDeclaration<'_> {
        let kind = FieldKind::PtrArray { class_keyword: T::CLASS_KEYWORD.to_string(), targets: Vec::new() };
        self.declare(field.keyword(), kind)
    }

    /// Declare a field from an untyped kind
    pub fn declare(&mut self, keyword: &str, kind: FieldKind) -> FieldDeclaration<'_> {
        let declared = match validate_field_keyword(keyword, &self.fields[..], self.class_keyword) {
            Ok(()) => {
                let mut handle = FieldHandle::new(self.owner, self.fields.len(), keyword, kind);
                handle.add_capability(FieldIoCapability::new());
                self.fields.push(handle);
                true
            }
            Err(e) => {
                crate::log_error!("Rejected field declaration on {}: {}", self.class_keyword, e);
                self.errors.push(e);
                false
            }
        };
        FieldDeclaration {
            class_keyword: self.class_keyword,
            fields: &mut *self.fields,
            errors: &mut *self.errors,
            declared,
        }
    }
}

/// Further configuration of a just-declared field.
///
/// Calls on a rejected declaration are ignored.
pub struct FieldDeclaration<'d> {
    class_keyword: &'d str,
    fields: &'d mut Vec<FieldHandle>,
    errors: &'d mut Vec<GraphError>,
    declared: bool,
}

impl FieldDeclaration<'_> {
    fn field_mut(&mut self) -> Option<&mut FieldHandle> {
        if self.declared {
            self.fields.last_mut()
        } else {
            None
        }
    }

    /// Also accept `alias` as the keyword when reading.
    ///
    /// The alias must be a valid element name that no field of the class
    /// already answers to.
    pub fn alias(mut self, alias: &str) -> Self {
        if !self.declared {
            return self;
        }
        match validate_field_keyword(alias, &self.fields[..], self.class_keyword) {
            Ok(()) => {
                if let Some(field) = self.field_mut() {
                    field.add_alias(alias);
                }
            }
            Err(e) => {
                crate::log_error!("Rejected field alias on {}: {}", self.class_keyword, e);
                self.errors.push(e);
            }
        }
        self
    }

    /// Attach another capability
    pub fn capability<C: Capability>(mut self, capability: C) -> Self {
        if let Some(field) = self.field_mut() {
            field.add_capability(capability);
        }
        self
    }

    /// Whether the reader populates the field
    pub fn readable(self, readable: bool) -> Self {
        self.with_io(|io| io.set_io_readable(readable))
    }

    /// Whether the writer emits the field
    pub fn writable(self, writable: bool) -> Self {
        self.with_io(|io| io.set_io_writable(writable))
    }

    /// Whether copy operations carry the field over
    pub fn copyable(self, copyable: bool) -> Self {
        self.with_io(|io| io.set_copyable(copyable))
    }

    /// Exclude the field from serialization entirely
    pub fn without_io(mut self) -> Self {
        if let Some(field) = self.field_mut() {
            field.capabilities_mut().remove::<FieldIoCapability>();
        }
        self
    }

    fn with_io(mut self, apply: impl FnOnce(&mut FieldIoCapability)) -> Self {
        if let Some(io) = self.field_mut().and_then(|f| f.capability_mut::<FieldIoCapability>()) {
            apply(io);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_objects::{Item, SpecialItem};

    #[test]
    fn test_inheritance_stack() {
        let item = ClassDescriptor::of::<Item>();
        assert_eq!(item.inheritance_stack(), ["Item", "Object"]);

        let special = ClassDescriptor::of::<SpecialItem>();
        assert_eq!(special.inheritance_stack(), ["SpecialItem", "Item", "Object"]);
        assert!(special.inherits_class_with_keyword("Item"));
        assert!(!item.inherits_class_with_keyword("SpecialItem"));

        let any = ClassDescriptor::of::<AnyObject>();
        assert_eq!(any.inheritance_stack(), ["Object"]);
    }

    #[test]
    fn test_declarations_reject_bad_keywords() {
        // Goal: invalid and duplicate keywords are reported, valid ones still declared
        let mut fields = Vec::new();
        let mut errors = Vec::new();
        {
            let mut decl = FieldDeclarations::new(ObjectId::new(0, 0), "Test", &mut fields, &mut errors);
            decl.value(ValueField::<i32>::new("count"), 0).alias("total");
            decl.value(ValueField::<i32>::new("count"), 1);
            decl.value(ValueField::<i32>::new("total"), 1);
            decl.value(ValueField::<i32>::new("2fast"), 1);
            decl.value(ValueField::<bool>::new("flag"), false).writable(false);
        }

        assert_eq!(fields.len(), 2);
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], GraphError::DuplicateFieldKeyword { .. }));
        assert!(matches!(errors[1], GraphError::DuplicateFieldKeyword { .. }));
        assert_eq!(errors[2], GraphError::InvalidKeyword("2fast".to_string()));

        let io = fields[1].capability::<FieldIoCapability>().unwrap();
        assert!(io.is_io_readable());
        assert!(!io.is_io_writable());
    }

    #[test]
    fn test_aliases_are_validated() {
        // Goal: an alias can neither be malformed nor shadow another field's keyword
        let mut fields = Vec::new();
        let mut errors = Vec::new();
        {
            let mut decl = FieldDeclarations::new(ObjectId::new(0, 0), "Test", &mut fields, &mut errors);
            decl.value(ValueField::<String>::new("name"), String::new());
            decl.value(ValueField::<String>::new("title"), String::new())
                .alias("name")
                .alias("xmlTitle")
                .alias("heading")
                .alias("heading");
            decl.value(ValueField::<i32>::new("count"), 0).alias("size");
            decl.value(ValueField::<i32>::new("2fast"), 0).alias("quick");
        }

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1].aliases(), ["heading".to_string()]);
        assert_eq!(fields[2].aliases(), ["size".to_string()]);
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], GraphError::DuplicateFieldKeyword { .. }));
        assert_eq!(errors[1], GraphError::InvalidKeyword("xmlTitle".to_string()));
        assert!(matches!(errors[2], GraphError::DuplicateFieldKeyword { .. }));
        assert_eq!(errors[3], GraphError::InvalidKeyword("2fast".to_string()));
        assert!(fields.iter().all(|f| !f.matches_keyword("quick")));
    }
}
