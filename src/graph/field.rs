//! Field handles and typed field tokens
//!
//! Every object exposes an ordered list of [`FieldHandle`]s. A handle knows its
//! keyword, its owner and what it holds: a value, owned children or
//! non-owning pointers. Typed tokens such as [`ValueField`] name a field at
//! compile time and carry the value or class type used to access it.

use crate::graph::accessor::ValueSlot;
use crate::graph::capability::{Capability, CapabilitySet};
use crate::types::{FieldRef, ObjectId};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

macro_rules! field_token {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name<T> {
            keyword: &'static str,
            _marker: PhantomData<fn() -> T>,
        }

        impl<T> $name<T> {
            /// Name a field by keyword
            pub const fn new(keyword: &'static str) -> Self {
                Self { keyword, _marker: PhantomData }
            }

            /// The field keyword
            pub fn keyword(&self) -> &'static str {
                self.keyword
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $name<T> {}

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.keyword)
            }
        }
    };
}

field_token!(
    /// Token for a data field holding a `T`
    ValueField
);
field_token!(
    /// Token for a field owning at most one object of class `T`
    ChildField
);
field_token!(
    /// Token for a field owning an ordered list of objects of class `T`
    ChildArrayField
);
field_token!(
    /// Token for a non-owning pointer to an object of class `T`
    PtrField
);
field_token!(
    /// Token for an ordered list of non-owning pointers to class `T`
    PtrArrayField
);

/// What a field holds
#[derive(Debug)]
pub enum FieldKind {
    /// A data value behind an accessor
    Value(ValueSlot),
    /// Zero or one owned object
    Child {
        /// Class keyword accepted by the field
        class_keyword: String,
        /// The owned object
        child: Option<ObjectId>,
    },
    /// Ordered owned objects
    ChildArray {
        /// Class keyword accepted by the field
        class_keyword: String,
        /// The owned objects
        children: Vec<ObjectId>,
    },
    /// Zero or one non-owning pointer
    Ptr {
        /// Class keyword accepted by the field
        class_keyword: String,
        /// The pointed-to object
        target: Option<ObjectId>,
    },
    /// Ordered non-owning pointers; slots go null when targets are deleted
    PtrArray {
        /// Class keyword accepted by the field
        class_keyword: String,
        /// The pointed-to objects
        targets: Vec<Option<ObjectId>>,
    },
}

/// Field kind without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKindTag {
    /// Data value
    Value,
    /// Single owned child
    Child,
    /// Owned child list
    ChildArray,
    /// Single pointer
    Ptr,
    /// Pointer list
    PtrArray,
}

impl fmt::Display for FieldKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKindTag::Value => "value",
            FieldKindTag::Child => "child",
            FieldKindTag::ChildArray => "child array",
            FieldKindTag::Ptr => "pointer",
            FieldKindTag::PtrArray => "pointer array",
        };
        f.write_str(name)
    }
}

impl FieldKind {
    /// Payload-free kind
    pub fn tag(&self) -> FieldKindTag {
        match self {
            FieldKind::Value(_) => FieldKindTag::Value,
            FieldKind::Child { .. } => FieldKindTag::Child,
            FieldKind::ChildArray { .. } => FieldKindTag::ChildArray,
            FieldKind::Ptr { .. } => FieldKindTag::Ptr,
            FieldKind::PtrArray { .. } => FieldKindTag::PtrArray,
        }
    }

    /// Class keyword for object-holding fields
    pub fn class_keyword(&self) -> Option<&str> {
        match self {
            FieldKind::Value(_) => None,
            FieldKind::Child { class_keyword, .. }
            | FieldKind::ChildArray { class_keyword, .. }
            | FieldKind::Ptr { class_keyword, .. }
            | FieldKind::PtrArray { class_keyword, .. } => Some(class_keyword),
        }
    }

    /// Owned objects, in order
    pub fn child_objects(&self) -> Vec<ObjectId> {
        match self {
            FieldKind::Child { child, .. } => child.iter().copied().collect(),
            FieldKind::ChildArray { children, .. } => children.clone(),
            _ => Vec::new(),
        }
    }

    /// Non-null pointer targets, in order
    pub fn ptr_targets(&self) -> Vec<ObjectId> {
        match self {
            FieldKind::Ptr { target, .. } => target.iter().copied().collect(),
            FieldKind::PtrArray { targets, .. } => targets.iter().flatten().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// True for child arrays and pointer arrays
    pub fn is_array(&self) -> bool {
        matches!(self, FieldKind::ChildArray { .. } | FieldKind::PtrArray { .. })
    }

    /// Number of entries in an array field, counting null pointer slots
    pub fn array_len(&self) -> Option<usize> {
        match self {
            FieldKind::ChildArray { children, .. } => Some(children.len()),
            FieldKind::PtrArray { targets, .. } => Some(targets.len()),
            _ => None,
        }
    }

    /// Portable data type name written as the field's `type` tag.
    ///
    /// Values use the value type's portable name. Object fields use the class
    /// keyword with `[]` for arrays and `*` for pointers.
    pub fn data_type(&self) -> String {
        match self {
            FieldKind::Value(slot) => slot.portable_type_name(),
            FieldKind::Child { class_keyword, .. } => class_keyword.clone(),
            FieldKind::ChildArray { class_keyword, .. } => format!("{}[]", class_keyword),
            FieldKind::Ptr { class_keyword, .. } => format!("{}*", class_keyword),
            FieldKind::PtrArray { class_keyword, .. } => format!("{}*[]", class_keyword),
        }
    }
}

/// A named, typed slot on an object
pub struct FieldHandle {
    keyword: String,
    aliases: Vec<String>,
    owner: ObjectId,
    index: usize,
    kind: FieldKind,
    capabilities: CapabilitySet,
}

impl FieldHandle {
    pub(crate) fn new(owner: ObjectId, index: usize, keyword: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            keyword: keyword.into(),
            aliases: Vec::new(),
            owner,
            index,
            kind,
            capabilities: CapabilitySet::new(),
        }
    }

    /// The field keyword. Fixed for the lifetime of the field.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Alternative keywords accepted when reading
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub(crate) fn add_alias(&mut self, alias: impl Into<String>) {
        self.aliases.push(alias.into());
    }

    /// True if `keyword` is the field keyword or one of its aliases
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.keyword == keyword || self.aliases.iter().any(|a| a == keyword)
    }

    /// The object that owns this field
    pub fn owner_object(&self) -> ObjectId {
        self.owner
    }

    /// Address of this field
    pub fn field_ref(&self) -> FieldRef {
        FieldRef::new(self.owner, self.index)
    }

    /// What the field holds
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut FieldKind {
        &mut self.kind
    }

    /// Payload-free kind
    pub fn kind_tag(&self) -> FieldKindTag {
        self.kind.tag()
    }

    /// Owned objects, in order
    pub fn child_objects(&self) -> Vec<ObjectId> {
        self.kind.child_objects()
    }

    /// Portable data type name
    pub fn data_type(&self) -> String {
        self.kind.data_type()
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

    /// Attach an owned capability
    pub fn add_capability<C: Capability>(&mut self, capability: C) {
        self.capabilities.add(capability);
    }

    /// Attach a shared capability
    pub fn add_shared_capability(&mut self, capability: Rc<dyn Capability>) {
        self.capabilities.add_shared(capability);
    }
}

impl fmt::Debug for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHandle")
            .field("keyword", &self.keyword)
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: ValueField<String> = ValueField::new("name");

    #[test]
    fn test_data_type_names() {
        let owner = ObjectId::new(0, 0);
        let value = FieldHandle::new(owner, 0, "name", FieldKind::Value(ValueSlot::new(Vec::<i32>::new())));
        assert_eq!(value.data_type(), "int[]");

        let kinds = [
            (FieldKind::Child { class_keyword: "Item".into(), child: None }, "Item"),
            (FieldKind::ChildArray { class_keyword: "Item".into(), children: vec![] }, "Item[]"),
            (FieldKind::Ptr { class_keyword: "Item".into(), target: None }, "Item*"),
            (FieldKind::PtrArray { class_keyword: "Item".into(), targets: vec![] }, "Item*[]"),
        ];
        for (kind, expected) in kinds {
            assert_eq!(kind.data_type(), expected);
        }
    }

    #[test]
    fn test_aliases_and_tokens() {
        let mut field = FieldHandle::new(ObjectId::new(1, 0), 3, NAME.keyword(), FieldKind::Value(ValueSlot::new(String::new())));
        field.add_alias("label");
        assert!(field.matches_keyword("name"));
        assert!(field.matches_keyword("label"));
        assert!(!field.matches_keyword("title"));
        assert_eq!(field.field_ref(), FieldRef::new(ObjectId::new(1, 0), 3));
        assert_eq!(format!("{:?}", NAME), "ValueField(name)");
    }

    #[test]
    fn test_ptr_targets_skip_null_slots() {
        let a = ObjectId::new(1, 0);
        let b = ObjectId::new(2, 0);
        let kind = FieldKind::PtrArray { class_keyword: "Item".into(), targets: vec![Some(a), None, Some(b)] };
        assert_eq!(kind.ptr_targets(), vec![a, b]);
        assert_eq!(kind.array_len(), Some(3));
        assert!(kind.child_objects().is_empty());
    }
}
