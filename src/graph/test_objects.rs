//! Classes shared by the crate's unit tests

use crate::graph::capability::Capability;
use crate::graph::class::{FieldDeclarations, ObjectClass};
use crate::graph::field::{ChildArrayField, ChildField, PtrArrayField, PtrField, ValueField};
use crate::graph::object::FieldChanged;
use crate::graph::store::ObjectGraph;
use crate::io::factory::ObjectFactory;
use crate::types::ObjectId;

#[derive(Debug, PartialEq)]
pub(crate) struct Tag(pub &'static str);
impl Capability for Tag {}

pub(crate) struct Item;

impl Item {
    pub const NAME: ValueField<String> = ValueField::new("name");
    pub const VALUE: ValueField<f64> = ValueField::new("value");
}

impl ObjectClass for Item {
    const CLASS_KEYWORD: &'static str = "Item";

    fn define_fields(fields: &mut FieldDeclarations<'_>) {
        fields.value(Self::NAME, String::new()).alias("label");
        fields.value(Self::VALUE, 0.0);
    }
}

pub(crate) struct SpecialItem;

impl SpecialItem {
    pub const LEVEL: ValueField<i32> = ValueField::new("level");
}

impl ObjectClass for SpecialItem {
    const CLASS_KEYWORD: &'static str = "SpecialItem";

    fn parent_class_keywords() -> Vec<&'static str> {
        vec!["Item"]
    }

    fn define_fields(fields: &mut FieldDeclarations<'_>) {
        Item::define_fields(fields);
        fields.value(Self::LEVEL, 1);
    }
}

pub(crate) struct ItemV2;

impl ItemV2 {
    pub const NOTES: ValueField<Vec<String>> = ValueField::new("notes");
}

impl ObjectClass for ItemV2 {
    const CLASS_KEYWORD: &'static str = "ItemV2";

    fn parent_class_keywords() -> Vec<&'static str> {
        vec!["Item"]
    }

    fn define_fields(fields: &mut FieldDeclarations<'_>) {
        Item::define_fields(fields);
        fields.value(Self::NOTES, Vec::new());
    }
}

pub(crate) struct Container;

impl Container {
    pub const TITLE: ValueField<String> = ValueField::new("title");
    pub const ITEMS: ChildArrayField<Item> = ChildArrayField::new("items");
    pub const SELECTED: PtrField<Item> = PtrField::new("selected");
    pub const FAVOURITES: PtrArrayField<Item> = PtrArrayField::new("favourites");
    pub const SUB: ChildField<Container> = ChildField::new("sub");
}

impl ObjectClass for Container {
    const CLASS_KEYWORD: &'static str = "Container";

    fn define_fields(fields: &mut FieldDeclarations<'_>) {
        fields.value(Self::TITLE, String::new());
        fields.child_array(Self::ITEMS);
        fields.ptr(Self::SELECTED);
        fields.ptr_array(Self::FAVOURITES);
        fields.child(Self::SUB);
    }
}

/// Exercises every lifecycle hook
pub(crate) struct Document;

impl Document {
    pub const ROOT: ChildField<Container> = ChildField::new("root");
    pub const NOTE: ValueField<String> = ValueField::new("note");
    pub const SAVE_COUNT: ValueField<i32> = ValueField::new("saveCount");
    pub const LOADED: ValueField<bool> = ValueField::new("loaded");
    pub const NOTE_EDITS: ValueField<i32> = ValueField::new("noteEdits");
}

impl ObjectClass for Document {
    const CLASS_KEYWORD: &'static str = "Document";

    fn define_fields(fields: &mut FieldDeclarations<'_>) {
        fields.child(Self::ROOT);
        fields.value(Self::NOTE, String::new()).copyable(false);
        fields.value(Self::SAVE_COUNT, 0);
        fields.value(Self::LOADED, false).without_io();
        fields.value(Self::NOTE_EDITS, 0).without_io();
    }

    fn setup_before_save(graph: &mut ObjectGraph, object: ObjectId) {
        let count = graph.value(object, Self::SAVE_COUNT).unwrap_or(0);
        let _ = graph.set_value(object, Self::SAVE_COUNT, count + 1);
    }

    fn init_after_read(graph: &mut ObjectGraph, object: ObjectId) {
        let _ = graph.set_value(object, Self::LOADED, true);
    }

    fn on_field_changed(graph: &mut ObjectGraph, change: &FieldChanged) {
        if change.keyword == Self::NOTE.keyword() {
            let edits = graph.value(change.object(), Self::NOTE_EDITS).unwrap_or(0);
            let _ = graph.set_value(change.object(), Self::NOTE_EDITS, edits + 1);
        }
    }
}

pub(crate) struct Unrelated;

impl Unrelated {
    pub const FLAG: ValueField<bool> = ValueField::new("flag");
}

impl ObjectClass for Unrelated {
    const CLASS_KEYWORD: &'static str = "Unrelated";

    fn define_fields(fields: &mut FieldDeclarations<'_>) {
        fields.value(Self::FLAG, false);
    }
}

pub(crate) fn factory() -> ObjectFactory {
    let mut factory = ObjectFactory::new();
    factory.register::<Item>();
    factory.register::<SpecialItem>();
    factory.register::<ItemV2>();
    factory.register::<Container>();
    factory.register::<Document>();
    factory.register::<Unrelated>();
    factory
}
