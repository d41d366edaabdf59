//! Textual references between objects and fields
//!
//! A reference from a root is a whitespace-separated list of
//! `fieldKeyword index` pairs walking down the ownership tree. A field
//! reference prefixes that path with the field keyword. References from a
//! pointer field start either with [`ROOT_MARKER`], meaning "from the root",
//! or with one `..` per level climbed from the field's owner before walking
//! down.

use crate::graph::ObjectGraph;
use crate::types::{FieldRef, ObjectId};

/// First token of a pointer reference resolved from the root
pub const ROOT_MARKER: &str = "$ROOT$";

/// Token climbing one ownership level
pub const PARENT_MARKER: &str = "..";

/// `fieldKeyword index` tokens from `root` down to `object`
fn path_tokens(graph: &ObjectGraph, root: ObjectId, object: ObjectId) -> Option<Vec<String>> {
    if !graph.contains(root) || !graph.contains(object) {
        return None;
    }
    let mut segments = Vec::new();
    let mut current = object;
    while current != root {
        let parent_field = graph.parent_field(current)?;
        let field = graph.field(parent_field)?;
        let index = field.child_objects().iter().position(|c| *c == current)?;
        segments.push((field.keyword().to_string(), index));
        current = parent_field.object;
    }
    Some(
        segments
            .into_iter()
            .rev()
            .flat_map(|(keyword, index)| [keyword, index.to_string()])
            .collect(),
    )
}

fn object_from_tokens(graph: &ObjectGraph, root: ObjectId, tokens: &[&str]) -> Option<ObjectId> {
    if !graph.contains(root) || tokens.len() % 2 != 0 {
        return None;
    }
    let mut current = root;
    for pair in tokens.chunks(2) {
        let field = graph.find_field(current, pair[0])?;
        let children = graph.child_objects(field);
        if children.is_empty() {
            return None;
        }
        let index: usize = pair[1].parse().ok()?;
        current = *children.get(index)?;
    }
    Some(current)
}

/// Objects from the topmost owner down to `object`
pub fn path_from_root(graph: &ObjectGraph, object: ObjectId) -> Vec<ObjectId> {
    if !graph.contains(object) {
        return Vec::new();
    }
    let mut path = graph.ancestors(object);
    path.reverse();
    path.push(object);
    path
}

/// Topmost owner of `object`
pub fn find_root(graph: &ObjectGraph, object: ObjectId) -> Option<ObjectId> {
    graph.find_root(object)
}

/// Topmost owner of the object holding `field`
pub fn find_root_of_field(graph: &ObjectGraph, field: FieldRef) -> Option<ObjectId> {
    graph.field(field)?;
    graph.find_root(field.object)
}

/// Path from `root` to `object`.
///
/// Empty when `object` is `root`, when either id is stale or when `object`
/// is not below `root`.
pub fn reference_from_root_to_object(graph: &ObjectGraph, root: ObjectId, object: ObjectId) -> String {
    path_tokens(graph, root, object).map(|t| t.join(" ")).unwrap_or_default()
}

/// Field keyword followed by the path from `root` to the field's owner
pub fn reference_from_root_to_field(graph: &ObjectGraph, root: ObjectId, field: FieldRef) -> String {
    let Some(handle) = graph.field(field) else {
        return String::new();
    };
    match path_tokens(graph, root, field.object) {
        Some(mut tokens) => {
            tokens.insert(0, handle.keyword().to_string());
            tokens.join(" ")
        }
        None => String::new(),
    }
}

/// Resolve a path produced by [`reference_from_root_to_object`].
///
/// An empty reference resolves to nothing.
pub fn object_from_reference(graph: &ObjectGraph, root: ObjectId, reference: &str) -> Option<ObjectId> {
    let tokens: Vec<&str> = reference.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }
    object_from_tokens(graph, root, &tokens)
}

/// Resolve a path produced by [`reference_from_root_to_field`]
pub fn field_from_reference(graph: &ObjectGraph, root: ObjectId, reference: &str) -> Option<FieldRef> {
    let tokens: Vec<&str> = reference.split_whitespace().collect();
    let (keyword, path) = tokens.split_first()?;
    let object = object_from_tokens(graph, root, path)?;
    graph.find_field(object, keyword)
}

/// Reference from a pointer field to `object` through their nearest common owner.
///
/// Empty when the two live in different trees.
pub fn reference_from_field_to_object(graph: &ObjectGraph, field: FieldRef, object: ObjectId) -> String {
    reference_from_field_within(graph, field, object, None)
}

/// Like [`reference_from_field_to_object`], with [`ROOT_MARKER`] standing for
/// `anchor` instead of the topmost owner. Targets whose common owner with the
/// field is not `anchor` are reached with `..` climbs.
pub fn reference_from_field_within(
    graph: &ObjectGraph,
    field: FieldRef,
    object: ObjectId,
    anchor: Option<ObjectId>,
) -> String {
    if graph.field(field).is_none() || !graph.contains(object) {
        return String::new();
    }
    let from_path = path_from_root(graph, field.object);
    let to_path = path_from_root(graph, object);
    if from_path.first() != to_path.first() {
        return String::new();
    }

    let mut common = 0;
    while common + 1 < from_path.len()
        && common + 1 < to_path.len()
        && from_path[common + 1] == to_path[common + 1]
    {
        common += 1;
    }

    let anchor = anchor.unwrap_or(from_path[0]);
    if from_path[common] == anchor {
        let mut tokens = vec![ROOT_MARKER.to_string()];
        tokens.extend(path_tokens(graph, anchor, object).unwrap_or_default());
        return tokens.join(" ");
    }

    let mut levels_up = from_path.len() - 1 - common;
    let mut ancestor = from_path[common];
    if levels_up == 0 && ancestor == object {
        // The owner itself: climb once so the reference is not empty.
        let Some(parent) = common.checked_sub(1).map(|i| from_path[i]) else {
            return String::new();
        };
        levels_up = 1;
        ancestor = parent;
    }

    let mut tokens = vec![PARENT_MARKER.to_string(); levels_up];
    tokens.extend(path_tokens(graph, ancestor, object).unwrap_or_default());
    tokens.join(" ")
}

/// Resolve a reference produced by [`reference_from_field_to_object`]
pub fn object_from_field_reference(graph: &ObjectGraph, field: FieldRef, reference: &str) -> Option<ObjectId> {
    object_from_field_reference_within(graph, field, reference, None)
}

/// Resolve a pointer reference with [`ROOT_MARKER`] standing for `anchor`
pub fn object_from_field_reference_within(
    graph: &ObjectGraph,
    field: FieldRef,
    reference: &str,
    anchor: Option<ObjectId>,
) -> Option<ObjectId> {
    graph.field(field)?;
    let tokens: Vec<&str> = reference.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let mut current = field.object;
    let mut rest = &tokens[..];
    if tokens[0] == ROOT_MARKER {
        current = match anchor {
            Some(anchor) => anchor,
            None => graph.find_root(field.object)?,
        };
        rest = &tokens[1..];
    } else {
        while let Some((first, tail)) = rest.split_first() {
            if *first != PARENT_MARKER {
                break;
            }
            current = graph.parent_object(current)?;
            rest = tail;
        }
    }
    object_from_tokens(graph, current, rest)
}
