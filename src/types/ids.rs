/// Identifier types for objects and fields.
///
/// Objects live in a generational arena, so an [`ObjectId`] carries the slot
/// index plus the generation the slot had when the object was created. A slot
/// reused after deletion gets a new generation and stale ids stop matching.

use std::fmt;

/// Handle to an object stored in an [`ObjectGraph`](crate::graph::ObjectGraph).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this id was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Pack the id into one integer, used as the `serverAddress` token
    pub fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    /// Inverse of [`ObjectId::to_bits`]
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Address of a field: the owning object and the field's declaration position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldRef {
    /// Object that owns the field
    pub object: ObjectId,
    /// Position of the field in the owner's field list
    pub index: usize,
}

impl FieldRef {
    /// Create a field reference
    pub fn new(object: ObjectId, index: usize) -> Self {
        Self { object, index }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.object, self.index)
    }
}
