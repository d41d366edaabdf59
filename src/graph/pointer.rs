//! Guarded object pointers
//!
//! A [`GuardedPtr`] observes an object without owning it. It reads as null as
//! soon as the object is prepared for deletion, without needing access to the
//! graph.

use crate::types::ObjectId;
use std::fmt;
use std::rc::{Rc, Weak};

/// Liveness token held by every live object
pub(crate) type Liveness = Rc<()>;

/// Non-owning reference to an object that becomes null when the object dies.
#[derive(Clone, Default)]
pub struct GuardedPtr {
    id: Option<ObjectId>,
    alive: Weak<()>,
}

impl GuardedPtr {
    /// A pointer that observes nothing
    pub fn null() -> Self {
        Self::default()
    }

    pub(crate) fn new(id: ObjectId, liveness: Option<&Liveness>) -> Self {
        match liveness {
            Some(token) => Self { id: Some(id), alive: Rc::downgrade(token) },
            None => Self::null(),
        }
    }

    /// The observed object, or `None` once it has been deleted
    pub fn get(&self) -> Option<ObjectId> {
        if self.alive.strong_count() > 0 {
            self.id
        } else {
            None
        }
    }

    /// True when the pointer no longer observes a live object
    pub fn is_null(&self) -> bool {
        self.get().is_none()
    }

    /// Stop observing
    pub fn reset(&mut self) {
        *self = Self::null();
    }
}

impl PartialEq for GuardedPtr {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Eq for GuardedPtr {}

impl PartialEq<ObjectId> for GuardedPtr {
    fn eq(&self, other: &ObjectId) -> bool {
        self.get() == Some(*other)
    }
}

impl PartialEq<Option<ObjectId>> for GuardedPtr {
    fn eq(&self, other: &Option<ObjectId>) -> bool {
        self.get() == *other
    }
}

impl fmt::Debug for GuardedPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(id) => write!(f, "GuardedPtr({})", id),
            None => write!(f, "GuardedPtr(null)"),
        }
    }
}
