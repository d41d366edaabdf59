//! Capabilities: optional behaviour attached to objects and fields
//!
//! A capability set is a small ordered collection of trait objects looked up
//! by concrete type. Entries are either owned by the set or shared with other
//! holders through an `Rc`.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Upcast helper so capability trait objects can be downcast by type
pub trait AsAny: Any {
    /// Shared `Any` view
    fn as_any(&self) -> &dyn Any;
    /// Mutable `Any` view
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Marker for types that can be attached to an object or a field
pub trait Capability: AsAny {}

enum CapabilityEntry {
    Owned(Box<dyn Capability>),
    Shared(Rc<dyn Capability>),
}

impl CapabilityEntry {
    fn get(&self) -> &dyn Capability {
        match self {
            CapabilityEntry::Owned(capability) => &**capability,
            CapabilityEntry::Shared(capability) => &**capability,
        }
    }
}

/// Ordered set of capabilities. Lookup returns the first entry of the type.
#[derive(Default)]
pub struct CapabilitySet {
    entries: Vec<CapabilityEntry>,
}

impl CapabilitySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a capability owned by this set
    pub fn add<C: Capability>(&mut self, capability: C) {
        self.entries.push(CapabilityEntry::Owned(Box::new(capability)));
    }

    /// Attach a capability shared with other holders
    pub fn add_shared(&mut self, capability: Rc<dyn Capability>) {
        self.entries.push(CapabilityEntry::Shared(capability));
    }

    /// First capability of type `C`
    pub fn get<C: Capability>(&self) -> Option<&C> {
        self.entries.iter().find_map(|entry| entry.get().as_any().downcast_ref::<C>())
    }

    /// First owned capability of type `C`, mutably. Shared entries are skipped.
    pub fn get_mut<C: Capability>(&mut self) -> Option<&mut C> {
        self.entries.iter_mut().find_map(|entry| match entry {
            CapabilityEntry::Owned(capability) => (**capability).as_any_mut().downcast_mut::<C>(),
            CapabilityEntry::Shared(_) => None,
        })
    }

    /// True if a capability of type `C` is attached
    pub fn contains<C: Capability>(&self) -> bool {
        self.get::<C>().is_some()
    }

    /// Detach every capability of type `C`, returning how many were removed
    pub fn remove<C: Capability>(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.get().as_any().is::<C>());
        before - self.entries.len()
    }

    /// Number of attached capabilities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is attached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop owned capabilities and release shared ones
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owned = self.entries.iter().filter(|e| matches!(e, CapabilityEntry::Owned(_))).count();
        f.debug_struct("CapabilitySet")
            .field("owned", &owned)
            .field("shared", &(self.entries.len() - owned))
            .finish()
    }
}
