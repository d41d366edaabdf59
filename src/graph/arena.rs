use crate::types::ObjectId;

/// Statistics for arena slot usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    /// Live entries
    pub live: usize,
    /// Slots ever allocated
    pub slots: usize,
    /// Slots waiting for reuse
    pub free: usize,
}

/// Generational slot arena that owns every object in a graph.
///
/// Removing an entry bumps the slot generation, so ids issued before the
/// removal no longer resolve even after the slot is reused.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Arena { slots: Vec::new(), free: Vec::new(), live: 0 }
    }

    /// Current statistics snapshot
    pub fn stats(&self) -> ArenaStats {
        ArenaStats { live: self.live, slots: self.slots.len(), free: self.free.len() }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.live
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// The id the next [`Arena::insert`] will return
    pub fn next_id(&self) -> ObjectId {
        match self.free.last() {
            Some(&index) => ObjectId::new(index, self.slots[index as usize].generation),
            None => ObjectId::new(self.slots.len() as u32, 0),
        }
    }

    /// Store a value and return its id
    pub fn insert(&mut self, value: T) -> ObjectId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return ObjectId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, value: Some(value) });
        ObjectId::new(index, 0)
    }

    /// Remove and return the value for `id`
    pub fn remove(&mut self, id: ObjectId) -> Option<T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.live -= 1;
        Some(value)
    }

    /// True if `id` refers to a live entry
    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Shared access to an entry
    pub fn get(&self, id: ObjectId) -> Option<&T> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Mutable access to an entry
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    /// Iterate over live entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (ObjectId::new(index as u32, slot.generation), value))
        })
    }

    /// Ids of all live entries
    pub fn ids(&self) -> Vec<ObjectId> {
        self.iter().map(|(id, _)| id).collect()
    }
}
