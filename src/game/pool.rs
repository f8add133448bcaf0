//! Slot Pools
//!
//! Arena storage for bullets, actors and objects. A slot is either free or
//! holds a fully built value; there is no half-initialised state. Freeing a
//! slot bumps its generation so that stale [`ThingId`]s held elsewhere (the
//! tile index, events in flight) stop resolving.
//!
//! Allocation always takes the lowest free slot, and iteration is in slot
//! order. Both matter: replicas that allocate the same sequence end up with
//! the same layout and update bullets in the same order.

use tracing::warn;

use crate::game::thing::{ThingId, ThingKind};

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational slot pool.
#[derive(Clone, Debug)]
pub struct Pool<T> {
    kind: ThingKind,
    slots: Vec<Slot<T>>,
}

impl<T> Pool<T> {
    /// Create a pool with `capacity` free slots.
    pub fn with_capacity(kind: ThingKind, capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot { generation: 0, value: None });
        Self { kind, slots }
    }

    /// Store a value in the lowest free slot, growing if none is free.
    pub fn alloc(&mut self, value: T) -> ThingId {
        let index = match self.slots.iter().position(|s| s.value.is_none()) {
            Some(i) => i,
            None => {
                warn!(kind = ?self.kind, from = self.slots.len(), "pool exhausted, growing");
                self.slots.push(Slot { generation: 0, value: None });
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.value = Some(value);
        ThingId { kind: self.kind, slot: index as u32, generation: slot.generation }
    }

    /// Release a slot. Returns the value if the id was still live.
    pub fn free(&mut self, id: ThingId) -> Option<T> {
        if id.kind != self.kind {
            return None;
        }
        let slot = self.slots.get_mut(id.slot as usize)?;
        if slot.generation != id.generation || slot.value.is_none() {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        slot.value.take()
    }

    /// Resolve a weak reference. `None` if the slot was freed or recycled.
    pub fn get(&self, id: ThingId) -> Option<&T> {
        if id.kind != self.kind {
            return None;
        }
        let slot = self.slots.get(id.slot as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Mutable [`Pool::get`].
    pub fn get_mut(&mut self, id: ThingId) -> Option<&mut T> {
        if id.kind != self.kind {
            return None;
        }
        let slot = self.slots.get_mut(id.slot as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// First live value matching `pred`, in slot order.
    pub fn find<F>(&self, mut pred: F) -> Option<(ThingId, &T)>
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().find(|(_, v)| pred(*v))
    }

    /// Live values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ThingId, &T)> + '_ {
        let kind = self.kind;
        self.slots.iter().enumerate().filter_map(move |(i, s)| {
            s.value.as_ref().map(|v| {
                (ThingId { kind, slot: i as u32, generation: s.generation }, v)
            })
        })
    }

    /// Mutable live values in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ThingId, &mut T)> + '_ {
        let kind = self.kind;
        self.slots.iter_mut().enumerate().filter_map(move |(i, s)| {
            let generation = s.generation;
            s.value.as_mut().map(|v| {
                (ThingId { kind, slot: i as u32, generation }, v)
            })
        })
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    /// No live values.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.value.is_none())
    }

    /// Total slots, free or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
