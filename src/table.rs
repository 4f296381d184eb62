//! # Hash table
//!
//! Open-addressed hash table keyed by interned strings, used for the
//! intern set itself and as the general associative container. Probing is
//! linear with wrap-around. Slot state is an explicit tri-state: a lookup
//! stops at a never-used slot but walks through deleted ones, so deletions
//! must leave a tombstone to keep probe chains intact.

use crate::heap::{Heap, ObjRef};
use crate::value::Value;

/// Grow rule: 8 slots when empty, doubling afterwards.
const INITIAL_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy)]
enum Slot {
    Empty,
    Tombstone,
    Live { key: ObjRef, value: Value },
}

#[derive(Debug, Default)]
pub struct Table {
    /// Live + tombstone slots. Growing on this sum (not just live entries)
    /// keeps the backing array from ever filling completely, which the
    /// probe loop relies on to terminate.
    count: usize,
    slots: Vec<Slot>,
}

impl Table {
    pub fn new() -> Self {
        Self {
            count: 0,
            slots: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Live { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, heap: &Heap, key: ObjRef) -> Option<Value> {
        if self.count == 0 {
            return None;
        }
        match self.slots[self.find_slot(heap, key)] {
            Slot::Live { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Insert or overwrite. Returns true when the key was not present.
    pub fn set(&mut self, heap: &Heap, key: ObjRef, value: Value) -> bool {
        if 4 * (self.count + 1) > 3 * self.slots.len() {
            self.grow(heap);
        }

        let index = self.find_slot(heap, key);
        let is_new = !matches!(self.slots[index], Slot::Live { .. });
        // A reused tombstone is already accounted for in `count`.
        if matches!(self.slots[index], Slot::Empty) {
            self.count += 1;
        }
        self.slots[index] = Slot::Live { key, value };
        is_new
    }

    /// Replace the entry with a tombstone so later probes keep walking.
    /// `count` stays put; the tombstone still occupies a slot.
    pub fn delete(&mut self, heap: &Heap, key: ObjRef) -> bool {
        if self.count == 0 {
            return false;
        }
        let index = self.find_slot(heap, key);
        if !matches!(self.slots[index], Slot::Live { .. }) {
            return false;
        }
        self.slots[index] = Slot::Tombstone;
        true
    }

    /// Copy every live entry of `from` into `self`.
    pub fn add_all(&mut self, heap: &Heap, from: &Table) {
        for slot in &from.slots {
            if let Slot::Live { key, value } = *slot {
                self.set(heap, key, value);
            }
        }
    }

    /// Content lookup for a string that has no handle yet. The hash and
    /// bytes identify the string; an empty non-tombstone slot proves
    /// absence. This is the query the interning constructor runs before
    /// allocating.
    pub fn find_string(&self, heap: &Heap, chars: &str, hash: u32) -> Option<ObjRef> {
        if self.count == 0 {
            return None;
        }
        let mut index = hash as usize % self.slots.len();
        loop {
            match self.slots[index] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Live { key, .. } => {
                    if heap.string_hash(key) == hash && heap.string(key) == chars {
                        return Some(key);
                    }
                }
            }
            index = (index + 1) % self.slots.len();
        }
    }

    /// Locate the slot for `key`: its live slot if present, otherwise the
    /// first reusable slot on its probe path (preferring a tombstone so
    /// deleted slots get recycled). Single modular loop; the load-factor
    /// ceiling guarantees a terminating empty slot.
    fn find_slot(&self, heap: &Heap, key: ObjRef) -> usize {
        let mut index = heap.string_hash(key) as usize % self.slots.len();
        let mut tombstone: Option<usize> = None;
        loop {
            match self.slots[index] {
                Slot::Empty => return tombstone.unwrap_or(index),
                Slot::Tombstone => {
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Slot::Live { key: existing, .. } => {
                    // Keys are interned, so identity comparison suffices.
                    if existing == key {
                        return index;
                    }
                }
            }
            index = (index + 1) % self.slots.len();
        }
    }

    fn grow(&mut self, heap: &Heap) {
        let capacity = if self.slots.is_empty() {
            INITIAL_CAPACITY
        } else {
            self.slots.len() * 2
        };
        let old = std::mem::replace(&mut self.slots, vec![Slot::Empty; capacity]);

        // Tombstones are dropped on rehash, so count resets to the live count.
        self.count = 0;
        for slot in old {
            if let Slot::Live { key, value } = slot {
                let index = self.find_slot(heap, key);
                self.slots[index] = Slot::Live { key, value };
                self.count += 1;
            }
        }
    }
}
