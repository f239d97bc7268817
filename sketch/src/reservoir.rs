use rand::Rng;
use std::collections::HashMap;
use std::hash::Hash;

/// A uniform sample of up to `cap` elements, stored in a slot array with an
/// identity-to-slot index for O(1) removal.
///
/// The slot array and the index mutate together; every public method leaves
/// them agreeing, so callers never touch slots directly.
#[derive(Clone, Debug)]
pub struct Reservoir<T: Copy + Eq + Hash> {
    slots: Vec<T>,
    index: HashMap<T, usize>,
    cap: usize,
}

impl<T: Copy + Eq + Hash> Reservoir<T> {
    pub fn with_cap(cap: usize) -> Reservoir<T> {
        Reservoir {
            slots: Vec::with_capacity(cap),
            index: HashMap::with_capacity(cap),
            cap,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.cap
    }

    pub fn contains(&self, item: &T) -> bool {
        self.index.contains_key(item)
    }

    /// Appends `item` at the next free slot.
    pub fn insert(&mut self, item: T) {
        debug_assert!(!self.is_full());
        self.index.insert(item, self.slots.len());
        self.slots.push(item);
    }

    /// Overwrites a uniformly chosen slot with `item` and returns the
    /// evicted element.
    pub fn replace_random<R: Rng>(&mut self, rng: &mut R, item: T) -> T {
        let slot = rng.random_range(0..self.slots.len());
        let evicted = self.slots[slot];
        self.index.remove(&evicted);
        self.index.insert(item, slot);
        self.slots[slot] = item;
        evicted
    }

    /// Removes `item` by moving the last occupied slot into its place.
    /// Returns whether it was present.
    pub fn swap_remove(&mut self, item: &T) -> bool {
        let Some(slot) = self.index.remove(item) else {
            return false;
        };
        let last = self.slots.pop().unwrap();
        if slot < self.slots.len() {
            self.slots[slot] = last;
            self.index.insert(last, slot);
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }

    /// Checks that the index points at the slot actually holding each
    /// element. Test support.
    pub fn index_agrees(&self) -> bool {
        self.index.len() == self.slots.len()
            && self
                .index
                .iter()
                .all(|(item, &slot)| self.slots.get(slot) == Some(item))
    }
}
