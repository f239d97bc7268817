use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// An insertion-ordered collection with a well-defined oldest element and
/// O(1) removal by value.
///
/// Removal leaves a tombstone in the queue; the sequence map is the
/// authoritative membership. A re-added value gets a fresh sequence number,
/// so its age resets to "newest" and the stale queue entry is skipped when
/// it reaches the front.
#[derive(Clone, Debug)]
pub struct WaitingRoom<T: Copy + Eq + Hash> {
    queue: VecDeque<(u64, T)>,
    live: HashMap<T, u64>,
    next_seq: u64,
}

impl<T: Copy + Eq + Hash> WaitingRoom<T> {
    pub fn new() -> WaitingRoom<T> {
        WaitingRoom {
            queue: VecDeque::new(),
            live: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.live.contains_key(item)
    }

    /// Appends `item` as the newest element. The caller keeps duplicates out.
    pub fn add(&mut self, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push_back((seq, item));
        self.live.insert(item, seq);
    }

    /// Removes and returns the oldest element still present.
    pub fn pop_oldest(&mut self) -> Option<T> {
        while let Some((seq, item)) = self.queue.pop_front() {
            if self.live.get(&item) == Some(&seq) {
                self.live.remove(&item);
                return Some(item);
            }
        }
        None
    }

    /// Removes `item` if present. The queue slot becomes a tombstone that
    /// `pop_oldest` discards later.
    pub fn remove(&mut self, item: &T) -> bool {
        let removed = self.live.remove(item).is_some();
        if removed && self.queue.len() > 2 * self.live.len() + 8 {
            self.compact();
        }
        removed
    }

    /// Oldest to newest, skipping tombstones.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.queue
            .iter()
            .filter(|(seq, item)| self.live.get(item) == Some(seq))
            .map(|(_, item)| item)
    }

    fn compact(&mut self) {
        let live = &self.live;
        self.queue.retain(|(seq, item)| live.get(item) == Some(seq));
    }
}

impl<T: Copy + Eq + Hash> Default for WaitingRoom<T> {
    fn default() -> WaitingRoom<T> {
        WaitingRoom::new()
    }
}

#[cfg(test)]
mod tests {
    use super::WaitingRoom;
    use proptest::prelude::*;

    #[test]
    fn fifo_order() {
        let mut wr = WaitingRoom::new();
        wr.add(1);
        wr.add(2);
        wr.add(3);
        assert_eq!(wr.pop_oldest(), Some(1));
        assert_eq!(wr.pop_oldest(), Some(2));
        wr.add(4);
        assert_eq!(wr.pop_oldest(), Some(3));
        assert_eq!(wr.pop_oldest(), Some(4));
        assert_eq!(wr.pop_oldest(), None);
    }

    #[test]
    fn remove_skips_tombstone() {
        let mut wr = WaitingRoom::new();
        wr.add(1);
        wr.add(2);
        assert!(wr.remove(&1));
        assert!(!wr.remove(&1));
        assert_eq!(wr.len(), 1);
        assert_eq!(wr.pop_oldest(), Some(2));
    }

    #[test]
    fn readd_resets_age() {
        let mut wr = WaitingRoom::new();
        wr.add(1);
        wr.add(2);
        assert!(wr.remove(&1));
        wr.add(1);
        // 1 was re-added after 2, so 2 is now the oldest.
        assert_eq!(wr.pop_oldest(), Some(2));
        assert_eq!(wr.pop_oldest(), Some(1));
    }

    proptest! {
        #[test]
        fn order_matches_a_naive_model(ops in proptest::collection::vec((0u8..3, 0u32..20), 1..200)) {
            let mut wr = WaitingRoom::new();
            let mut model: Vec<u32> = Vec::new();
            for (op, x) in ops {
                match op {
                    0 => {
                        if !model.contains(&x) {
                            wr.add(x);
                            model.push(x);
                        }
                    }
                    1 => {
                        let expected = !model.is_empty();
                        if expected {
                            let oldest = model.remove(0);
                            prop_assert_eq!(wr.pop_oldest(), Some(oldest));
                        } else {
                            prop_assert_eq!(wr.pop_oldest(), None);
                        }
                    }
                    _ => {
                        let was_there = model.iter().position(|&y| y == x);
                        prop_assert_eq!(wr.remove(&x), was_there.is_some());
                        if let Some(i) = was_there {
                            model.remove(i);
                        }
                    }
                }
                prop_assert_eq!(wr.len(), model.len());
            }
        }
    }
}
