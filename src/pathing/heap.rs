//! Rescorable binary min-heap
//!
//! Array-backed min-heap pairing each payload with its score, plus a slot
//! index from payload to heap position so `remove` and `rescore` locate
//! elements in O(1) and restore the heap property in O(log n). Payloads stay
//! decoupled from heap internals; nothing is stored on the scheduled items
//! themselves.

use std::hash::Hash;

use ahash::AHashMap;
use ordered_float::OrderedFloat;

use crate::core::error::{EngineError, Result};

/// Min-heap keyed by an `f32` score
#[derive(Debug, Default)]
pub struct ScoreHeap<T: Eq + Hash + Clone> {
    content: Vec<(OrderedFloat<f32>, T)>,
    slots: AHashMap<T, usize>,
}

impl<T: Eq + Hash + Clone> ScoreHeap<T> {
    pub fn new() -> Self {
        Self {
            content: Vec::new(),
            slots: AHashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.slots.contains_key(item)
    }

    /// Minimum-score element without removing it
    pub fn peek(&self) -> Option<(&T, f32)> {
        self.content.first().map(|(score, item)| (item, score.0))
    }

    /// Insert an element. Pushing an element already in the heap is a
    /// contract violation.
    pub fn push(&mut self, item: T, score: f32) -> Result<()> {
        if self.slots.contains_key(&item) {
            return Err(EngineError::HeapDuplicateElement);
        }
        self.content.push((OrderedFloat(score), item.clone()));
        let n = self.content.len() - 1;
        self.slots.insert(item, n);
        self.sift_up(n);
        Ok(())
    }

    /// Remove and return the minimum-score element
    pub fn pop(&mut self) -> Option<T> {
        if self.content.is_empty() {
            return None;
        }
        let last = self.content.len() - 1;
        self.content.swap(0, last);
        let (_, item) = self.content.pop().expect("non-empty");
        self.slots.remove(&item);
        if !self.content.is_empty() {
            self.slots.insert(self.content[0].1.clone(), 0);
            self.sift_down(0);
        }
        Some(item)
    }

    /// Remove an arbitrary element by identity
    pub fn remove(&mut self, item: &T) -> Result<()> {
        let slot = self.slots.remove(item).ok_or(EngineError::HeapElementMissing)?;
        let last = self.content.len() - 1;
        if slot == last {
            self.content.pop();
            return Ok(());
        }
        let old_score = self.content[slot].0;
        self.content.swap(slot, last);
        self.content.pop();
        self.slots.insert(self.content[slot].1.clone(), slot);
        if self.content[slot].0 < old_score {
            self.sift_up(slot);
        } else {
            self.sift_down(slot);
        }
        Ok(())
    }

    /// Update an element's score and restore the heap property
    pub fn rescore(&mut self, item: &T, new_score: f32) -> Result<()> {
        let slot = *self.slots.get(item).ok_or(EngineError::HeapElementMissing)?;
        let old_score = self.content[slot].0;
        self.content[slot].0 = OrderedFloat(new_score);
        if OrderedFloat(new_score) < old_score {
            self.sift_up(slot);
        } else {
            self.sift_down(slot);
        }
        Ok(())
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.content.swap(a, b);
        self.slots.insert(self.content[a].1.clone(), a);
        self.slots.insert(self.content[b].1.clone(), b);
    }

    /// Move an element toward the root while it beats its parent
    fn sift_up(&mut self, mut n: usize) {
        while n > 0 {
            let parent = (n - 1) / 2;
            if self.content[n].0 < self.content[parent].0 {
                self.swap_slots(n, parent);
                n = parent;
            } else {
                break;
            }
        }
    }

    /// Move an element toward the leaves while a child beats it
    fn sift_down(&mut self, mut n: usize) {
        let len = self.content.len();
        loop {
            let left = 2 * n + 1;
            let right = left + 1;
            let mut smallest = n;
            if left < len && self.content[left].0 < self.content[smallest].0 {
                smallest = left;
            }
            if right < len && self.content[right].0 < self.content[smallest].0 {
                smallest = right;
            }
            if smallest == n {
                break;
            }
            self.swap_slots(n, smallest);
            n = smallest;
        }
    }

    #[cfg(test)]
    fn assert_heap_property(&self) {
        for n in 1..self.content.len() {
            let parent = (n - 1) / 2;
            assert!(
                self.content[parent].0 <= self.content[n].0,
                "heap property violated at slot {n}"
            );
        }
        for (item, &slot) in &self.slots {
            assert!(&self.content[slot].1 == item, "slot map out of sync");
        }
    }
}
