// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear-scan backend.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::backend::Backend;

/// Flat slot table scanned in full on every query.
///
/// O(n) per query with no structure to maintain, which makes it both the
/// baseline for small scenarios and the correctness oracle the other
/// backends are tested against. The query rectangle is ignored: every live
/// slot is a candidate.
#[derive(Debug, Default)]
pub struct LinearScan {
    slots: Vec<Option<Point>>,
}

impl LinearScan {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_slot(&mut self, slot: usize) {
        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, None);
        }
    }
}

impl Backend for LinearScan {
    fn insert(&mut self, slot: usize, position: Point) {
        self.ensure_slot(slot);
        self.slots[slot] = Some(position);
    }

    fn update(&mut self, slot: usize, position: Point) {
        self.insert(slot, position);
    }

    fn remove(&mut self, slot: usize) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = None;
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    fn visit_rect<F: FnMut(usize)>(&self, _rect: Rect, mut f: F) {
        for (slot, entry) in self.slots.iter().enumerate() {
            if entry.is_some() {
                f(slot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn visits_every_live_slot() {
        let mut backend = LinearScan::new();
        backend.insert(0, Point::new(0.0, 0.0));
        backend.insert(3, Point::new(100.0, 100.0));
        backend.insert(1, Point::new(-5.0, 2.0));
        backend.remove(3);

        let mut hits = Vec::new();
        backend.visit_rect(Rect::new(0.0, 0.0, 1.0, 1.0), |slot| hits.push(slot));
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn remove_is_a_no_op_for_unknown_slots() {
        let mut backend = LinearScan::new();
        backend.remove(17);
        let mut count = 0;
        backend.visit_rect(Rect::new(0.0, 0.0, 1.0, 1.0), |_| count += 1);
        assert_eq!(count, 0);
    }
}
