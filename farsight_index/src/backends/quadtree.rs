// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadtree backend.
//!
//! The tree recursively splits the scenario rectangle into four quadrants
//! once a leaf exceeds its split size, down to a maximum depth. It adapts
//! to clustered vehicle distributions where a uniform grid would leave most
//! cells empty and a few cells overfull.

use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::backend::Backend;
use crate::error::ConfigError;
use crate::util::{rect_contains, rects_overlap};

const ROOT: usize = 0;

/// Point quadtree over a fixed root rectangle.
///
/// Positions outside the root rectangle are kept in a separate overflow
/// list that every query scans, so a record never goes missing just
/// because a vehicle left the mapped area.
pub struct Quadtree {
    split_size: usize,
    max_depth: usize,
    nodes: Vec<Node>,
    slots: Vec<Option<SlotEntry>>,
    overflow: Vec<usize>,
}

struct Node {
    bounds: Rect,
    depth: usize,
    /// Indices of the four children, in x-major order. Interior nodes
    /// hold no items of their own.
    children: Option<[usize; 4]>,
    items: SmallVec<[usize; 8]>,
}

#[derive(Clone, Debug)]
struct SlotEntry {
    position: Point,
    place: Place,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Place {
    /// Stored in the leaf node with this index.
    Leaf(usize),
    /// Stored in the out-of-root-bounds overflow list.
    Overflow,
}

impl Debug for Quadtree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let live_slots = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("Quadtree")
            .field("split_size", &self.split_size)
            .field("max_depth", &self.max_depth)
            .field("bounds", &self.nodes[ROOT].bounds)
            .field("nodes", &self.nodes.len())
            .field("live_slots", &live_slots)
            .field("overflow", &self.overflow.len())
            .finish_non_exhaustive()
    }
}

impl Quadtree {
    /// Create a quadtree over the scenario bounds.
    ///
    /// `split_size` is the number of items a leaf holds before it splits;
    /// `max_depth` caps subdivision so degenerate clusters (many vehicles
    /// at one position) cannot recurse without bound.
    pub fn new(bounds: Rect, split_size: usize, max_depth: usize) -> Result<Self, ConfigError> {
        if split_size == 0 {
            return Err(ConfigError::ZeroSplitSize);
        }
        let bounds = bounds.abs();
        if bounds.area() <= 0.0 {
            return Err(ConfigError::EmptyBounds);
        }
        let mut nodes = Vec::new();
        nodes.push(Node {
            bounds,
            depth: 0,
            children: None,
            items: SmallVec::new(),
        });
        Ok(Self {
            split_size,
            max_depth,
            nodes,
            slots: Vec::new(),
            overflow: Vec::new(),
        })
    }

    fn ensure_slot(&mut self, slot: usize) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
    }

    /// Index of the quadrant of `bounds` containing `position`.
    ///
    /// Points exactly on the center lines go to the upper quadrant of the
    /// relevant axis so the choice is deterministic.
    fn quadrant(bounds: Rect, position: Point) -> usize {
        let center = bounds.center();
        usize::from(position.x >= center.x) + 2 * usize::from(position.y >= center.y)
    }

    fn quadrant_bounds(bounds: Rect, quadrant: usize) -> Rect {
        let center = bounds.center();
        match quadrant {
            0 => Rect::new(bounds.x0, bounds.y0, center.x, center.y),
            1 => Rect::new(center.x, bounds.y0, bounds.x1, center.y),
            2 => Rect::new(bounds.x0, center.y, center.x, bounds.y1),
            3 => Rect::new(center.x, center.y, bounds.x1, bounds.y1),
            _ => unreachable!("quadrant index out of range"),
        }
    }

    /// Descend from the root to the leaf whose bounds contain `position`.
    fn leaf_for(&self, position: Point) -> usize {
        let mut node = ROOT;
        while let Some(children) = self.nodes[node].children {
            node = children[Self::quadrant(self.nodes[node].bounds, position)];
        }
        node
    }

    /// Store the entry for `slot` and link it into the structure.
    ///
    /// The slot-table entry goes live before the leaf is touched: a split
    /// triggered by the insertion redistributes items by reading their
    /// positions back out of the slot table, the new slot included.
    fn place(&mut self, slot: usize, position: Point) {
        if rect_contains(&self.nodes[ROOT].bounds, position) {
            let leaf = self.leaf_for(position);
            self.slots[slot] = Some(SlotEntry {
                position,
                place: Place::Leaf(leaf),
            });
            self.nodes[leaf].items.push(slot);
            // Splitting moves redistributed slots, this one included, and
            // keeps their places current.
            self.maybe_split(leaf);
        } else {
            self.slots[slot] = Some(SlotEntry {
                position,
                place: Place::Overflow,
            });
            self.overflow.push(slot);
        }
    }

    /// Split `node` if it exceeds the split size and may still subdivide.
    fn maybe_split(&mut self, node: usize) {
        if self.nodes[node].items.len() <= self.split_size
            || self.nodes[node].depth >= self.max_depth
        {
            return;
        }

        let bounds = self.nodes[node].bounds;
        let depth = self.nodes[node].depth;
        let items = core::mem::take(&mut self.nodes[node].items);

        let mut children = [0_usize; 4];
        for (quadrant, child) in children.iter_mut().enumerate() {
            *child = self.nodes.len();
            self.nodes.push(Node {
                bounds: Self::quadrant_bounds(bounds, quadrant),
                depth: depth + 1,
                children: None,
                items: SmallVec::new(),
            });
        }
        self.nodes[node].children = Some(children);

        for slot in items {
            let position = self.slots[slot]
                .as_ref()
                .expect("quadtree invariant violated: node references vacant slot")
                .position;
            let child = children[Self::quadrant(bounds, position)];
            self.nodes[child].items.push(slot);
            self.slots[slot]
                .as_mut()
                .expect("quadtree invariant violated: node references vacant slot")
                .place = Place::Leaf(child);
        }

        // All items may have landed in the same child; keep splitting there.
        for child in children {
            self.maybe_split(child);
        }
    }

    fn unlink(&mut self, slot: usize, place: Place) {
        let items = match place {
            Place::Leaf(node) => &mut self.nodes[node].items,
            Place::Overflow => return Self::remove_from(&mut self.overflow, slot),
        };
        let pos = items
            .iter()
            .position(|&s| s == slot)
            .expect("quadtree invariant violated: slot not found in expected leaf");
        items.swap_remove(pos);
    }

    fn remove_from(list: &mut Vec<usize>, slot: usize) {
        let pos = list
            .iter()
            .position(|&s| s == slot)
            .expect("quadtree invariant violated: slot not found in overflow list");
        list.swap_remove(pos);
    }

}

impl Backend for Quadtree {
    fn insert(&mut self, slot: usize, position: Point) {
        self.ensure_slot(slot);

        if let Some(old) = self.slots[slot].take() {
            self.unlink(slot, old.place);
        }

        self.place(slot, position);
    }

    fn update(&mut self, slot: usize, position: Point) {
        let current = self.slots.get_mut(slot).and_then(Option::take);
        let Some(entry) = current else {
            self.insert(slot, position);
            return;
        };

        self.unlink(slot, entry.place);
        self.place(slot, position);
    }

    fn remove(&mut self, slot: usize) {
        if slot >= self.slots.len() {
            return;
        }
        if let Some(entry) = self.slots[slot].take() {
            self.unlink(slot, entry.place);
        }
    }

    fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[ROOT].children = None;
        self.nodes[ROOT].items.clear();
        self.slots.clear();
        self.overflow.clear();
    }

    fn visit_rect<F: FnMut(usize)>(&self, rect: Rect, mut f: F) {
        // Iterative traversal; quadtree depth is bounded but the node count
        // is not small, and there is no need to recurse.
        let mut stack: SmallVec<[usize; 16]> = SmallVec::new();
        stack.push(ROOT);
        while let Some(node) = stack.pop() {
            let node = &self.nodes[node];
            if !rects_overlap(&node.bounds, &rect) {
                continue;
            }
            if let Some(children) = node.children {
                stack.extend_from_slice(&children);
                continue;
            }
            for &slot in &node.items {
                let entry = self.slots[slot]
                    .as_ref()
                    .expect("quadtree invariant violated: node references vacant slot");
                if rect_contains(&rect, entry.position) {
                    f(slot);
                }
            }
        }

        for &slot in &self.overflow {
            let entry = self.slots[slot]
                .as_ref()
                .expect("quadtree invariant violated: overflow references vacant slot");
            if rect_contains(&rect, entry.position) {
                f(slot);
            }
        }
    }
}
