// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform grid backend.
//!
//! This backend buckets vehicle positions into fixed-size rectangular cells
//! and answers queries by touching only the cells overlapping the query
//! rectangle. It is intended for scenarios with a known bounding rectangle,
//! roughly uniform vehicle density, and query boxes that are small compared
//! to the full scenario extent.

use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashMap;
use kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::backend::Backend;
use crate::error::ConfigError;
use crate::util::rect_contains;

/// Uniform grid backend with fixed cell size.
///
/// Each record occupies exactly one cell, the cell containing its position;
/// the union of all cell contents is always the full record set.
pub struct Grid {
    cell_width: f64,
    cell_height: f64,
    origin: Point,
    cells: HashMap<(i32, i32), Cell>,
    slots: Vec<Option<SlotEntry>>,
}

#[derive(Clone, Debug)]
struct SlotEntry {
    position: Point,
    /// Cell currently containing this slot.
    cell: (i32, i32),
}

#[derive(Default)]
struct Cell {
    slots: SmallVec<[usize; 8]>,
}

impl Debug for Grid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total_slots = self.slots.len();
        let live_slots = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("Grid")
            .field("cell_width", &self.cell_width)
            .field("cell_height", &self.cell_height)
            .field("origin", &self.origin)
            .field("total_slots", &total_slots)
            .field("live_slots", &live_slots)
            .field("cells", &self.cells.len())
            .finish_non_exhaustive()
    }
}

/// Map a coordinate to a cell coordinate along one axis.
///
/// Rounds towards negative infinity; values out of `i32` range saturate.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Cell indices are intentionally i32; out-of-range values are saturated by the float cast."
)]
#[inline]
fn cell_coord(value: f64, origin: f64, cell_size: f64) -> i32 {
    debug_assert!(cell_size > 0.0, "grid cell size must be strictly positive");
    let t = (value - origin) / cell_size;
    let coord = t as i32;

    // Round towards -inf (the cast above has already truncated).
    if t < 0.0 && f64::from(coord) > t {
        coord.saturating_sub(1)
    } else {
        coord
    }
}

impl Grid {
    /// Create a grid over the scenario bounds with the given cell size.
    ///
    /// The grid origin is the minimum corner of `bounds`; positions outside
    /// the bounds still land in well-defined (outer) cells, so no record is
    /// ever lost.
    pub fn new(bounds: Rect, cell_width: f64, cell_height: f64) -> Result<Self, ConfigError> {
        if !(cell_width.is_finite()
            && cell_width > 0.0
            && cell_height.is_finite()
            && cell_height > 0.0)
        {
            return Err(ConfigError::NonPositiveCellSize {
                width: cell_width,
                height: cell_height,
            });
        }
        let bounds = bounds.abs();
        if bounds.area() <= 0.0 {
            return Err(ConfigError::EmptyBounds);
        }
        Ok(Self {
            cell_width,
            cell_height,
            origin: bounds.origin(),
            cells: HashMap::new(),
            slots: Vec::new(),
        })
    }

    fn cell_of(&self, position: Point) -> (i32, i32) {
        (
            cell_coord(position.x, self.origin.x, self.cell_width),
            cell_coord(position.y, self.origin.y, self.cell_height),
        )
    }

    fn ensure_slot(&mut self, slot: usize) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
    }

    fn unlink_from_cell(&mut self, slot: usize, cell: (i32, i32)) {
        let entry = self
            .cells
            .get_mut(&cell)
            .expect("grid invariant violated: missing cell while removing slot");
        let pos = entry
            .slots
            .iter()
            .position(|&s| s == slot)
            .expect("grid invariant violated: slot not found in expected cell");
        entry.slots.swap_remove(pos);

        if entry.slots.is_empty() {
            // Dropping empty cells keeps the map compact for sparse scenarios.
            self.cells.remove(&cell);
        }
    }
}

impl Backend for Grid {
    fn insert(&mut self, slot: usize, position: Point) {
        self.ensure_slot(slot);

        // If this slot was previously used, clean up its old cell membership.
        if let Some(old) = self.slots[slot].take() {
            self.unlink_from_cell(slot, old.cell);
        }

        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().slots.push(slot);
        self.slots[slot] = Some(SlotEntry { position, cell });
    }

    fn update(&mut self, slot: usize, position: Point) {
        let current = self.slots.get_mut(slot).and_then(Option::take);
        let Some(mut entry) = current else {
            // Unknown slot: treat as an insert.
            self.insert(slot, position);
            return;
        };

        let cell = self.cell_of(position);
        if cell != entry.cell {
            // Migrate between cells; the entry is re-linked before any
            // query can run again, so the record is never in limbo.
            self.unlink_from_cell(slot, entry.cell);
            self.cells.entry(cell).or_default().slots.push(slot);
            entry.cell = cell;
        }
        entry.position = position;
        self.slots[slot] = Some(entry);
    }

    fn remove(&mut self, slot: usize) {
        if slot >= self.slots.len() {
            return;
        }
        if let Some(entry) = self.slots[slot].take() {
            self.unlink_from_cell(slot, entry.cell);
        }
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.slots.clear();
    }

    fn visit_rect<F: FnMut(usize)>(&self, rect: Rect, mut f: F) {
        let (ix0, ix1) = (
            cell_coord(rect.x0, self.origin.x, self.cell_width),
            cell_coord(rect.x1, self.origin.x, self.cell_width),
        );
        let (iy0, iy1) = (
            cell_coord(rect.y0, self.origin.y, self.cell_height),
            cell_coord(rect.y1, self.origin.y, self.cell_height),
        );

        for ix in ix0..=ix1 {
            for iy in iy0..=iy1 {
                let Some(cell) = self.cells.get(&(ix, iy)) else {
                    continue;
                };
                for &slot in &cell.slots {
                    let entry = self.slots[slot]
                        .as_ref()
                        .expect("grid invariant violated: cell references vacant slot");
                    // Each slot lives in exactly one cell, so no dedup
                    // pass is needed here.
                    if rect_contains(&rect, entry.position) {
                        f(slot);
                    }
                }
            }
        }
    }
}
