// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for the vehicle broad phase.

use core::fmt::Debug;

use kurbo::{Point, Rect};

/// Broad-phase abstraction used by
/// [`PerceptionIndexGeneric`][crate::PerceptionIndexGeneric].
///
/// A backend tracks the projected positions of vehicle slots and answers
/// rectangle queries with a candidate set. The candidate set may
/// over-approximate (a backend is free to return slots outside the
/// rectangle) but must never miss a slot whose position lies inside it;
/// callers always apply the exact field-of-view test afterwards.
pub trait Backend: Debug {
    /// Insert a new slot at the given position.
    fn insert(&mut self, slot: usize, position: Point);

    /// Move an existing slot to a new position.
    ///
    /// Updating a slot the backend has never seen behaves like an insert.
    /// The relocation is atomic with respect to the slot: no query window
    /// exists in which the slot is tracked in neither its old nor its new
    /// location.
    fn update(&mut self, slot: usize, position: Point);

    /// Remove a slot. Removing an unknown slot is a no-op.
    fn remove(&mut self, slot: usize);

    /// Drop all slots.
    fn clear(&mut self);

    /// Visit candidate slots for a query rectangle.
    fn visit_rect<F: FnMut(usize)>(&self, rect: Rect, f: F);
}
