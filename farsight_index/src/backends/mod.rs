// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `linear`: flat slot table with linear scans, the correctness oracle.
//! - `grid`: uniform grid with configurable rectangular cell size.
//! - `quadtree`: midpoint-split hierarchy with a capacity threshold and a
//!   depth bound.
//!
//! All three answer the same queries with identical observable semantics;
//! they differ only in complexity. [`AnyBackend`] closes the set for
//! configuration-driven selection.

use kurbo::{Point, Rect};

pub(crate) mod grid;
pub(crate) mod linear;
pub(crate) mod quadtree;

pub use grid::Grid;
pub use linear::LinearScan;
pub use quadtree::Quadtree;

use crate::backend::Backend;

/// The closed set of backends, selected by configuration at startup.
#[derive(Debug)]
pub enum AnyBackend {
    /// Linear scan over all records.
    Linear(LinearScan),
    /// Uniform grid.
    Grid(Grid),
    /// Midpoint-split spatial tree.
    Quadtree(Quadtree),
}

impl Backend for AnyBackend {
    fn insert(&mut self, slot: usize, position: Point) {
        match self {
            Self::Linear(backend) => backend.insert(slot, position),
            Self::Grid(backend) => backend.insert(slot, position),
            Self::Quadtree(backend) => backend.insert(slot, position),
        }
    }

    fn update(&mut self, slot: usize, position: Point) {
        match self {
            Self::Linear(backend) => backend.update(slot, position),
            Self::Grid(backend) => backend.update(slot, position),
            Self::Quadtree(backend) => backend.update(slot, position),
        }
    }

    fn remove(&mut self, slot: usize) {
        match self {
            Self::Linear(backend) => backend.remove(slot),
            Self::Grid(backend) => backend.remove(slot),
            Self::Quadtree(backend) => backend.remove(slot),
        }
    }

    fn clear(&mut self) {
        match self {
            Self::Linear(backend) => backend.clear(),
            Self::Grid(backend) => backend.clear(),
            Self::Quadtree(backend) => backend.clear(),
        }
    }

    fn visit_rect<F: FnMut(usize)>(&self, rect: Rect, f: F) {
        match self {
            Self::Linear(backend) => backend.visit_rect(rect, f),
            Self::Grid(backend) => backend.visit_rect(rect, f),
            Self::Quadtree(backend) => backend.visit_rect(rect, f),
        }
    }
}

impl Default for AnyBackend {
    fn default() -> Self {
        Self::Linear(LinearScan::new())
    }
}

impl From<LinearScan> for AnyBackend {
    fn from(backend: LinearScan) -> Self {
        Self::Linear(backend)
    }
}

impl From<Grid> for AnyBackend {
    fn from(backend: Grid) -> Self {
        Self::Grid(backend)
    }
}

impl From<Quadtree> for AnyBackend {
    fn from(backend: Quadtree) -> Self {
        Self::Quadtree(backend)
    }
}
