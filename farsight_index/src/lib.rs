// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Farsight Index: a spatial index over moving vehicles and static
//! traffic lights.
//!
//! Farsight Index is the query core of the perception engine.
//!
//! - Insert, replace wholesale, and remove vehicle records keyed by id.
//! - Register traffic lights, change their signals in batches, and apply
//!   one-shot position corrections.
//! - Query both populations through a [`PerceptionModel`], typically a
//!   sector-shaped [`FieldOfView`].
//!
//! Vehicle storage is generic over a [`Backend`] so the spatial strategy
//! can be swapped without API churn. The default backend is a flat slot
//! table (linear scan); a uniform [grid][backends::Grid] and a
//! [quadtree][backends::Quadtree] are available for larger scenarios, and
//! [`backends::AnyBackend`] selects between them at runtime.
//!
//! # Example
//!
//! ```rust
//! use farsight_index::{FieldOfView, PerceptionIndex, Position, VehicleObject};
//! use core::f64::consts::FRAC_PI_2;
//!
//! let mut index = PerceptionIndex::linear();
//! index.upsert_vehicles([
//!     VehicleObject {
//!         id: "ego".into(),
//!         position: Position::new(0.0, 0.0, 0.0),
//!         heading: 0.0,
//!         speed: 13.9,
//!     },
//!     VehicleObject {
//!         id: "lead".into(),
//!         position: Position::new(20.0, 1.0, 0.0),
//!         heading: 0.0,
//!         speed: 12.0,
//!     },
//! ]);
//!
//! // A 90 degree cone, 50 units deep, looking along +x.
//! let mut fov = FieldOfView::new("ego", FRAC_PI_2, 50.0).unwrap();
//! fov.look_from(Position::new(0.0, 0.0, 0.0), 0.0);
//!
//! let seen = index.vehicles_in_range(&fov);
//! assert_eq!(seen.len(), 1);
//! assert_eq!(seen[0].id, "lead");
//! ```
//!
//! ## Choosing a backend
//!
//! - [`PerceptionIndex::linear`]: simplest and smallest, linear scans.
//!   Good for small scenarios, and the reference the spatial backends are
//!   tested against.
//! - [`PerceptionIndex::grid`]: uniform grid with configurable cell size.
//!   A good fit when vehicles are roughly uniformly distributed and view
//!   ranges are small compared to the scenario extent.
//! - [`PerceptionIndex::quadtree`]: adaptive subdivision; better when the
//!   distribution is irregular, e.g. dense junctions in an otherwise
//!   sparse map.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for coordinates and headings. Vehicle data
//! arrives from a traffic simulator; positions far outside the configured
//! scenario bounds are tolerated and still found by queries.

#![no_std]

extern crate alloc;

mod backend;
pub mod backends;
mod error;
mod index;
mod lights;
mod model;
mod objects;
pub(crate) mod util;

pub use backend::Backend;
pub use error::{ConfigError, LookupError};
pub use index::{IndexStats, PerceptionIndex, PerceptionIndexGeneric};
pub use lights::TrafficLightRegistration;
pub use model::{BoundingBoxModel, FieldOfView, PerceptionModel};
pub use objects::{Position, SignalState, TrafficLightObject, VehicleObject, traffic_light_id};
