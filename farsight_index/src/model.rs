// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Perception models.
//!
//! A perception model decides which records a querying vehicle can see.
//! The index only requires a conservative bounding box for the broad phase
//! and an exact per-record test; what "seeing" means is up to the model.

use alloc::string::String;

use farsight_sector::{Sector, SectorError};
use kurbo::{Point, Rect};

use crate::objects::Position;

/// Decides which records a query perceives.
///
/// [`bounding_box`][Self::bounding_box] must enclose every position for
/// which [`is_in_range`][Self::is_in_range] can return `true`; the index
/// uses it to cull candidates before running the exact test.
pub trait PerceptionModel {
    /// Conservative bounds of the perceivable area.
    fn bounding_box(&self) -> Rect;

    /// Exact geometric test for a single position.
    fn is_in_range(&self, position: Position) -> bool;

    /// Id of the querying vehicle, if any.
    ///
    /// The index drops this id from vehicle query results; it has no
    /// effect on traffic-light queries.
    fn owner(&self) -> Option<&str> {
        None
    }
}

/// Sector-shaped field of view of one vehicle.
///
/// The owner vehicle never perceives itself, regardless of geometry.
#[derive(Clone, Debug)]
pub struct FieldOfView {
    owner: String,
    sector: Sector,
}

impl FieldOfView {
    /// Create a field of view for the named vehicle.
    ///
    /// `opening_angle` is the full horizontal aperture in radians,
    /// `range` the viewing distance. Both are validated once here; see
    /// [`Sector::new`] for the accepted ranges.
    pub fn new(
        owner: impl Into<String>,
        opening_angle: f64,
        range: f64,
    ) -> Result<Self, SectorError> {
        Ok(Self {
            owner: owner.into(),
            sector: Sector::new(opening_angle, range)?,
        })
    }

    /// Position the field of view at the owner's current pose.
    ///
    /// `heading` is in radians, 0 along +x, increasing counter-clockwise.
    pub fn look_from(&mut self, position: Position, heading: f64) {
        self.sector.set_origin(position.projected(), heading);
    }

    /// The underlying view sector.
    pub fn sector(&self) -> &Sector {
        &self.sector
    }
}

impl PerceptionModel for FieldOfView {
    fn bounding_box(&self) -> Rect {
        self.sector.bounding_box()
    }

    fn is_in_range(&self, position: Position) -> bool {
        self.sector.contains(position.projected())
    }

    fn owner(&self) -> Option<&str> {
        Some(&self.owner)
    }
}

/// Perceives everything within a fixed rectangle, with no owner.
///
/// Useful for map-wide sweeps and for tooling that needs the raw contents
/// of a region rather than a vehicle's view.
#[derive(Clone, Debug)]
pub struct BoundingBoxModel {
    bounds: Rect,
}

impl BoundingBoxModel {
    /// Create a model covering the given rectangle.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds: bounds.abs(),
        }
    }
}

impl PerceptionModel for BoundingBoxModel {
    fn bounding_box(&self) -> Rect {
        self.bounds
    }

    fn is_in_range(&self, position: Position) -> bool {
        let p: Point = position.projected();
        crate::util::rect_contains(&self.bounds, p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::FRAC_PI_2;

    #[test]
    fn field_of_view_names_its_owner() {
        let mut fov = FieldOfView::new("veh_0", FRAC_PI_2, 10.0).unwrap();
        fov.look_from(Position::new(0.0, 0.0, 0.0), 0.0);

        assert_eq!(fov.owner(), Some("veh_0"));
        // The geometric test is owner-agnostic; exclusion happens at the
        // query site.
        assert!(fov.is_in_range(Position::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn field_of_view_ignores_height() {
        let mut fov = FieldOfView::new("veh_0", FRAC_PI_2, 10.0).unwrap();
        fov.look_from(Position::new(0.0, 0.0, 0.0), 0.0);
        assert!(fov.is_in_range(Position::new(5.0, 0.0, 120.0)));
    }

    #[test]
    fn invalid_aperture_is_rejected_up_front() {
        assert!(FieldOfView::new("veh_0", 0.0, 10.0).is_err());
        assert!(FieldOfView::new("veh_0", FRAC_PI_2, -1.0).is_err());
    }

    #[test]
    fn bounding_box_model_is_edge_inclusive() {
        let model = BoundingBoxModel::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(model.is_in_range(Position::new(10.0, 10.0, 0.0)));
        assert!(!model.is_in_range(Position::new(10.1, 10.0, 0.0)));
    }
}
