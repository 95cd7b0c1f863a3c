// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Circular-sector field-of-view geometry.
//!
//! This crate provides the exact sensor-area model used for perception
//! queries: a bounded circular sector with an origin, a heading, an opening
//! angle below a half-turn, and a range. It is built on [`kurbo`] and is
//! intentionally decoupled from any spatial index or simulation loop.
//!
//! # Typical usage
//!
//! - Construct a [`Sector`] once from sensor parameters (this is where
//!   configuration errors are rejected).
//! - Each time the owning entity moves, call [`Sector::set_origin`] with its
//!   current position and heading; this recomputes the cached boundary
//!   vectors and the axis-aligned bounding box.
//! - Feed [`Sector::bounding_box`] to a broad-phase index to cull
//!   candidates, then call [`Sector::contains`] on each candidate position
//!   for the exact test.
//!
//! The sidedness test works on the horizontal plane; callers project 3-D
//! positions before testing. All angles are radians, heading 0 points along
//! the +x axis and increases counter-clockwise.

#![no_std]

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect, Vec2};

use core::f64::consts::{FRAC_PI_2, PI, TAU};

/// Relative sidedness tolerance for points on a sector-edge ray.
const BOUNDARY_EPSILON: f64 = 1e-12;

/// Rejected sensor-area parameters.
///
/// These are configuration errors: a [`Sector`] with such parameters is
/// never constructed.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum SectorError {
    /// The opening angle must lie strictly between 0 and π radians.
    ///
    /// The boundary-vector construction assumes a convex sector
    /// representable by two rays less than a half-turn apart.
    #[error("opening angle must be in (0, \u{3c0}) radians, got {0}")]
    InvalidOpeningAngle(f64),
    /// The range must be strictly positive and finite.
    #[error("viewing range must be positive and finite, got {0}")]
    InvalidRange(f64),
}

/// A bounded circular sector: the field of view of a forward-facing sensor.
///
/// The sector caches its two boundary unit vectors and an axis-aligned
/// bounding box; both are recomputed by [`Sector::set_origin`]. Temporaries
/// are stack-local, so a `Sector` can be tested against concurrently once
/// positioned (all query methods take `&self`).
#[derive(Clone, Copy, Debug)]
pub struct Sector {
    opening_angle: f64,
    range: f64,
    origin: Point,
    heading: f64,
    /// Unit vector along the counter-clockwise sector edge.
    left_bound: Vec2,
    /// Unit vector along the clockwise sector edge.
    right_bound: Vec2,
    bounds: Rect,
}

impl Sector {
    /// Create a sector from an opening angle and a range, both validated.
    ///
    /// The sector starts at the coordinate origin with heading 0; call
    /// [`set_origin`][Self::set_origin] before querying.
    pub fn new(opening_angle: f64, range: f64) -> Result<Self, SectorError> {
        if !(opening_angle.is_finite() && opening_angle > 0.0 && opening_angle < PI) {
            return Err(SectorError::InvalidOpeningAngle(opening_angle));
        }
        if !(range.is_finite() && range > 0.0) {
            return Err(SectorError::InvalidRange(range));
        }
        let mut sector = Self {
            opening_angle,
            range,
            origin: Point::ORIGIN,
            heading: 0.0,
            left_bound: Vec2::ZERO,
            right_bound: Vec2::ZERO,
            bounds: Rect::ZERO,
        };
        sector.set_origin(Point::ORIGIN, 0.0);
        Ok(sector)
    }

    /// Move the sector to a new origin and heading, recomputing the cached
    /// boundary vectors and bounding box.
    pub fn set_origin(&mut self, origin: Point, heading: f64) {
        let half = self.opening_angle / 2.0;
        self.origin = origin;
        self.heading = heading;
        self.left_bound = Vec2::from_angle(heading + half);
        self.right_bound = Vec2::from_angle(heading - half);

        // The box always spans the origin and both sector-edge endpoints.
        let left_end = origin + self.left_bound * self.range;
        let right_end = origin + self.right_bound * self.range;
        let mut bounds = Rect::from_points(origin, left_end).union_pt(right_end);

        // Whenever the sector straddles a cardinal direction, the arc's
        // extreme point in that direction lies outside the triangle above.
        const CARDINALS: [(f64, Vec2); 4] = [
            (0.0, Vec2::new(1.0, 0.0)),
            (FRAC_PI_2, Vec2::new(0.0, 1.0)),
            (PI, Vec2::new(-1.0, 0.0)),
            (3.0 * FRAC_PI_2, Vec2::new(0.0, -1.0)),
        ];
        for (angle, direction) in CARDINALS {
            if angle_diff(heading, angle).abs() < half {
                bounds = bounds.union_pt(origin + direction * self.range);
            }
        }
        self.bounds = bounds;
    }

    /// Whether the point lies inside the sector.
    ///
    /// The origin itself is never contained. Both boundary rays are
    /// inclusive, as is the range.
    pub fn contains(&self, point: Point) -> bool {
        let rel = point - self.origin;
        if rel.x == 0.0 && rel.y == 0.0 {
            return false;
        }
        let distance = rel.hypot();
        if distance > self.range {
            return false;
        }
        // Counter-clockwise of the right edge, clockwise of the left edge,
        // sign taken from the 2-D cross product. The boundary vectors come
        // out of `from_angle`, so a point constructed on a boundary ray can
        // land a rounding error on either side; the cross product scales
        // with the distance, so the tolerance does too.
        let tolerance = BOUNDARY_EPSILON * distance;
        self.right_bound.cross(rel) >= -tolerance && self.left_bound.cross(rel) <= tolerance
    }

    /// The cached axis-aligned bounding box enclosing the sector.
    ///
    /// Intended for coarse pre-filtering; it is exact for the sector at its
    /// current origin and heading.
    pub fn bounding_box(&self) -> Rect {
        self.bounds
    }

    /// The opening angle in radians.
    pub fn opening_angle(&self) -> f64 {
        self.opening_angle
    }

    /// The viewing range.
    pub fn range(&self) -> f64 {
        self.range
    }

    /// The current origin.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// The current heading in radians.
    pub fn heading(&self) -> f64 {
        self.heading
    }
}

/// Signed angular difference `a - b`, wrapped to `[-π, π)`.
fn angle_diff(a: f64, b: f64) -> f64 {
    let d = a - b;
    d - TAU * ((d + PI) / TAU).floor()
}
