// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Records stored in the perception index.

use alloc::format;
use alloc::string::String;

use kurbo::Point;

/// A 3-D position in scenario coordinates.
///
/// Query geometry operates on the horizontal projection; the vertical
/// component travels with the record but does not participate in
/// field-of-view tests.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// East-west coordinate.
    pub x: f64,
    /// North-south coordinate.
    pub y: f64,
    /// Height above the reference plane.
    pub z: f64,
}

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The projection onto the horizontal plane.
    pub const fn projected(self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl From<Point> for Position {
    fn from(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0)
    }
}

/// The signal shown by a traffic light.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalState {
    /// Stop.
    Red,
    /// Stop if safe to do so.
    Yellow,
    /// Go.
    Green,
    /// Off, or not reported by the traffic simulator.
    #[default]
    Unknown,
}

/// A vehicle record as stored by the index.
///
/// Records are owned exclusively by the index and replaced wholesale on
/// every update; queries hand out clones as read-only snapshots.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleObject {
    /// Unique vehicle identifier.
    pub id: String,
    /// Current position.
    pub position: Position,
    /// Heading in radians, 0 along +x, increasing counter-clockwise.
    pub heading: f64,
    /// Scalar speed.
    pub speed: f64,
}

/// A traffic-light record as stored by the index.
///
/// The identity is formed from the light group and the position of the
/// light within it (see [`traffic_light_id`]). Lane topology is fixed at
/// registration; the signal state changes freely; the position can be
/// corrected through the one-shot mapping protocol exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct TrafficLightObject {
    id: String,
    group_id: String,
    position: Position,
    incoming_lane: String,
    outgoing_lane: String,
    state: SignalState,
    mapped: bool,
}

impl TrafficLightObject {
    pub(crate) fn new(
        id: String,
        group_id: String,
        position: Position,
        incoming_lane: String,
        outgoing_lane: String,
        state: SignalState,
    ) -> Self {
        Self {
            id,
            group_id,
            position,
            incoming_lane,
            outgoing_lane,
            state,
            mapped: false,
        }
    }

    /// The unique identifier, `"{group_id}_{index}"`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The identifier of the light group this light belongs to.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// The current (possibly corrected) position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The lane controlled by this light.
    pub fn incoming_lane(&self) -> &str {
        &self.incoming_lane
    }

    /// The lane this light releases traffic into.
    pub fn outgoing_lane(&self) -> &str {
        &self.outgoing_lane
    }

    /// The signal currently shown.
    pub fn state(&self) -> SignalState {
        self.state
    }

    /// Whether the position has been corrected by an observation.
    ///
    /// Once set this never reverts, and further corrections are rejected.
    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub(crate) fn set_state(&mut self, state: SignalState) {
        self.state = state;
    }

    /// Refresh registration data without disturbing a corrected position.
    pub(crate) fn refresh_registration(
        &mut self,
        position: Position,
        incoming_lane: String,
        outgoing_lane: String,
        state: SignalState,
    ) {
        if !self.mapped {
            self.position = position;
        }
        self.incoming_lane = incoming_lane;
        self.outgoing_lane = outgoing_lane;
        self.state = state;
    }

    /// One-shot position correction: applies and latches `mapped` on the
    /// first call, rejects every later one.
    pub(crate) fn try_map_position(&mut self, position: Position) -> bool {
        if self.mapped {
            return false;
        }
        self.position = position;
        self.mapped = true;
        true
    }
}

/// The deterministic identity of a traffic light within its group.
pub fn traffic_light_id(group_id: &str, index: usize) -> String {
    format!("{group_id}_{index}")
}
