// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-vehicle perception facade.

use std::sync::Arc;

use farsight_index::{FieldOfView, Position, TrafficLightObject, VehicleObject};
use farsight_sector::SectorError;

use crate::coordinator::PerceptionCoordinator;

/// Perception interface of a single vehicle agent.
///
/// Thin by design: it holds the vehicle's [`FieldOfView`] and a handle to
/// the shared [`PerceptionCoordinator`], which is passed in at
/// construction rather than reached through any global state. Queries
/// refresh the coordinator first, so agents never need to care about
/// tick boundaries themselves.
#[derive(Debug)]
pub struct PerceptionModule {
    owner: String,
    coordinator: Arc<PerceptionCoordinator>,
    fov: Option<FieldOfView>,
}

impl PerceptionModule {
    /// Create an unconfigured module for the named vehicle.
    ///
    /// Until [`configure`][Self::configure] succeeds, every query returns
    /// empty.
    pub fn new(owner: impl Into<String>, coordinator: Arc<PerceptionCoordinator>) -> Self {
        Self {
            owner: owner.into(),
            coordinator,
            fov: None,
        }
    }

    /// Configure the sensor: full opening angle in radians and range.
    ///
    /// Fails if the angle is not strictly between 0 and half a turn, or
    /// the range is not strictly positive; an earlier configuration stays
    /// in effect in that case.
    pub fn configure(&mut self, opening_angle: f64, range: f64) -> Result<(), SectorError> {
        self.fov = Some(FieldOfView::new(self.owner.clone(), opening_angle, range)?);
        Ok(())
    }

    /// Whether [`configure`][Self::configure] has succeeded.
    pub fn is_configured(&self) -> bool {
        self.fov.is_some()
    }

    /// The vehicle owning this module.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Aim the field of view at the owner's current pose, if both the
    /// sensor and the pose are available.
    fn aimed_fov(&mut self, query: &str) -> Option<&FieldOfView> {
        if self.fov.is_none() {
            log::warn!(
                "{}: {query} before perception was configured, returning nothing",
                self.owner
            );
            return None;
        }
        self.coordinator.refresh();
        let Some(pose) = self.coordinator.vehicle(&self.owner) else {
            log::warn!(
                "{}: {query} without a known pose, returning nothing",
                self.owner
            );
            return None;
        };
        let fov = self.fov.as_mut()?;
        fov.look_from(pose.position, pose.heading);
        Some(fov)
    }

    /// All other vehicles currently inside the field of view.
    pub fn perceived_vehicles(&mut self) -> Vec<VehicleObject> {
        let coordinator = Arc::clone(&self.coordinator);
        match self.aimed_fov("vehicle query") {
            Some(fov) => coordinator.vehicles_in_range(fov),
            None => Vec::new(),
        }
    }

    /// All traffic lights currently inside the field of view.
    pub fn perceived_traffic_lights(&mut self) -> Vec<TrafficLightObject> {
        let coordinator = Arc::clone(&self.coordinator);
        match self.aimed_fov("traffic light query") {
            Some(fov) => coordinator.traffic_lights_in_range(fov),
            None => Vec::new(),
        }
    }

    /// Report a corrected traffic-light position observed in the field.
    ///
    /// Delegates to the coordinator's one-shot correction; `false` means
    /// another agent already corrected this light (or it is unknown).
    pub fn report_traffic_light_position(&self, id: &str, position: Position) -> bool {
        self.coordinator.try_map_traffic_light(id, position)
    }
}
