// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Farsight Perception: the coordination layer of the perception engine.
//!
//! ## Overview
//!
//! This crate sits between a traffic simulator and the spatial query core
//! in [`farsight_index`]. One [`PerceptionCoordinator`] owns the active
//! index for the whole process; the simulation pushes per-tick vehicle
//! and signal deltas into it, and any number of per-vehicle
//! [`PerceptionModule`]s query through it. Deltas are buffered behind two
//! dirty flags and applied by the first [`PerceptionCoordinator::refresh`]
//! of a tick, so the index is rebuilt at most once per tick and every
//! agent sees the same snapshot. Vehicle removals are the exception and
//! apply immediately, so a departed vehicle can never be perceived.
//!
//! The coordinator also carries the one-shot traffic-light correction:
//! any agent may replace a light's imprecise registered position with an
//! observed one, exactly once per light, atomically under concurrency.
//! [`MappingService`] accumulates the winning corrections into a
//! TOML-serializable snapshot the host can persist across runs.
//!
//! ## Workflow
//!
//! 1) Load a [`PerceptionConfig`] and build the coordinator with
//!    [`PerceptionCoordinator::from_config`]. Unusable backend parameters
//!    degrade to the linear backend with a warning.
//! 2) At scenario load, register traffic lights and
//!    [`restore`][MappingService::restore] a mapping snapshot from the
//!    previous run.
//! 3) Per tick, feed [`VehicleDelta`]s and signal sequences into the
//!    coordinator; agents call
//!    [`perceived_vehicles`][PerceptionModule::perceived_vehicles] and
//!    [`perceived_traffic_lights`][PerceptionModule::perceived_traffic_lights]
//!    on their own modules.
//! 4) At shutdown, take [`MappingService::snapshot`] and write its
//!    [`to_toml_string`][MappingSnapshot::to_toml_string] output wherever
//!    the host keeps scenario state.
//!
//! Modules get the coordinator handed to them at construction; nothing in
//! this crate is reachable through global state.

mod config;
mod coordinator;
mod error;
mod mapping;
mod module;

pub use config::{BackendConfig, Bounds, PerceptionConfig, SensorConfig};
pub use coordinator::{PerceptionCoordinator, VehicleDelta};
pub use error::ConfigLoadError;
pub use mapping::{MappingEntry, MappingService, MappingSnapshot};
pub use module::PerceptionModule;

#[cfg(test)]
mod tests {
    use super::*;
    use farsight_index::{Position, SignalState, TrafficLightRegistration, VehicleObject};
    use std::sync::Arc;

    /// End-to-end: configure, register, drive a tick, query, correct.
    #[test]
    fn full_tick_cycle() {
        let config = PerceptionConfig::from_toml_str(
            r#"
            [backend]
            type = "grid"
            cell_width = 100.0
            cell_height = 100.0

            [bounds]
            min_x = 0.0
            min_y = 0.0
            max_x = 1000.0
            max_y = 1000.0
            "#,
        )
        .unwrap();
        let coordinator = Arc::new(PerceptionCoordinator::from_config(&config));

        coordinator.register_traffic_lights([TrafficLightRegistration {
            group_id: "tls_main".to_string(),
            index: 0,
            position: Position::new(40.0, 0.0, 0.0),
            incoming_lane: "edge_in_0".to_string(),
            outgoing_lane: "edge_out_0".to_string(),
            initial_state: SignalState::Red,
        }]);

        coordinator.notify_vehicle_delta(VehicleDelta {
            added: vec![
                VehicleObject {
                    id: "ego".to_string(),
                    position: Position::new(0.0, 0.0, 0.0),
                    heading: 0.0,
                    speed: 13.9,
                },
                VehicleObject {
                    id: "lead".to_string(),
                    position: Position::new(30.0, 2.0, 0.0),
                    heading: 0.0,
                    speed: 11.0,
                },
            ],
            ..VehicleDelta::default()
        });
        coordinator.notify_traffic_light_delta([(
            "tls_main".to_string(),
            vec![SignalState::Green],
        )]);

        let mut module = PerceptionModule::new("ego", Arc::clone(&coordinator));
        module
            .configure(config.sensor.opening_angle, config.sensor.range)
            .unwrap();

        let vehicles = module.perceived_vehicles();
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].id, "lead");

        let lights = module.perceived_traffic_lights();
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].state(), SignalState::Green);
        assert!(!lights[0].is_mapped());

        // The agent observes the actual signal head and corrects it.
        let service = MappingService::new(Arc::clone(&coordinator));
        let observed = Position::new(42.5, 1.0, 2.1);
        assert!(service.report("tls_main_0", "Main junction", observed));
        assert_eq!(
            coordinator.traffic_light("tls_main_0").unwrap().position(),
            observed
        );
    }
}
