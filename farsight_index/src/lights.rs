// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traffic-light registry.
//!
//! Traffic lights are static infrastructure: their set is fixed by
//! registration at scenario start, only their signal state (and, once, a
//! position correction) changes afterwards. The registry therefore does
//! not involve the spatial backend at all; light counts are small enough
//! that range queries scan the registry directly.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::objects::{Position, SignalState, TrafficLightObject, traffic_light_id};

/// Registration payload for one traffic light.
///
/// The light's identity is derived from `group_id` and `index`; see
/// [`traffic_light_id`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrafficLightRegistration {
    /// Identifier of the signal group.
    pub group_id: String,
    /// Position of the light within its group.
    pub index: usize,
    /// Position reported by the traffic simulator. Usually the junction
    /// center rather than the physical signal head.
    pub position: Position,
    /// Lane controlled by the light.
    pub incoming_lane: String,
    /// Lane the light releases traffic into.
    pub outgoing_lane: String,
    /// Signal shown at registration time.
    #[cfg_attr(feature = "serde", serde(default))]
    pub initial_state: SignalState,
}

#[derive(Debug, Default)]
pub(crate) struct TrafficLightRegistry {
    lights: HashMap<String, TrafficLightObject>,
}

impl TrafficLightRegistry {
    /// Register a group of lights, returning the number of new entries.
    ///
    /// Re-registering an existing light refreshes its lane topology and
    /// state but keeps a corrected position (corrections outlive simulator
    /// restarts on purpose).
    pub(crate) fn register<I>(&mut self, registrations: I) -> usize
    where
        I: IntoIterator<Item = TrafficLightRegistration>,
    {
        let mut added = 0;
        for registration in registrations {
            let id = traffic_light_id(&registration.group_id, registration.index);
            match self.lights.get_mut(&id) {
                Some(light) => light.refresh_registration(
                    registration.position,
                    registration.incoming_lane,
                    registration.outgoing_lane,
                    registration.initial_state,
                ),
                None => {
                    self.lights.insert(
                        id.clone(),
                        TrafficLightObject::new(
                            id,
                            registration.group_id,
                            registration.position,
                            registration.incoming_lane,
                            registration.outgoing_lane,
                            registration.initial_state,
                        ),
                    );
                    added += 1;
                }
            }
        }
        added
    }

    /// Apply a batch of signal changes.
    ///
    /// Every id present in the registry is updated; ids that are not are
    /// collected, in batch order. Returns the number of lights updated
    /// together with the unknown ids, so a partial batch still reports how
    /// much of it landed.
    pub(crate) fn update_states<'a, I>(&mut self, updates: I) -> (usize, Vec<String>)
    where
        I: IntoIterator<Item = (&'a str, SignalState)>,
    {
        let mut applied = 0;
        let mut unknown = Vec::new();
        for (id, state) in updates {
            match self.lights.get_mut(id) {
                Some(light) => {
                    light.set_state(state);
                    applied += 1;
                }
                None => unknown.push(id.to_string()),
            }
        }
        (applied, unknown)
    }

    /// Apply a one-shot position correction.
    ///
    /// Returns `true` if the correction was applied, `false` if the light
    /// is unknown or already mapped.
    pub(crate) fn try_map(&mut self, id: &str, position: Position) -> bool {
        self.lights
            .get_mut(id)
            .is_some_and(|light| light.try_map_position(position))
    }

    pub(crate) fn get(&self, id: &str) -> Option<&TrafficLightObject> {
        self.lights.get(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.lights.len()
    }

    /// Lights matching a caller-supplied position predicate.
    pub(crate) fn in_range<F>(&self, mut is_in_range: F) -> Vec<TrafficLightObject>
    where
        F: FnMut(Position) -> bool,
    {
        self.lights
            .values()
            .filter(|light| is_in_range(light.position()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn registration(group_id: &str, index: usize, x: f64) -> TrafficLightRegistration {
        TrafficLightRegistration {
            group_id: group_id.to_string(),
            index,
            position: Position::new(x, 0.0, 0.0),
            incoming_lane: alloc::format!("edge_in_{index}"),
            outgoing_lane: alloc::format!("edge_out_{index}"),
            initial_state: SignalState::Red,
        }
    }

    #[test]
    fn register_assigns_group_scoped_ids() {
        let mut registry = TrafficLightRegistry::default();
        let added = registry.register(vec![
            registration("tls_a", 0, 1.0),
            registration("tls_a", 1, 2.0),
            registration("tls_b", 0, 3.0),
        ]);
        assert_eq!(added, 3);
        assert_eq!(registry.len(), 3);
        assert!(registry.get("tls_a_0").is_some());
        assert!(registry.get("tls_a_1").is_some());
        assert!(registry.get("tls_b_0").is_some());
        assert!(registry.get("tls_b_1").is_none());
    }

    #[test]
    fn update_states_applies_known_and_reports_unknown() {
        let mut registry = TrafficLightRegistry::default();
        registry.register(vec![registration("tls", 0, 0.0), registration("tls", 1, 5.0)]);

        let (applied, unknown) = registry.update_states(vec![
            ("tls_0", SignalState::Green),
            ("bogus_9", SignalState::Red),
            ("tls_1", SignalState::Yellow),
        ]);
        assert_eq!(applied, 2);
        assert_eq!(unknown, vec!["bogus_9".to_string()]);

        // The known entries were applied despite the unknown id.
        assert_eq!(registry.get("tls_0").unwrap().state(), SignalState::Green);
        assert_eq!(registry.get("tls_1").unwrap().state(), SignalState::Yellow);
    }

    #[test]
    fn mapping_is_one_shot_per_light() {
        let mut registry = TrafficLightRegistry::default();
        registry.register(vec![registration("tls", 0, 0.0)]);

        assert!(registry.try_map("tls_0", Position::new(10.0, 10.0, 0.0)));
        assert!(!registry.try_map("tls_0", Position::new(99.0, 99.0, 0.0)));
        assert!(!registry.try_map("unknown_0", Position::new(0.0, 0.0, 0.0)));
        assert_eq!(
            registry.get("tls_0").unwrap().position(),
            Position::new(10.0, 10.0, 0.0)
        );
    }

    #[test]
    fn reregistration_survives_a_mapped_position() {
        let mut registry = TrafficLightRegistry::default();
        registry.register(vec![registration("tls", 0, 0.0)]);
        registry.try_map("tls_0", Position::new(7.0, 7.0, 0.0));

        let added = registry.register(vec![registration("tls", 0, 0.0)]);
        assert_eq!(added, 0);
        let light = registry.get("tls_0").unwrap();
        assert_eq!(light.position(), Position::new(7.0, 7.0, 0.0));
        assert!(light.is_mapped());
    }

    #[test]
    fn in_range_filters_by_predicate() {
        let mut registry = TrafficLightRegistry::default();
        registry.register(vec![
            registration("tls", 0, 1.0),
            registration("tls", 1, 50.0),
        ]);
        let near = registry.in_range(|position| position.x < 10.0);
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].id(), "tls_0");
    }
}
