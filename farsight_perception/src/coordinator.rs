// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The process-wide perception coordinator.
//!
//! Exactly one coordinator owns the active [`PerceptionIndex`]. The
//! simulation pushes per-tick deltas into it; vehicle agents query
//! through it. Deltas are buffered and applied lazily on the first
//! [`refresh`][PerceptionCoordinator::refresh] of a tick, so the index
//! is rebuilt at most once per tick no matter how many agents query it,
//! and every agent within a tick sees the same snapshot.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use farsight_index::{
    IndexStats, LookupError, PerceptionIndex, PerceptionModel, Position, SignalState,
    TrafficLightObject, TrafficLightRegistration, VehicleObject,
};

use crate::config::PerceptionConfig;

/// One tick's worth of vehicle movement.
///
/// Added and updated records are applied identically (the index upserts);
/// they are kept apart because the traffic simulator reports them apart
/// and the distinction is useful in logs.
#[derive(Clone, Debug, Default)]
pub struct VehicleDelta {
    /// Vehicles that entered the simulation this tick.
    pub added: Vec<VehicleObject>,
    /// Vehicles that moved this tick.
    pub updated: Vec<VehicleObject>,
    /// Ids of vehicles that left the simulation this tick.
    pub removed: Vec<String>,
}

#[derive(Default)]
struct Pending {
    /// Latest buffered record per vehicle id.
    vehicles: HashMap<String, VehicleObject>,
    /// Latest buffered state sequence per light group.
    signals: HashMap<String, Vec<SignalState>>,
    vehicles_dirty: bool,
    lights_dirty: bool,
}

/// Owner of the active perception index.
///
/// Shared by reference (typically `Arc`) between the simulation driver
/// and every per-vehicle [`PerceptionModule`][crate::PerceptionModule];
/// all methods take `&self` and synchronize internally. Mutations take
/// the index write lock, queries the read lock, so queries from parallel
/// agent workers proceed concurrently with each other.
#[derive(Debug)]
pub struct PerceptionCoordinator {
    index: RwLock<PerceptionIndex>,
    pending: Mutex<Pending>,
}

impl core::fmt::Debug for Pending {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pending")
            .field("vehicles", &self.vehicles.len())
            .field("signals", &self.signals.len())
            .field("vehicles_dirty", &self.vehicles_dirty)
            .field("lights_dirty", &self.lights_dirty)
            .finish()
    }
}

impl PerceptionCoordinator {
    /// Wrap an index built elsewhere.
    pub fn new(index: PerceptionIndex) -> Self {
        Self {
            index: RwLock::new(index),
            pending: Mutex::new(Pending::default()),
        }
    }

    /// Build the index from configuration and wrap it.
    pub fn from_config(config: &PerceptionConfig) -> Self {
        Self::new(config.build_index())
    }

    fn read_index(&self) -> RwLockReadGuard<'_, PerceptionIndex> {
        self.index.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, PerceptionIndex> {
        self.index.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_pending(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Buffer one tick's vehicle movement.
    ///
    /// Movement is applied lazily on the next [`refresh`][Self::refresh];
    /// when the same vehicle appears in several deltas before a refresh,
    /// the latest record wins. Removals are applied immediately so a
    /// departed vehicle can never satisfy a query, not even before the
    /// next refresh.
    pub fn notify_vehicle_delta(&self, delta: VehicleDelta) {
        let mut pending = self.lock_pending();
        for vehicle in delta.added.into_iter().chain(delta.updated) {
            pending.vehicles.insert(vehicle.id.clone(), vehicle);
        }
        if !delta.removed.is_empty() {
            for id in &delta.removed {
                pending.vehicles.remove(id);
            }
            self.write_index().remove_vehicles(&delta.removed);
        }
        pending.vehicles_dirty = true;
    }

    /// Buffer one tick's signal changes, one ordered sequence per group.
    ///
    /// Within a group the latest buffered sequence wins.
    pub fn notify_traffic_light_delta<I>(&self, updates: I)
    where
        I: IntoIterator<Item = (String, Vec<SignalState>)>,
    {
        let mut pending = self.lock_pending();
        for (group_id, states) in updates {
            pending.signals.insert(group_id, states);
        }
        pending.lights_dirty = true;
    }

    /// Apply all buffered deltas to the index.
    ///
    /// A second call with no intervening `notify_*` is a no-op: the index
    /// is untouched and no write lock is taken. Unknown light ids in a
    /// buffered signal sequence are logged and skipped; the rest of the
    /// batch still applies.
    pub fn refresh(&self) {
        let mut pending = self.lock_pending();
        if !pending.vehicles_dirty && !pending.lights_dirty {
            return;
        }
        let mut index = self.write_index();
        if pending.vehicles_dirty {
            index.upsert_vehicles(pending.vehicles.drain().map(|(_, vehicle)| vehicle));
            pending.vehicles_dirty = false;
        }
        if pending.lights_dirty {
            for (group_id, states) in pending.signals.drain() {
                if let Err(LookupError { unknown }) =
                    index.update_traffic_light_group(&group_id, states)
                {
                    log::warn!(
                        "signal update for group {group_id} referenced {} unregistered light(s): {unknown:?}",
                        unknown.len()
                    );
                }
            }
            pending.lights_dirty = false;
        }
    }

    /// Register traffic lights, immediately. Returns the number of new
    /// entries.
    pub fn register_traffic_lights<I>(&self, registrations: I) -> usize
    where
        I: IntoIterator<Item = TrafficLightRegistration>,
    {
        self.write_index().register_traffic_lights(registrations)
    }

    /// One-shot traffic-light position correction.
    ///
    /// Atomic with respect to concurrent callers: when several agents
    /// race to correct the same light, exactly one call returns `true`
    /// and its position sticks.
    pub fn try_map_traffic_light(&self, id: &str, position: Position) -> bool {
        self.write_index().map_traffic_light_position(id, position)
    }

    /// Snapshot of a vehicle record, if known to the index.
    pub fn vehicle(&self, id: &str) -> Option<VehicleObject> {
        self.read_index().vehicle(id).cloned()
    }

    /// Snapshot of a traffic-light record, if registered.
    pub fn traffic_light(&self, id: &str) -> Option<TrafficLightObject> {
        self.read_index().traffic_light(id).cloned()
    }

    /// Vehicles perceived by the given model.
    pub fn vehicles_in_range(&self, model: &impl PerceptionModel) -> Vec<VehicleObject> {
        self.read_index().vehicles_in_range(model)
    }

    /// Traffic lights perceived by the given model.
    pub fn traffic_lights_in_range(&self, model: &impl PerceptionModel) -> Vec<TrafficLightObject> {
        self.read_index().traffic_lights_in_range(model)
    }

    /// Mutation counters of the underlying index.
    pub fn stats(&self) -> IndexStats {
        self.read_index().stats()
    }

    /// Number of vehicles currently indexed.
    pub fn vehicle_count(&self) -> usize {
        self.read_index().vehicle_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farsight_index::FieldOfView;
    use std::sync::Arc;
    use std::thread;

    fn vehicle(id: &str, x: f64, y: f64) -> VehicleObject {
        VehicleObject {
            id: id.to_string(),
            position: Position::new(x, y, 0.0),
            heading: 0.0,
            speed: 10.0,
        }
    }

    fn registration(index: usize, x: f64) -> TrafficLightRegistration {
        TrafficLightRegistration {
            group_id: "tls".to_string(),
            index,
            position: Position::new(x, 0.0, 0.0),
            incoming_lane: format!("in_{index}"),
            outgoing_lane: format!("out_{index}"),
            initial_state: SignalState::Red,
        }
    }

    #[test]
    fn refresh_is_idempotent_between_deltas() {
        let coordinator = PerceptionCoordinator::new(PerceptionIndex::linear());
        coordinator.notify_vehicle_delta(VehicleDelta {
            added: vec![vehicle("veh_0", 1.0, 1.0)],
            ..VehicleDelta::default()
        });

        coordinator.refresh();
        let after_first = coordinator.stats();
        coordinator.refresh();
        coordinator.refresh();
        assert_eq!(coordinator.stats(), after_first);
        assert_eq!(after_first.vehicle_upserts, 1);
    }

    #[test]
    fn latest_buffered_record_wins() {
        let coordinator = PerceptionCoordinator::new(PerceptionIndex::linear());
        coordinator.notify_vehicle_delta(VehicleDelta {
            added: vec![vehicle("veh_0", 1.0, 1.0)],
            ..VehicleDelta::default()
        });
        coordinator.notify_vehicle_delta(VehicleDelta {
            updated: vec![vehicle("veh_0", 9.0, 9.0)],
            ..VehicleDelta::default()
        });
        coordinator.refresh();

        let stored = coordinator.vehicle("veh_0").unwrap();
        assert_eq!(stored.position, Position::new(9.0, 9.0, 0.0));
        // Only the winning record hit the index.
        assert_eq!(coordinator.stats().vehicle_upserts, 1);
    }

    #[test]
    fn removal_is_never_deferred() {
        let coordinator = PerceptionCoordinator::new(PerceptionIndex::linear());
        coordinator.notify_vehicle_delta(VehicleDelta {
            added: vec![vehicle("veh_0", 5.0, 0.0)],
            ..VehicleDelta::default()
        });
        coordinator.refresh();

        // The vehicle moves and leaves in the same tick; it must be gone
        // even before the next refresh, and the buffered move must not
        // resurrect it.
        coordinator.notify_vehicle_delta(VehicleDelta {
            updated: vec![vehicle("veh_0", 6.0, 0.0)],
            ..VehicleDelta::default()
        });
        coordinator.notify_vehicle_delta(VehicleDelta {
            removed: vec!["veh_0".to_string()],
            ..VehicleDelta::default()
        });
        assert!(coordinator.vehicle("veh_0").is_none());

        coordinator.refresh();
        assert!(coordinator.vehicle("veh_0").is_none());
        assert_eq!(coordinator.vehicle_count(), 0);
    }

    #[test]
    fn signal_deltas_apply_on_refresh() {
        let coordinator = PerceptionCoordinator::new(PerceptionIndex::linear());
        coordinator.register_traffic_lights((0..2).map(|i| registration(i, 0.0)));

        coordinator.notify_traffic_light_delta([(
            "tls".to_string(),
            vec![SignalState::Green, SignalState::Yellow],
        )]);
        // Not yet applied.
        assert_eq!(
            coordinator.traffic_light("tls_0").unwrap().state(),
            SignalState::Red
        );

        coordinator.refresh();
        assert_eq!(
            coordinator.traffic_light("tls_0").unwrap().state(),
            SignalState::Green
        );
        assert_eq!(
            coordinator.traffic_light("tls_1").unwrap().state(),
            SignalState::Yellow
        );
    }

    #[test]
    fn concurrent_mapping_has_exactly_one_winner() {
        let coordinator = Arc::new(PerceptionCoordinator::new(PerceptionIndex::linear()));
        coordinator.register_traffic_lights([registration(0, 0.0)]);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let coordinator = Arc::clone(&coordinator);
                thread::spawn(move || {
                    let position = Position::new(f64::from(i), 0.0, 0.0);
                    coordinator.try_map_traffic_light("tls_0", position).then_some(position)
                })
            })
            .collect();

        let winners: Vec<Position> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(winners.len(), 1);

        let light = coordinator.traffic_light("tls_0").unwrap();
        assert!(light.is_mapped());
        assert_eq!(light.position(), winners[0]);
    }

    #[test]
    fn queries_go_through_the_shared_snapshot() {
        let coordinator = PerceptionCoordinator::new(PerceptionIndex::linear());
        coordinator.notify_vehicle_delta(VehicleDelta {
            added: vec![vehicle("ego", 0.0, 0.0), vehicle("lead", 5.0, 0.0)],
            ..VehicleDelta::default()
        });
        coordinator.refresh();

        let mut fov = FieldOfView::new("ego", core::f64::consts::FRAC_PI_2, 10.0).unwrap();
        fov.look_from(Position::new(0.0, 0.0, 0.0), 0.0);
        let seen = coordinator.vehicles_in_range(&fov);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, "lead");
    }
}
