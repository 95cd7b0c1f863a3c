// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traffic-light mapping persistence.
//!
//! Corrected traffic-light positions are worth keeping across runs: the
//! registered positions come from the traffic simulator's junction
//! geometry and stay imprecise until some vehicle observes the physical
//! signal head. The snapshot serializes as TOML mapping light id to a
//! name and position; the host persists it and replays it at startup
//! through the coordinator's one-shot correction, which is idempotent
//! against double application. The file I/O itself belongs to the host.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use farsight_index::Position;
use serde::{Deserialize, Serialize};

use crate::coordinator::PerceptionCoordinator;

/// One persisted correction.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MappingEntry {
    /// Human-readable name of the light, for scenario tooling.
    pub name: String,
    /// The corrected position.
    pub position: Position,
}

/// The persisted form of all corrections, keyed by light id.
///
/// Keys are kept sorted so the written file is stable under re-saving.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MappingSnapshot {
    #[serde(default)]
    lights: BTreeMap<String, MappingEntry>,
}

impl MappingSnapshot {
    /// Record a correction. An existing entry for the id is kept; the
    /// snapshot mirrors the index, where the first correction wins.
    pub fn record(&mut self, id: impl Into<String>, entry: MappingEntry) {
        self.lights.entry(id.into()).or_insert(entry);
    }

    /// The recorded entry for a light id.
    pub fn get(&self, id: &str) -> Option<&MappingEntry> {
        self.lights.get(id)
    }

    /// Number of recorded corrections.
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// Whether no corrections are recorded.
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Iterate over all entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappingEntry)> {
        self.lights.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Parse a snapshot from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Serialize the snapshot to TOML text.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

/// Central authority for traffic-light corrections.
///
/// Field reports arrive here (locally or forwarded by a messaging layer),
/// are applied through the coordinator's one-shot correction, and the
/// winners are accumulated for persistence at shutdown.
#[derive(Debug)]
pub struct MappingService {
    coordinator: Arc<PerceptionCoordinator>,
    snapshot: Mutex<MappingSnapshot>,
}

impl MappingService {
    /// Create a service with an empty snapshot.
    pub fn new(coordinator: Arc<PerceptionCoordinator>) -> Self {
        Self {
            coordinator,
            snapshot: Mutex::new(MappingSnapshot::default()),
        }
    }

    fn lock_snapshot(&self) -> MutexGuard<'_, MappingSnapshot> {
        self.snapshot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Handle a field report of a corrected position.
    ///
    /// Returns `true` if the report won the one-shot correction; losing
    /// reports (light unknown or already corrected) leave both the index
    /// and the snapshot untouched.
    pub fn report(&self, id: &str, name: &str, position: Position) -> bool {
        // Snapshot lock held across the correction so a racing report
        // cannot record a loser between apply and record.
        let mut snapshot = self.lock_snapshot();
        let won = self.coordinator.try_map_traffic_light(id, position);
        if won {
            snapshot.record(
                id,
                MappingEntry {
                    name: name.to_string(),
                    position,
                },
            );
        } else {
            log::debug!("discarding mapping report for {id}: unknown or already mapped");
        }
        won
    }

    /// Adopt a snapshot from a previous run and replay it.
    ///
    /// Replay goes through the same one-shot correction as live reports.
    /// Entries for lights that are unknown this run are kept in the
    /// snapshot so they survive scenario variations that omit a group.
    pub fn restore(&self, saved: MappingSnapshot) {
        let mut snapshot = self.lock_snapshot();
        for (id, entry) in saved.iter() {
            self.coordinator.try_map_traffic_light(id, entry.position);
        }
        *snapshot = saved;
    }

    /// Current snapshot, for persistence.
    pub fn snapshot(&self) -> MappingSnapshot {
        self.lock_snapshot().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farsight_index::{PerceptionIndex, SignalState, TrafficLightRegistration};

    fn coordinator_with_light() -> Arc<PerceptionCoordinator> {
        let coordinator = Arc::new(PerceptionCoordinator::new(PerceptionIndex::linear()));
        coordinator.register_traffic_lights([TrafficLightRegistration {
            group_id: "tls".to_string(),
            index: 0,
            position: Position::new(0.0, 0.0, 0.0),
            incoming_lane: "in".to_string(),
            outgoing_lane: "out".to_string(),
            initial_state: SignalState::Red,
        }]);
        coordinator
    }

    #[test]
    fn first_report_wins_and_is_recorded() {
        let coordinator = coordinator_with_light();
        let service = MappingService::new(Arc::clone(&coordinator));

        let p1 = Position::new(3.0, 4.0, 0.0);
        let p2 = Position::new(8.0, 8.0, 0.0);
        assert!(service.report("tls_0", "Main St / 1st Ave", p1));
        assert!(!service.report("tls_0", "Main St / 1st Ave", p2));

        assert_eq!(coordinator.traffic_light("tls_0").unwrap().position(), p1);
        let snapshot = service.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("tls_0").unwrap().position, p1);
    }

    #[test]
    fn reports_for_unknown_lights_are_discarded() {
        let service = MappingService::new(coordinator_with_light());
        assert!(!service.report("ghost_0", "nowhere", Position::default()));
        assert!(service.snapshot().is_empty());
    }

    #[test]
    fn snapshot_roundtrips_through_toml() {
        let mut snapshot = MappingSnapshot::default();
        snapshot.record(
            "tls_0",
            MappingEntry {
                name: "Main St / 1st Ave".to_string(),
                position: Position::new(3.0, 4.0, 1.5),
            },
        );
        snapshot.record(
            "tls_1",
            MappingEntry {
                name: "Main St / 2nd Ave".to_string(),
                position: Position::new(10.0, -2.0, 0.0),
            },
        );

        let text = snapshot.to_toml_string().unwrap();
        assert_eq!(MappingSnapshot::from_toml_str(&text).unwrap(), snapshot);
    }

    #[test]
    fn restore_replays_through_the_correction() {
        let coordinator = coordinator_with_light();
        let service = MappingService::new(Arc::clone(&coordinator));

        let mut saved = MappingSnapshot::default();
        let p = Position::new(3.0, 4.0, 0.0);
        saved.record(
            "tls_0",
            MappingEntry {
                name: "Main St / 1st Ave".to_string(),
                position: p,
            },
        );
        // An entry this scenario does not know about survives the restore.
        saved.record(
            "other_0",
            MappingEntry {
                name: "elsewhere".to_string(),
                position: Position::default(),
            },
        );

        service.restore(saved.clone());
        let light = coordinator.traffic_light("tls_0").unwrap();
        assert!(light.is_mapped());
        assert_eq!(light.position(), p);
        assert_eq!(service.snapshot(), saved);

        // Replaying the same snapshot again changes nothing.
        service.restore(saved);
        assert_eq!(coordinator.traffic_light("tls_0").unwrap().position(), p);
    }
}
