// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The perception index proper.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Rect;

use crate::backend::Backend;
use crate::backends::{AnyBackend, Grid, LinearScan, Quadtree};
use crate::error::{ConfigError, LookupError};
use crate::lights::{TrafficLightRegistration, TrafficLightRegistry};
use crate::model::PerceptionModel;
use crate::objects::{Position, SignalState, TrafficLightObject, VehicleObject};

/// Mutation counters, for logging and performance comparisons across
/// backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Vehicle records inserted or replaced.
    pub vehicle_upserts: u64,
    /// Vehicle records removed.
    pub vehicle_removals: u64,
    /// Traffic-light signal changes applied.
    pub signal_updates: u64,
}

/// Spatial index over vehicles and traffic lights, generic over the
/// vehicle broad phase.
///
/// Vehicle records live in a slot table; a slot freed by removal is
/// recycled by the next insertion. The id map and the backend always
/// agree on which slots are live. Queries run through a
/// [`PerceptionModel`]: the backend culls by bounding box, the model
/// applies the exact test, and matches are handed out as clones.
#[derive(Debug)]
pub struct PerceptionIndexGeneric<B: Backend> {
    entries: Vec<Option<VehicleObject>>,
    free_list: Vec<usize>,
    by_id: HashMap<String, usize>,
    backend: B,
    lights: TrafficLightRegistry,
    stats: IndexStats,
}

/// The perception index with a configuration-selected backend.
pub type PerceptionIndex = PerceptionIndexGeneric<AnyBackend>;

impl PerceptionIndex {
    /// Index backed by a linear scan. Never fails; this is also the
    /// fallback when a spatial backend rejects its parameters.
    pub fn linear() -> Self {
        Self::with_backend(AnyBackend::from(LinearScan::new()))
    }

    /// Index backed by a uniform grid over the scenario bounds.
    pub fn grid(bounds: Rect, cell_width: f64, cell_height: f64) -> Result<Self, ConfigError> {
        Ok(Self::with_backend(AnyBackend::from(Grid::new(
            bounds,
            cell_width,
            cell_height,
        )?)))
    }

    /// Index backed by a quadtree over the scenario bounds.
    pub fn quadtree(bounds: Rect, split_size: usize, max_depth: usize) -> Result<Self, ConfigError> {
        Ok(Self::with_backend(AnyBackend::from(Quadtree::new(
            bounds,
            split_size,
            max_depth,
        )?)))
    }
}

impl<B: Backend> PerceptionIndexGeneric<B> {
    /// Create an index over the given backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            by_id: HashMap::new(),
            backend,
            lights: TrafficLightRegistry::default(),
            stats: IndexStats::default(),
        }
    }

    /// Mutation counters since construction.
    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// Number of vehicles currently tracked.
    pub fn vehicle_count(&self) -> usize {
        self.by_id.len()
    }

    /// Number of traffic lights currently registered.
    pub fn traffic_light_count(&self) -> usize {
        self.lights.len()
    }

    // ---- vehicles ----

    /// Insert or replace vehicle records.
    ///
    /// A record whose id is already known replaces the stored record
    /// wholesale and moves it in the backend; a new id claims a recycled
    /// slot if one is free.
    pub fn upsert_vehicles<I>(&mut self, vehicles: I)
    where
        I: IntoIterator<Item = VehicleObject>,
    {
        for vehicle in vehicles {
            let position = vehicle.position.projected();
            match self.by_id.get(&vehicle.id) {
                Some(&slot) => {
                    self.entries[slot] = Some(vehicle);
                    self.backend.update(slot, position);
                }
                None => {
                    let slot = match self.free_list.pop() {
                        Some(slot) => slot,
                        None => {
                            self.entries.push(None);
                            self.entries.len() - 1
                        }
                    };
                    self.by_id.insert(vehicle.id.clone(), slot);
                    self.entries[slot] = Some(vehicle);
                    self.backend.insert(slot, position);
                }
            }
            self.stats.vehicle_upserts += 1;
        }
    }

    /// Remove vehicles by id. Unknown ids are skipped.
    pub fn remove_vehicles<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            let Some(slot) = self.by_id.remove(id.as_ref()) else {
                continue;
            };
            self.entries[slot] = None;
            self.free_list.push(slot);
            self.backend.remove(slot);
            self.stats.vehicle_removals += 1;
        }
    }

    /// The stored record for a vehicle id.
    pub fn vehicle(&self, id: &str) -> Option<&VehicleObject> {
        self.by_id.get(id).map(|&slot| {
            self.entries[slot]
                .as_ref()
                .expect("index invariant violated: id map references vacant slot")
        })
    }

    /// Vehicles perceived by the given model, as snapshots.
    ///
    /// The model's owner, if any, is excluded: a vehicle never perceives
    /// itself. Order is unspecified.
    pub fn vehicles_in_range(&self, model: &impl PerceptionModel) -> Vec<VehicleObject> {
        let mut matches = Vec::new();
        self.backend.visit_rect(model.bounding_box(), |slot| {
            let vehicle = self.entries[slot]
                .as_ref()
                .expect("index invariant violated: backend references vacant slot");
            if model.owner() != Some(vehicle.id.as_str()) && model.is_in_range(vehicle.position) {
                matches.push(vehicle.clone());
            }
        });
        matches
    }

    /// Drop every vehicle, keeping traffic lights and stats.
    pub fn clear_vehicles(&mut self) {
        self.entries.clear();
        self.free_list.clear();
        self.by_id.clear();
        self.backend.clear();
    }

    // ---- traffic lights ----

    /// Register a group of traffic lights, returning the number of new
    /// entries. Registration is idempotent per light id.
    pub fn register_traffic_lights<I>(&mut self, registrations: I) -> usize
    where
        I: IntoIterator<Item = TrafficLightRegistration>,
    {
        self.lights.register(registrations)
    }

    /// Apply a batch of signal changes.
    ///
    /// Every registered id in the batch is applied even when some ids are
    /// unknown; the unknown ones come back as a [`LookupError`].
    pub fn update_traffic_light_states<'a, I>(&mut self, updates: I) -> Result<usize, LookupError>
    where
        I: IntoIterator<Item = (&'a str, SignalState)>,
    {
        let (applied, unknown) = self.lights.update_states(updates);
        self.stats.signal_updates += applied as u64;
        if unknown.is_empty() {
            Ok(applied)
        } else {
            Err(LookupError { unknown })
        }
    }

    /// Apply the ordered signal states of one light group.
    ///
    /// `states[i]` targets the light at position `i` within the group;
    /// ids are derived as in [`traffic_light_id`][crate::traffic_light_id].
    pub fn update_traffic_light_group<I>(
        &mut self,
        group_id: &str,
        states: I,
    ) -> Result<usize, LookupError>
    where
        I: IntoIterator<Item = SignalState>,
    {
        let ids: Vec<(String, SignalState)> = states
            .into_iter()
            .enumerate()
            .map(|(i, state)| (crate::objects::traffic_light_id(group_id, i), state))
            .collect();
        self.update_traffic_light_states(ids.iter().map(|(id, state)| (id.as_str(), *state)))
    }

    /// Apply a one-shot position correction to a traffic light.
    ///
    /// Returns `true` on the first successful correction, `false` if the
    /// light is unknown or already corrected.
    pub fn map_traffic_light_position(&mut self, id: &str, position: Position) -> bool {
        self.lights.try_map(id, position)
    }

    /// The stored record for a traffic-light id.
    pub fn traffic_light(&self, id: &str) -> Option<&TrafficLightObject> {
        self.lights.get(id)
    }

    /// Traffic lights perceived by the given model, as snapshots.
    ///
    /// Only the geometric test applies; the model's owner exclusion is a
    /// vehicle concern. Light counts are small and static, so this scans
    /// the registry directly instead of going through the backend.
    pub fn traffic_lights_in_range(
        &self,
        model: &impl PerceptionModel,
    ) -> Vec<TrafficLightObject> {
        self.lights.in_range(|position| model.is_in_range(position))
    }
}
