// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Perception configuration.
//!
//! The configuration selects the spatial backend and its parameters once
//! at scenario load. Backend parameters that turn out to be unusable
//! (degenerate bounds, a zero cell size) degrade to the linear-scan
//! backend with a warning instead of aborting the scenario: a slow index
//! beats no index.

use std::fs;
use std::path::Path;

use farsight_index::PerceptionIndex;
use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::error::ConfigLoadError;

/// Rectangular scenario bounds, min corner to max corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Bounds {
    /// Minimum x.
    pub min_x: f64,
    /// Minimum y.
    pub min_y: f64,
    /// Maximum x.
    pub max_x: f64,
    /// Maximum y.
    pub max_y: f64,
}

impl Bounds {
    /// The bounds as a rectangle.
    pub fn rect(&self) -> Rect {
        Rect::new(self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

/// Backend selection with per-backend parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Flat scan over all records.
    #[default]
    Linear,
    /// Uniform grid with the given cell size.
    Grid {
        /// Cell width.
        cell_width: f64,
        /// Cell height.
        cell_height: f64,
    },
    /// Quadtree with the given split threshold and depth bound.
    Quadtree {
        /// Records a leaf holds before splitting.
        split_size: usize,
        /// Maximum subdivision depth.
        max_depth: usize,
    },
}

/// Default sensor parameters for vehicles that do not configure their
/// own.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Full opening angle in radians.
    pub opening_angle: f64,
    /// Viewing distance.
    pub range: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        // A 40 degree cone reaching 200 units.
        Self {
            opening_angle: 40.0_f64.to_radians(),
            range: 200.0,
        }
    }
}

/// Top-level perception configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Spatial backend to index vehicles with.
    pub backend: BackendConfig,
    /// Scenario bounds the spatial backends partition. Ignored by the
    /// linear backend.
    pub bounds: Bounds,
    /// Default sensor parameters.
    pub sensor: SensorConfig,
}

impl PerceptionConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the configured index.
    ///
    /// Unusable backend parameters fall back to the linear scan with a
    /// warning; see the module docs.
    pub fn build_index(&self) -> PerceptionIndex {
        let result = match self.backend {
            BackendConfig::Linear => return PerceptionIndex::linear(),
            BackendConfig::Grid {
                cell_width,
                cell_height,
            } => PerceptionIndex::grid(self.bounds.rect(), cell_width, cell_height),
            BackendConfig::Quadtree {
                split_size,
                max_depth,
            } => PerceptionIndex::quadtree(self.bounds.rect(), split_size, max_depth),
        };
        match result {
            Ok(index) => index,
            Err(err) => {
                log::warn!("unusable backend configuration ({err}), falling back to linear scan");
                PerceptionIndex::linear()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_linear() {
        let config = PerceptionConfig::from_toml_str("").unwrap();
        assert_eq!(config.backend, BackendConfig::Linear);
        let debug = format!("{:?}", config.build_index());
        assert!(debug.contains("Linear"), "unexpected index: {debug}");
    }

    #[test]
    fn sensor_defaults_are_usable() {
        let config = PerceptionConfig::default();
        assert!((config.sensor.opening_angle - 40.0_f64.to_radians()).abs() < 1e-12);
        assert_eq!(config.sensor.range, 200.0);

        // Partial sensor sections keep the other default.
        let config = PerceptionConfig::from_toml_str(
            r#"
            [sensor]
            range = 150.0
            "#,
        )
        .unwrap();
        assert_eq!(config.sensor.range, 150.0);
        assert!((config.sensor.opening_angle - 40.0_f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn parses_a_grid_backend() {
        let config = PerceptionConfig::from_toml_str(
            r#"
            [backend]
            type = "grid"
            cell_width = 200.0
            cell_height = 200.0

            [bounds]
            min_x = 0.0
            min_y = 0.0
            max_x = 4000.0
            max_y = 3000.0
            "#,
        )
        .unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Grid {
                cell_width: 200.0,
                cell_height: 200.0
            }
        );
        let debug = format!("{:?}", config.build_index());
        assert!(debug.contains("Grid"), "unexpected index: {debug}");
    }

    #[test]
    fn degenerate_bounds_fall_back_to_linear() {
        let config = PerceptionConfig {
            backend: BackendConfig::Quadtree {
                split_size: 8,
                max_depth: 10,
            },
            // Default bounds have zero area.
            bounds: Bounds::default(),
            sensor: SensorConfig::default(),
        };
        let debug = format!("{:?}", config.build_index());
        assert!(debug.contains("Linear"), "unexpected index: {debug}");
    }

    #[test]
    fn roundtrips_through_toml() {
        let config = PerceptionConfig {
            backend: BackendConfig::Quadtree {
                split_size: 16,
                max_depth: 12,
            },
            bounds: Bounds {
                min_x: -100.0,
                min_y: -100.0,
                max_x: 900.0,
                max_y: 900.0,
            },
            sensor: SensorConfig::default(),
        };
        let text = toml::to_string(&config).unwrap();
        assert_eq!(PerceptionConfig::from_toml_str(&text).unwrap(), config);
    }
}
