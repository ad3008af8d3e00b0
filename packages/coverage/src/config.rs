//! Engine settings, loadable from TOML.
//!
//! The bundled defaults live in `config/default.toml` and are embedded at
//! compile time as [`DEFAULT_CONFIG_TOML`]. Every field is optional in a
//! user-supplied file; omitted fields take the same defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::CoverageError;

/// The bundled default configuration file.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Overlap correction applied to summed tower footprints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapModel {
    /// `1 / (1 + 0.1 * ln(1 + n))`
    #[default]
    Reciprocal,
    /// `1 - min(0.7, 0.1 * ln(n + 1))`
    Linear,
}

/// Tunable parameters of the coverage engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Weight tower footprints by [`TowerType`] and [`TowerStatus`] instead
    /// of counting only active towers at full strength.
    ///
    /// [`TowerType`]: infra_map_coverage_models::TowerType
    /// [`TowerStatus`]: infra_map_coverage_models::TowerStatus
    #[serde(default)]
    pub weight_by_tower_type: bool,
    /// Overlap correction formula.
    #[serde(default)]
    pub overlap_model: OverlapModel,
    /// Vertices per synthesized coverage circle.
    #[serde(default = "default_circle_segments")]
    pub circle_segments: usize,
    /// Radius for towers without a recorded coverage radius (km).
    #[serde(default = "default_tower_radius_km")]
    pub default_tower_radius_km: f64,
    /// Footprint radius around internet-enabled schools (km).
    #[serde(default = "default_school_radius_km")]
    pub school_radius_km: f64,
    /// Footprint radius around internet-enabled hospitals (km).
    #[serde(default = "default_hospital_radius_km")]
    pub hospital_radius_km: f64,
}

const fn default_circle_segments() -> usize {
    infra_map_geometry::DEFAULT_CIRCLE_SEGMENTS
}

const fn default_tower_radius_km() -> f64 {
    5.0
}

const fn default_school_radius_km() -> f64 {
    2.0
}

const fn default_hospital_radius_km() -> f64 {
    5.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weight_by_tower_type: false,
            overlap_model: OverlapModel::default(),
            circle_segments: default_circle_segments(),
            default_tower_radius_km: default_tower_radius_km(),
            school_radius_km: default_school_radius_km(),
            hospital_radius_km: default_hospital_radius_km(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Config`] if the TOML is malformed, has
    /// unknown keys, or holds invalid values.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, CoverageError> {
        let config: Self = toml::de::from_str(toml_str).map_err(|e| CoverageError::Config {
            message: format!("Failed to parse engine config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Config`] if the file cannot be read or is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, CoverageError> {
        let contents = std::fs::read_to_string(path).map_err(|e| CoverageError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        log::debug!("Loaded engine config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Checks that every radius is a finite, non-negative number.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), CoverageError> {
        let radii = [
            ("default_tower_radius_km", self.default_tower_radius_km),
            ("school_radius_km", self.school_radius_km),
            ("hospital_radius_km", self.hospital_radius_km),
        ];

        for (name, value) in radii {
            if !value.is_finite() || value < 0.0 {
                return Err(CoverageError::Config {
                    message: format!("{name} must be a non-negative number, got {value}"),
                });
            }
        }

        Ok(())
    }
}
