//! Tower footprint coverage model.
//!
//! Each contributing tower covers a circle of `π·r²`. The summed area is
//! discounted by a scalar overlap factor that grows with tower count
//! (towers in the same district increasingly serve the same ground), then
//! compared against the district area. Districts without a known area fall
//! back to a tower-density heuristic.

use std::f64::consts::PI;

use infra_map_coverage_models::{Tower, TowerStatus};
use infra_map_geometry::{circle_polygon, combine_polygons};

use crate::config::{EngineConfig, OverlapModel};
use crate::engine::{DistrictBaseline, DistrictFigures, FALLBACK_DISTRICT_AREA_KM2, PEOPLE_PER_KM2};
use crate::located::Located as _;
use crate::{population_share, round1};

/// Ground one tower is assumed to serve when estimating the ideal tower
/// count for a district of unknown area (km²).
pub const IDEAL_TOWER_AREA_KM2: f64 = 25.0;

const MAX_LINEAR_OVERLAP_DISCOUNT: f64 = 0.7;

/// Overlap discount for `tower_count` towers.
///
/// Both models equal 1 for zero towers and never increase as towers are
/// added.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn overlap_factor(model: OverlapModel, tower_count: usize) -> f64 {
    let log_term = 0.1 * (tower_count as f64).ln_1p();
    match model {
        OverlapModel::Reciprocal => 1.0 / (1.0 + log_term),
        OverlapModel::Linear => 1.0 - log_term.min(MAX_LINEAR_OVERLAP_DISCOUNT),
    }
}

/// Footprint multiplier for a tower.
///
/// Without type weighting only active towers count, at full strength.
#[must_use]
pub fn tower_weight(config: &EngineConfig, tower: &Tower) -> f64 {
    if config.weight_by_tower_type {
        tower.tower_type.weight() * tower.status.weight()
    } else if tower.status == TowerStatus::Active {
        1.0
    } else {
        0.0
    }
}

/// Effective coverage radius of a tower (km).
#[must_use]
pub fn tower_radius_km(config: &EngineConfig, tower: &Tower) -> f64 {
    tower
        .coverage_radius_km
        .filter(|r| r.is_finite() && *r >= 0.0)
        .unwrap_or(config.default_tower_radius_km)
}

/// Coverage percentage for a district of unknown area, from tower density.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn density_percentage(tower_count: usize, known_population: Option<u64>) -> f64 {
    let estimated_area =
        known_population.map_or(FALLBACK_DISTRICT_AREA_KM2, |p| p as f64 / PEOPLE_PER_KM2);
    let ideal_tower_count = (estimated_area / IDEAL_TOWER_AREA_KM2).ceil().max(1.0);
    100.0 * tower_count as f64 / ideal_tower_count
}

pub(crate) fn analyze_district(
    config: &EngineConfig,
    baseline: &DistrictBaseline,
    towers: &[&Tower],
) -> DistrictFigures {
    let contributing: Vec<(&Tower, f64)> = towers
        .iter()
        .filter_map(|tower| {
            let weight = tower_weight(config, tower);
            (weight > 0.0).then_some((*tower, weight))
        })
        .collect();

    if contributing.is_empty() {
        return DistrictFigures::empty();
    }

    let tower_count = contributing.len();
    let total_area: f64 = contributing
        .iter()
        .map(|(tower, weight)| PI * tower_radius_km(config, tower).powi(2) * weight)
        .sum();
    let factor = overlap_factor(config.overlap_model, tower_count);
    let adjusted_area = total_area * factor;

    let raw_percentage = baseline.area_km2.map_or_else(
        || density_percentage(tower_count, baseline.known_population),
        |area| 100.0 * adjusted_area / area,
    );
    let percentage = round1(raw_percentage.clamp(0.0, 100.0));

    log::debug!(
        "District {}: {tower_count} towers, raw {total_area:.1} km², overlap {factor:.3}, \
         adjusted {adjusted_area:.1} km², {percentage}%",
        baseline.district_id
    );

    let footprint = combine_polygons(contributing.iter().filter_map(|(tower, _)| {
        let center = tower.coordinates()?;
        Some(circle_polygon(
            center,
            tower_radius_km(config, tower),
            config.circle_segments,
        ))
    }));

    DistrictFigures {
        percentage,
        population_covered: population_share(baseline.population(), percentage),
        footprint,
    }
}
