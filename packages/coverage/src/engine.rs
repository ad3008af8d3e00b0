//! Per-district coverage analysis.
//!
//! [`CoverageEngine::analyze`] groups infrastructure by district, runs the
//! model matching the [`AnalysisType`], and produces one fresh
//! [`CoverageResult`] per district in input order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use geo::MultiPolygon;
use infra_map_coverage_models::{
    AnalysisType, CoverageLevel, CoverageResult, District, Hospital, School, Tower,
};
use infra_map_geometry::multipolygon_to_geojson;

use crate::config::EngineConfig;
use crate::{CoverageError, facility, telecom};

/// Area assumed for a district whose area and population are both unknown
/// (km²).
pub const FALLBACK_DISTRICT_AREA_KM2: f64 = 1000.0;

/// Density used to convert between district area and population.
pub const PEOPLE_PER_KM2: f64 = 100.0;

/// Infrastructure snapshot for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct InfrastructureSet {
    /// Telecom towers.
    pub towers: Vec<Tower>,
    /// Schools.
    pub schools: Vec<School>,
    /// Hospitals.
    pub hospitals: Vec<Hospital>,
}

/// A district's area and population with the engine's defaults applied.
#[derive(Debug, Clone)]
pub(crate) struct DistrictBaseline {
    pub district_id: String,
    /// Area when known and positive.
    pub area_km2: Option<f64>,
    /// Population as recorded.
    pub known_population: Option<u64>,
}

impl DistrictBaseline {
    pub fn new(district: &District) -> Self {
        Self {
            district_id: district.id.clone(),
            area_km2: district.area_km2.filter(|a| a.is_finite() && *a > 0.0),
            known_population: district.population,
        }
    }

    /// Recorded population, or an estimate from area at
    /// [`PEOPLE_PER_KM2`].
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn population(&self) -> u64 {
        self.known_population.unwrap_or_else(|| {
            let area = self.area_km2.unwrap_or(FALLBACK_DISTRICT_AREA_KM2);
            (area * PEOPLE_PER_KM2).round() as u64
        })
    }
}

/// Model output for one district.
#[derive(Debug, Clone)]
pub(crate) struct DistrictFigures {
    pub percentage: f64,
    pub population_covered: u64,
    pub footprint: Option<MultiPolygon<f64>>,
}

impl DistrictFigures {
    pub const fn empty() -> Self {
        Self {
            percentage: 0.0,
            population_covered: 0,
            footprint: None,
        }
    }
}

/// The coverage analysis engine.
#[derive(Debug, Clone, Default)]
pub struct CoverageEngine {
    config: EngineConfig,
}

impl CoverageEngine {
    /// Creates an engine with the given settings.
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The engine's settings.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyzes every district in `districts`.
    ///
    /// Infrastructure whose `district_id` matches none of the districts is
    /// ignored. `computed_at` is stamped on every result so the output is
    /// fully determined by the inputs.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::NoDistricts`] if `districts` is empty.
    pub fn analyze(
        &self,
        districts: &[District],
        infrastructure: &InfrastructureSet,
        analysis_type: AnalysisType,
        computed_at: DateTime<Utc>,
    ) -> Result<Vec<CoverageResult>, CoverageError> {
        if districts.is_empty() {
            return Err(CoverageError::NoDistricts { filter: None });
        }

        let towers = group_by_district(&infrastructure.towers, |t| &t.district_id);
        let schools = group_by_district(&infrastructure.schools, |s| &s.district_id);
        let hospitals = group_by_district(&infrastructure.hospitals, |h| &h.district_id);

        let results: Vec<CoverageResult> = districts
            .iter()
            .map(|district| {
                let baseline = DistrictBaseline::new(district);
                let key = district.id.as_str();

                let figures = match analysis_type {
                    AnalysisType::Telecom | AnalysisType::Internet => telecom::analyze_district(
                        &self.config,
                        &baseline,
                        towers.get(key).map_or(&[][..], Vec::as_slice),
                    ),
                    AnalysisType::Education => facility::analyze_district(
                        &baseline,
                        schools.get(key).map_or(&[][..], Vec::as_slice),
                        self.config.school_radius_km,
                        self.config.circle_segments,
                    ),
                    AnalysisType::Healthcare => facility::analyze_district(
                        &baseline,
                        hospitals.get(key).map_or(&[][..], Vec::as_slice),
                        self.config.hospital_radius_km,
                        self.config.circle_segments,
                    ),
                };

                to_result(district, analysis_type, figures, computed_at)
            })
            .collect();

        log::info!(
            "Analyzed {} districts for {analysis_type} coverage",
            results.len()
        );

        Ok(results)
    }
}

fn to_result(
    district: &District,
    analysis_type: AnalysisType,
    figures: DistrictFigures,
    computed_at: DateTime<Utc>,
) -> CoverageResult {
    CoverageResult {
        district_id: district.id.clone(),
        analysis_type,
        coverage_level: CoverageLevel::from_percentage(figures.percentage),
        coverage_percentage: figures.percentage,
        population_covered: figures.population_covered,
        coverage_area: figures.footprint.as_ref().map(multipolygon_to_geojson),
        computed_at,
    }
}

fn group_by_district<T>(items: &[T], key: impl Fn(&T) -> &String) -> BTreeMap<&str, Vec<&T>> {
    let mut grouped: BTreeMap<&str, Vec<&T>> = BTreeMap::new();
    for item in items {
        grouped.entry(key(item).as_str()).or_default().push(item);
    }
    grouped
}

/// Narrows `districts` to `filter` when one is given.
///
/// # Errors
///
/// Returns [`CoverageError::NoDistricts`] if the selection is empty.
pub fn select_districts(
    districts: Vec<District>,
    filter: Option<&str>,
) -> Result<Vec<District>, CoverageError> {
    let selected: Vec<District> = match filter {
        Some(id) => districts.into_iter().filter(|d| d.id == id).collect(),
        None => districts,
    };

    if selected.is_empty() {
        return Err(CoverageError::NoDistricts {
            filter: filter.map(str::to_string),
        });
    }

    Ok(selected)
}
