#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! District, infrastructure and coverage result types.
//!
//! Records mirror the rows served by the hosted infrastructure store:
//! districts, telecom towers, schools and hospitals. Positions arrive in
//! whatever shape the store produced (`GeoJSON`, WKT, EWKB hex, flat
//! lat/lon columns), so every infrastructure record keeps its raw
//! `location` value alongside any unrecognized columns in `properties`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumString};

/// Percentage at or above which a district is [`CoverageLevel::High`].
pub const HIGH_COVERAGE_THRESHOLD: f64 = 70.0;

/// Percentage at or above which a district is [`CoverageLevel::Medium`].
pub const MEDIUM_COVERAGE_THRESHOLD: f64 = 40.0;

/// An administrative district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    /// Opaque district identifier.
    pub id: String,
    /// Human-readable district name (e.g. "Kampala").
    pub name: String,
    /// Land area in square kilometers.
    #[serde(default, alias = "area", alias = "area_sq_km")]
    pub area_km2: Option<f64>,
    /// Resident population.
    #[serde(default)]
    pub population: Option<u64>,
}

/// Operational status of a telecom tower.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TowerStatus {
    /// Tower is in service.
    Active,
    /// Tower is partially in service while being maintained.
    Maintenance,
    /// Tower is out of service.
    Inactive,
}

impl TowerStatus {
    /// Multiplier applied to a tower's coverage area when weighting by
    /// status.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Active => 1.0,
            Self::Maintenance => 0.5,
            Self::Inactive => 0.0,
        }
    }
}

/// Transmission technology of a telecom tower.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TowerType {
    /// Cellular base station.
    Cellular,
    /// Microwave backhaul link.
    Microwave,
    /// Satellite ground station.
    Satellite,
    /// Fiber distribution node.
    FiberNode,
}

impl TowerType {
    /// Multiplier applied to a tower's coverage area when weighting by type.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Cellular => 1.0,
            Self::Microwave => 0.8,
            Self::Satellite => 1.5,
            Self::FiberNode => 0.5,
        }
    }
}

/// A telecom tower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    /// Opaque tower identifier.
    pub id: String,
    /// District the tower belongs to.
    pub district_id: String,
    /// Operational status.
    pub status: TowerStatus,
    /// Transmission technology.
    #[serde(alias = "type")]
    pub tower_type: TowerType,
    /// Effective service radius in kilometers. Defaults to 5 km when absent.
    #[serde(default, alias = "coverage_radius")]
    pub coverage_radius_km: Option<f64>,
    /// Raw positional value in any supported encoding.
    #[serde(default)]
    pub location: Option<Value>,
    /// Flat latitude column, when the store provides one.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Flat longitude column, when the store provides one.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Any other columns the store returned.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// A school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    /// Opaque school identifier.
    pub id: String,
    /// District the school belongs to.
    pub district_id: String,
    /// Whether the school has an internet connection.
    #[serde(default)]
    pub has_internet: bool,
    /// Enrolled students.
    #[serde(default, alias = "students")]
    pub student_count: Option<u64>,
    /// Raw positional value in any supported encoding.
    #[serde(default)]
    pub location: Option<Value>,
    /// Flat latitude column, when the store provides one.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Flat longitude column, when the store provides one.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Any other columns the store returned.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// A hospital or health facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    /// Opaque hospital identifier.
    pub id: String,
    /// District the hospital belongs to.
    pub district_id: String,
    /// Whether the hospital has an internet connection.
    #[serde(default)]
    pub has_internet: bool,
    /// Inpatient bed capacity.
    #[serde(default, alias = "beds")]
    pub bed_count: Option<u64>,
    /// Raw positional value in any supported encoding.
    #[serde(default)]
    pub location: Option<Value>,
    /// Flat latitude column, when the store provides one.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Flat longitude column, when the store provides one.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Any other columns the store returned.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Which coverage question an analysis run answers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AnalysisType {
    /// Mobile network coverage from tower footprints.
    Telecom,
    /// Internet reachability from tower footprints.
    Internet,
    /// Share of schools and students with internet access.
    Education,
    /// Share of hospitals and beds with internet access.
    Healthcare,
}

impl AnalysisType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Telecom,
            Self::Internet,
            Self::Education,
            Self::Healthcare,
        ]
    }

    /// Whether this analysis is driven by tower footprints rather than
    /// facility connectivity ratios.
    #[must_use]
    pub const fn uses_towers(self) -> bool {
        matches!(self, Self::Telecom | Self::Internet)
    }
}

/// Coverage tier of a district.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum CoverageLevel {
    /// At least 70% covered.
    High,
    /// At least 40% covered.
    Medium,
    /// Below 40% covered.
    Low,
}

impl CoverageLevel {
    /// Classifies a coverage percentage into a tier.
    ///
    /// `NaN` classifies as [`Self::Low`].
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= HIGH_COVERAGE_THRESHOLD {
            Self::High
        } else if percentage >= MEDIUM_COVERAGE_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Coverage estimate for one district from one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    /// District the estimate applies to.
    pub district_id: String,
    /// Analysis that produced the estimate.
    pub analysis_type: AnalysisType,
    /// Coverage tier.
    pub coverage_level: CoverageLevel,
    /// Covered share of the district, 0-100 with one decimal.
    pub coverage_percentage: f64,
    /// Estimated residents covered.
    pub population_covered: u64,
    /// Approximate coverage footprint as a `GeoJSON` `MultiPolygon`.
    pub coverage_area: Option<geojson::Geometry>,
    /// When the analysis ran.
    pub computed_at: DateTime<Utc>,
}

/// Action recorded in the audit trail.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    /// A coverage analysis run.
    Analysis,
}

/// An audit trail entry attributing an action to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: String,
    /// Identity of the user who triggered the action.
    pub user_id: String,
    /// What happened.
    pub action: AuditAction,
    /// Free-form structured details.
    pub details: Value,
    /// When the action happened.
    pub created_at: DateTime<Utc>,
}

/// Overall connection quality label derived from average coverage.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ConnectionQuality {
    /// Average coverage of at least 75%.
    Excellent,
    /// Average coverage of at least 60%.
    Good,
    /// Average coverage of at least 40%.
    Fair,
    /// Anything lower.
    Poor,
}

impl ConnectionQuality {
    /// Labels an average coverage percentage.
    #[must_use]
    pub fn from_average(average: f64) -> Self {
        if average >= 75.0 {
            Self::Excellent
        } else if average >= 60.0 {
            Self::Good
        } else if average >= 40.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// Share of analyzed districts in each tier, as whole-number percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDistribution {
    /// Percent of districts rated [`CoverageLevel::High`].
    pub high: u32,
    /// Percent of districts rated [`CoverageLevel::Medium`].
    pub medium: u32,
    /// Percent of districts rated [`CoverageLevel::Low`].
    pub low: u32,
}

/// A district's position in the coverage ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictRanking {
    /// District identifier.
    pub district_id: String,
    /// District name, or the identifier when the district is unknown.
    pub district_name: String,
    /// Covered share of the district.
    pub coverage_percentage: f64,
    /// Coverage tier.
    pub coverage_level: CoverageLevel,
}

/// Dashboard metrics reduced from a set of coverage results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetrics {
    /// Mean coverage percentage, one decimal.
    pub average_coverage: f64,
    /// Label for the average coverage.
    pub connection_quality: ConnectionQuality,
    /// Active towers as a percentage of all towers, one decimal.
    pub infrastructure_utilization: f64,
    /// Tier shares.
    pub tier_distribution: TierDistribution,
    /// Best-covered districts, highest first (at most five).
    pub top_districts: Vec<DistrictRanking>,
    /// Sum of covered population across districts.
    pub total_population_covered: u64,
    /// Number of results reduced.
    pub districts_analyzed: usize,
}
