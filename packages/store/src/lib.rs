#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data access and persistence seams for the coverage engine.
//!
//! The engine never talks to a database directly. Callers hand it an
//! [`InfrastructureSource`] to read districts and infrastructure from, and
//! a [`ResultSink`] to persist results and audit entries to. Two
//! implementations ship here:
//!
//! - [`json_dir::JsonDirStore`] reads and writes JSON files in a directory
//! - [`memory::MemoryStore`] keeps everything in memory, for tests and
//!   embedding

pub mod json_dir;
pub mod memory;

use std::path::PathBuf;

use async_trait::async_trait;
use infra_map_coverage_models::{
    AnalysisType, AuditEntry, CoverageResult, District, Hospital, School, Tower,
};
use thiserror::Error;

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failed.
    #[error("JSON error in {path}: {source}")]
    Json {
        /// File that failed to parse or serialize.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A required dataset does not exist.
    #[error("Not found: {what}")]
    NotFound {
        /// Description of the missing dataset.
        what: String,
    },

    /// The store refused the write.
    #[error("Write rejected: {message}")]
    Rejected {
        /// Description of why the write was refused.
        message: String,
    },
}

/// Read access to districts and infrastructure.
///
/// `district_filter` narrows infrastructure to one district; `None`
/// returns everything.
#[async_trait]
pub trait InfrastructureSource: Send + Sync {
    /// Lists all districts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the districts cannot be read.
    async fn list_districts(&self) -> Result<Vec<District>, StoreError>;

    /// Lists telecom towers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the towers cannot be read.
    async fn list_towers(&self, district_filter: Option<&str>) -> Result<Vec<Tower>, StoreError>;

    /// Lists schools.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the schools cannot be read.
    async fn list_schools(&self, district_filter: Option<&str>)
    -> Result<Vec<School>, StoreError>;

    /// Lists hospitals.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the hospitals cannot be read.
    async fn list_hospitals(
        &self,
        district_filter: Option<&str>,
    ) -> Result<Vec<Hospital>, StoreError>;
}

/// Write access for analysis output.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persists results, superseding any earlier result for the same
    /// district and analysis type.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the results cannot be written.
    async fn persist_coverage_results(&self, results: &[CoverageResult]) -> Result<(), StoreError>;

    /// Appends an entry to the audit trail.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the entry cannot be written.
    async fn record_audit(&self, entry: &AuditEntry) -> Result<(), StoreError>;

    /// Lists the current results for an analysis type.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the results cannot be read.
    async fn list_coverage_results(
        &self,
        analysis_type: AnalysisType,
    ) -> Result<Vec<CoverageResult>, StoreError>;
}

/// Whether a record belongs to the filtered district.
#[must_use]
pub(crate) fn in_district(district_id: &str, filter: Option<&str>) -> bool {
    filter.is_none_or(|f| f == district_id)
}

/// Replaces results that share a district and analysis type with `incoming`.
pub(crate) fn supersede(existing: &mut Vec<CoverageResult>, incoming: &[CoverageResult]) {
    existing.retain(|old| {
        !incoming.iter().any(|new| {
            new.district_id == old.district_id && new.analysis_type == old.analysis_type
        })
    });
    existing.extend_from_slice(incoming);
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use infra_map_coverage_models::CoverageLevel;

    use super::*;

    fn result(district_id: &str, analysis_type: AnalysisType, percentage: f64) -> CoverageResult {
        CoverageResult {
            district_id: district_id.to_string(),
            analysis_type,
            coverage_level: CoverageLevel::from_percentage(percentage),
            coverage_percentage: percentage,
            population_covered: 0,
            coverage_area: None,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn supersedes_same_district_and_type_only() {
        let mut existing = vec![
            result("d-1", AnalysisType::Telecom, 10.0),
            result("d-1", AnalysisType::Education, 20.0),
            result("d-2", AnalysisType::Telecom, 30.0),
        ];

        supersede(&mut existing, &[result("d-1", AnalysisType::Telecom, 99.0)]);

        assert_eq!(existing.len(), 3);
        let telecom_d1: Vec<_> = existing
            .iter()
            .filter(|r| r.district_id == "d-1" && r.analysis_type == AnalysisType::Telecom)
            .collect();
        assert_eq!(telecom_d1.len(), 1);
        assert!((telecom_d1[0].coverage_percentage - 99.0).abs() < f64::EPSILON);
    }

    #[test]
    fn district_filter_matches() {
        assert!(in_district("d-1", None));
        assert!(in_district("d-1", Some("d-1")));
        assert!(!in_district("d-1", Some("d-2")));
    }
}
