#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! District coverage analysis engine.
//!
//! Given districts and the infrastructure points inside them, the engine
//! estimates what share of each district (and of its population) is
//! served, classifies it into a [`CoverageLevel`] tier, and synthesizes an
//! approximate coverage footprint.
//!
//! Two models back the four analysis types:
//!
//! - [`telecom`] sums tower footprint areas, discounts them with a scalar
//!   overlap factor and compares the result to the district area.
//! - [`facility`] averages the share of connected schools/hospitals with
//!   the share of students/beds they hold.
//!
//! The engine itself is pure and synchronous. [`runner`] wires it to the
//! store traits for fetching inputs, persisting results and writing the
//! audit trail.
//!
//! [`CoverageLevel`]: infra_map_coverage_models::CoverageLevel

pub mod config;
pub mod engine;
pub mod export;
pub mod facility;
pub mod metrics;
pub mod runner;
pub mod telecom;

mod located;

use infra_map_store::StoreError;
use thiserror::Error;

pub use config::{EngineConfig, OverlapModel};
pub use engine::{CoverageEngine, InfrastructureSet};
pub use metrics::aggregate_metrics;
pub use runner::{AnalysisOutcome, AnalysisRequest, run_analysis};

/// Errors that can occur during coverage analysis.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// The district filter matched nothing, so there is nothing to analyze.
    #[error("No districts to analyze (filter: {})", .filter.as_deref().unwrap_or("all districts"))]
    NoDistricts {
        /// The district id that was requested, if any.
        filter: Option<String>,
    },

    /// Fetching input data failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The engine configuration is invalid.
    #[error("Config error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Rounds to one decimal place.
#[must_use]
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Covered population for a percentage of `population`, never exceeding it.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn population_share(population: u64, percentage: f64) -> u64 {
    let covered = (population as f64 * percentage / 100.0).round();
    if covered.is_nan() || covered <= 0.0 {
        0
    } else {
        (covered as u64).min(population)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_one_decimal() {
        assert!((round1(20.58) - 20.6).abs() < 1e-9);
        assert!((round1(49.99) - 50.0).abs() < 1e-9);
        assert!((round1(0.04) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn population_share_is_bounded() {
        assert_eq!(population_share(400_000, 20.6), 82_400);
        assert_eq!(population_share(1_000, 100.0), 1_000);
        assert_eq!(population_share(1_000, 150.0), 1_000);
        assert_eq!(population_share(1_000, -3.0), 0);
        assert_eq!(population_share(1_000, f64::NAN), 0);
    }

    #[test]
    fn no_districts_message_names_filter() {
        let err = CoverageError::NoDistricts {
            filter: Some("d-404".to_string()),
        };
        assert_eq!(err.to_string(), "No districts to analyze (filter: d-404)");

        let err = CoverageError::NoDistricts { filter: None };
        assert_eq!(
            err.to_string(),
            "No districts to analyze (filter: all districts)"
        );
    }
}
