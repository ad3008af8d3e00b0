#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for district coverage analysis.
//!
//! Reads districts and infrastructure from a JSON data directory (see
//! [`infra_map_store::json_dir`]), runs an analysis, prints a per-district
//! table with the aggregate dashboard metrics, and optionally writes a
//! `GeoJSON` map layer.

use std::path::PathBuf;
use std::str::FromStr as _;

use chrono::Utc;
use clap::{Parser, Subcommand};
use infra_map_coverage::config::EngineConfig;
use infra_map_coverage::export::coverage_feature_collection;
use infra_map_coverage::{AnalysisRequest, CoverageEngine, aggregate_metrics, run_analysis};
use infra_map_coverage_models::{AggregateMetrics, AnalysisType, CoverageResult, District};
use infra_map_geometry::{LocationSource, extract_coordinates};
use infra_map_store::{InfrastructureSource as _, JsonDirStore, ResultSink as _};

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// Estimate telecom, internet, education and healthcare coverage per
/// district.
#[derive(Parser)]
#[command(name = "infra_map")]
#[command(about = "District infrastructure coverage analysis")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run a coverage analysis and persist the results.
    Analyze {
        /// Directory holding districts.json, towers.json, etc.
        #[arg(long, env = "INFRA_MAP_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// Analysis type: telecom, internet, education or healthcare.
        #[arg(long = "type", value_parser = parse_analysis_type)]
        analysis_type: AnalysisType,

        /// Analyze a single district id instead of all districts.
        #[arg(long)]
        district: Option<String>,

        /// User recorded in the audit trail.
        #[arg(long, env = "INFRA_MAP_USER", default_value = "cli")]
        user: String,

        /// Engine config TOML (defaults to the bundled configuration).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the results as a `GeoJSON` `FeatureCollection` to this file.
        #[arg(long)]
        geojson: Option<PathBuf>,

        /// Skip persisting results and the audit entry.
        #[arg(long)]
        no_persist: bool,
    },

    /// Recompute dashboard metrics from persisted results.
    Metrics {
        /// Directory holding districts.json, towers.json, etc.
        #[arg(long, env = "INFRA_MAP_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// Analysis type whose results to reduce.
        #[arg(long = "type", value_parser = parse_analysis_type)]
        analysis_type: AnalysisType,
    },

    /// Resolve a location value to coordinates (`GeoJSON`, WKT, EWKT, hex
    /// WKB or a JSON string of any of those).
    ParseLocation {
        /// The raw location value.
        value: String,
    },
}

fn parse_analysis_type(value: &str) -> Result<AnalysisType, String> {
    AnalysisType::from_str(value).map_err(|_| {
        let known: Vec<&str> = AnalysisType::all().iter().map(|t| t.as_ref()).collect();
        format!("unknown analysis type '{value}' (expected one of: {})", known.join(", "))
    })
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            data_dir,
            analysis_type,
            district,
            user,
            config,
            geojson,
            no_persist,
        } => {
            let config = match config {
                Some(path) => EngineConfig::load(&path)?,
                None => EngineConfig::default(),
            };
            let request = AnalysisRequest {
                analysis_type,
                district_id: district,
                user_id: user,
                requested_at: Utc::now(),
            };
            cmd_analyze(data_dir, config, &request, geojson, !no_persist).await
        }
        Commands::Metrics {
            data_dir,
            analysis_type,
        } => cmd_metrics(data_dir, analysis_type).await,
        Commands::ParseLocation { value } => cmd_parse_location(&value),
    }
}

// ---------------------------------------------------------------------------
// Analyze command
// ---------------------------------------------------------------------------

/// Runs one analysis and prints its results.
async fn cmd_analyze(
    data_dir: PathBuf,
    config: EngineConfig,
    request: &AnalysisRequest,
    geojson: Option<PathBuf>,
    persist: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonDirStore::new(data_dir);
    let engine = CoverageEngine::new(config);

    let outcome = run_analysis(&engine, &store, &store, request, persist).await?;
    let districts = store.list_districts().await?;

    print_results(&outcome.results, &districts);
    println!();
    print_metrics(&outcome.metrics);

    if let Some(ref e) = outcome.persist_error {
        println!();
        println!("Warning: results were not persisted: {e}");
    }
    if let Some(ref e) = outcome.audit_error {
        println!("Warning: audit entry was not recorded: {e}");
    }

    if let Some(path) = geojson {
        let collection = coverage_feature_collection(&outcome.results, &districts);
        tokio::fs::write(&path, serde_json::to_string_pretty(&collection)?).await?;
        println!();
        println!("Wrote {} features to {}", collection.features.len(), path.display());
    }

    Ok(())
}

fn print_results(results: &[CoverageResult], districts: &[District]) {
    println!(
        "{:<12} {:<24} {:>8} {:<8} {:>14}",
        "ID", "District", "Coverage", "Level", "People"
    );
    println!("{}", "-".repeat(70));

    for result in results {
        let name = districts
            .iter()
            .find(|d| d.id == result.district_id)
            .map_or(result.district_id.as_str(), |d| d.name.as_str());
        println!(
            "{:<12} {:<24} {:>7.1}% {:<8} {:>14}",
            result.district_id,
            name,
            result.coverage_percentage,
            result.coverage_level,
            result.population_covered
        );
    }
}

// ---------------------------------------------------------------------------
// Metrics command
// ---------------------------------------------------------------------------

/// Reduces the persisted results for `analysis_type` without re-running
/// the analysis.
async fn cmd_metrics(
    data_dir: PathBuf,
    analysis_type: AnalysisType,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonDirStore::new(data_dir);

    let results = store.list_coverage_results(analysis_type).await?;
    if results.is_empty() {
        println!("No persisted {analysis_type} results in {}", store.root().display());
        return Ok(());
    }

    let districts = store.list_districts().await?;
    let towers = store.list_towers(None).await?;
    log::debug!(
        "Reducing {} persisted {analysis_type} results over {} districts",
        results.len(),
        districts.len()
    );

    print_metrics(&aggregate_metrics(&results, &districts, &towers));
    Ok(())
}

fn print_metrics(metrics: &AggregateMetrics) {
    println!("=== Coverage Metrics ===");
    println!();
    println!("Districts analyzed:         {}", metrics.districts_analyzed);
    println!(
        "Average coverage:           {:.1}% ({})",
        metrics.average_coverage, metrics.connection_quality
    );
    println!(
        "Infrastructure utilization: {:.1}%",
        metrics.infrastructure_utilization
    );
    println!(
        "Population covered:         {}",
        metrics.total_population_covered
    );
    println!(
        "Tiers:                      high {}%, medium {}%, low {}%",
        metrics.tier_distribution.high,
        metrics.tier_distribution.medium,
        metrics.tier_distribution.low
    );

    if !metrics.top_districts.is_empty() {
        println!();
        println!("Top districts:");
        for (rank, district) in metrics.top_districts.iter().enumerate() {
            println!(
                "  {}. {:<24} {:>5.1}% {}",
                rank + 1,
                district.district_name,
                district.coverage_percentage,
                district.coverage_level
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Parse-location command
// ---------------------------------------------------------------------------

/// Resolves a literal location value. Input that parses as JSON is used as
/// JSON; anything else is treated as a plain string.
fn cmd_parse_location(value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = serde_json::from_str::<serde_json::Value>(value)
        .unwrap_or_else(|_| serde_json::Value::from(value));

    let source = LocationSource {
        location: Some(&parsed),
        ..LocationSource::default()
    };
    let coordinates = extract_coordinates(&source)?;

    println!(
        "latitude={} longitude={}",
        coordinates.latitude, coordinates.longitude
    );
    Ok(())
}
