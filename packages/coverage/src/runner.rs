//! One end-to-end analysis run: fetch, analyze, persist, audit.

use chrono::{DateTime, Utc};
use infra_map_coverage_models::{
    AggregateMetrics, AnalysisType, AuditAction, AuditEntry, CoverageResult,
};
use infra_map_store::{InfrastructureSource, ResultSink, StoreError};
use serde_json::json;

use crate::engine::{CoverageEngine, InfrastructureSet, select_districts};
use crate::{CoverageError, metrics};

/// Parameters of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Which coverage model to run.
    pub analysis_type: AnalysisType,
    /// Restrict the run to one district id.
    pub district_id: Option<String>,
    /// Identity recorded in the audit trail.
    pub user_id: String,
    /// Stamped on every result and on the audit entry.
    pub requested_at: DateTime<Utc>,
}

/// What a run produced.
///
/// Persistence and audit are best effort: their failures are reported
/// here instead of failing the run.
#[derive(Debug)]
pub struct AnalysisOutcome {
    /// One result per analyzed district, in district order.
    pub results: Vec<CoverageResult>,
    /// Dashboard metrics reduced from `results`.
    pub metrics: AggregateMetrics,
    /// Set when persisting the results failed.
    pub persist_error: Option<StoreError>,
    /// Set when writing the audit entry failed.
    pub audit_error: Option<StoreError>,
}

impl AnalysisOutcome {
    /// Whether results and audit entry were both written.
    #[must_use]
    pub const fn fully_recorded(&self) -> bool {
        self.persist_error.is_none() && self.audit_error.is_none()
    }
}

/// Runs an analysis against `source`, writing output to `sink`.
///
/// Towers are always fetched since they drive infrastructure utilization;
/// schools and hospitals only for the analysis type that needs them. With
/// `persist` false the results are neither persisted nor audited.
///
/// # Errors
///
/// * [`CoverageError::Store`] if fetching districts or infrastructure fails
/// * [`CoverageError::NoDistricts`] if the district filter matches nothing
pub async fn run_analysis(
    engine: &CoverageEngine,
    source: &dyn InfrastructureSource,
    sink: &dyn ResultSink,
    request: &AnalysisRequest,
    persist: bool,
) -> Result<AnalysisOutcome, CoverageError> {
    let filter = request.district_id.as_deref();
    let model = if request.analysis_type.uses_towers() {
        "tower footprint"
    } else {
        "facility connectivity"
    };
    log::info!(
        "Starting {} analysis ({model} model) for {} (user {})",
        request.analysis_type,
        filter.unwrap_or("all districts"),
        request.user_id
    );

    let districts = select_districts(source.list_districts().await?, filter)?;

    let infrastructure = InfrastructureSet {
        towers: source.list_towers(filter).await?,
        schools: if request.analysis_type == AnalysisType::Education {
            source.list_schools(filter).await?
        } else {
            Vec::new()
        },
        hospitals: if request.analysis_type == AnalysisType::Healthcare {
            source.list_hospitals(filter).await?
        } else {
            Vec::new()
        },
    };

    log::debug!(
        "Fetched {} districts, {} towers, {} schools, {} hospitals",
        districts.len(),
        infrastructure.towers.len(),
        infrastructure.schools.len(),
        infrastructure.hospitals.len()
    );

    let results = engine.analyze(
        &districts,
        &infrastructure,
        request.analysis_type,
        request.requested_at,
    )?;
    let metrics = metrics::aggregate_metrics(&results, &districts, &infrastructure.towers);

    let mut outcome = AnalysisOutcome {
        results,
        metrics,
        persist_error: None,
        audit_error: None,
    };

    if !persist {
        log::info!(
            "Finished {} analysis of {} districts (not persisted)",
            request.analysis_type,
            outcome.results.len()
        );
        return Ok(outcome);
    }

    if let Err(e) = sink.persist_coverage_results(&outcome.results).await {
        log::warn!("Failed to persist coverage results: {e}");
        outcome.persist_error = Some(e);
    }

    let entry = audit_entry(request, &outcome);
    if let Err(e) = sink.record_audit(&entry).await {
        log::warn!("Failed to record audit entry {}: {e}", entry.id);
        outcome.audit_error = Some(e);
    }

    log::info!(
        "Finished {} analysis of {} districts, average coverage {}%",
        request.analysis_type,
        outcome.results.len(),
        outcome.metrics.average_coverage
    );

    Ok(outcome)
}

fn audit_entry(request: &AnalysisRequest, outcome: &AnalysisOutcome) -> AuditEntry {
    AuditEntry {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: request.user_id.clone(),
        action: AuditAction::Analysis,
        details: json!({
            "analysisType": request.analysis_type.as_ref(),
            "districtFilter": request.district_id,
            "resultCount": outcome.results.len(),
            "averageCoverage": outcome.metrics.average_coverage,
        }),
        created_at: request.requested_at,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use infra_map_coverage_models::{District, School, Tower, TowerStatus, TowerType};
    use infra_map_store::MemoryStore;
    use serde_json::{Map, Value};

    use super::*;

    fn district(id: &str, name: &str) -> District {
        District {
            id: id.to_string(),
            name: name.to_string(),
            area_km2: Some(1000.0),
            population: Some(400_000),
        }
    }

    fn tower(id: &str, district_id: &str) -> Tower {
        Tower {
            id: id.to_string(),
            district_id: district_id.to_string(),
            status: TowerStatus::Active,
            tower_type: TowerType::Cellular,
            coverage_radius_km: Some(5.0),
            location: Some(Value::from("SRID=4326;POINT(32.58 0.31)")),
            latitude: None,
            longitude: None,
            properties: Map::new(),
        }
    }

    fn school(id: &str, district_id: &str, has_internet: bool) -> School {
        School {
            id: id.to_string(),
            district_id: district_id.to_string(),
            has_internet,
            student_count: Some(100),
            location: None,
            latitude: Some(2.77),
            longitude: Some(32.3),
            properties: Map::new(),
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_districts(vec![district("kla", "Kampala"), district("gul", "Gulu")])
            .with_towers(vec![
                tower("t1", "kla"),
                tower("t2", "kla"),
                tower("t3", "kla"),
                tower("t4", "gul"),
            ])
            .with_schools(vec![school("s1", "gul", true), school("s2", "gul", false)])
    }

    fn request(analysis_type: AnalysisType, district_id: Option<&str>) -> AnalysisRequest {
        AnalysisRequest {
            analysis_type,
            district_id: district_id.map(str::to_string),
            user_id: "planner-7".to_string(),
            requested_at: Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn persists_results_and_audits_the_run() {
        let store = store();
        let engine = CoverageEngine::default();

        let outcome = run_analysis(
            &engine,
            &store,
            &store,
            &request(AnalysisType::Telecom, None),
            true,
        )
        .await
        .unwrap();

        assert!(outcome.fully_recorded());
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].district_id, "kla");
        assert!((outcome.results[0].coverage_percentage - 20.7).abs() < 1e-9);
        assert_eq!(outcome.metrics.districts_analyzed, 2);
        assert!((outcome.metrics.infrastructure_utilization - 100.0).abs() < f64::EPSILON);
        assert_eq!(outcome.metrics.top_districts[0].district_name, "Kampala");

        assert_eq!(store.results().len(), 2);

        let audit = store.audit_entries();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].user_id, "planner-7");
        assert_eq!(audit[0].action, AuditAction::Analysis);
        assert_eq!(audit[0].details["analysisType"], "telecom");
        assert_eq!(audit[0].details["resultCount"], 2);
        assert!(audit[0].details["districtFilter"].is_null());
    }

    #[tokio::test]
    async fn district_filter_narrows_the_run() {
        let store = store();
        let outcome = run_analysis(
            &CoverageEngine::default(),
            &store,
            &store,
            &request(AnalysisType::Education, Some("gul")),
            true,
        )
        .await
        .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].district_id, "gul");
        assert!((outcome.results[0].coverage_percentage - 50.0).abs() < 1e-9);
        assert_eq!(store.audit_entries()[0].details["districtFilter"], "gul");
    }

    #[tokio::test]
    async fn unknown_district_is_an_error() {
        let store = store();
        let err = run_analysis(
            &CoverageEngine::default(),
            &store,
            &store,
            &request(AnalysisType::Telecom, Some("nowhere")),
            true,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            CoverageError::NoDistricts { filter: Some(ref id) } if id == "nowhere"
        ));
        assert!(store.audit_entries().is_empty());
    }

    #[tokio::test]
    async fn rejected_writes_still_return_results() {
        let store = store();
        store.reject_writes(true);

        let outcome = run_analysis(
            &CoverageEngine::default(),
            &store,
            &store,
            &request(AnalysisType::Internet, None),
            true,
        )
        .await
        .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert!(matches!(outcome.persist_error, Some(StoreError::Rejected { .. })));
        assert!(matches!(outcome.audit_error, Some(StoreError::Rejected { .. })));
        assert!(!outcome.fully_recorded());
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let store = store();
        let outcome = run_analysis(
            &CoverageEngine::default(),
            &store,
            &store,
            &request(AnalysisType::Healthcare, None),
            false,
        )
        .await
        .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert!(store.results().is_empty());
        assert!(store.audit_entries().is_empty());
    }
}
