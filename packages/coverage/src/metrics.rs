//! Dashboard metrics reduced from computed coverage results.
//!
//! Nothing here re-runs an analysis; every figure is derived from results
//! that already exist.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use infra_map_coverage_models::{
    AggregateMetrics, ConnectionQuality, CoverageLevel, CoverageResult, District, DistrictRanking,
    TierDistribution, Tower, TowerStatus,
};

use crate::round1;

/// Number of districts kept in the coverage ranking.
pub const TOP_DISTRICT_COUNT: usize = 5;

/// Reduces `results` into dashboard metrics.
///
/// `districts` resolves ranking names; `towers` drives infrastructure
/// utilization. Empty inputs produce zeroed metrics.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_metrics(
    results: &[CoverageResult],
    districts: &[District],
    towers: &[Tower],
) -> AggregateMetrics {
    let average_coverage = if results.is_empty() {
        0.0
    } else {
        round1(results.iter().map(|r| r.coverage_percentage).sum::<f64>() / results.len() as f64)
    };

    AggregateMetrics {
        average_coverage,
        connection_quality: ConnectionQuality::from_average(average_coverage),
        infrastructure_utilization: utilization(towers),
        tier_distribution: tier_distribution(results),
        top_districts: top_districts(results, districts, TOP_DISTRICT_COUNT),
        total_population_covered: results.iter().map(|r| r.population_covered).sum(),
        districts_analyzed: results.len(),
    }
}

/// Active towers as a percentage of all towers, one decimal.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn utilization(towers: &[Tower]) -> f64 {
    if towers.is_empty() {
        return 0.0;
    }
    let active = towers
        .iter()
        .filter(|t| t.status == TowerStatus::Active)
        .count();
    round1(active as f64 / towers.len() as f64 * 100.0)
}

/// Share of results in each tier, rounded to whole percentages.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn tier_distribution(results: &[CoverageResult]) -> TierDistribution {
    if results.is_empty() {
        return TierDistribution::default();
    }

    let total = results.len() as f64;
    let share = |level: CoverageLevel| {
        let count = results.iter().filter(|r| r.coverage_level == level).count();
        (count as f64 / total * 100.0).round() as u32
    };

    TierDistribution {
        high: share(CoverageLevel::High),
        medium: share(CoverageLevel::Medium),
        low: share(CoverageLevel::Low),
    }
}

/// The `limit` best-covered districts, highest percentage first.
///
/// Ties are ordered by district name, then id.
#[must_use]
pub fn top_districts(
    results: &[CoverageResult],
    districts: &[District],
    limit: usize,
) -> Vec<DistrictRanking> {
    let names: BTreeMap<&str, &str> = districts
        .iter()
        .map(|d| (d.id.as_str(), d.name.as_str()))
        .collect();

    let mut ranking: Vec<DistrictRanking> = results
        .iter()
        .map(|r| DistrictRanking {
            district_id: r.district_id.clone(),
            district_name: names
                .get(r.district_id.as_str())
                .map_or_else(|| r.district_id.clone(), |name| (*name).to_string()),
            coverage_percentage: r.coverage_percentage,
            coverage_level: r.coverage_level,
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.coverage_percentage
            .partial_cmp(&a.coverage_percentage)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.district_name.cmp(&b.district_name))
            .then_with(|| a.district_id.cmp(&b.district_id))
    });
    ranking.truncate(limit);
    ranking
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use infra_map_coverage_models::{AnalysisType, TowerType};
    use serde_json::Map;

    use super::*;

    fn result(district_id: &str, percentage: f64, population_covered: u64) -> CoverageResult {
        CoverageResult {
            district_id: district_id.to_string(),
            analysis_type: AnalysisType::Telecom,
            coverage_level: CoverageLevel::from_percentage(percentage),
            coverage_percentage: percentage,
            population_covered,
            coverage_area: None,
            computed_at: Utc::now(),
        }
    }

    fn district(id: &str, name: &str) -> District {
        District {
            id: id.to_string(),
            name: name.to_string(),
            area_km2: None,
            population: None,
        }
    }

    fn tower(status: TowerStatus) -> Tower {
        Tower {
            id: "t".to_string(),
            district_id: "d".to_string(),
            status,
            tower_type: TowerType::Cellular,
            coverage_radius_km: None,
            location: None,
            latitude: None,
            longitude: None,
            properties: Map::new(),
        }
    }

    #[test]
    fn empty_results_produce_zeroed_metrics() {
        let metrics = aggregate_metrics(&[], &[], &[]);
        assert!(metrics.average_coverage.abs() < f64::EPSILON);
        assert_eq!(metrics.connection_quality, ConnectionQuality::Poor);
        assert!(metrics.infrastructure_utilization.abs() < f64::EPSILON);
        assert_eq!(metrics.tier_distribution, TierDistribution::default());
        assert!(metrics.top_districts.is_empty());
        assert_eq!(metrics.districts_analyzed, 0);
    }

    #[test]
    fn averages_and_labels() {
        let results = [result("a", 80.0, 10), result("b", 45.0, 20), result("c", 60.2, 30)];
        let metrics = aggregate_metrics(&results, &[], &[]);
        assert!((metrics.average_coverage - 61.7).abs() < 1e-9);
        assert_eq!(metrics.connection_quality, ConnectionQuality::Good);
        assert_eq!(metrics.total_population_covered, 60);
        assert_eq!(metrics.districts_analyzed, 3);
    }

    #[test]
    fn utilization_counts_active_towers() {
        let towers = [
            tower(TowerStatus::Active),
            tower(TowerStatus::Active),
            tower(TowerStatus::Maintenance),
        ];
        assert!((utilization(&towers) - 66.7).abs() < 1e-9);
    }

    #[test]
    fn tier_distribution_rounds_to_whole_percent() {
        let results = [result("a", 90.0, 0), result("b", 50.0, 0), result("c", 10.0, 0)];
        assert_eq!(
            tier_distribution(&results),
            TierDistribution {
                high: 33,
                medium: 33,
                low: 33
            }
        );
    }

    #[test]
    fn ranks_top_five_descending() {
        let results = [
            result("d1", 10.0, 0),
            result("d2", 95.0, 0),
            result("d3", 40.0, 0),
            result("d4", 95.0, 0),
            result("d5", 70.0, 0),
            result("d6", 5.0, 0),
            result("d7", 55.5, 0),
        ];
        let districts = [district("d2", "Mbarara"), district("d4", "Gulu")];

        let top = top_districts(&results, &districts, TOP_DISTRICT_COUNT);
        let ids: Vec<&str> = top.iter().map(|r| r.district_id.as_str()).collect();
        // Ties at 95.0 order by name: Gulu before Mbarara.
        assert_eq!(ids, vec!["d4", "d2", "d5", "d7", "d3"]);
        assert_eq!(top[0].district_name, "Gulu");
        assert_eq!(top[2].district_name, "d5");
    }
}
