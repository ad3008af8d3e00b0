//! `GeoJSON` rendering of coverage results for map layers.

use std::collections::BTreeMap;

use geojson::{Feature, FeatureCollection, JsonObject};
use infra_map_coverage_models::{CoverageResult, District};
use serde_json::Value;

/// Builds a `FeatureCollection` with one feature per result.
///
/// Results without a coverage footprint are kept with a null geometry so
/// their properties still reach the map legend.
#[must_use]
pub fn coverage_feature_collection(
    results: &[CoverageResult],
    districts: &[District],
) -> FeatureCollection {
    let names: BTreeMap<&str, &str> = districts
        .iter()
        .map(|d| (d.id.as_str(), d.name.as_str()))
        .collect();

    let features = results
        .iter()
        .map(|result| {
            let mut properties = JsonObject::new();
            properties.insert(
                "districtId".to_string(),
                Value::from(result.district_id.clone()),
            );
            properties.insert(
                "districtName".to_string(),
                Value::from(
                    names
                        .get(result.district_id.as_str())
                        .copied()
                        .unwrap_or(result.district_id.as_str()),
                ),
            );
            properties.insert(
                "analysisType".to_string(),
                Value::from(result.analysis_type.as_ref()),
            );
            properties.insert(
                "coverageLevel".to_string(),
                Value::from(result.coverage_level.as_ref()),
            );
            properties.insert(
                "coveragePercentage".to_string(),
                Value::from(result.coverage_percentage),
            );
            properties.insert(
                "populationCovered".to_string(),
                Value::from(result.population_covered),
            );

            Feature {
                bbox: None,
                geometry: result.coverage_area.clone(),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
