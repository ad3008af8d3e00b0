//! Planar circle approximations for coverage footprints.
//!
//! Circles are projected with an equirectangular approximation around
//! their center, which is adequate at district scale near the equator but
//! not geodesically exact. Multiple circles are concatenated into one
//! [`MultiPolygon`]; overlapping footprints are not dissolved.

use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::Coordinates;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Vertices per circle unless configured otherwise.
pub const DEFAULT_CIRCLE_SEGMENTS: usize = 32;

const MIN_CIRCLE_SEGMENTS: usize = 3;

/// Builds a closed polygon of `segments` vertices approximating a circle
/// of `radius_km` around `center`.
///
/// Negative or `NaN` radii collapse to the center point. Fewer than three
/// segments are raised to three.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn circle_polygon(center: Coordinates, radius_km: f64, segments: usize) -> Polygon<f64> {
    let segments = segments.max(MIN_CIRCLE_SEGMENTS);
    let radius_km = radius_km.max(0.0);
    let lat_scale = center.latitude.to_radians().cos().abs().max(f64::EPSILON);

    let mut ring: Vec<Coord<f64>> = (0..segments)
        .map(|i| {
            let theta = std::f64::consts::TAU * (i as f64) / (segments as f64);
            let dx = radius_km * theta.cos();
            let dy = radius_km * theta.sin();

            let delta_lat = (dy / EARTH_RADIUS_KM).to_degrees();
            let delta_lon = (dx / (EARTH_RADIUS_KM * lat_scale)).to_degrees();

            Coord {
                x: center.longitude + delta_lon,
                y: center.latitude + delta_lat,
            }
        })
        .collect();

    ring.push(ring[0]);

    Polygon::new(LineString::new(ring), vec![])
}

/// Concatenates polygons into a single [`MultiPolygon`].
///
/// Returns `None` when there are no polygons.
#[must_use]
pub fn combine_polygons<I>(polygons: I) -> Option<MultiPolygon<f64>>
where
    I: IntoIterator<Item = Polygon<f64>>,
{
    let polygons: Vec<Polygon<f64>> = polygons.into_iter().collect();
    if polygons.is_empty() {
        None
    } else {
        Some(MultiPolygon::new(polygons))
    }
}

/// Converts a [`MultiPolygon`] into a `GeoJSON` geometry.
#[must_use]
pub fn multipolygon_to_geojson(multi_polygon: &MultiPolygon<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(multi_polygon))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kampala() -> Coordinates {
        Coordinates::new(0.31, 32.58).unwrap()
    }

    #[test]
    fn ring_is_closed_with_expected_vertex_count() {
        let polygon = circle_polygon(kampala(), 5.0, DEFAULT_CIRCLE_SEGMENTS);
        let ring = polygon.exterior();
        assert_eq!(ring.0.len(), DEFAULT_CIRCLE_SEGMENTS + 1);
        assert_eq!(ring.0.first(), ring.0.last());
    }

    #[test]
    fn zero_radius_collapses_to_center() {
        let center = kampala();
        let polygon = circle_polygon(center, 0.0, 16);
        for coord in polygon.exterior().coords() {
            assert!((coord.x - center.longitude).abs() < 1e-12);
            assert!((coord.y - center.latitude).abs() < 1e-12);
        }
    }

    #[test]
    fn first_vertex_is_due_east() {
        let center = kampala();
        let polygon = circle_polygon(center, 10.0, 32);
        let first = polygon.exterior().0[0];

        let expected_dlon = (10.0 / (EARTH_RADIUS_KM * 0.31_f64.to_radians().cos())).to_degrees();
        assert!((first.x - (center.longitude + expected_dlon)).abs() < 1e-12);
        assert!((first.y - center.latitude).abs() < 1e-12);
    }

    #[test]
    fn latitude_extent_matches_radius() {
        let center = kampala();
        let polygon = circle_polygon(center, 5.0, 4);
        // Vertex 1 sits at 90 degrees (due north).
        let north = polygon.exterior().0[1];
        let expected_dlat = (5.0 / EARTH_RADIUS_KM).to_degrees();
        assert!((north.y - center.latitude - expected_dlat).abs() < 1e-12);
    }

    #[test]
    fn raises_degenerate_segment_counts() {
        let polygon = circle_polygon(kampala(), 1.0, 1);
        assert_eq!(polygon.exterior().0.len(), 4);
    }

    #[test]
    fn combines_by_concatenation() {
        let a = circle_polygon(kampala(), 5.0, 8);
        let b = circle_polygon(kampala(), 5.0, 8);
        let combined = combine_polygons([a, b]).unwrap();
        // Identical circles stay as two members; nothing is dissolved.
        assert_eq!(combined.0.len(), 2);
        assert!(combine_polygons(Vec::new()).is_none());
    }

    #[test]
    fn converts_to_geojson_multipolygon() {
        let combined = combine_polygons([circle_polygon(kampala(), 2.0, 8)]).unwrap();
        let geometry = multipolygon_to_geojson(&combined);
        match geometry.value {
            geojson::Value::MultiPolygon(polygons) => {
                assert_eq!(polygons.len(), 1);
                assert_eq!(polygons[0][0].len(), 9);
            }
            other => panic!("Expected MultiPolygon, got {other:?}"),
        }
    }
}
