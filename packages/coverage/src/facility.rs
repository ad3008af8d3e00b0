//! Facility connectivity coverage model (education and healthcare).
//!
//! Coverage is the mean of two ratios: the share of facilities with
//! internet, and the share of capacity (students or beds) those facilities
//! hold. Internet-enabled facilities get a fixed-radius footprint.

use infra_map_coverage_models::{Hospital, School};
use infra_map_geometry::{circle_polygon, combine_polygons};

use crate::engine::{DistrictBaseline, DistrictFigures};
use crate::located::Located;
use crate::{population_share, round1};

/// A facility whose connectivity contributes to district coverage.
pub(crate) trait Facility: Located {
    fn has_internet(&self) -> bool;

    /// Students for schools, beds for hospitals.
    fn capacity(&self) -> Option<u64>;
}

impl Facility for School {
    fn has_internet(&self) -> bool {
        self.has_internet
    }

    fn capacity(&self) -> Option<u64> {
        self.student_count
    }
}

impl Facility for Hospital {
    fn has_internet(&self) -> bool {
        self.has_internet
    }

    fn capacity(&self) -> Option<u64> {
        self.bed_count
    }
}

/// Connectivity counts for one district's facilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FacilityTally {
    /// All facilities in the district.
    pub total: usize,
    /// Facilities with internet.
    pub connected: usize,
    /// Summed capacity of all facilities that report one.
    pub total_capacity: u64,
    /// Summed capacity of connected facilities that report one.
    pub connected_capacity: u64,
}

impl FacilityTally {
    /// Mean of the facility ratio and the capacity ratio, as a percentage.
    ///
    /// When no facility reports a capacity, the capacity ratio equals the
    /// facility ratio.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        let facility_ratio = self.connected as f64 / self.total as f64;
        let capacity_ratio = if self.total_capacity == 0 {
            facility_ratio
        } else {
            self.connected_capacity as f64 / self.total_capacity as f64
        };

        (facility_ratio + capacity_ratio) / 2.0 * 100.0
    }
}

fn tally<F: Facility>(facilities: &[&F]) -> FacilityTally {
    facilities
        .iter()
        .fold(FacilityTally::default(), |mut acc, facility| {
            let capacity = facility.capacity().unwrap_or(0);
            acc.total += 1;
            acc.total_capacity = acc.total_capacity.saturating_add(capacity);
            if facility.has_internet() {
                acc.connected += 1;
                acc.connected_capacity = acc.connected_capacity.saturating_add(capacity);
            }
            acc
        })
}

pub(crate) fn analyze_district<F: Facility>(
    baseline: &DistrictBaseline,
    facilities: &[&F],
    radius_km: f64,
    segments: usize,
) -> DistrictFigures {
    if facilities.is_empty() {
        return DistrictFigures::empty();
    }

    let counts = tally(facilities);
    let percentage = round1(counts.percentage().clamp(0.0, 100.0));

    log::debug!(
        "District {}: {}/{} facilities connected, capacity {}/{}, {percentage}%",
        baseline.district_id,
        counts.connected,
        counts.total,
        counts.connected_capacity,
        counts.total_capacity,
    );

    let footprint = combine_polygons(
        facilities
            .iter()
            .filter(|facility| facility.has_internet())
            .filter_map(|facility| facility.coordinates())
            .map(|center| circle_polygon(center, radius_km, segments)),
    );

    DistrictFigures {
        percentage,
        population_covered: population_share(baseline.population(), percentage),
        footprint,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};

    use super::*;

    fn school(id: usize, has_internet: bool, students: Option<u64>) -> School {
        School {
            id: format!("s-{id}"),
            district_id: "d-1".to_string(),
            has_internet,
            student_count: students,
            location: None,
            latitude: Some(0.31),
            longitude: Some(32.58),
            properties: Map::new(),
        }
    }

    fn baseline(population: Option<u64>) -> DistrictBaseline {
        DistrictBaseline {
            district_id: "d-1".to_string(),
            area_km2: Some(1000.0),
            known_population: population,
        }
    }

    #[test]
    fn averages_school_and_student_ratios() {
        // 4 of 10 schools connected, holding 600 of 1000 students.
        let offline_students = [67, 67, 67, 67, 66, 66];
        let schools: Vec<School> = (0..4)
            .map(|i| school(i, true, Some(150)))
            .chain(
                offline_students
                    .iter()
                    .enumerate()
                    .map(|(i, students)| school(i + 4, false, Some(*students))),
            )
            .collect();
        let refs: Vec<&School> = schools.iter().collect();

        let counts = tally(&refs);
        assert_eq!(counts.total, 10);
        assert_eq!(counts.connected, 4);
        assert_eq!(counts.total_capacity, 1000);
        assert_eq!(counts.connected_capacity, 600);
        assert!((counts.percentage() - 50.0).abs() < 1e-9);

        let figures = analyze_district(&baseline(Some(200_000)), &refs, 2.0, 32);
        assert!((figures.percentage - 50.0).abs() < 1e-9);
        assert_eq!(figures.population_covered, 100_000);
        assert_eq!(figures.footprint.unwrap().0.len(), 4);
    }

    #[test]
    fn missing_capacity_falls_back_to_facility_ratio() {
        let counts = FacilityTally {
            total: 4,
            connected: 1,
            total_capacity: 0,
            connected_capacity: 0,
        };
        assert!((counts.percentage() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn huge_capacities_saturate_instead_of_overflowing() {
        let online = school(0, true, Some(u64::MAX));
        let offline = school(1, false, Some(u64::MAX));

        let counts = tally(&[&online, &offline]);
        assert_eq!(counts.total_capacity, u64::MAX);
        assert_eq!(counts.connected_capacity, u64::MAX);
        // Half the schools, and (saturated) all of the capacity.
        assert!((counts.percentage() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn no_facilities_yield_zero() {
        let figures = analyze_district::<School>(&baseline(Some(1_000)), &[], 2.0, 32);
        assert!(figures.percentage.abs() < f64::EPSILON);
        assert!(figures.footprint.is_none());
    }

    #[test]
    fn unlocated_facilities_count_but_draw_nothing() {
        let mut connected = school(0, true, Some(100));
        connected.latitude = None;
        connected.longitude = None;
        let offline = school(1, false, Some(100));

        let figures = analyze_district(&baseline(Some(1_000)), &[&connected, &offline], 2.0, 32);
        assert!((figures.percentage - 50.0).abs() < 1e-9);
        assert!(figures.footprint.is_none());
    }

    #[test]
    fn hospitals_weight_by_beds() {
        let hospital = |has_internet, beds| Hospital {
            id: "h".to_string(),
            district_id: "d-1".to_string(),
            has_internet,
            bed_count: Some(beds),
            location: Some(Value::from("SRID=4326;POINT(32.58 0.31)")),
            latitude: None,
            longitude: None,
            properties: Map::new(),
        };
        let big = hospital(true, 300);
        let small = hospital(false, 100);

        let figures = analyze_district(&baseline(Some(10_000)), &[&big, &small], 5.0, 16);
        // (50% + 75%) / 2
        assert!((figures.percentage - 62.5).abs() < 1e-9);
        assert_eq!(figures.population_covered, 6_250);
        assert_eq!(figures.footprint.unwrap().0.len(), 1);
    }
}
