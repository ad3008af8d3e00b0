#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate extraction and approximate coverage geometry.
//!
//! Infrastructure rows encode their position in several incompatible
//! ways. [`location`] resolves them through a fixed chain of parsers that
//! ends in an explicit [`CoordinateError`] rather than a default position.
//! [`circle`] turns resolved points into planar circle approximations that
//! are concatenated (not unioned) into coverage multi-polygons.

pub mod circle;
pub mod location;
pub mod wkb;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use circle::{
    DEFAULT_CIRCLE_SEGMENTS, EARTH_RADIUS_KM, circle_polygon, combine_polygons,
    multipolygon_to_geojson,
};
pub use location::{LocationSource, extract_coordinates, parse_location_value};

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Builds a coordinate pair, rejecting non-finite or out-of-range
    /// values.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Builds a coordinate pair from `x`/`y` (longitude/latitude) order.
    #[must_use]
    pub fn from_lon_lat(longitude: f64, latitude: f64) -> Option<Self> {
        Self::new(latitude, longitude)
    }
}

/// Errors from coordinate extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    /// None of the supported encodings matched.
    #[error("Unresolvable location: {description}")]
    Unresolvable {
        /// Short description of the value that could not be parsed.
        description: String,
    },
}
