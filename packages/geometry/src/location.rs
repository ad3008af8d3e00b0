//! Ordered parser chain for heterogeneous position encodings.
//!
//! A record's position is resolved by trying, in order:
//!
//! 1. `GeoJSON` Point (bare geometry or a Feature wrapping one)
//! 2. an object with `x`/`y` or `lon`/`lat` style fields
//! 3. EWKT text (`SRID=4326;POINT(lon lat)`)
//! 4. WKT text (`POINT(lon lat)`)
//! 5. hex-encoded (E)WKB
//! 6. a JSON-encoded string holding any of the above
//! 7. the record's flat `latitude`/`longitude` columns
//! 8. a heuristic scan of the record's remaining properties
//!
//! The first parser that yields a valid WGS84 position wins. When none
//! does, [`extract_coordinates`] returns [`CoordinateError::Unresolvable`].

use std::sync::LazyLock;

use geojson::GeoJson;
use regex::Regex;
use serde_json::{Map, Value};

use crate::wkb::{self, WGS84_SRID};
use crate::{CoordinateError, Coordinates};

const NUMBER: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:E[-+]?\d+)?";

static WKT_POINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^POINT\s*(?:ZM|Z|M)?\s*\(\s*({NUMBER})\s+({NUMBER})(?:\s+{NUMBER})*\s*\)$"
    ))
    .expect("valid regex")
});

static EWKT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SRID=(\d+)\s*;\s*(.+)$").expect("valid regex"));

const LONGITUDE_KEYS: &[&str] = &["lon", "lng", "long", "longitude"];
const LATITUDE_KEYS: &[&str] = &["lat", "latitude"];

/// Shortest hex string that can hold a WKB point (21 bytes).
const MIN_WKB_HEX_LEN: usize = 42;

type ValueParser = fn(&Value) -> Option<Coordinates>;

/// Parsers applied directly to a location value, in priority order.
const VALUE_PARSERS: &[(&str, ValueParser)] = &[
    ("geojson", parse_geojson_point),
    ("xy_object", parse_xy_object),
    ("ewkt", parse_ewkt),
    ("wkt", parse_wkt),
    ("wkb_hex", parse_wkb_hex),
];

/// The positional fields of one infrastructure record.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationSource<'a> {
    /// Raw `location` value in any supported encoding.
    pub location: Option<&'a Value>,
    /// Flat latitude column.
    pub latitude: Option<f64>,
    /// Flat longitude column.
    pub longitude: Option<f64>,
    /// Remaining record columns, used for the heuristic scan.
    pub properties: Option<&'a Map<String, Value>>,
}

/// Resolves a record's position through the full parser chain.
///
/// # Errors
///
/// Returns [`CoordinateError::Unresolvable`] if no encoding matches.
pub fn extract_coordinates(source: &LocationSource<'_>) -> Result<Coordinates, CoordinateError> {
    if let Some(value) = source.location
        && let Some(coords) = parse_location_value(value)
    {
        return Ok(coords);
    }

    if let (Some(latitude), Some(longitude)) = (source.latitude, source.longitude)
        && let Some(coords) = Coordinates::new(latitude, longitude)
    {
        return Ok(coords);
    }

    if let Some(properties) = source.properties
        && let Some(coords) = scan_properties(properties)
    {
        return Ok(coords);
    }

    Err(CoordinateError::Unresolvable {
        description: describe(source),
    })
}

/// Resolves a single location value (steps 1-6 of the chain).
#[must_use]
pub fn parse_location_value(value: &Value) -> Option<Coordinates> {
    apply_value_parsers(value).or_else(|| parse_json_string(value))
}

fn apply_value_parsers(value: &Value) -> Option<Coordinates> {
    VALUE_PARSERS.iter().find_map(|(name, parser)| {
        let coords = parser(value)?;
        log::trace!("Resolved location via {name} parser");
        Some(coords)
    })
}

fn parse_geojson_point(value: &Value) -> Option<Coordinates> {
    if !value.as_object()?.contains_key("type") {
        return None;
    }

    let geometry = match GeoJson::from_json_value(value.clone()).ok()? {
        GeoJson::Geometry(geometry) => geometry,
        GeoJson::Feature(feature) => feature.geometry?,
        GeoJson::FeatureCollection(_) => return None,
    };

    match geometry.value {
        geojson::Value::Point(position) if position.len() >= 2 => {
            Coordinates::from_lon_lat(position[0], position[1])
        }
        _ => None,
    }
}

fn parse_xy_object(value: &Value) -> Option<Coordinates> {
    let object = value.as_object()?;

    if let (Some(x), Some(y)) = (
        object.get("x").and_then(number),
        object.get("y").and_then(number),
    ) {
        return Coordinates::from_lon_lat(x, y);
    }

    let longitude = first_number(object, LONGITUDE_KEYS)?;
    let latitude = first_number(object, LATITUDE_KEYS)?;
    Coordinates::new(latitude, longitude)
}

fn parse_ewkt(value: &Value) -> Option<Coordinates> {
    let text = value.as_str()?.trim().to_ascii_uppercase();
    let caps = EWKT_RE.captures(&text)?;

    let srid: u32 = caps.get(1)?.as_str().parse().ok()?;
    if srid != WGS84_SRID {
        log::debug!("Ignoring EWKT with unsupported SRID {srid}");
        return None;
    }

    parse_wkt_text(caps.get(2)?.as_str())
}

fn parse_wkt(value: &Value) -> Option<Coordinates> {
    parse_wkt_text(&value.as_str()?.trim().to_ascii_uppercase())
}

/// Parses upper-cased `POINT(x y)` text.
fn parse_wkt_text(text: &str) -> Option<Coordinates> {
    let caps = WKT_POINT_RE.captures(text.trim())?;
    let x: f64 = caps.get(1)?.as_str().parse().ok()?;
    let y: f64 = caps.get(2)?.as_str().parse().ok()?;
    Coordinates::from_lon_lat(x, y)
}

fn parse_wkb_hex(value: &Value) -> Option<Coordinates> {
    let text = value.as_str()?.trim();
    if text.len() < MIN_WKB_HEX_LEN || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    match wkb::decode_hex_point(text) {
        Ok(coords) => Some(coords),
        Err(e) => {
            log::debug!("Failed to decode WKB location: {e}");
            None
        }
    }
}

/// Decodes a JSON-encoded string once and retries the value parsers.
fn parse_json_string(value: &Value) -> Option<Coordinates> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    let decoded: Value = serde_json::from_str(text).ok()?;
    apply_value_parsers(&decoded)
}

/// Scans record properties for a lat/lon pair, then for any property
/// holding a recognizable location value.
fn scan_properties(properties: &Map<String, Value>) -> Option<Coordinates> {
    let mut latitude = None;
    let mut longitude = None;

    for (key, value) in properties {
        let key = key.to_ascii_lowercase();
        if latitude.is_none() && has_token(&key, LATITUDE_KEYS) {
            latitude = number(value).filter(|v| (-90.0..=90.0).contains(v));
        } else if longitude.is_none() && has_token(&key, LONGITUDE_KEYS) {
            longitude = number(value).filter(|v| (-180.0..=180.0).contains(v));
        }
    }

    if let (Some(latitude), Some(longitude)) = (latitude, longitude)
        && let Some(coords) = Coordinates::new(latitude, longitude)
    {
        return Some(coords);
    }

    properties.values().find_map(parse_location_value)
}

/// Whether a `_`/`-` separated column name has one of `tokens` as a word.
fn has_token(key: &str, tokens: &[&str]) -> bool {
    key.split(['_', '-']).any(|part| tokens.contains(&part))
}

fn number(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str()?.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn first_number(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| object.get(*key).and_then(number))
}

fn describe(source: &LocationSource<'_>) -> String {
    const MAX_LEN: usize = 64;

    let mut tried = Vec::new();

    if let Some(value) = source.location {
        let mut text = value.to_string();
        if text.len() > MAX_LEN {
            let cut = (0..=MAX_LEN)
                .rev()
                .find(|i| text.is_char_boundary(*i))
                .unwrap_or(0);
            text.truncate(cut);
            text.push_str("...");
        }
        tried.push(format!("unrecognized location {text}"));
    }

    match (source.latitude, source.longitude) {
        (None, None) => {}
        (latitude, longitude) => tried.push(format!(
            "invalid latitude/longitude ({}, {})",
            latitude.map_or_else(|| "missing".to_string(), |v| v.to_string()),
            longitude.map_or_else(|| "missing".to_string(), |v| v.to_string()),
        )),
    }

    if let Some(properties) = source.properties
        && !properties.is_empty()
    {
        tried.push(format!("no position in {} properties", properties.len()));
    }

    if tried.is_empty() {
        "no location fields".to_string()
    } else {
        tried.join("; ")
    }
}
