//! Minimal (E)WKB point decoder.
//!
//! `PostGIS` returns `geography(Point)` columns as hex-encoded EWKB when
//! they are selected without `ST_AsGeoJSON`. Only points are decoded; any
//! other geometry type is an error.

use thiserror::Error;

use crate::Coordinates;

/// SRID accepted in EWKB payloads.
pub const WGS84_SRID: u32 = 4326;

const EWKB_Z_FLAG: u32 = 0x8000_0000;
const EWKB_M_FLAG: u32 = 0x4000_0000;
const EWKB_SRID_FLAG: u32 = 0x2000_0000;
const WKB_POINT: u32 = 1;

/// Errors from decoding a WKB point.
#[derive(Debug, Error)]
pub enum WkbError {
    /// The hex text was malformed.
    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// The payload ended before the point was complete.
    #[error("WKB payload truncated at byte {offset}")]
    Truncated {
        /// Offset at which more bytes were expected.
        offset: usize,
    },

    /// The first byte was neither `0` (big endian) nor `1` (little endian).
    #[error("Unknown WKB byte order marker {0:#04x}")]
    ByteOrder(u8),

    /// The geometry is not a point.
    #[error("WKB geometry type {0:#010x} is not a point")]
    NotAPoint(u32),

    /// The embedded SRID is not WGS84.
    #[error("Unsupported SRID {0}")]
    UnsupportedSrid(u32),

    /// The point is empty (NaN) or outside WGS84 bounds.
    #[error("WKB point is empty or out of range")]
    InvalidPosition,
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
    little_endian: bool,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], WkbError> {
        let end = self.offset + N;
        let chunk = self
            .bytes
            .get(self.offset..end)
            .ok_or(WkbError::Truncated {
                offset: self.offset,
            })?;
        let mut out = [0_u8; N];
        out.copy_from_slice(chunk);
        self.offset = end;
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32, WkbError> {
        let raw = self.take::<4>()?;
        Ok(if self.little_endian {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        })
    }

    fn f64(&mut self) -> Result<f64, WkbError> {
        let raw = self.take::<8>()?;
        Ok(if self.little_endian {
            f64::from_le_bytes(raw)
        } else {
            f64::from_be_bytes(raw)
        })
    }
}

/// Decodes a WKB or EWKB point.
///
/// Z and M ordinates, when flagged, are ignored.
///
/// # Errors
///
/// Returns [`WkbError`] if the payload is truncated, not a point, carries
/// a non-WGS84 SRID, or holds an out-of-range position.
pub fn decode_point(bytes: &[u8]) -> Result<Coordinates, WkbError> {
    let order = *bytes.first().ok_or(WkbError::Truncated { offset: 0 })?;
    let little_endian = match order {
        0 => false,
        1 => true,
        other => return Err(WkbError::ByteOrder(other)),
    };

    let mut reader = Reader {
        bytes,
        offset: 1,
        little_endian,
    };

    let raw_type = reader.u32()?;
    if raw_type & EWKB_SRID_FLAG != 0 {
        let srid = reader.u32()?;
        if srid != WGS84_SRID {
            return Err(WkbError::UnsupportedSrid(srid));
        }
    }

    // ISO WKB encodes Z/M as 1001/2001/3001.
    let base_type = (raw_type & !(EWKB_Z_FLAG | EWKB_M_FLAG | EWKB_SRID_FLAG)) % 1000;
    if base_type != WKB_POINT {
        return Err(WkbError::NotAPoint(raw_type));
    }

    let x = reader.f64()?;
    let y = reader.f64()?;

    Coordinates::from_lon_lat(x, y).ok_or(WkbError::InvalidPosition)
}

/// Decodes a hex-encoded WKB or EWKB point.
///
/// # Errors
///
/// Returns [`WkbError`] if the text is not valid hex or the decoded
/// payload is not a valid point.
pub fn decode_hex_point(text: &str) -> Result<Coordinates, WkbError> {
    let bytes = hex::decode(text.trim())?;
    decode_point(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ewkb_point(little_endian: bool, srid: Option<u32>, x: f64, y: f64) -> Vec<u8> {
        let mut out = vec![u8::from(little_endian)];
        let geometry_type = if srid.is_some() {
            WKB_POINT | EWKB_SRID_FLAG
        } else {
            WKB_POINT
        };
        let push_u32 = |out: &mut Vec<u8>, v: u32| {
            if little_endian {
                out.extend_from_slice(&v.to_le_bytes());
            } else {
                out.extend_from_slice(&v.to_be_bytes());
            }
        };
        push_u32(&mut out, geometry_type);
        if let Some(srid) = srid {
            push_u32(&mut out, srid);
        }
        for v in [x, y] {
            if little_endian {
                out.extend_from_slice(&v.to_le_bytes());
            } else {
                out.extend_from_slice(&v.to_be_bytes());
            }
        }
        out
    }

    #[test]
    fn decodes_plain_little_endian_point() {
        let c = decode_hex_point("0101000000000000000000F03F0000000000000040").unwrap();
        assert!((c.longitude - 1.0).abs() < f64::EPSILON);
        assert!((c.latitude - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn decodes_ewkb_with_srid() {
        let bytes = ewkb_point(true, Some(WGS84_SRID), 32.58, 0.31);
        let c = decode_hex_point(&hex::encode_upper(bytes)).unwrap();
        assert!((c.longitude - 32.58).abs() < 1e-12);
        assert!((c.latitude - 0.31).abs() < 1e-12);
    }

    #[test]
    fn decodes_big_endian_point() {
        let bytes = ewkb_point(false, None, 30.1, -1.2);
        let c = decode_point(&bytes).unwrap();
        assert!((c.longitude - 30.1).abs() < 1e-12);
        assert!((c.latitude + 1.2).abs() < 1e-12);
    }

    #[test]
    fn rejects_truncated_payload() {
        let bytes = ewkb_point(true, None, 32.58, 0.31);
        assert!(matches!(
            decode_point(&bytes[..12]),
            Err(WkbError::Truncated { .. })
        ));
    }

    #[test]
    fn rejects_foreign_srid() {
        let bytes = ewkb_point(true, Some(3857), 32.58, 0.31);
        assert!(matches!(
            decode_point(&bytes),
            Err(WkbError::UnsupportedSrid(3857))
        ));
    }

    #[test]
    fn rejects_non_point_geometry() {
        // LineString header with no body.
        let bytes = [1_u8, 2, 0, 0, 0];
        assert!(matches!(decode_point(&bytes), Err(WkbError::NotAPoint(2))));
    }

    #[test]
    fn rejects_bad_byte_order() {
        assert!(matches!(decode_point(&[7_u8]), Err(WkbError::ByteOrder(7))));
    }

    #[test]
    fn rejects_invalid_hex() {
        assert!(matches!(decode_hex_point("01zz"), Err(WkbError::Hex(_))));
    }
}
