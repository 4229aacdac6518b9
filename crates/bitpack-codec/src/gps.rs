//! Fixed-point GPS coordinate encoding (×10⁷, signed 32-bit).

use crate::error::CodecError;

const SCALE: f64 = 1e7;

/// Encodes a latitude in degrees to its ×10⁷ fixed-point representation.
///
/// Valid only for `lat ∈ [-90, 90]`.
pub fn encode_latitude(lat: f64) -> Result<i32, CodecError> {
    encode_coordinate(lat, "latitude", -90.0, 90.0)
}

/// Encodes a longitude in degrees to its ×10⁷ fixed-point representation.
///
/// Valid only for `lon ∈ [-180, 180]`.
pub fn encode_longitude(lon: f64) -> Result<i32, CodecError> {
    encode_coordinate(lon, "longitude", -180.0, 180.0)
}

fn encode_coordinate(
    value: f64,
    field: &'static str,
    min: f64,
    max: f64,
) -> Result<i32, CodecError> {
    if !(min..=max).contains(&value) || !value.is_finite() {
        return Err(CodecError::OutOfRange {
            field,
            value: value as i64,
            min: min as i64,
            max: max as i64,
        });
    }
    Ok((value * SCALE).round() as i32)
}

/// Decodes a ×10⁷ fixed-point latitude back to degrees.
pub fn decode_latitude(raw: i32) -> f64 {
    f64::from(raw) / SCALE
}

/// Decodes a ×10⁷ fixed-point longitude back to degrees.
pub fn decode_longitude(raw: i32) -> f64 {
    f64::from(raw) / SCALE
}
