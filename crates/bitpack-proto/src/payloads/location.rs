//! Location report payload: 8 bytes (lat/lon) or 12 bytes (+ altitude/accuracy).

use bitpack_codec::{bits, gps};

use crate::{error::ProtocolError, opcode::MessageType};

const SIZE_BASIC: usize = 8;
const SIZE_EXTENDED: usize = 12;

/// A location report, optionally carrying altitude and horizontal accuracy.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPayload {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters (signed); `None` for the 8-byte basic form.
    pub altitude_meters: Option<i16>,
    /// Horizontal accuracy in meters; present iff `altitude_meters` is.
    pub accuracy_meters: Option<u16>,
}

impl LocationPayload {
    /// The wire type for this payload.
    pub fn message_type(&self) -> MessageType {
        MessageType::Location
    }

    /// 8 bytes for the basic form, 12 for the extended form.
    pub fn size_in_bytes(&self) -> usize {
        if self.altitude_meters.is_some() { SIZE_EXTENDED } else { SIZE_BASIC }
    }

    /// Encodes this payload.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = Vec::with_capacity(self.size_in_bytes());
        out.extend_from_slice(&gps::encode_latitude(self.latitude)?.to_be_bytes());
        out.extend_from_slice(&gps::encode_longitude(self.longitude)?.to_be_bytes());
        if let Some(altitude) = self.altitude_meters {
            let accuracy = self.accuracy_meters.unwrap_or(0);
            out.extend_from_slice(&altitude.to_be_bytes());
            out.extend_from_slice(&accuracy.to_be_bytes());
        }
        Ok(out)
    }

    /// Decodes an 8- or 12-byte location payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != SIZE_BASIC && bytes.len() != SIZE_EXTENDED {
            return Err(ProtocolError::InsufficientBytes { needed: SIZE_BASIC, available: bytes.len() });
        }
        let latitude = gps::decode_latitude(bits::read_i32_be(&bytes[0..4])?);
        let longitude = gps::decode_longitude(bits::read_i32_be(&bytes[4..8])?);

        let (altitude_meters, accuracy_meters) = if bytes.len() == SIZE_EXTENDED {
            let altitude = i16::from_be_bytes(bytes[8..10].try_into().expect("2 bytes"));
            let accuracy = u16::from_be_bytes(bytes[10..12].try_into().expect("2 bytes"));
            (Some(altitude), Some(accuracy))
        } else {
            (None, None)
        };

        Ok(Self { latitude, longitude, altitude_meters, accuracy_meters })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_roundtrip_is_8_bytes() {
        let payload =
            LocationPayload { latitude: 41.0082, longitude: 28.9784, altitude_meters: None, accuracy_meters: None };
        let bytes = payload.encode().unwrap();
        assert_eq!(bytes.len(), 8);
        let decoded = LocationPayload::decode(&bytes).unwrap();
        assert!((decoded.latitude - payload.latitude).abs() < 1e-6);
        assert_eq!(decoded.altitude_meters, None);
    }

    #[test]
    fn extended_roundtrip_is_12_bytes() {
        let payload = LocationPayload {
            latitude: -12.5,
            longitude: 45.25,
            altitude_meters: Some(-50),
            accuracy_meters: Some(12),
        };
        let bytes = payload.encode().unwrap();
        assert_eq!(bytes.len(), 12);
        let decoded = LocationPayload::decode(&bytes).unwrap();
        assert_eq!(decoded.altitude_meters, Some(-50));
        assert_eq!(decoded.accuracy_meters, Some(12));
    }

    #[test]
    fn decode_rejects_bad_length() {
        assert!(LocationPayload::decode(&[0u8; 9]).is_err());
    }

    proptest::proptest! {
        #[test]
        fn roundtrip_prop(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
            altitude in proptest::prelude::any::<i16>(),
            accuracy in proptest::prelude::any::<u16>(),
        ) {
            let payload = LocationPayload {
                latitude: lat,
                longitude: lon,
                altitude_meters: Some(altitude),
                accuracy_meters: Some(accuracy),
            };
            let bytes = payload.encode().unwrap();
            let decoded = LocationPayload::decode(&bytes).unwrap();
            proptest::prop_assert_eq!(decoded.altitude_meters, payload.altitude_meters);
            proptest::prop_assert_eq!(decoded.accuracy_meters, payload.accuracy_meters);
        }
    }
}
