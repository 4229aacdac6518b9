//! Fixed 15-byte SOS beacon payload.

use bitpack_codec::{bcd, gps, BitReader, BitWriter};

use crate::{error::ProtocolError, opcode::MessageType};

const SIZE: usize = 15;
const PHONE_BYTES: usize = 4;
const MAX_ALTITUDE: u16 = 4095;
const MAX_BATTERY_CODE: u8 = 15;

/// The nature of the emergency. Closed 3-bit codespace; any bit pattern not
/// explicitly assigned decodes as [`SosType::NeedRescue`] rather than
/// failing, since an SOS beacon must never be dropped on a type mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosType {
    /// Sender is physically trapped (structure collapse, debris).
    Trapped,
    /// Medical emergency requiring immediate attention.
    MedicalEmergency,
    /// Active fire.
    Fire,
    /// Flooding.
    Flood,
    /// Threat of violence.
    Violence,
    /// Drowning or at risk of drowning.
    Drowning,
    /// Distress without a more specific category.
    GeneralDistress,
    /// Fallback for any unrecognized or future code.
    NeedRescue,
}

impl SosType {
    fn code(self) -> u8 {
        match self {
            Self::Trapped => 0,
            Self::MedicalEmergency => 1,
            Self::Fire => 2,
            Self::Flood => 3,
            Self::Violence => 4,
            Self::Drowning => 5,
            Self::GeneralDistress => 6,
            Self::NeedRescue => 7,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Self::Trapped,
            1 => Self::MedicalEmergency,
            2 => Self::Fire,
            3 => Self::Flood,
            4 => Self::Violence,
            5 => Self::Drowning,
            6 => Self::GeneralDistress,
            _ => Self::NeedRescue,
        }
    }
}

/// An SOS beacon: location, emergency category, headcount, and a best-effort
/// contact phone number.
#[derive(Debug, Clone, PartialEq)]
pub struct SosPayload {
    /// Nature of the emergency.
    pub sos_type: SosType,
    /// Number of people at the location, 0-7.
    pub people_count: u8,
    /// At least one person is injured.
    pub has_injured: bool,
    /// Sender is physically trapped.
    pub is_trapped: bool,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Contact phone digits, if they fit the 8-digit packed field and
    /// decoded cleanly. `None` on malformed BCD (resilient, not an error).
    pub phone_digits: Option<String>,
    /// Altitude in meters above sea level, 0-4095.
    pub altitude_meters: u16,
    /// Battery level coded 0-15 (`round(percent * 15 / 100)`).
    pub battery_coded: u8,
}

impl SosPayload {
    /// Converts a battery percentage (0-100) into the coded 0-15 field.
    pub fn code_battery_percent(percent: u8) -> u8 {
        ((u32::from(percent.min(100)) * 15 + 50) / 100) as u8
    }

    /// Converts the coded 0-15 battery field back to an approximate percent.
    pub fn battery_percent(&self) -> u8 {
        (u32::from(self.battery_coded) * 100 / 15) as u8
    }

    /// The wire type for this payload.
    pub fn message_type(&self) -> MessageType {
        MessageType::SosBeacon
    }

    /// Encoded size; always [`SIZE`].
    pub fn size_in_bytes(&self) -> usize {
        SIZE
    }

    /// Encodes this payload to exactly 15 bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = Vec::with_capacity(SIZE);

        let byte0 = (self.sos_type.code() & 0x07) << 5
            | (self.people_count.min(7) & 0x07) << 2
            | u8::from(self.has_injured) << 1
            | u8::from(self.is_trapped);
        out.push(byte0);

        out.extend_from_slice(&gps::encode_latitude(self.latitude)?.to_be_bytes());
        out.extend_from_slice(&gps::encode_longitude(self.longitude)?.to_be_bytes());

        let digits: String =
            self.phone_digits.as_deref().unwrap_or("").chars().filter(char::is_ascii_digit).collect();
        out.extend_from_slice(&bcd::encode_last(&digits, PHONE_BYTES)?);

        if self.altitude_meters > MAX_ALTITUDE {
            return Err(ProtocolError::OutOfRange {
                field: "altitude_meters",
                value: i64::from(self.altitude_meters),
                min: 0,
                max: i64::from(MAX_ALTITUDE),
            });
        }
        if self.battery_coded > MAX_BATTERY_CODE {
            return Err(ProtocolError::OutOfRange {
                field: "battery_coded",
                value: i64::from(self.battery_coded),
                min: 0,
                max: i64::from(MAX_BATTERY_CODE),
            });
        }
        let mut writer = BitWriter::new();
        writer.write_bits(u32::from(self.altitude_meters), 12);
        writer.write_bits(u32::from(self.battery_coded), 4);
        out.extend_from_slice(&writer.finish());

        Ok(out)
    }

    /// Decodes a 15-byte SOS payload. Length must equal exactly 15.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != SIZE {
            return Err(ProtocolError::InsufficientBytes { needed: SIZE, available: bytes.len() });
        }

        let byte0 = bytes[0];
        let sos_type = SosType::from_bits(byte0 >> 5);
        let people_count = (byte0 >> 2) & 0x07;
        let has_injured = byte0 & 0b10 != 0;
        let is_trapped = byte0 & 0b01 != 0;

        let lat_raw = bitpack_codec::bits::read_i32_be(&bytes[1..5])?;
        let lon_raw = bitpack_codec::bits::read_i32_be(&bytes[5..9])?;
        let latitude = gps::decode_latitude(lat_raw);
        let longitude = gps::decode_longitude(lon_raw);

        let phone_digits = bcd::decode_bcd(&bytes[9..13]).ok();

        let mut reader = BitReader::new(&bytes[13..15]);
        let altitude_meters = reader.read_bits(12)? as u16;
        let battery_coded = reader.read_bits(4)? as u8;

        Ok(Self {
            sos_type,
            people_count,
            has_injured,
            is_trapped,
            latitude,
            longitude,
            phone_digits,
            altitude_meters,
            battery_coded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SosPayload {
        SosPayload {
            sos_type: SosType::Trapped,
            people_count: 3,
            has_injured: true,
            is_trapped: true,
            latitude: 41.0082,
            longitude: 28.9784,
            phone_digits: Some("90533123".to_string()),
            altitude_meters: 120,
            battery_coded: SosPayload::code_battery_percent(80),
        }
    }

    #[test]
    fn roundtrip_fixed_size() {
        let payload = sample();
        let bytes = payload.encode().unwrap();
        assert_eq!(bytes.len(), SIZE);
        let decoded = SosPayload::decode(&bytes).unwrap();
        assert_eq!(decoded.sos_type, payload.sos_type);
        assert_eq!(decoded.people_count, payload.people_count);
        assert_eq!(decoded.has_injured, payload.has_injured);
        assert_eq!(decoded.is_trapped, payload.is_trapped);
        assert!((decoded.latitude - payload.latitude).abs() < 1e-6);
        assert!((decoded.longitude - payload.longitude).abs() < 1e-6);
        assert_eq!(decoded.phone_digits, payload.phone_digits);
        assert_eq!(decoded.altitude_meters, payload.altitude_meters);
        assert_eq!(decoded.battery_coded, payload.battery_coded);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert!(SosPayload::decode(&[0u8; 14]).is_err());
    }

    #[test]
    fn malformed_phone_bcd_becomes_none_not_error() {
        let mut bytes = sample().encode().unwrap();
        bytes[9] = 0xAB; // invalid nibble
        let decoded = SosPayload::decode(&bytes).unwrap();
        assert_eq!(decoded.phone_digits, None);
    }

    #[test]
    fn unassigned_type_bits_fall_back_to_need_rescue() {
        assert_eq!(SosType::from_bits(7), SosType::NeedRescue);
    }

    #[test]
    fn battery_percent_roundtrip_is_approximate() {
        let coded = SosPayload::code_battery_percent(100);
        assert_eq!(coded, 15);
        let payload = SosPayload { battery_coded: coded, ..sample() };
        assert_eq!(payload.battery_percent(), 100);
    }

    proptest::proptest! {
        #[test]
        fn roundtrip_prop(
            people_count in 0u8..=7,
            has_injured in proptest::prelude::any::<bool>(),
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
            altitude_meters in 0u16..=4095,
            battery_coded in 0u8..=15,
        ) {
            let payload = SosPayload {
                sos_type: SosType::GeneralDistress,
                people_count,
                has_injured,
                is_trapped: false,
                latitude: lat,
                longitude: lon,
                phone_digits: None,
                altitude_meters,
                battery_coded,
            };
            let bytes = payload.encode().unwrap();
            proptest::prop_assert_eq!(bytes.len(), SIZE);
            let decoded = SosPayload::decode(&bytes).unwrap();
            proptest::prop_assert_eq!(decoded.people_count, payload.people_count);
            proptest::prop_assert_eq!(decoded.has_injured, payload.has_injured);
            proptest::prop_assert_eq!(decoded.altitude_meters, payload.altitude_meters);
            proptest::prop_assert_eq!(decoded.battery_coded, payload.battery_coded);
            proptest::prop_assert!((decoded.latitude - payload.latitude).abs() < 1e-6);
            proptest::prop_assert!((decoded.longitude - payload.longitude).abs() < 1e-6);
        }
    }
}
