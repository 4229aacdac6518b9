//! Text message bundled with a location fix.

use bitpack_codec::{bits, gps};

use crate::{error::ProtocolError, opcode::MessageType};

const HAS_SENDER_BIT: u8 = 0x80;
const HAS_RECIPIENT_BIT: u8 = 0x40;

/// A text message carrying the sender's current location.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLocationPayload {
    /// Sender identifier, if present.
    pub sender: Option<String>,
    /// Recipient identifier; `None` means broadcast.
    pub recipient: Option<String>,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Message body.
    pub text: String,
}

fn encode_length_prefixed(out: &mut Vec<u8>, value: &str) -> Result<(), ProtocolError> {
    let bytes = value.as_bytes();
    if bytes.len() > u8::MAX as usize {
        return Err(ProtocolError::OutOfRange {
            field: "length_prefix",
            value: bytes.len() as i64,
            min: 0,
            max: i64::from(u8::MAX),
        });
    }
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
    Ok(())
}

fn decode_length_prefixed<'a>(bytes: &'a [u8], field: &'static str) -> Result<(&'a str, &'a [u8]), ProtocolError> {
    let len =
        usize::from(*bytes.first().ok_or(ProtocolError::InsufficientBytes { needed: 1, available: 0 })?);
    let body = bytes
        .get(1..1 + len)
        .ok_or(ProtocolError::InsufficientBytes { needed: 1 + len, available: bytes.len() })?;
    let value = std::str::from_utf8(body).map_err(|_| ProtocolError::Utf8Decode { field })?;
    Ok((value, &bytes[1 + len..]))
}

impl TextLocationPayload {
    /// The wire type for this payload.
    pub fn message_type(&self) -> MessageType {
        MessageType::TextLocation
    }

    /// Encoded size in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.encode().map(|b| b.len()).unwrap_or(0)
    }

    /// Encodes this payload.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut flags = 0u8;
        if self.sender.is_some() {
            flags |= HAS_SENDER_BIT;
        }
        if self.recipient.is_some() {
            flags |= HAS_RECIPIENT_BIT;
        }
        let mut out = vec![flags];
        if let Some(sender) = &self.sender {
            encode_length_prefixed(&mut out, sender)?;
        }
        if let Some(recipient) = &self.recipient {
            encode_length_prefixed(&mut out, recipient)?;
        }
        out.extend_from_slice(&gps::encode_latitude(self.latitude)?.to_be_bytes());
        out.extend_from_slice(&gps::encode_longitude(self.longitude)?.to_be_bytes());
        out.extend_from_slice(self.text.as_bytes());
        Ok(out)
    }

    /// Decodes this payload. The `has_sender`/`has_recipient` flag bits
    /// must be consistent with the identifiers that actually follow.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let flags = *bytes.first().ok_or(ProtocolError::InsufficientBytes { needed: 1, available: 0 })?;
        let mut rest = &bytes[1..];

        let sender = if flags & HAS_SENDER_BIT != 0 {
            let (value, remainder) = decode_length_prefixed(rest, "sender")?;
            rest = remainder;
            Some(value.to_string())
        } else {
            None
        };

        let recipient = if flags & HAS_RECIPIENT_BIT != 0 {
            let (value, remainder) = decode_length_prefixed(rest, "recipient")?;
            rest = remainder;
            Some(value.to_string())
        } else {
            None
        };

        if rest.len() < 8 {
            return Err(ProtocolError::InsufficientBytes { needed: 8, available: rest.len() });
        }
        let latitude = gps::decode_latitude(bits::read_i32_be(&rest[0..4])?);
        let longitude = gps::decode_longitude(bits::read_i32_be(&rest[4..8])?);
        let text = std::str::from_utf8(&rest[8..])
            .map_err(|_| ProtocolError::Utf8Decode { field: "text" })?
            .to_string();

        Ok(Self { sender, recipient, latitude, longitude, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_identifiers() {
        let payload = TextLocationPayload {
            sender: Some("alice".into()),
            recipient: None,
            latitude: 41.0082,
            longitude: 28.9784,
            text: "heading to shelter".into(),
        };
        let bytes = payload.encode().unwrap();
        let decoded = TextLocationPayload::decode(&bytes).unwrap();
        assert_eq!(decoded.sender, payload.sender);
        assert_eq!(decoded.recipient, payload.recipient);
        assert_eq!(decoded.text, payload.text);
        assert!((decoded.latitude - payload.latitude).abs() < 1e-6);
    }

    #[test]
    fn decode_rejects_truncated_coordinates() {
        let bytes = vec![0u8, 1, 2, 3];
        assert!(TextLocationPayload::decode(&bytes).is_err());
    }
}
