//! Short text message payload.

use crate::{error::ProtocolError, opcode::MessageType};

const HAS_SENDER_BIT: u8 = 0x80;
const HAS_RECIPIENT_BIT: u8 = 0x40;

/// A text message, optionally tagged with sender/recipient identifiers.
/// Absent recipient means broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPayload {
    /// Sender identifier, if present.
    pub sender: Option<String>,
    /// Recipient identifier; `None` means broadcast.
    pub recipient: Option<String>,
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
    let len = usize::from(*bytes.first().ok_or(ProtocolError::InsufficientBytes {
        needed: 1,
        available: 0,
    })?);
    let body = bytes
        .get(1..1 + len)
        .ok_or(ProtocolError::InsufficientBytes { needed: 1 + len, available: bytes.len() })?;
    let value = std::str::from_utf8(body).map_err(|_| ProtocolError::Utf8Decode { field })?;
    Ok((value, &bytes[1 + len..]))
}

impl TextPayload {
    /// The wire type for this payload.
    pub fn message_type(&self) -> MessageType {
        MessageType::TextShort
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
        out.extend_from_slice(self.text.as_bytes());
        Ok(out)
    }

    /// Decodes a text payload. Strict on length prefixes: a prefix that
    /// overruns the remaining bytes is `InsufficientBytes`.
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

        let text = std::str::from_utf8(rest).map_err(|_| ProtocolError::Utf8Decode { field: "text" })?.to_string();

        Ok(Self { sender, recipient, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_sender_and_recipient() {
        let payload = TextPayload {
            sender: Some("alice".into()),
            recipient: Some("bob".into()),
            text: "need water".into(),
        };
        let bytes = payload.encode().unwrap();
        assert_eq!(TextPayload::decode(&bytes).unwrap(), payload);
    }

    #[test]
    fn roundtrip_broadcast_no_identifiers() {
        let payload = TextPayload { sender: None, recipient: None, text: "all clear".into() };
        let bytes = payload.encode().unwrap();
        assert_eq!(bytes[0], 0);
        assert_eq!(TextPayload::decode(&bytes).unwrap(), payload);
    }

    #[test]
    fn decode_rejects_truncated_length_prefix() {
        let bytes = vec![HAS_SENDER_BIT, 10, b'a', b'b'];
        assert!(TextPayload::decode(&bytes).is_err());
    }

    proptest::proptest! {
        #[test]
        fn roundtrip_prop(text in "[a-zA-Z0-9 ]{0,50}") {
            let payload = TextPayload { sender: None, recipient: None, text: text.clone() };
            let bytes = payload.encode().unwrap();
            let decoded = TextPayload::decode(&bytes).unwrap();
            proptest::prop_assert_eq!(decoded.text, text);
        }
    }
}
