//! Opaque fallback payload for unrecognized type codes.

use crate::opcode::MessageType;

/// Bytes carried by a message type this decoder does not recognize.
/// Preserved verbatim so CRC-validated frames are never dropped on type
/// alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    /// The unrecognized wire type code.
    pub type_code: u8,
    /// Payload bytes, unparsed.
    pub bytes: Vec<u8>,
}

impl RawPayload {
    /// The wire type for this payload.
    pub fn message_type(&self) -> MessageType {
        MessageType::from_code(self.type_code)
    }

    /// Encoded size in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Encodes this payload (identity: returns the stored bytes).
    pub fn encode(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Wraps `bytes` as a raw payload for `type_code`.
    pub fn decode(type_code: u8, bytes: &[u8]) -> Self {
        Self { type_code, bytes: bytes.to_vec() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_bytes() {
        let payload = RawPayload::decode(0x2A, &[1, 2, 3, 4]);
        assert_eq!(payload.encode(), vec![1, 2, 3, 4]);
        assert_eq!(payload.message_type(), MessageType::Raw(0x2A));
    }
}
