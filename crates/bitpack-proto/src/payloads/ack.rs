//! Acknowledgement payload, shared by the Compact and Standard `SosAck`
//! and `DataAck` message types.

use bitpack_codec::bits;

use crate::{error::ProtocolError, opcode::MessageType};

/// Width of the original message ID this ack refers to; mirrors whichever
/// mode the acknowledged packet was sent in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdWidth {
    /// 16-bit message ID (Compact).
    Bits16,
    /// 32-bit message ID (Standard).
    Bits32,
}

/// Delivery status of the acknowledged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    /// The packet bytes were received.
    Received,
    /// The packet was delivered to the application.
    Delivered,
    /// The recipient has read the message.
    Read,
    /// Processing failed.
    Failed,
    /// The recipient rejected the message.
    Rejected,
    /// The message was relayed rather than consumed locally.
    Relayed,
}

impl AckStatus {
    fn code(self) -> u8 {
        match self {
            Self::Received => 0,
            Self::Delivered => 1,
            Self::Read => 2,
            Self::Failed => 3,
            Self::Rejected => 4,
            Self::Relayed => 5,
        }
    }

    fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Received,
            1 => Self::Delivered,
            2 => Self::Read,
            3 => Self::Failed,
            4 => Self::Rejected,
            _ => Self::Relayed,
        }
    }
}

/// Acknowledges receipt, delivery, or rejection of a prior message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckPayload {
    /// The message ID being acknowledged.
    pub original_message_id: u32,
    /// Width the ID should be encoded with.
    pub id_width: IdWidth,
    /// Delivery status.
    pub status: AckStatus,
    /// Optional human-readable reason (e.g. a rejection cause).
    pub reason: Option<String>,
}

impl AckPayload {
    /// `SosAck` or `DataAck` depending on `is_sos`.
    pub fn message_type(&self, is_sos: bool) -> MessageType {
        if is_sos { MessageType::SosAck } else { MessageType::DataAck }
    }

    /// Encoded size in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.encode().map(|b| b.len()).unwrap_or(0)
    }

    /// Encodes this payload.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = Vec::new();
        match self.id_width {
            IdWidth::Bits16 => {
                let id = u16::try_from(self.original_message_id).map_err(|_| ProtocolError::OutOfRange {
                    field: "original_message_id",
                    value: i64::from(self.original_message_id),
                    min: 0,
                    max: i64::from(u16::MAX),
                })?;
                bits::write_u16_be(&mut out, id);
            },
            IdWidth::Bits32 => bits::write_u32_be(&mut out, self.original_message_id),
        }
        out.push(self.status.code());
        if let Some(reason) = &self.reason {
            let bytes = reason.as_bytes();
            if bytes.len() > u8::MAX as usize {
                return Err(ProtocolError::OutOfRange {
                    field: "reason",
                    value: bytes.len() as i64,
                    min: 0,
                    max: i64::from(u8::MAX),
                });
            }
            out.push(bytes.len() as u8);
            out.extend_from_slice(bytes);
        }
        Ok(out)
    }

    /// Decodes an ack payload for the given ID width.
    pub fn decode(bytes: &[u8], id_width: IdWidth) -> Result<Self, ProtocolError> {
        let (original_message_id, rest) = match id_width {
            IdWidth::Bits16 => {
                (u32::from(bits::read_u16_be(bytes)?), bytes.get(2..).unwrap_or_default())
            },
            IdWidth::Bits32 => (bits::read_u32_be(bytes)?, bytes.get(4..).unwrap_or_default()),
        };
        let status_byte =
            *rest.first().ok_or(ProtocolError::InsufficientBytes { needed: 1, available: 0 })?;
        let status = AckStatus::from_code(status_byte);

        let reason = if rest.len() > 1 {
            let len = usize::from(rest[1]);
            let body = rest
                .get(2..2 + len)
                .ok_or(ProtocolError::InsufficientBytes { needed: 2 + len, available: rest.len() })?;
            Some(
                std::str::from_utf8(body)
                    .map_err(|_| ProtocolError::Utf8Decode { field: "reason" })?
                    .to_string(),
            )
        } else {
            None
        };

        Ok(Self { original_message_id, id_width, status, reason })
    }
}
