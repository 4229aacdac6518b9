//! Selective-repeat negative-acknowledgement payload.

use bitpack_codec::{bits, BitReader, BitWriter};

use crate::{error::ProtocolError, opcode::MessageType};

const MAX_BLOCKS: usize = 8;
const BLOCK_BYTES: usize = 3;

/// One missing-fragment block: up to 12 consecutive fragment indices
/// starting at `start_index`, with bit `N` of `missing_bitmask` set iff
/// fragment `start_index + N` is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NackBlock {
    /// First fragment index covered by this block.
    pub start_index: u16,
    /// 12-bit bitmask of missing offsets within the block.
    pub missing_bitmask: u16,
}

/// Requests retransmission of specific missing fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NackPayload {
    /// The fragmented message this NACK refers to.
    pub original_message_id: u32,
    /// 1-8 blocks of missing fragment indices.
    pub blocks: Vec<NackBlock>,
}

impl NackPayload {
    /// The wire type for this payload.
    pub fn message_type(&self) -> MessageType {
        MessageType::Nack
    }

    /// Encoded size in bytes.
    pub fn size_in_bytes(&self) -> usize {
        4 + 1 + self.blocks.len() * BLOCK_BYTES
    }

    /// Encodes this payload. `blocks` must be non-empty and at most
    /// [`MAX_BLOCKS`] long.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        if self.blocks.is_empty() || self.blocks.len() > MAX_BLOCKS {
            return Err(ProtocolError::OutOfRange {
                field: "block_count",
                value: self.blocks.len() as i64,
                min: 1,
                max: MAX_BLOCKS as i64,
            });
        }
        let mut out = Vec::with_capacity(self.size_in_bytes());
        bits::write_u32_be(&mut out, self.original_message_id);
        out.push(self.blocks.len() as u8);
        for block in &self.blocks {
            let mut writer = BitWriter::new();
            writer.write_bits(u32::from(block.start_index), 12);
            writer.write_bits(u32::from(block.missing_bitmask), 12);
            out.extend_from_slice(&writer.finish());
        }
        Ok(out)
    }

    /// Decodes a NACK payload. Rejects `block_count == 0`.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let original_message_id = bits::read_u32_be(bytes)?;
        let block_count = usize::from(
            *bytes.get(4).ok_or(ProtocolError::InsufficientBytes { needed: 5, available: bytes.len() })?,
        );
        if block_count == 0 {
            return Err(ProtocolError::OutOfRange { field: "block_count", value: 0, min: 1, max: MAX_BLOCKS as i64 });
        }

        let body = bytes.get(5..5 + block_count * BLOCK_BYTES).ok_or(ProtocolError::InsufficientBytes {
            needed: 5 + block_count * BLOCK_BYTES,
            available: bytes.len(),
        })?;

        let mut blocks = Vec::with_capacity(block_count);
        for chunk in body.chunks_exact(BLOCK_BYTES) {
            let mut reader = BitReader::new(chunk);
            let start_index = reader.read_bits(12)? as u16;
            let missing_bitmask = reader.read_bits(12)? as u16;
            blocks.push(NackBlock { start_index, missing_bitmask });
        }

        Ok(Self { original_message_id, blocks })
    }
}
