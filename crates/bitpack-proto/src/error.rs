//! The decode/encode error taxonomy for headers, payloads, and packets.

use bitpack_codec::CodecError;
use thiserror::Error;

use crate::opcode::OpcodeError;

/// Errors raised while encoding or decoding wire-level protocol values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The input ended before a required field could be read.
    #[error("insufficient bytes: need {needed}, have {available}")]
    InsufficientBytes {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        available: usize,
    },

    /// The integrity trailer (CRC-8 or CRC-32) did not match.
    #[error("CRC mismatch")]
    CrcMismatch,

    /// The mode bit (MSB of byte 0) did not match the parser invoked.
    #[error("invalid mode bit")]
    InvalidMode,

    /// The type code is unusable in the requested context (e.g. a
    /// Standard-only code presented to the Compact header parser).
    #[error("invalid type code 0x{code:02x} for this mode")]
    InvalidType {
        /// The offending code.
        code: u8,
    },

    /// A decoded or requested value fell outside its valid range.
    #[error("value {value} out of range [{min}, {max}] for {field}")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: i64,
        /// Minimum accepted value.
        min: i64,
        /// Maximum accepted value.
        max: i64,
    },

    /// A length-prefixed string was not valid UTF-8.
    #[error("invalid UTF-8 in {field}")]
    Utf8Decode {
        /// Field name.
        field: &'static str,
    },
}

impl From<CodecError> for ProtocolError {
    fn from(value: CodecError) -> Self {
        match value {
            CodecError::InsufficientBytes { needed, available } => {
                Self::InsufficientBytes { needed, available }
            },
            CodecError::OutOfRange { field, value, min, max } => {
                Self::OutOfRange { field, value, min, max }
            },
            CodecError::InvalidBcdNibble { nibble, position } => Self::OutOfRange {
                field: "bcd_nibble",
                value: i64::from(nibble),
                min: i64::try_from(position).unwrap_or(i64::MAX),
                max: i64::try_from(position).unwrap_or(i64::MAX),
            },
            CodecError::VarIntTooLong { max_bytes } => {
                Self::OutOfRange { field: "varint", value: 0, min: 0, max: max_bytes as i64 }
            },
            CodecError::TrailingBytes { trailing } => {
                Self::OutOfRange { field: "trailing_bytes", value: trailing as i64, min: 0, max: 0 }
            },
        }
    }
}

impl From<OpcodeError> for ProtocolError {
    fn from(value: OpcodeError) -> Self {
        match value {
            OpcodeError::RequiresStandard { code } => Self::InvalidType { code },
        }
    }
}
