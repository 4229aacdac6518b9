//! Error types shared by every codec in this crate.

use thiserror::Error;

/// Failures that can occur while packing, unpacking, or validating raw
/// wire-level values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The input buffer ended before the requested field could be read.
    #[error("insufficient bytes: need {needed}, have {available}")]
    InsufficientBytes {
        /// Bytes required to satisfy the read.
        needed: usize,
        /// Bytes actually present in the buffer.
        available: usize,
    },

    /// A decoded or requested value fell outside its valid range.
    #[error("value {value} out of range [{min}, {max}] for {field}")]
    OutOfRange {
        /// Name of the field being validated.
        field: &'static str,
        /// The offending value, widened to `i64` for display.
        value: i64,
        /// Minimum accepted value.
        min: i64,
        /// Maximum accepted value.
        max: i64,
    },

    /// A BCD nibble was neither a digit (0x0-0x9) nor the padding nibble
    /// (0xF).
    #[error("invalid BCD nibble 0x{nibble:x} at digit position {position}")]
    InvalidBcdNibble {
        /// The offending nibble.
        nibble: u8,
        /// Index of the nibble within the digit string.
        position: usize,
    },

    /// A VarInt did not terminate within the maximum allowed byte count.
    #[error("varint exceeds maximum of {max_bytes} bytes")]
    VarIntTooLong {
        /// The configured maximum byte count.
        max_bytes: usize,
    },

    /// Bytes remained unconsumed where an exact-length decode was expected.
    #[error("trailing bytes after decode: {trailing} unconsumed")]
    TrailingBytes {
        /// Number of bytes left over.
        trailing: usize,
    },
}
