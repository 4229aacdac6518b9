//! Table-driven CRC-8-CCITT and CRC-32/IEEE engines.
//!
//! Tables are computed once, at first use, via [`std::sync::LazyLock`].

use std::sync::LazyLock;

use crate::error::CodecError;

const CRC8_POLY: u8 = 0x07;
const CRC32_POLY: u32 = 0xEDB8_8320;

static CRC8_TABLE: LazyLock<[u8; 256]> = LazyLock::new(|| {
    let mut table = [0u8; 256];
    let mut byte = 0usize;
    while byte < 256 {
        let mut crc = byte as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ CRC8_POLY } else { crc << 1 };
            bit += 1;
        }
        table[byte] = crc;
        byte += 1;
    }
    table
});

static CRC32_TABLE: LazyLock<[u32; 256]> = LazyLock::new(|| {
    let mut table = [0u32; 256];
    let mut byte = 0usize;
    while byte < 256 {
        let mut crc = byte as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ CRC32_POLY } else { crc >> 1 };
            bit += 1;
        }
        table[byte] = crc;
        byte += 1;
    }
    table
});

/// CRC-8-CCITT: `poly=0x07, init=0x00, refin=false, refout=false, xorout=0x00`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc8;

impl Crc8 {
    /// Computes the CRC-8 of `bytes`.
    pub fn compute(bytes: &[u8]) -> u8 {
        Self::update(0, bytes)
    }

    /// Computes the CRC-8 of `bytes[off..off+len]`.
    pub fn compute_range(bytes: &[u8], off: usize, len: usize) -> Result<u8, CodecError> {
        let slice = bytes
            .get(off..off + len)
            .ok_or(CodecError::InsufficientBytes { needed: off + len, available: bytes.len() })?;
        Ok(Self::compute(slice))
    }

    /// Folds `bytes` into an in-progress CRC state.
    pub fn update(mut state: u8, bytes: &[u8]) -> u8 {
        for &byte in bytes {
            let index = (state ^ byte) as usize;
            state = CRC8_TABLE[index];
        }
        state
    }

    /// Validates that the trailing byte of `bytes_with_trailer` is the
    /// correct CRC-8 of everything preceding it.
    pub fn verify_or_error(bytes_with_trailer: &[u8]) -> Result<(), CodecError> {
        let (body, trailer) = bytes_with_trailer
            .split_last()
            .ok_or(CodecError::InsufficientBytes { needed: 1, available: 0 })?;
        let trailer = *trailer;
        let expected = Self::compute(body);
        if expected == trailer {
            Ok(())
        } else {
            Err(CodecError::OutOfRange {
                field: "crc8",
                value: i64::from(trailer),
                min: i64::from(expected),
                max: i64::from(expected),
            })
        }
    }
}

/// CRC-32/IEEE (Ethernet): reflected, `poly=0xEDB88320, init=xorout=0xFFFFFFFF`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32;

impl Crc32 {
    const INIT: u32 = 0xFFFF_FFFF;
    const XOROUT: u32 = 0xFFFF_FFFF;

    /// Computes the CRC-32/IEEE of `bytes`.
    pub fn compute(bytes: &[u8]) -> u32 {
        Self::update(Self::INIT, bytes) ^ Self::XOROUT
    }

    /// Computes the CRC-32/IEEE of `bytes[off..off+len]`.
    pub fn compute_range(bytes: &[u8], off: usize, len: usize) -> Result<u32, CodecError> {
        let slice = bytes
            .get(off..off + len)
            .ok_or(CodecError::InsufficientBytes { needed: off + len, available: bytes.len() })?;
        Ok(Self::compute(slice))
    }

    /// Folds `bytes` into a raw (pre-xorout) CRC state. Callers computing a
    /// final value must XOR the result with `0xFFFF_FFFF`.
    pub fn update(mut state: u32, bytes: &[u8]) -> u32 {
        for &byte in bytes {
            let index = ((state ^ u32::from(byte)) & 0xFF) as usize;
            state = (state >> 8) ^ CRC32_TABLE[index];
        }
        state
    }

    /// Validates that the trailing 4 bytes (big-endian) of
    /// `bytes_with_trailer` are the correct CRC-32 of everything preceding
    /// them.
    #[allow(clippy::expect_used)]
    pub fn verify_or_error(bytes_with_trailer: &[u8]) -> Result<(), CodecError> {
        if bytes_with_trailer.len() < 4 {
            return Err(CodecError::InsufficientBytes {
                needed: 4,
                available: bytes_with_trailer.len(),
            });
        }
        let split_at = bytes_with_trailer.len() - 4;
        let (body, trailer) = bytes_with_trailer.split_at(split_at);
        let trailer_value = u32::from_be_bytes(trailer.try_into().expect("split_at above leaves exactly 4 bytes"));
        let expected = Self::compute(body);
        if expected == trailer_value {
            Ok(())
        } else {
            Err(CodecError::OutOfRange {
                field: "crc32",
                value: i64::from(trailer_value),
                min: i64::from(expected),
                max: i64::from(expected),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc8_known_test_vector() {
        assert_eq!(Crc8::compute(b"123456789"), 0xF4);
    }

    #[test]
    fn crc32_known_test_vector() {
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn crc8_verify_accepts_matching_trailer() {
        let mut buf = b"123456789".to_vec();
        buf.push(0xF4);
        assert!(Crc8::verify_or_error(&buf).is_ok());
    }

    #[test]
    fn crc8_verify_rejects_single_bit_flip() {
        let mut buf = b"123456789".to_vec();
        buf.push(0xF4);
        buf[0] ^= 0x01;
        assert!(Crc8::verify_or_error(&buf).is_err());
    }

    #[test]
    fn crc32_verify_accepts_matching_trailer() {
        let mut buf = b"123456789".to_vec();
        buf.extend_from_slice(&0xCBF4_3926u32.to_be_bytes());
        assert!(Crc32::verify_or_error(&buf).is_ok());
    }

    #[test]
    fn crc32_verify_rejects_single_bit_flip() {
        let mut buf = b"123456789".to_vec();
        buf.extend_from_slice(&0xCBF4_3926u32.to_be_bytes());
        let last = buf.len() - 1;
        buf[last] ^= 0x01;
        assert!(Crc32::verify_or_error(&buf).is_err());
    }

    #[test]
    fn crc8_update_is_incremental() {
        let whole = Crc8::compute(b"123456789");
        let mut state = 0u8;
        state = Crc8::update(state, b"1234");
        state = Crc8::update(state, b"56789");
        assert_eq!(state, whole);
    }

    #[test]
    fn crc32_empty_input() {
        assert_eq!(Crc32::compute(&[]), 0);
    }

    proptest::proptest! {
        #[test]
        fn crc8_single_bit_flip_always_changes_result(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 1..64), bit_index in 0u32..8) {
            let original = Crc8::compute(&bytes);
            let mut flipped = bytes.clone();
            flipped[0] ^= 1 << bit_index;
            let after = Crc8::compute(&flipped);
            proptest::prop_assert_ne!(original, after);
        }
    }
}
