//! Mesh-layer error taxonomy.

use bitpack_crypto::CryptoError;
use bitpack_proto::ProtocolError;
use thiserror::Error;

/// Errors surfaced by fragmentation, relay, and controller logic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    /// Wraps a wire-format error from the protocol layer.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Wraps a key-derivation or AEAD error from the crypto layer.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A payload would need more fragments than the wire format can
    /// address (4095 max).
    #[error("payload needs {total} fragments, maximum is {max}")]
    TooManyFragments {
        /// Fragments the payload would actually need.
        total: usize,
        /// Maximum addressable fragment count.
        max: usize,
    },

    /// The configured MTU leaves no room for fragment overhead.
    #[error("MTU {mtu} too small to carry a fragment header and CRC trailer")]
    MtuTooSmall {
        /// The offending MTU.
        mtu: usize,
    },

    /// A reassembly buffer received a fragment whose `total_fragments`
    /// disagrees with the value already recorded for this message_id.
    #[error("fragment total mismatch for message {message_id}: expected {expected}, got {got}")]
    FragmentTotalMismatch {
        /// The message_id whose buffer was already established.
        message_id: u32,
        /// The total recorded when the buffer was created.
        expected: u16,
        /// The total carried by the newly arrived fragment.
        got: u16,
    },

    /// A fragment-reassembly operation was handed a packet that isn't
    /// actually a fragment (missing `FragmentHeader` or a non-raw payload).
    #[error("packet is not a valid fragment")]
    MissingFragment,

    /// The background key-derivation task (§4.10) panicked or was
    /// cancelled before it could return a result.
    #[error("background key derivation task did not complete")]
    DerivationTaskFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_converts_via_from() {
        let err: MeshError = ProtocolError::CrcMismatch.into();
        assert!(matches!(err, MeshError::Protocol(ProtocolError::CrcMismatch)));
    }

    #[test]
    fn crypto_error_converts_via_from() {
        let err: MeshError = CryptoError::AuthenticationFailed.into();
        assert!(matches!(err, MeshError::Crypto(CryptoError::AuthenticationFailed)));
    }
}
