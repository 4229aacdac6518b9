//! Packet-level behavioral flags.

/// Behavioral flags carried by every header.
///
/// Compact mode only exposes `mesh`, `ack_required`, `encrypted`,
/// `compressed`, `urgent`; `is_fragment`/`more_fragments` are always false
/// when constructed from a [`crate::header::CompactHeader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketFlags {
    /// Packet should be relayed across the mesh.
    pub mesh: bool,
    /// Sender requests an acknowledgement.
    pub ack_required: bool,
    /// Payload bytes are an AES-GCM envelope.
    pub encrypted: bool,
    /// Payload bytes are compressed (compression itself is out of scope;
    /// this only records the sender's claim).
    pub compressed: bool,
    /// Elevated relay priority (see `calculate_priority`).
    pub urgent: bool,
    /// This packet is one fragment of a larger logical message.
    pub is_fragment: bool,
    /// At least one more fragment follows this one.
    pub more_fragments: bool,
}

impl PacketFlags {
    /// The 3 bits packed into Compact header byte 0: `mesh,ack,enc`.
    pub fn compact_byte0_bits(self) -> u8 {
        (u8::from(self.mesh) << 2) | (u8::from(self.ack_required) << 1) | u8::from(self.encrypted)
    }

    /// Reconstructs the Compact-visible subset of flags from byte 0's low
    /// 3 bits.
    pub fn from_compact_byte0_bits(bits: u8) -> Self {
        Self {
            mesh: bits & 0b100 != 0,
            ack_required: bits & 0b010 != 0,
            encrypted: bits & 0b001 != 0,
            ..Self::default()
        }
    }

    /// The 2 bits packed into Compact header byte 1: `compressed,urgent`.
    pub fn compact_byte1_bits(self) -> u8 {
        (u8::from(self.compressed) << 1) | u8::from(self.urgent)
    }

    /// Merges the Compact byte-1 bits (`compressed`, `urgent`) into an
    /// already-built [`PacketFlags`].
    pub fn with_compact_byte1_bits(mut self, bits: u8) -> Self {
        self.compressed = bits & 0b10 != 0;
        self.urgent = bits & 0b01 != 0;
        self
    }

    /// Packs all seven Standard-mode flags into a single byte:
    /// `mesh,ack,enc,comp,urg,frag,more_frag,reserved`.
    pub fn to_standard_byte(self) -> u8 {
        (u8::from(self.mesh) << 7)
            | (u8::from(self.ack_required) << 6)
            | (u8::from(self.encrypted) << 5)
            | (u8::from(self.compressed) << 4)
            | (u8::from(self.urgent) << 3)
            | (u8::from(self.is_fragment) << 2)
            | (u8::from(self.more_fragments) << 1)
    }

    /// Reconstructs all seven Standard-mode flags from a flags byte.
    pub fn from_standard_byte(byte: u8) -> Self {
        Self {
            mesh: byte & 0x80 != 0,
            ack_required: byte & 0x40 != 0,
            encrypted: byte & 0x20 != 0,
            compressed: byte & 0x10 != 0,
            urgent: byte & 0x08 != 0,
            is_fragment: byte & 0x04 != 0,
            more_fragments: byte & 0x02 != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_byte_roundtrip() {
        let flags = PacketFlags {
            mesh: true,
            ack_required: false,
            encrypted: true,
            compressed: false,
            urgent: true,
            is_fragment: true,
            more_fragments: false,
        };
        let byte = flags.to_standard_byte();
        assert_eq!(PacketFlags::from_standard_byte(byte), flags);
    }

    #[test]
    fn compact_bits_roundtrip() {
        let flags =
            PacketFlags { mesh: true, ack_required: true, encrypted: false, ..Default::default() };
        let bits0 = flags.compact_byte0_bits();
        let restored = PacketFlags::from_compact_byte0_bits(bits0);
        assert_eq!(restored.mesh, flags.mesh);
        assert_eq!(restored.ack_required, flags.ack_required);
        assert_eq!(restored.encrypted, flags.encrypted);
    }

    #[test]
    fn compact_byte1_roundtrip() {
        let flags = PacketFlags { compressed: true, urgent: false, ..Default::default() };
        let bits1 = flags.compact_byte1_bits();
        let restored = PacketFlags::default().with_compact_byte1_bits(bits1);
        assert_eq!(restored.compressed, flags.compressed);
        assert_eq!(restored.urgent, flags.urgent);
    }

    #[test]
    fn reserved_bits_do_not_leak() {
        // Low bit of the standard byte is reserved and must round-trip to false.
        let flags = PacketFlags::default();
        assert_eq!(flags.to_standard_byte() & 0x01, 0);
    }
}
