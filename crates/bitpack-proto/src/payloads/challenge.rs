//! Zero-knowledge challenge payload: proves knowledge of a shared secret
//! without transmitting it.

use crate::{error::ProtocolError, opcode::MessageType};

const HAS_SENDER_BIT: u8 = 0x80;
const HAS_RECIPIENT_BIT: u8 = 0x40;
const SALT_LEN: usize = 16;

/// The fixed plaintext a correct response must decrypt to: the 8-byte
/// marker `"BITPACK\0"` followed by 8 random bytes.
pub const CHALLENGE_MARKER: &[u8; 8] = b"BITPACK\0";

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

/// A handshake challenge: a salt, a human-readable prompt, and ciphertext
/// the responder must be able to decrypt to prove shared-secret knowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengePayload {
    /// Sender identifier, if present.
    pub sender: Option<String>,
    /// Recipient identifier, if present.
    pub recipient: Option<String>,
    /// PBKDF2 salt used to derive the challenge key.
    pub salt: [u8; SALT_LEN],
    /// A human-readable prompt describing the shared secret in use.
    pub question: String,
    /// Encrypted challenge block (nonce || ciphertext || tag).
    pub ciphertext: Vec<u8>,
}

impl ChallengePayload {
    /// The wire type for this payload.
    pub fn message_type(&self) -> MessageType {
        MessageType::Challenge
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
        out.extend_from_slice(&self.salt);

        let question_bytes = self.question.as_bytes();
        if question_bytes.len() > u8::MAX as usize {
            return Err(ProtocolError::OutOfRange {
                field: "question",
                value: question_bytes.len() as i64,
                min: 0,
                max: i64::from(u8::MAX),
            });
        }
        out.push(question_bytes.len() as u8);
        out.extend_from_slice(question_bytes);
        out.extend_from_slice(&self.ciphertext);
        Ok(out)
    }

    /// Decodes this payload.
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

        if rest.len() < SALT_LEN {
            return Err(ProtocolError::InsufficientBytes { needed: SALT_LEN, available: rest.len() });
        }
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&rest[..SALT_LEN]);
        rest = &rest[SALT_LEN..];

        let question_len =
            usize::from(*rest.first().ok_or(ProtocolError::InsufficientBytes { needed: 1, available: 0 })?);
        let question_bytes = rest.get(1..1 + question_len).ok_or(ProtocolError::InsufficientBytes {
            needed: 1 + question_len,
            available: rest.len(),
        })?;
        let question = std::str::from_utf8(question_bytes)
            .map_err(|_| ProtocolError::Utf8Decode { field: "question" })?
            .to_string();
        let ciphertext = rest[1 + question_len..].to_vec();

        Ok(Self { sender, recipient, salt, question, ciphertext })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let payload = ChallengePayload {
            sender: Some("relay-1".into()),
            recipient: None,
            salt: [7u8; SALT_LEN],
            question: "shared passphrase?".into(),
            ciphertext: vec![1, 2, 3, 4, 5],
        };
        let bytes = payload.encode().unwrap();
        assert_eq!(ChallengePayload::decode(&bytes).unwrap(), payload);
    }

    #[test]
    fn decode_rejects_truncated_salt() {
        let bytes = vec![0u8, 1, 2, 3];
        assert!(ChallengePayload::decode(&bytes).is_err());
    }
}
