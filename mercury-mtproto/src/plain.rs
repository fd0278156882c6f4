//! The unauthenticated envelope used while no auth key exists (DH phase).
//!
//! Layout: `auth_key_id = 0 (8B) || message_id (8B) || length (4B) || body`.

use std::fmt;

/// Errors when parsing a plaintext frame.
#[derive(Clone, Debug, PartialEq)]
pub enum PlainError {
    /// Frame shorter than the 20-byte header.
    TooShort,
    /// The leading `auth_key_id` was not zero.
    NotPlain,
    /// The declared body length disagrees with the frame.
    BadLength,
}

impl fmt::Display for PlainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "plaintext frame too short"),
            Self::NotPlain => write!(f, "auth_key_id is not zero"),
            Self::BadLength => write!(f, "declared length exceeds frame"),
        }
    }
}

impl std::error::Error for PlainError {}

/// A plaintext MTProto message.
#[derive(Clone, Debug, PartialEq)]
pub struct PlainMessage {
    pub msg_id: i64,
    pub body: Vec<u8>,
}

impl PlainMessage {
    pub fn new(msg_id: i64, body: Vec<u8>) -> Self {
        Self { msg_id, body }
    }

    /// Frame for the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(20 + self.body.len());
        buf.extend(0u64.to_le_bytes());
        buf.extend(self.msg_id.to_le_bytes());
        buf.extend((self.body.len() as u32).to_le_bytes());
        buf.extend(&self.body);
        buf
    }

    /// Parse a frame received from the wire.
    pub fn from_bytes(frame: &[u8]) -> Result<Self, PlainError> {
        if frame.len() < 20 {
            return Err(PlainError::TooShort);
        }
        if frame[..8] != [0u8; 8] {
            return Err(PlainError::NotPlain);
        }
        let msg_id = i64::from_le_bytes(frame[8..16].try_into().unwrap());
        let len = u32::from_le_bytes(frame[16..20].try_into().unwrap()) as usize;
        if 20 + len > frame.len() {
            return Err(PlainError::BadLength);
        }
        Ok(Self { msg_id, body: frame[20..20 + len].to_vec() })
    }
}
