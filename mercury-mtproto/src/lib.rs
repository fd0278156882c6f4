//! MTProto 2.0 session plumbing: message ids, envelopes, the send helper,
//! and both sides of the auth-key handshake.
//!
//! Everything here is sans-IO: the serving loop (or any other transport)
//! feeds complete packets in and writes the returned packets out.

#![deny(unsafe_code)]

pub mod dc;
pub mod dev_keys;
pub mod handshake;
pub mod handshake_server;
pub mod message;
pub mod plain;
pub mod send_helper;

pub use message::{MSG_ID_WINDOW_SECS, MsgIdError, MsgIdGen, MsgIdWindow};
pub use plain::PlainMessage;
pub use send_helper::{EnvelopeError, SendHelper};

/// The 4-byte frame a server answers with when it cannot accept the
/// presented auth key: `6c fe ff ff` (little-endian `-404`).
pub const KEY_ERROR_FRAME: [u8; 4] = [0x6c, 0xfe, 0xff, 0xff];
