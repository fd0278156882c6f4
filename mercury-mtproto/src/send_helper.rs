//! The send helper: owns the auth key and server salt for one connection
//! and turns payloads into envelopes (and back).
//!
//! Before the handshake completes the helper has no key and only the
//! plaintext framing in [`crate::plain`] is usable; the DH layer stores
//! the established key here, after which both layers encrypt through it.

use std::fmt;

use mercury_crypto::{AuthKey, DecryptError, Side, decrypt_data_v2, encrypt_data_v2};

/// Errors from the encrypted envelope paths.
#[derive(Clone, Debug, PartialEq)]
pub enum EnvelopeError {
    /// No auth key is bound yet.
    NoAuthKey,
    /// The crypto layer rejected the envelope.
    Decrypt(DecryptError),
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAuthKey => write!(f, "no auth key bound"),
            Self::Decrypt(e) => write!(f, "decrypt: {e}"),
        }
    }
}

impl std::error::Error for EnvelopeError {}

impl From<DecryptError> for EnvelopeError {
    fn from(e: DecryptError) -> Self {
        Self::Decrypt(e)
    }
}

/// Per-connection envelope state.
pub struct SendHelper {
    side: Side,
    auth_key: Option<AuthKey>,
    server_salt: i64,
}

impl SendHelper {
    /// A helper for the given role; no key bound yet.
    pub fn new(side: Side) -> Self {
        Self { side, auth_key: None, server_salt: 0 }
    }

    /// Which role this helper writes as.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Bind an auth key; its id becomes the connection's identity.
    pub fn set_auth_key(&mut self, key: AuthKey) {
        self.auth_key = Some(key);
    }

    /// The bound key, if any.
    pub fn auth_key(&self) -> Option<&AuthKey> {
        self.auth_key.as_ref()
    }

    /// The bound key's id, or 0 while unkeyed.
    pub fn auth_key_id(&self) -> u64 {
        self.auth_key.as_ref().map(AuthKey::key_id).unwrap_or(0)
    }

    /// Current server salt.
    pub fn server_salt(&self) -> i64 {
        self.server_salt
    }

    /// Adopt a new server salt.
    pub fn set_server_salt(&mut self, salt: i64) {
        self.server_salt = salt;
    }

    /// Encrypt an inner payload into a full envelope authored by our side.
    pub fn encrypt_payload(&self, inner: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
        let key = self.auth_key.as_ref().ok_or(EnvelopeError::NoAuthKey)?;
        Ok(encrypt_data_v2(inner, key, self.side))
    }

    /// Decrypt an envelope authored by the peer, in place. Returns the
    /// padded plaintext.
    pub fn decrypt_payload<'a>(&self, frame: &'a mut [u8]) -> Result<&'a [u8], EnvelopeError> {
        let key = self.auth_key.as_ref().ok_or(EnvelopeError::NoAuthKey)?;
        Ok(decrypt_data_v2(frame, key, self.side.other())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> AuthKey {
        AuthKey::from_bytes(core::array::from_fn(|i| (i % 251) as u8))
    }

    #[test]
    fn unkeyed_helper_refuses_envelopes() {
        let helper = SendHelper::new(Side::Client);
        assert_eq!(helper.auth_key_id(), 0);
        assert_eq!(helper.encrypt_payload(b"x"), Err(EnvelopeError::NoAuthKey));
    }

    #[test]
    fn key_id_derived_on_set() {
        let mut helper = SendHelper::new(Side::Server);
        helper.set_auth_key(key());
        assert_eq!(helper.auth_key_id(), key().key_id());
    }

    #[test]
    fn client_and_server_helpers_interoperate() {
        let mut client = SendHelper::new(Side::Client);
        let mut server = SendHelper::new(Side::Server);
        client.set_auth_key(key());
        server.set_auth_key(key());

        let mut up = client.encrypt_payload(b"to server").unwrap();
        let plain = server.decrypt_payload(&mut up).unwrap();
        assert_eq!(&plain[..9], b"to server");

        let mut down = server.encrypt_payload(b"to client").unwrap();
        let plain = client.decrypt_payload(&mut down).unwrap();
        assert_eq!(&plain[..9], b"to client");
    }
}
