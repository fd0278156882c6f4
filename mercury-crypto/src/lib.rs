//! Cryptographic primitives for the MTProto 2.0 core.
//!
//! Provides:
//! - AES-256-IGE encryption/decryption
//! - SHA-1 / SHA-256 hash macros
//! - Brent-rho PQ factorization
//! - RSA-PAD encryption and its server-side inverse
//! - [`AuthKey`] — the 256-byte shared key
//! - MTProto 2.0 message envelope for both directions
//! - DH nonce→key derivation

#![deny(unsafe_code)]

pub mod aes;
mod auth_key;
pub mod digest;
mod factorize;
pub mod rsa;

pub use auth_key::AuthKey;
pub use factorize::factorize;

/// Which peer authored a message. Selects the `x` offset of the MTProto
/// 2.0 KDF: 0 for client→server, 8 for server→client.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    Client,
    Server,
}

impl Side {
    fn x(self) -> usize {
        match self {
            Side::Client => 0,
            Side::Server => 8,
        }
    }

    /// The opposite side.
    pub fn other(self) -> Side {
        match self {
            Side::Client => Side::Server,
            Side::Server => Side::Client,
        }
    }
}

/// Errors from [`decrypt_data_v2`].
#[derive(Clone, Debug, PartialEq)]
pub enum DecryptError {
    /// Ciphertext too short or not block-aligned.
    InvalidBuffer,
    /// The `auth_key_id` in the envelope does not match our key.
    AuthKeyMismatch,
    /// The recomputed `msg_key` does not match the envelope.
    MessageKeyMismatch,
}

impl std::fmt::Display for DecryptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBuffer => write!(f, "invalid ciphertext buffer length"),
            Self::AuthKeyMismatch => write!(f, "auth_key_id mismatch"),
            Self::MessageKeyMismatch => write!(f, "msg_key mismatch"),
        }
    }
}

impl std::error::Error for DecryptError {}

fn calc_key(auth_key: &AuthKey, msg_key: &[u8; 16], side: Side) -> ([u8; 32], [u8; 32]) {
    let x = side.x();
    let sha_a = sha256!(msg_key, &auth_key.data[x..x + 36]);
    let sha_b = sha256!(&auth_key.data[40 + x..40 + x + 36], msg_key);

    let mut aes_key = [0u8; 32];
    aes_key[..8].copy_from_slice(&sha_a[..8]);
    aes_key[8..24].copy_from_slice(&sha_b[8..24]);
    aes_key[24..].copy_from_slice(&sha_a[24..]);

    let mut aes_iv = [0u8; 32];
    aes_iv[..8].copy_from_slice(&sha_b[..8]);
    aes_iv[8..24].copy_from_slice(&sha_a[8..24]);
    aes_iv[24..].copy_from_slice(&sha_b[24..]);

    (aes_key, aes_iv)
}

fn padding_len(len: usize) -> usize {
    16 + (16 - len % 16)
}

/// Encrypt `plain` into a full MTProto 2.0 envelope
/// `key_id || msg_key || ciphertext`, written from `side`'s point of view.
pub fn encrypt_data_v2(plain: &[u8], auth_key: &AuthKey, side: Side) -> Vec<u8> {
    let mut rnd = [0u8; 32];
    getrandom::getrandom(&mut rnd).expect("getrandom failed");
    do_encrypt_data_v2(plain, auth_key, side, &rnd)
}

pub(crate) fn do_encrypt_data_v2(
    plain: &[u8],
    auth_key: &AuthKey,
    side: Side,
    rnd: &[u8; 32],
) -> Vec<u8> {
    let pad = padding_len(plain.len());
    let mut buf = vec![0u8; 24 + plain.len() + pad];
    buf[24..24 + plain.len()].copy_from_slice(plain);
    buf[24 + plain.len()..].copy_from_slice(&rnd[..pad]);

    let x = side.x();
    let msg_key_large = sha256!(&auth_key.data[88 + x..88 + x + 32], &buf[24..]);
    let mut msg_key = [0u8; 16];
    msg_key.copy_from_slice(&msg_key_large[8..24]);

    let (key, iv) = calc_key(auth_key, &msg_key, side);
    aes::ige_encrypt(&mut buf[24..], &key, &iv);

    buf[..8].copy_from_slice(&auth_key.key_id);
    buf[8..24].copy_from_slice(&msg_key);
    buf
}

/// Decrypt an envelope authored by `from` in place.
///
/// `buffer` must hold `key_id || msg_key || ciphertext`. On success
/// returns the padded plaintext as a slice of `buffer`.
pub fn decrypt_data_v2<'a>(
    buffer: &'a mut [u8],
    auth_key: &AuthKey,
    from: Side,
) -> Result<&'a [u8], DecryptError> {
    if buffer.len() < 24 || (buffer.len() - 24) % 16 != 0 {
        return Err(DecryptError::InvalidBuffer);
    }
    if auth_key.key_id != buffer[..8] {
        return Err(DecryptError::AuthKeyMismatch);
    }
    let mut msg_key = [0u8; 16];
    msg_key.copy_from_slice(&buffer[8..24]);

    let (key, iv) = calc_key(auth_key, &msg_key, from);
    aes::ige_decrypt(&mut buffer[24..], &key, &iv);

    let x = from.x();
    let our_key = sha256!(&auth_key.data[88 + x..88 + x + 32], &buffer[24..]);
    if msg_key != our_key[8..24] {
        return Err(DecryptError::MessageKeyMismatch);
    }
    Ok(&buffer[24..])
}

/// Derive the temporary `(key, iv)` protecting the DH inner data from the
/// handshake nonces.
pub fn generate_key_data_from_nonce(
    server_nonce: &[u8; 16],
    new_nonce: &[u8; 32],
) -> ([u8; 32], [u8; 32]) {
    let h1 = sha1!(new_nonce, server_nonce);
    let h2 = sha1!(server_nonce, new_nonce);
    let h3 = sha1!(new_nonce, new_nonce);

    let mut key = [0u8; 32];
    key[..20].copy_from_slice(&h1);
    key[20..].copy_from_slice(&h2[..12]);

    let mut iv = [0u8; 32];
    iv[..8].copy_from_slice(&h2[12..]);
    iv[8..28].copy_from_slice(&h3);
    iv[28..].copy_from_slice(&new_nonce[..4]);

    (key, iv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn sample_key() -> AuthKey {
        let mut data = [0u8; 256];
        for (i, b) in data.iter_mut().enumerate() {
            *b = ((i * 7 + 3) % 256) as u8;
        }
        AuthKey::from_bytes(data)
    }

    const PLAIN: &[u8] = b"The quick brown fox jumps over the lazy dog";

    // Envelopes computed with an independent implementation, padding
    // bytes fixed at 0x55.
    const ENV_CLIENT: &str = "9ed6e6ef196cc93124d27c16b35bf59f0305d0ecf409b24591174380a56d8a63d22ebfdfc1aad1cdeea31a7d5124cb9627d728e72c0c3152bee7cc91ad14c7e0f2f3cf60037c994131194d44d5a67f6fdb8c80a3ef41eca9";
    const ENV_SERVER: &str = "9ed6e6ef196cc93127f274491f5660866e8f1568defbcf0f1db0f4dd8e5f8f318a2058dfa64b00812a8e04889100144e00e278c97bab375caf732c23216cc7e50199c5b5b6efb46667e1a68eea6b72218360d91813fea975";

    #[test]
    fn encrypt_matches_reference_both_sides() {
        let key = sample_key();
        let rnd = [0x55u8; 32];
        assert_eq!(do_encrypt_data_v2(PLAIN, &key, Side::Client, &rnd), hex(ENV_CLIENT));
        assert_eq!(do_encrypt_data_v2(PLAIN, &key, Side::Server, &rnd), hex(ENV_SERVER));
    }

    #[test]
    fn decrypt_reverses_encrypt() {
        let key = sample_key();
        for side in [Side::Client, Side::Server] {
            let mut env = encrypt_data_v2(PLAIN, &key, side);
            let plain = decrypt_data_v2(&mut env, &key, side).unwrap();
            assert_eq!(&plain[..PLAIN.len()], PLAIN);
        }
    }

    #[test]
    fn single_bit_tamper_is_detected() {
        let key = sample_key();
        let clean = encrypt_data_v2(PLAIN, &key, Side::Client);
        // Any flipped ciphertext or msg_key bit must fail verification.
        for byte in [8, 24, clean.len() - 1] {
            let mut env = clean.clone();
            env[byte] ^= 0x01;
            assert!(decrypt_data_v2(&mut env, &key, Side::Client).is_err());
        }
    }

    #[test]
    fn wrong_key_id_is_rejected() {
        let key = sample_key();
        let mut env = encrypt_data_v2(PLAIN, &key, Side::Client);
        env[0] ^= 0xff;
        assert_eq!(
            decrypt_data_v2(&mut env, &key, Side::Client),
            Err(DecryptError::AuthKeyMismatch)
        );
    }

    #[test]
    fn misaligned_buffer_is_rejected() {
        let key = sample_key();
        let mut short = vec![0u8; 23];
        assert_eq!(
            decrypt_data_v2(&mut short, &key, Side::Client),
            Err(DecryptError::InvalidBuffer)
        );
    }

    #[test]
    fn side_mismatch_fails_msg_key_check() {
        let key = sample_key();
        let mut env = encrypt_data_v2(PLAIN, &key, Side::Client);
        assert!(decrypt_data_v2(&mut env, &key, Side::Server).is_err());
    }

    #[test]
    fn nonce_key_derivation_matches_reference() {
        let server_nonce: [u8; 16] = core::array::from_fn(|i| i as u8);
        let new_nonce: [u8; 32] = core::array::from_fn(|i| (100 + i) as u8);
        let (key, iv) = generate_key_data_from_nonce(&server_nonce, &new_nonce);
        assert_eq!(
            key.to_vec(),
            hex("e95c7c3ec6aeeae100f21acfd4a819230989731d44b134a83a2e9ca0ce56c585")
        );
        assert_eq!(
            iv.to_vec(),
            hex("da23077ca3f27dec3969124214fdeeacbd8c9de3143ab8ba9423116e64656667")
        );
    }

    #[test]
    fn padding_stays_in_band() {
        for len in [0usize, 1, 15, 16, 17, 1024] {
            let pad = padding_len(len);
            assert!((12..=1024).contains(&pad));
            assert_eq!((len + pad) % 16, 0);
        }
    }
}
