//! The 2048-bit authorization key produced by the DH handshake.

use crate::sha1;

/// A 256-byte authorization key plus its pre-computed identifiers.
///
/// `key_id` is the low 64 bits of SHA-1 of the key (bytes 12..20 of the
/// digest); `aux_hash` is the high 64 bits (bytes 0..8). Both are fixed at
/// construction — an established key never changes for the lifetime of its
/// binding.
#[derive(Clone)]
pub struct AuthKey {
    pub(crate) data: [u8; 256],
    pub(crate) aux_hash: [u8; 8],
    pub(crate) key_id: [u8; 8],
}

impl AuthKey {
    /// Construct from the raw 256-byte DH output.
    pub fn from_bytes(data: [u8; 256]) -> Self {
        let sha = sha1!(&data);
        let mut aux_hash = [0u8; 8];
        aux_hash.copy_from_slice(&sha[..8]);
        let mut key_id = [0u8; 8];
        key_id.copy_from_slice(&sha[12..20]);
        Self { data, aux_hash, key_id }
    }

    /// The raw 256-byte representation.
    pub fn to_bytes(&self) -> [u8; 256] {
        self.data
    }

    /// The 8-byte key identifier in wire order.
    pub fn key_id_bytes(&self) -> [u8; 8] {
        self.key_id
    }

    /// The key identifier as the `u64` used in registries and headers.
    pub fn key_id(&self) -> u64 {
        u64::from_le_bytes(self.key_id)
    }

    /// The nonce hash sent in `dh_gen_ok` / `retry` / `fail`; `number` is
    /// 1, 2 or 3 respectively.
    pub fn calc_new_nonce_hash(&self, new_nonce: &[u8; 32], number: u8) -> [u8; 16] {
        let sha = sha1!(new_nonce, [number], self.aux_hash);
        let mut out = [0u8; 16];
        out.copy_from_slice(&sha[4..]);
        out
    }
}

impl std::fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthKey(id={:#018x})", self.key_id())
    }
}

impl PartialEq for AuthKey {
    fn eq(&self, other: &Self) -> bool {
        self.key_id == other.key_id
    }
}

impl Eq for AuthKey {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key() -> AuthKey {
        let mut data = [0u8; 256];
        for (i, b) in data.iter_mut().enumerate() {
            *b = ((i * 7 + 3) % 256) as u8;
        }
        AuthKey::from_bytes(data)
    }

    #[test]
    fn key_id_is_low_64_of_sha1() {
        let key = sample_key();
        assert_eq!(key.key_id_bytes(), [0x9e, 0xd6, 0xe6, 0xef, 0x19, 0x6c, 0xc9, 0x31]);
        assert_eq!(key.key_id(), 3587517436832175774);
    }

    #[test]
    fn aux_hash_is_high_64_of_sha1() {
        let key = sample_key();
        assert_eq!(key.aux_hash, [0x6a, 0xa0, 0xe6, 0x2c, 0xd3, 0x73, 0xdc, 0x2e]);
    }

    #[test]
    fn equality_tracks_key_id() {
        assert_eq!(sample_key(), sample_key());
        assert_ne!(sample_key(), AuthKey::from_bytes([9u8; 256]));
    }
}
