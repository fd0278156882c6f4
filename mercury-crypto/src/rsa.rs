//! RSA with the MTProto RSA-PAD scheme, in both directions.
//!
//! The client encrypts `p_q_inner_data` against the server's public key;
//! a server holding the private exponent reverses the scheme with
//! [`decrypt_hashed`]. Key fingerprints identify which public key a
//! `resPQ` offers.

use num_bigint::BigUint;

use crate::{aes, sha1, sha256};

/// An RSA key. Public `(n, e)` always; `d` present only on the serving
/// side.
pub struct Key {
    n: BigUint,
    e: BigUint,
    d: Option<BigUint>,
}

impl Key {
    /// Parse a public key from decimal `n` and `e` strings.
    pub fn new(n: &str, e: &str) -> Option<Self> {
        Some(Self {
            n: BigUint::parse_bytes(n.as_bytes(), 10)?,
            e: BigUint::parse_bytes(e.as_bytes(), 10)?,
            d: None,
        })
    }

    /// Parse a private key from decimal `n`, `e` and `d` strings.
    pub fn new_private(n: &str, e: &str, d: &str) -> Option<Self> {
        Some(Self {
            d: Some(BigUint::parse_bytes(d.as_bytes(), 10)?),
            ..Self::new(n, e)?
        })
    }

    /// True if this key can decrypt.
    pub fn has_private_part(&self) -> bool {
        self.d.is_some()
    }

    /// The 64-bit fingerprint: low 64 bits of SHA-1 over the TL
    /// serialization of `(n, e)` as big-endian byte strings.
    pub fn fingerprint(&self) -> i64 {
        let mut buf = Vec::new();
        tl_bytes(&self.n.to_bytes_be(), &mut buf);
        tl_bytes(&self.e.to_bytes_be(), &mut buf);
        let sha = sha1!(&buf);
        i64::from_le_bytes(sha[12..20].try_into().unwrap())
    }
}

/// TL `bytes` encoding, needed locally for the fingerprint.
fn tl_bytes(data: &[u8], out: &mut Vec<u8>) {
    let header_len = if data.len() <= 253 {
        out.push(data.len() as u8);
        1
    } else {
        out.extend([0xfe, data.len() as u8, (data.len() >> 8) as u8, (data.len() >> 16) as u8]);
        4
    };
    out.extend_from_slice(data);
    out.extend(std::iter::repeat(0).take((4 - (header_len + data.len()) % 4) % 4));
}

fn increment(data: &mut [u8]) {
    let mut i = data.len() - 1;
    loop {
        let (n, overflow) = data[i].overflowing_add(1);
        data[i] = n;
        if overflow {
            i = i.checked_sub(1).unwrap_or(data.len() - 1);
        } else {
            break;
        }
    }
}

/// RSA-encrypt `data` using the RSA-PAD scheme.
///
/// `random_bytes` must be 224 bytes of secure random data (192 of padding
/// plus a 32-byte temporary AES key). `data` must be at most 144 bytes.
pub fn encrypt_hashed(data: &[u8], key: &Key, random_bytes: &[u8; 224]) -> Vec<u8> {
    assert!(data.len() <= 144, "data too large for RSA-PAD");

    let mut data_with_padding = Vec::with_capacity(192);
    data_with_padding.extend_from_slice(data);
    data_with_padding.extend_from_slice(&random_bytes[..192 - data.len()]);

    let data_pad_reversed: Vec<u8> = data_with_padding.iter().copied().rev().collect();

    let mut temp_key: [u8; 32] = random_bytes[192..].try_into().unwrap();

    let key_aes_encrypted = loop {
        let mut data_with_hash = Vec::with_capacity(224);
        data_with_hash.extend_from_slice(&data_pad_reversed);
        data_with_hash.extend_from_slice(&sha256!(&temp_key, &data_with_padding));

        aes::ige_encrypt(&mut data_with_hash, &temp_key, &[0u8; 32]);

        // temp_key_xor = temp_key XOR SHA256(aes_encrypted)
        let hash = sha256!(&data_with_hash);
        let mut xored = temp_key;
        for (a, b) in xored.iter_mut().zip(hash.iter()) {
            *a ^= b;
        }

        let mut candidate = Vec::with_capacity(256);
        candidate.extend_from_slice(&xored);
        candidate.extend_from_slice(&data_with_hash);

        if BigUint::from_bytes_be(&candidate) < key.n {
            break candidate;
        }
        // Candidate not below the modulus; pick the next temp key.
        increment(&mut temp_key);
    };

    let payload = BigUint::from_bytes_be(&key_aes_encrypted);
    let encrypted = payload.modpow(&key.e, &key.n);
    let mut block = encrypted.to_bytes_be();
    while block.len() < 256 {
        block.insert(0, 0);
    }
    block
}

/// Reverse [`encrypt_hashed`]. Requires the private part of `key`.
///
/// Returns the 192-byte `data_with_padding` on success (callers TL-parse
/// from the front); `None` if the block fails the integrity hash.
pub fn decrypt_hashed(block: &[u8], key: &Key) -> Option<Vec<u8>> {
    let d = key.d.as_ref()?;
    if block.len() != 256 {
        return None;
    }

    let decrypted = BigUint::from_bytes_be(block).modpow(d, &key.n);
    let mut buf = decrypted.to_bytes_be();
    while buf.len() < 256 {
        buf.insert(0, 0);
    }

    let (temp_key_xor, aes_encrypted) = buf.split_at(32);

    let hash = sha256!(aes_encrypted);
    let mut temp_key = [0u8; 32];
    for (t, (x, h)) in temp_key.iter_mut().zip(temp_key_xor.iter().zip(hash.iter())) {
        *t = x ^ h;
    }

    let mut data_with_hash = aes_encrypted.to_vec();
    aes::ige_decrypt(&mut data_with_hash, &temp_key, &[0u8; 32]);

    let (data_pad_reversed, got_hash) = data_with_hash.split_at(192);
    let data_with_padding: Vec<u8> = data_pad_reversed.iter().copied().rev().collect();

    if got_hash != sha256!(&temp_key, &data_with_padding) {
        return None;
    }
    Some(data_with_padding)
}
