//! AES-256 in IGE (infinite garble extension) mode.
//!
//! IGE chains both the previous plaintext and the previous ciphertext
//! block into each encryption, so the 32-byte IV is really two 16-byte
//! halves: the ciphertext seed followed by the plaintext seed.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

const BLOCK: usize = 16;

fn xor_block(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Encrypt `data` in place. `data.len()` must be a multiple of 16.
pub fn ige_encrypt(data: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) {
    assert_eq!(data.len() % BLOCK, 0, "IGE requires block-aligned input");
    let cipher = Aes256::new(GenericArray::from_slice(key));

    let mut prev_cipher = [0u8; BLOCK];
    let mut prev_plain = [0u8; BLOCK];
    prev_cipher.copy_from_slice(&iv[..BLOCK]);
    prev_plain.copy_from_slice(&iv[BLOCK..]);

    for chunk in data.chunks_exact_mut(BLOCK) {
        let plain: [u8; BLOCK] = chunk.try_into().unwrap();
        xor_block(chunk, &prev_cipher);
        cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
        xor_block(chunk, &prev_plain);
        prev_cipher.copy_from_slice(chunk);
        prev_plain = plain;
    }
}

/// Decrypt `data` in place. `data.len()` must be a multiple of 16.
pub fn ige_decrypt(data: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) {
    assert_eq!(data.len() % BLOCK, 0, "IGE requires block-aligned input");
    let cipher = Aes256::new(GenericArray::from_slice(key));

    let mut prev_cipher = [0u8; BLOCK];
    let mut prev_plain = [0u8; BLOCK];
    prev_cipher.copy_from_slice(&iv[..BLOCK]);
    prev_plain.copy_from_slice(&iv[BLOCK..]);

    for chunk in data.chunks_exact_mut(BLOCK) {
        let encrypted: [u8; BLOCK] = chunk.try_into().unwrap();
        xor_block(chunk, &prev_plain);
        cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
        xor_block(chunk, &prev_cipher);
        prev_cipher = encrypted;
        prev_plain.copy_from_slice(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Vector cross-checked against an independent IGE implementation:
    // key = 00..1f, iv = 20..3f, plaintext = 40..5f.
    const KEY: [u8; 32] = {
        let mut k = [0u8; 32];
        let mut i = 0;
        while i < 32 {
            k[i] = i as u8;
            i += 1;
        }
        k
    };

    fn iota(start: u8, len: usize) -> Vec<u8> {
        (0..len).map(|i| start + i as u8).collect()
    }

    #[test]
    fn known_answer() {
        let iv: [u8; 32] = iota(32, 32).try_into().unwrap();
        let mut data = iota(64, 32);
        ige_encrypt(&mut data, &KEY, &iv);
        assert_eq!(
            data,
            [
                0xb6, 0xb2, 0x3c, 0xb4, 0x6d, 0x2f, 0x43, 0xde, 0x2c, 0x67, 0xfc, 0x9a, 0x3a,
                0x9e, 0x35, 0x10, 0x4f, 0xad, 0x6e, 0xd1, 0x51, 0x77, 0x96, 0x9c, 0x1c, 0xeb,
                0xc6, 0x16, 0xbc, 0xfa, 0x48, 0x2c,
            ]
        );
    }

    #[test]
    fn roundtrip() {
        let iv: [u8; 32] = iota(7, 32).try_into().unwrap();
        let plain = iota(100, 64);
        let mut data = plain.clone();
        ige_encrypt(&mut data, &KEY, &iv);
        assert_ne!(data, plain);
        ige_decrypt(&mut data, &KEY, &iv);
        assert_eq!(data, plain);
    }
}
