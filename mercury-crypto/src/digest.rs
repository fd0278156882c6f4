//! Digest helpers.
//!
//! Every hash the protocol computes is a digest over a concatenation of
//! byte slices, so the helpers take the parts and feed them through one
//! hasher without building an intermediate buffer. The `sha1!`/`sha256!`
//! macros are the ergonomic front end: any mix of arrays, slices and
//! vectors goes in, the fixed-size digest comes out.

use sha1::{Digest, Sha1};
use sha2::Sha256;

/// SHA-1 over the concatenation of `parts`.
pub fn sha1_concat(parts: &[&[u8]]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// SHA-256 over the concatenation of `parts`.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// SHA-1 of the given byte-slice expressions, concatenated.
#[macro_export]
macro_rules! sha1 {
    ( $( $part:expr ),+ $(,)? ) => {
        $crate::digest::sha1_concat(&[ $( ::core::convert::AsRef::<[u8]>::as_ref(&$part) ),+ ])
    };
}

/// SHA-256 of the given byte-slice expressions, concatenated.
#[macro_export]
macro_rules! sha256 {
    ( $( $part:expr ),+ $(,)? ) => {
        $crate::digest::sha256_concat(&[ $( ::core::convert::AsRef::<[u8]>::as_ref(&$part) ),+ ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_matches_reference() {
        assert_eq!(
            sha1_concat(&[b"abc"]),
            [
                0xa9, 0x99, 0x3e, 0x36, 0x47, 0x06, 0x81, 0x6a, 0xba, 0x3e, 0x25, 0x71, 0x78,
                0x50, 0xc2, 0x6c, 0x9c, 0xd0, 0xd8, 0x9d,
            ]
        );
    }

    #[test]
    fn sha256_matches_reference() {
        assert_eq!(
            sha256_concat(&[b"abc"]),
            [
                0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d,
                0xae, 0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10,
                0xff, 0x61, 0xf2, 0x00, 0x15, 0xad,
            ]
        );
    }

    #[test]
    fn concatenation_is_split_independent() {
        assert_eq!(sha1_concat(&[b"a", b"bc"]), sha1_concat(&[b"abc"]));
        assert_eq!(sha256_concat(&[b"ab", b"c"]), sha256_concat(&[b"abc"]));
    }

    #[test]
    fn macros_accept_mixed_part_types() {
        let array = [1u8, 2, 3];
        let vec = vec![4u8, 5];
        let slice: &[u8] = &[6u8];
        assert_eq!(sha1!(array, vec, slice), sha1_concat(&[&[1, 2, 3], &[4, 5], &[6]]));
        assert_eq!(sha256!(&array), sha256_concat(&[&[1, 2, 3]]));
    }
}
