//! The [`Deserializable`] trait, the [`Cursor`] it reads from, and the
//! primitive impls.

use std::fmt;

use crate::{RawVec, VECTOR_ID};

/// Errors that can occur while decoding TL data.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Ran out of bytes before the value was fully read.
    UnexpectedEof,
    /// Read a constructor id that matches no known variant.
    UnexpectedConstructor {
        /// The offending id.
        id: u32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of buffer"),
            Self::UnexpectedConstructor { id } => {
                write!(f, "unexpected constructor id: {id:#010x}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for TL decoding.
pub type Result<T> = std::result::Result<T, Error>;

/// A forward-only cursor over an in-memory byte slice.
///
/// Overruns surface as [`Error::UnexpectedEof`] and propagate with `?`,
/// which is this crate's only failure channel.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned at the start of `buf`.
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Read one byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let b = self.buf.get(self.pos).copied().ok_or(Error::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    /// Read exactly `out.len()` bytes.
    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<()> {
        let end = self.pos + out.len();
        if end > self.buf.len() {
            return Err(Error::UnexpectedEof);
        }
        out.copy_from_slice(&self.buf[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    /// Borrow the next `len` bytes without copying.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos + len;
        if end > self.buf.len() {
            return Err(Error::UnexpectedEof);
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Consume the rest of the buffer.
    pub fn read_to_end(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }
}

/// Deserialize a value from TL binary format.
pub trait Deserializable: Sized {
    /// Read `Self` from `cur`, advancing its position.
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self>;

    /// Deserialize from a byte slice.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::deserialize(&mut Cursor::from_slice(bytes))
    }
}

impl Deserializable for bool {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        match u32::deserialize(cur)? {
            0x997275b5 => Ok(true),
            0xbc799737 => Ok(false),
            id => Err(Error::UnexpectedConstructor { id }),
        }
    }
}

macro_rules! impl_fixed {
    ($ty:ty, $len:literal) => {
        impl Deserializable for $ty {
            fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
                let mut b = [0u8; $len];
                cur.read_exact(&mut b)?;
                Ok(<$ty>::from_le_bytes(b))
            }
        }
    };
}

impl_fixed!(i32, 4);
impl_fixed!(u32, 4);
impl_fixed!(i64, 8);
impl_fixed!(f64, 8);

impl Deserializable for [u8; 16] {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let mut b = [0u8; 16];
        cur.read_exact(&mut b)?;
        Ok(b)
    }
}

impl Deserializable for [u8; 32] {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let mut b = [0u8; 32];
        cur.read_exact(&mut b)?;
        Ok(b)
    }
}

impl Deserializable for Vec<u8> {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let first = cur.read_byte()?;
        let (len, header_len) = if first != 0xfe {
            (first as usize, 1)
        } else {
            let a = cur.read_byte()? as usize;
            let b = cur.read_byte()? as usize;
            let c = cur.read_byte()? as usize;
            (a | (b << 8) | (c << 16), 4)
        };

        let data = cur.read_slice(len)?.to_vec();

        let padding = (4 - (header_len + len) % 4) % 4;
        for _ in 0..padding {
            cur.read_byte()?;
        }
        Ok(data)
    }
}

impl Deserializable for String {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let bytes = Vec::<u8>::deserialize(cur)?;
        // Telegram strings are UTF-8; anything else is a malformed message.
        String::from_utf8(bytes).map_err(|_| Error::UnexpectedEof)
    }
}

impl<T: Deserializable> Deserializable for Vec<T> {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        match u32::deserialize(cur)? {
            VECTOR_ID => {}
            id => return Err(Error::UnexpectedConstructor { id }),
        }
        let len = i32::deserialize(cur)? as usize;
        (0..len).map(|_| T::deserialize(cur)).collect()
    }
}

impl<T: Deserializable> Deserializable for RawVec<T> {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = i32::deserialize(cur)? as usize;
        let items = (0..len).map(|_| T::deserialize(cur)).collect::<Result<_>>()?;
        Ok(RawVec(items))
    }
}
