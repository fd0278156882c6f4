//! TL (Type Language) wire codec and the schema subset used by the core.
//!
//! Everything on the wire is little-endian. Boxed types carry a 32-bit
//! constructor id; the decoder dispatches on it. This crate is split the
//! usual way:
//!
//! | Module        | Contents                                             |
//! |---------------|------------------------------------------------------|
//! | [`types`]     | Concrete constructors as `struct`s                   |
//! | [`functions`] | RPC functions as `struct`s implementing [`RemoteCall`] |
//! | [`enums`]     | Boxed types as `enum`s dispatching on constructor id |
//!
//! The schema here is hand-written rather than generated: the core only
//! exercises the handshake, the service messages, and a small domain API,
//! so the full generated surface is not needed.

#![deny(unsafe_code)]

pub mod deserialize;
pub mod serialize;

pub mod enums;
pub mod functions;
pub mod types;

pub use deserialize::{Cursor, Deserializable};
pub use serialize::Serializable;

/// Constructor id of the boxed `Vector` type.
pub const VECTOR_ID: u32 = 0x1cb5c415;

/// Bare `vector<T>` — count and elements, without the boxed `Vector` id.
#[derive(Clone, Debug, PartialEq)]
pub struct RawVec<T>(pub Vec<T>);

/// Every constructor has a unique 32-bit id from the schema.
pub trait Identifiable {
    /// The constructor id.
    const CONSTRUCTOR_ID: u32;
}

/// A function that can be sent as an RPC call.
///
/// `Return` is the boxed type the peer answers with.
pub trait RemoteCall: Serializable {
    /// The deserialized response type.
    type Return: Deserializable;
}
