//! # mercury — an MTProto 2.0 client/server core
//!
//! `mercury` wires the focused sub-crates together for convenience:
//!
//! | Sub-crate        | Role                                               |
//! |------------------|----------------------------------------------------|
//! | `mercury-tl`     | TL wire codec and the schema subset                |
//! | `mercury-crypto` | AES-IGE, SHA, RSA-PAD, factorization, auth keys    |
//! | `mercury-mtproto`| Envelopes, send helper, both handshake sides       |
//! | `mercury-server` | Registries, sessions, connections, RPC dispatch    |
//! | `mercury-client` | Client-side data store                             |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mercury::tl::{Serializable, functions};
//!
//! // Build a raw TL request.
//! let req = functions::help::GetConfig {};
//! let bytes = req.to_bytes();
//! // Frame and send it over an MTProto connection…
//! ```

#![deny(unsafe_code)]

/// Re-export of [`mercury_tl`] — codec traits, constructors, functions, enums.
pub use mercury_tl as tl;

/// Re-export of [`mercury_crypto`] — AES-IGE, SHA, RSA, factorize, [`AuthKey`].
pub use mercury_crypto as crypto;

/// Re-export of [`mercury_mtproto`] — envelopes, send helper, handshakes.
pub use mercury_mtproto as mtproto;

/// Re-export of [`mercury_server`] — the server core.
pub use mercury_server as server;

/// Re-export of [`mercury_client`] — the client data store.
pub use mercury_client as client;

pub use mercury_crypto::AuthKey;
pub use mercury_mtproto::{SendHelper, handshake, handshake_server};
pub use mercury_server::{Connection, ServerApi, ServerConfig};
pub use mercury_tl::{Deserializable, Identifiable, RemoteCall, Serializable};
