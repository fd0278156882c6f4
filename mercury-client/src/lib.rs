//! Client-side state: the in-memory data store the RPC plumbing consults
//! to resolve peers and render conversations.

#![deny(unsafe_code)]

mod store;

pub use store::{DataStore, MessageSnapshot, Peer, channel_message_key};
