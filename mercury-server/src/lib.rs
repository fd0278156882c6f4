//! Server core: registries, sessions, connections and the RPC layer.

#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod connection;
pub mod rpc;
pub mod serve;
pub mod session;
pub mod user;

pub use api::ServerApi;
pub use config::ServerConfig;
pub use connection::Connection;
pub use rpc::{RpcError, RpcLayer, RpcRouter};
pub use session::Session;
pub use user::LocalUser;
