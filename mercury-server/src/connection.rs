//! One client connection: routes raw packets to the DH layer until a key
//! is established, then to the RPC layer.
//!
//! The connection is sans-IO: `process_packet` consumes one transport
//! packet and returns the packets to send back. The serving loop owns the
//! socket.

use std::sync::Arc;

use mercury_crypto::Side;
use mercury_mtproto::handshake_server::ServerHandshake;
use mercury_mtproto::{KEY_ERROR_FRAME, MsgIdGen, PlainMessage, SendHelper};

use crate::api::ServerApi;
use crate::rpc::RpcLayer;

/// Server-side connection state.
///
/// Field order is teardown order: the RPC layer goes first, then the DH
/// layer, and the send helper both of them reference goes last.
pub struct Connection {
    rpc: RpcLayer,
    dh: ServerHandshake,
    helper: SendHelper,
    api: Arc<ServerApi>,
    id: u64,
    plain_ids: MsgIdGen,
    failed: bool,
}

impl Connection {
    pub fn new(api: Arc<ServerApi>) -> Self {
        let id = api.next_connection_id();
        log::debug!(target: "remote.connection", "connection {id} created");
        Self {
            rpc: RpcLayer::new(Arc::clone(&api), id),
            dh: ServerHandshake::new(api.rsa_key()),
            helper: SendHelper::new(Side::Server),
            api,
            id,
            plain_ids: MsgIdGen::new(),
            failed: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// True once the connection is unrecoverable; the transport should
    /// close after flushing pending replies.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// True once an auth key is bound (the RPC layer is active).
    pub fn is_authenticated(&self) -> bool {
        self.helper.auth_key_id() != 0
    }

    /// The RPC layer, for introspection.
    pub fn rpc_layer(&self) -> &RpcLayer {
        &self.rpc
    }

    /// Feed one raw transport packet; returns packets to write back.
    pub fn process_packet(&mut self, packet: &[u8]) -> Vec<Vec<u8>> {
        if self.failed {
            // Once failed, every further packet gets the key error frame.
            return vec![KEY_ERROR_FRAME.to_vec()];
        }
        if packet.len() < 8 {
            log::warn!(target: "remote.connection", "runt packet ({} bytes)", packet.len());
            return self.fail_with_key_error();
        }

        let auth_key_id = u64::from_le_bytes(packet[..8].try_into().unwrap());
        if auth_key_id == 0 {
            self.process_plain(packet)
        } else if self.process_auth_key(auth_key_id) {
            let mut frame = packet.to_vec();
            match self.rpc.process_frame(&mut self.helper, &mut frame) {
                Ok(replies) => replies,
                Err(e) => {
                    // Crypto/frame failures are fatal; the session itself
                    // survives for a future reconnect.
                    log::warn!(target: "remote.connection", "connection {} failed: {e}", self.id);
                    self.failed = true;
                    Vec::new()
                }
            }
        } else {
            self.fail_with_key_error()
        }
    }

    /// Unencrypted traffic is only ever the DH handshake.
    fn process_plain(&mut self, packet: &[u8]) -> Vec<Vec<u8>> {
        let message = match PlainMessage::from_bytes(packet) {
            Ok(m) => m,
            Err(e) => {
                log::warn!(target: "remote.connection", "bad plaintext frame: {e}");
                return self.fail_with_key_error();
            }
        };

        match self.dh.process_message(&message.body) {
            Ok((reply, established)) => {
                if let Some(established) = established {
                    self.api.store_auth_key(established.auth_key.clone());
                    self.helper.set_auth_key(established.auth_key);
                    self.helper.set_server_salt(established.first_salt);
                }
                vec![PlainMessage::new(self.plain_ids.next(), reply).to_bytes()]
            }
            Err(_) => {
                // The DH layer already logged the cause.
                self.fail_with_key_error()
            }
        }
    }

    /// Port of the auth-key binding rules: accept the bound key, look up
    /// an unknown id in the registry, and fail the connection otherwise.
    fn process_auth_key(&mut self, auth_key_id: u64) -> bool {
        if auth_key_id == self.helper.auth_key_id() {
            return true;
        }
        if self.helper.auth_key_id() != 0 {
            log::info!(
                target: "remote.connection",
                "connection {}: auth_key_id {auth_key_id:#018x} differs from the expected {:#018x}",
                self.id,
                self.helper.auth_key_id()
            );
            return false;
        }
        match self.api.get_auth_key_by_id(auth_key_id) {
            Some(key) => {
                log::info!(
                    target: "remote.connection",
                    "connection {}: attached to existing auth key {auth_key_id:#018x}", self.id
                );
                self.helper.set_auth_key(key);
                true
            }
            None => {
                log::info!(
                    target: "remote.connection",
                    "connection {}: no authorization with id {auth_key_id:#018x}", self.id
                );
                false
            }
        }
    }

    fn fail_with_key_error(&mut self) -> Vec<Vec<u8>> {
        self.failed = true;
        vec![KEY_ERROR_FRAME.to_vec()]
    }
}
