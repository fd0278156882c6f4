//! The RPC layer: decrypts authenticated frames, enforces the message-id
//! window, unwraps containers, answers service messages and dispatches
//! typed calls through the routing table.

pub mod error;
pub mod help;
pub mod users;

pub use error::RpcError;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mercury_mtproto::{EnvelopeError, MsgIdError, SendHelper};
use mercury_tl::{Cursor, Deserializable, Identifiable, Serializable, enums, functions, types};

use crate::api::ServerApi;
use crate::session::Session;

const MSG_CONTAINER_ID: u32 = 0x73f1f8dc;
const RPC_RESULT_ID: u32 = 0xf35c6d01;

/// A parsed operation; the variant records which run step executes.
pub enum Operation {
    Help(help::HelpOperation),
    Users(users::UsersOperation),
}

impl Operation {
    /// Execute and produce the serialized result.
    pub fn run(self, ctx: &RunContext<'_>) -> Result<Vec<u8>, RpcError> {
        match self {
            Self::Help(op) => op.run(ctx),
            Self::Users(op) => op.run(ctx),
        }
    }
}

/// What an operation may reach while running.
pub struct RunContext<'a> {
    pub api: &'a ServerApi,
    /// The user the session is authorized as, if any.
    pub requester: Option<u32>,
}

/// Parses the typed argument for a function id into an [`Operation`].
pub type OperationFactory =
    fn(u32, &mut Cursor<'_>) -> mercury_tl::deserialize::Result<Operation>;

/// The function-id → factory table. Built at startup, immutable after.
pub struct RpcRouter {
    routes: HashMap<u32, OperationFactory>,
}

impl RpcRouter {
    /// A router over every built-in namespace.
    pub fn with_builtin_factories() -> Self {
        let mut routes: HashMap<u32, OperationFactory> = HashMap::new();
        for &id in help::FUNCTION_IDS {
            routes.insert(id, help::factory);
        }
        for &id in users::FUNCTION_IDS {
            routes.insert(id, users::factory);
        }
        Self { routes }
    }

    /// The factory serving `id`, if registered.
    pub fn lookup(&self, id: u32) -> Option<OperationFactory> {
        self.routes.get(&id).copied()
    }

    /// Number of routable functions.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Errors that end the connection; anything milder is handled in-layer.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerError {
    /// Decryption or msg_key verification failed.
    Envelope(EnvelopeError),
    /// The decrypted plaintext is not a well-formed message frame.
    MalformedFrame,
}

impl std::fmt::Display for LayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Envelope(e) => write!(f, "envelope: {e}"),
            Self::MalformedFrame => write!(f, "malformed inner frame"),
        }
    }
}

impl std::error::Error for LayerError {}

impl From<EnvelopeError> for LayerError {
    fn from(e: EnvelopeError) -> Self {
        Self::Envelope(e)
    }
}

struct OutboundMessage {
    body: Vec<u8>,
    content: bool,
}

/// Per-connection RPC state. Activated once the DH layer succeeded.
pub struct RpcLayer {
    api: Arc<ServerApi>,
    connection_id: u64,
    session: Option<Arc<Mutex<Session>>>,
}

impl RpcLayer {
    pub fn new(api: Arc<ServerApi>, connection_id: u64) -> Self {
        Self { api, connection_id, session: None }
    }

    /// The session this layer currently serves, if any.
    pub fn session(&self) -> Option<&Arc<Mutex<Session>>> {
        self.session.as_ref()
    }

    /// Process one encrypted frame; returns the encrypted reply packets.
    ///
    /// An `Err` is fatal to the connection. Replayed or out-of-window
    /// messages are dropped silently (logged) per protocol.
    pub fn process_frame(
        &mut self,
        helper: &mut SendHelper,
        frame: &mut [u8],
    ) -> Result<Vec<Vec<u8>>, LayerError> {
        let plain = helper.decrypt_payload(frame)?;
        if plain.len() < 32 {
            return Err(LayerError::MalformedFrame);
        }

        let salt = i64::from_le_bytes(plain[..8].try_into().unwrap());
        let session_id = i64::from_le_bytes(plain[8..16].try_into().unwrap());
        let msg_id = i64::from_le_bytes(plain[16..24].try_into().unwrap());
        let seq_no = i32::from_le_bytes(plain[24..28].try_into().unwrap());
        let len = u32::from_le_bytes(plain[28..32].try_into().unwrap()) as usize;
        if 32 + len > plain.len() {
            return Err(LayerError::MalformedFrame);
        }
        let body = plain[32..32 + len].to_vec();

        // The first frame of an unknown session id creates the session.
        let known = self
            .session
            .as_ref()
            .map(|s| lock(s).session_id() == session_id)
            .unwrap_or(false);
        let mut created = false;
        if !known {
            let (session, fresh) =
                self.api.find_or_create_session(helper.auth_key_id(), session_id, self.connection_id);
            self.session = Some(session);
            created = fresh;
        }
        let session_arc = Arc::clone(self.session.as_ref().expect("session bound above"));
        let mut session = lock(&session_arc);
        if session.connection_id() != Some(self.connection_id) {
            log::info!(
                target: "rpc.layer",
                "session {session_id:#x} reattached to connection {}", self.connection_id
            );
            session.bind_connection(self.connection_id);
        }

        // Adopt the client's salt on a rebind; after a handshake the
        // helper already carries the first salt and these agree.
        if helper.server_salt() == 0 {
            helper.set_server_salt(salt);
        }

        let mut out = Vec::new();
        if created {
            let mut unique = [0u8; 8];
            getrandom::getrandom(&mut unique).expect("getrandom failed");
            let notice = enums::NewSession::NewSessionCreated(types::NewSessionCreated {
                first_msg_id: msg_id,
                unique_id: i64::from_le_bytes(unique),
                server_salt: helper.server_salt(),
            });
            out.push(OutboundMessage { body: notice.to_bytes(), content: false });
        }

        if salt != helper.server_salt() {
            // A stale salt skips the message entirely; the client learns
            // the asserted salt and resends under it. The message id is
            // not consumed so the resend may reuse it.
            log::warn!(target: "rpc.layer", "rejecting message {msg_id}: bad server salt {salt:#x}");
            let notice = enums::BadMsgNotification::BadServerSalt(types::BadServerSalt {
                bad_msg_id: msg_id,
                bad_msg_seqno: seq_no,
                error_code: 48,
                new_server_salt: helper.server_salt(),
            });
            out.push(OutboundMessage { body: notice.to_bytes(), content: false });
        } else if let Err(e) = session.accept_msg_id(msg_id) {
            match e {
                // Scenario: a replayed id is dropped without any reply.
                MsgIdError::Replayed => {
                    log::warn!(target: "rpc.layer", "dropping message {msg_id}: {e}");
                    return Ok(Vec::new());
                }
                MsgIdError::TooOld | MsgIdError::TooNew => {
                    log::warn!(target: "rpc.layer", "rejecting message {msg_id}: {e}");
                    let code = if e == MsgIdError::TooOld { 16 } else { 17 };
                    out.push(bad_msg_notification(msg_id, seq_no, code));
                }
            }
        } else {
            self.handle_message(msg_id, seq_no, &body, &mut session, &mut out);
        }

        // Piggyback accumulated acks on this reply batch.
        if session.has_pending_acks() {
            let acks = enums::MsgsAck::MsgsAck(types::MsgsAck { msg_ids: session.take_acks() });
            out.push(OutboundMessage { body: acks.to_bytes(), content: false });
        }

        let mut packets = Vec::with_capacity(out.len());
        for msg in out {
            let out_msg_id = session.next_msg_id();
            let out_seq_no =
                if msg.content { session.next_seq_no() } else { session.next_seq_no_unrelated() };
            let mut inner = Vec::with_capacity(32 + msg.body.len());
            inner.extend(helper.server_salt().to_le_bytes());
            inner.extend(session.session_id().to_le_bytes());
            inner.extend(out_msg_id.to_le_bytes());
            inner.extend(out_seq_no.to_le_bytes());
            inner.extend((msg.body.len() as u32).to_le_bytes());
            inner.extend(&msg.body);
            packets.push(helper.encrypt_payload(&inner)?);
        }
        Ok(packets)
    }

    /// Handle one message body; may recurse for containers. Decode errors
    /// abort this message only.
    fn handle_message(
        &self,
        msg_id: i64,
        seq_no: i32,
        body: &[u8],
        session: &mut Session,
        out: &mut Vec<OutboundMessage>,
    ) {
        let mut cur = Cursor::from_slice(body);
        let id = match u32::deserialize(&mut cur) {
            Ok(id) => id,
            Err(e) => {
                log::warn!(target: "rpc.layer", "unreadable message {msg_id}: {e}");
                return;
            }
        };

        if id == MSG_CONTAINER_ID {
            self.handle_container(&mut cur, session, out);
            return;
        }

        if id == types::MsgsAck::CONSTRUCTOR_ID {
            // Pure acks are content-unrelated and must carry an even seq_no.
            if seq_no & 1 != 0 {
                log::warn!(target: "rpc.layer", "ack message {msg_id} has odd seq_no {seq_no}");
                out.push(bad_msg_notification(msg_id, seq_no, 34));
                return;
            }
            match types::MsgsAck::deserialize(&mut cur) {
                Ok(ack) => {
                    log::debug!(target: "rpc.layer", "peer acknowledged {} messages", ack.msg_ids.len());
                }
                Err(e) => log::warn!(target: "rpc.layer", "bad msgs_ack: {e}"),
            }
            return;
        }

        if id == functions::Ping::CONSTRUCTOR_ID {
            match functions::Ping::deserialize(&mut cur) {
                Ok(ping) => {
                    let pong =
                        enums::Pong::Pong(types::Pong { msg_id, ping_id: ping.ping_id });
                    out.push(OutboundMessage { body: pong.to_bytes(), content: false });
                }
                Err(e) => log::warn!(target: "rpc.layer", "bad ping: {e}"),
            }
            return;
        }

        let Some(factory) = self.api.router().lookup(id) else {
            log::warn!(target: "rpc.layer", "no operation factory for {id:#010x}");
            return;
        };

        // RPC calls are content-bearing and must carry an odd seq_no.
        if seq_no & 1 == 0 {
            log::warn!(target: "rpc.layer", "call {msg_id} has even seq_no {seq_no}");
            out.push(bad_msg_notification(msg_id, seq_no, 35));
            return;
        }

        // A content-bearing message we act on is owed an acknowledgement.
        session.push_ack(msg_id);

        let operation = match factory(id, &mut cur) {
            Ok(op) => op,
            Err(e) => {
                log::warn!(target: "rpc.layer", "argument parse failed for {id:#010x}: {e}");
                return;
            }
        };

        let ctx = RunContext { api: self.api.as_ref(), requester: session.user_id() };
        let result = match operation.run(&ctx) {
            Ok(bytes) => bytes,
            Err(rpc_error) => {
                log::debug!(target: "rpc.layer", "call {id:#010x} answered with {rpc_error}");
                enums::RpcError::RpcError(rpc_error.to_tl()).to_bytes()
            }
        };
        out.push(OutboundMessage { body: rpc_result(msg_id, &result), content: true });
    }

    fn handle_container(
        &self,
        cur: &mut Cursor<'_>,
        session: &mut Session,
        out: &mut Vec<OutboundMessage>,
    ) {
        // msg_container: u32 count, then {msg_id, seq_no, len, body} each.
        let count = match i32::deserialize(cur) {
            Ok(n) if n >= 0 => n,
            _ => {
                log::warn!(target: "rpc.layer", "bad container header");
                return;
            }
        };
        for _ in 0..count {
            let header = (|| -> mercury_tl::deserialize::Result<(i64, i32, usize)> {
                let msg_id = i64::deserialize(cur)?;
                let seq_no = i32::deserialize(cur)?;
                let len = i32::deserialize(cur)? as usize;
                Ok((msg_id, seq_no, len))
            })();
            let (inner_id, inner_seq, len) = match header {
                Ok(h) => h,
                Err(e) => {
                    log::warn!(target: "rpc.layer", "truncated container: {e}");
                    return;
                }
            };
            let inner_body = match cur.read_slice(len) {
                Ok(b) => b,
                Err(e) => {
                    log::warn!(target: "rpc.layer", "truncated container body: {e}");
                    return;
                }
            };
            self.handle_message(inner_id, inner_seq, inner_body, session, out);
        }
    }
}

fn lock<'a>(session: &'a Arc<Mutex<Session>>) -> std::sync::MutexGuard<'a, Session> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A `bad_msg_notification` service message ready for the reply batch.
fn bad_msg_notification(msg_id: i64, seq_no: i32, error_code: i32) -> OutboundMessage {
    let notice = enums::BadMsgNotification::BadMsgNotification(types::BadMsgNotification {
        bad_msg_id: msg_id,
        bad_msg_seqno: seq_no,
        error_code,
    });
    OutboundMessage { body: notice.to_bytes(), content: false }
}

/// `rpc_result#f35c6d01 req_msg_id:long result:Object`
fn rpc_result(req_msg_id: i64, result: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(12 + result.len());
    buf.extend(RPC_RESULT_ID.to_le_bytes());
    buf.extend(req_msg_id.to_le_bytes());
    buf.extend_from_slice(result);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_serves_every_builtin_namespace() {
        let router = RpcRouter::with_builtin_factories();
        assert_eq!(router.len(), help::FUNCTION_IDS.len() + users::FUNCTION_IDS.len());
        assert!(router.lookup(functions::help::GetConfig::CONSTRUCTOR_ID).is_some());
        assert!(router.lookup(functions::users::GetUsers::CONSTRUCTOR_ID).is_some());
        assert!(router.lookup(0xdeadbeef).is_none());
    }

    #[test]
    fn rpc_result_layout() {
        let bytes = rpc_result(0x0102030405060708, &[0xAA]);
        assert_eq!(&bytes[..4], &RPC_RESULT_ID.to_le_bytes());
        assert_eq!(i64::from_le_bytes(bytes[4..12].try_into().unwrap()), 0x0102030405060708);
        assert_eq!(&bytes[12..], &[0xAA]);
    }
}
