//! End-to-end scenarios: a real client (handshake steps + client-side
//! send helper) talking to the server's sans-IO connection.

use std::sync::Arc;

use mercury_crypto::{AuthKey, Side};
use mercury_mtproto::{KEY_ERROR_FRAME, MsgIdGen, PlainMessage, SendHelper, dev_keys, handshake};
use mercury_server::{Connection, ServerApi, ServerConfig};
use mercury_tl::{Cursor, Deserializable, Serializable, enums, functions, types};

fn new_api() -> Arc<ServerApi> {
    ServerApi::new(ServerConfig::default()).unwrap()
}

/// A minimal in-test client: owns the client half of the session state.
struct TestClient {
    helper: SendHelper,
    session_id: i64,
    msg_ids: MsgIdGen,
    sequence: i32,
}

impl TestClient {
    /// Run the full DH handshake against `conn`.
    fn handshake(conn: &mut Connection) -> TestClient {
        let mut plain_ids = MsgIdGen::new();
        let keys = vec![dev_keys::public_key()];

        let send_plain = |conn: &mut Connection, ids: &mut MsgIdGen, body: Vec<u8>| -> Vec<u8> {
            let packet = PlainMessage::new(ids.next(), body).to_bytes();
            let mut replies = conn.process_packet(&packet);
            assert_eq!(replies.len(), 1, "handshake step expects one reply");
            PlainMessage::from_bytes(&replies.remove(0)).unwrap().body
        };

        let (req1, s1) = handshake::step1();
        let reply = send_plain(conn, &mut plain_ids, req1.to_bytes());
        let (req2, s2) =
            handshake::step2(s1, enums::ResPq::from_bytes(&reply).unwrap(), &keys).unwrap();
        let reply = send_plain(conn, &mut plain_ids, req2.to_bytes());
        let (req3, s3) =
            handshake::step3(s2, enums::ServerDhParams::from_bytes(&reply).unwrap()).unwrap();
        let reply = send_plain(conn, &mut plain_ids, req3.to_bytes());
        let done =
            handshake::finish(s3, enums::SetClientDhParamsAnswer::from_bytes(&reply).unwrap())
                .unwrap();

        let mut helper = SendHelper::new(Side::Client);
        helper.set_auth_key(AuthKey::from_bytes(done.auth_key));
        helper.set_server_salt(done.first_salt);

        let mut session_id_bytes = [0u8; 8];
        getrandom::getrandom(&mut session_id_bytes).unwrap();
        TestClient {
            helper,
            session_id: i64::from_le_bytes(session_id_bytes),
            msg_ids: MsgIdGen::new(),
            sequence: 0,
        }
    }

    /// A client sharing this client's auth key but nothing else — what a
    /// reconnect from the same device looks like.
    fn reconnected(&self) -> TestClient {
        let mut helper = SendHelper::new(Side::Client);
        helper.set_auth_key(self.helper.auth_key().unwrap().clone());
        helper.set_server_salt(self.helper.server_salt());
        TestClient {
            helper,
            session_id: self.session_id.wrapping_add(1),
            msg_ids: MsgIdGen::new(),
            sequence: 0,
        }
    }

    /// Frame and encrypt one message with explicit salt and seq_no, for
    /// tests that deliberately violate either.
    fn encrypt_with(&mut self, body: &[u8], salt: i64, seq_no: i32) -> Vec<u8> {
        let msg_id = self.msg_ids.next();
        let mut inner = Vec::with_capacity(32 + body.len());
        inner.extend(salt.to_le_bytes());
        inner.extend(self.session_id.to_le_bytes());
        inner.extend(msg_id.to_le_bytes());
        inner.extend(seq_no.to_le_bytes());
        inner.extend((body.len() as u32).to_le_bytes());
        inner.extend_from_slice(body);
        self.helper.encrypt_payload(&inner).unwrap()
    }

    fn encrypt_message(&mut self, body: &[u8]) -> Vec<u8> {
        let seq_no = self.sequence * 2 + 1;
        self.sequence += 1;
        let salt = self.helper.server_salt();
        self.encrypt_with(body, salt, seq_no)
    }

    fn decrypt_replies(&self, replies: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
        replies
            .into_iter()
            .map(|mut reply| {
                let plain = self.helper.decrypt_payload(&mut reply).unwrap();
                let len = u32::from_le_bytes(plain[28..32].try_into().unwrap()) as usize;
                plain[32..32 + len].to_vec()
            })
            .collect()
    }

    /// Send a serialized call and return the decrypted reply bodies.
    fn send(&mut self, conn: &mut Connection, body: &[u8]) -> Vec<Vec<u8>> {
        let packet = self.encrypt_message(body);
        self.decrypt_replies(conn.process_packet(&packet))
    }

    /// Pick the `rpc_result` payload out of a reply batch.
    fn rpc_result(replies: &[Vec<u8>]) -> Option<Vec<u8>> {
        replies.iter().find_map(|body| {
            let mut cur = Cursor::from_slice(body);
            match u32::deserialize(&mut cur) {
                Ok(0xf35c6d01) => {
                    let _req_msg_id = i64::deserialize(&mut cur).unwrap();
                    Some(cur.read_to_end().to_vec())
                }
                _ => None,
            }
        })
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn full_handshake_binds_auth_key() {
    let api = new_api();
    let mut conn = Connection::new(Arc::clone(&api));

    let client = TestClient::handshake(&mut conn);

    assert!(conn.is_authenticated());
    assert!(!conn.is_failed());
    // The established key is registered for future connections.
    let key_id = client.helper.auth_key().unwrap().key_id();
    assert!(api.get_auth_key_by_id(key_id).is_some());
}

#[test]
fn get_config_returns_configured_dc_options() {
    let api = new_api();
    let mut conn = Connection::new(Arc::clone(&api));
    let mut client = TestClient::handshake(&mut conn);

    let replies = client.send(&mut conn, &functions::help::GetConfig {}.to_bytes());
    let result = TestClient::rpc_result(&replies).expect("rpc_result expected");

    let enums::Config::Config(config) = enums::Config::from_bytes(&result).unwrap();
    assert_eq!(config.this_dc, 1);
    assert_eq!(config.dc_options.len(), 1);
    let enums::DcOption::DcOption(dc) = &config.dc_options[0];
    assert_eq!(dc.ip_address, "127.0.0.1");
    assert_eq!(dc.port, 4430);
}

#[test]
fn first_message_reports_new_session() {
    let api = new_api();
    let mut conn = Connection::new(Arc::clone(&api));
    let mut client = TestClient::handshake(&mut conn);

    let replies = client.send(&mut conn, &functions::help::GetConfig {}.to_bytes());
    let new_session = replies.iter().any(|body| {
        enums::NewSession::from_bytes(body).is_ok()
    });
    assert!(new_session, "first frame of a session must announce new_session_created");
}

#[test]
fn unknown_user_gets_user_id_invalid() {
    let api = new_api();
    let mut conn = Connection::new(Arc::clone(&api));
    let mut client = TestClient::handshake(&mut conn);

    let call = functions::users::GetFullUser {
        id: enums::InputUser::User(types::InputUser { user_id: 999, access_hash: 0 }),
    };
    let replies = client.send(&mut conn, &call.to_bytes());
    let result = TestClient::rpc_result(&replies).unwrap();

    let enums::RpcError::RpcError(err) = enums::RpcError::from_bytes(&result).unwrap();
    assert_eq!(err.error_code, 400);
    assert_eq!(err.error_message, "USER_ID_INVALID");
}

#[test]
fn registered_user_resolves_with_access_hash() {
    let api = new_api();
    let alice = api.add_user("+1000");
    let mut conn = Connection::new(Arc::clone(&api));
    let mut client = TestClient::handshake(&mut conn);

    let call = functions::users::GetUsers {
        id: vec![enums::InputUser::User(types::InputUser {
            user_id: alice.id as i32,
            access_hash: alice.access_hash,
        })],
    };
    let replies = client.send(&mut conn, &call.to_bytes());
    let result = TestClient::rpc_result(&replies).unwrap();

    let users = Vec::<enums::User>::from_bytes(&result).unwrap();
    assert_eq!(users.len(), 1);
    let enums::User::User(user) = &users[0] else { panic!("expected full user") };
    assert_eq!(user.id, alice.id as i32);
    assert!(!user.is_self);
}

#[test]
fn self_lookup_after_session_authorization() {
    let api = new_api();
    let alice = api.add_user("+1000");
    let mut conn = Connection::new(Arc::clone(&api));
    let mut client = TestClient::handshake(&mut conn);

    // Create the session with a first call, then authorize it.
    client.send(&mut conn, &functions::help::GetConfig {}.to_bytes());
    assert!(api.bind_session_user(client.session_id, alice.id));

    let call = functions::users::GetFullUser { id: enums::InputUser::SelfUser };
    let replies = client.send(&mut conn, &call.to_bytes());
    let result = TestClient::rpc_result(&replies).unwrap();

    let enums::UserFull::UserFull(full) = enums::UserFull::from_bytes(&result).unwrap();
    let enums::User::User(user) = full.user else { panic!("expected full user") };
    assert!(user.is_self);
    assert_eq!(user.id, alice.id as i32);
}

#[test]
fn session_rebinds_to_new_connection_by_key_id() {
    let api = new_api();
    let mut conn_a = Connection::new(Arc::clone(&api));
    let client_a = TestClient::handshake(&mut conn_a);

    // Connection B never handshakes; its first packet presents the key id.
    let mut conn_b = Connection::new(Arc::clone(&api));
    let mut client_b = client_a.reconnected();
    let replies = client_b.send(&mut conn_b, &functions::help::GetConfig {}.to_bytes());

    assert!(conn_b.is_authenticated());
    assert!(TestClient::rpc_result(&replies).is_some());
}

#[test]
fn unknown_auth_key_gets_error_frame_and_fails() {
    let api = new_api();
    let mut conn = Connection::new(api);

    let mut packet = 0xDEADBEEFDEADBEEFu64.to_le_bytes().to_vec();
    packet.extend_from_slice(&[0u8; 32]);
    assert_eq!(conn.process_packet(&packet), vec![KEY_ERROR_FRAME.to_vec()]);
    assert!(conn.is_failed());

    // Every subsequent packet gets the same frame.
    assert_eq!(conn.process_packet(&packet), vec![KEY_ERROR_FRAME.to_vec()]);
}

#[test]
fn replayed_message_id_is_dropped_silently() {
    let api = new_api();
    let mut conn = Connection::new(Arc::clone(&api));
    let mut client = TestClient::handshake(&mut conn);

    let packet = client.encrypt_message(&functions::help::GetConfig {}.to_bytes());
    let first = conn.process_packet(&packet);
    assert!(!first.is_empty());

    // Byte-identical replay: same msg_id, dropped without a reply.
    let second = conn.process_packet(&packet);
    assert!(second.is_empty());
    assert!(!conn.is_failed(), "a replay must not kill the connection");
}

#[test]
fn tampered_envelope_is_fatal_but_session_survives() {
    let api = new_api();
    let mut conn = Connection::new(Arc::clone(&api));
    let mut client = TestClient::handshake(&mut conn);

    client.send(&mut conn, &functions::help::GetConfig {}.to_bytes());

    let mut packet = client.encrypt_message(&functions::help::GetConfig {}.to_bytes());
    let last = packet.len() - 1;
    packet[last] ^= 1;
    assert!(conn.process_packet(&packet).is_empty());
    assert!(conn.is_failed());

    // The session can be reattached from a fresh connection.
    let mut conn_b = Connection::new(Arc::clone(&api));
    let mut client_b = client.reconnected();
    let replies = client_b.send(&mut conn_b, &functions::help::GetConfig {}.to_bytes());
    assert!(TestClient::rpc_result(&replies).is_some());
}

#[test]
fn container_dispatches_every_inner_call() {
    let api = new_api();
    let mut conn = Connection::new(Arc::clone(&api));
    let mut client = TestClient::handshake(&mut conn);

    // msg_container with two help.getConfig calls.
    let call = functions::help::GetConfig {}.to_bytes();
    let mut container = Vec::new();
    container.extend(0x73f1f8dcu32.to_le_bytes());
    container.extend(2i32.to_le_bytes());
    for _ in 0..2 {
        container.extend(client.msg_ids.next().to_le_bytes());
        container.extend(1i32.to_le_bytes());
        container.extend((call.len() as i32).to_le_bytes());
        container.extend_from_slice(&call);
    }

    let replies = client.send(&mut conn, &container);
    let results = replies
        .iter()
        .filter(|body| body.starts_with(&0xf35c6d01u32.to_le_bytes()))
        .count();
    assert_eq!(results, 2);
}

#[test]
fn ping_is_answered_with_pong() {
    let api = new_api();
    let mut conn = Connection::new(Arc::clone(&api));
    let mut client = TestClient::handshake(&mut conn);

    let replies = client.send(&mut conn, &functions::Ping { ping_id: 0x55AA }.to_bytes());
    let pong = replies
        .iter()
        .find_map(|body| enums::Pong::from_bytes(body).ok())
        .expect("pong expected");
    let enums::Pong::Pong(pong) = pong;
    assert_eq!(pong.ping_id, 0x55AA);
}

#[test]
fn stale_salt_is_answered_with_bad_server_salt() {
    let api = new_api();
    let mut conn = Connection::new(Arc::clone(&api));
    let mut client = TestClient::handshake(&mut conn);

    let call = functions::help::GetConfig {}.to_bytes();
    let good_salt = client.helper.server_salt();
    let packet = client.encrypt_with(&call, good_salt ^ 0x55, 1);
    let replies = client.decrypt_replies(conn.process_packet(&packet));

    // The call is not processed; the client is told the asserted salt.
    assert!(TestClient::rpc_result(&replies).is_none());
    let notice = replies
        .iter()
        .find_map(|body| match enums::BadMsgNotification::from_bytes(body).ok()? {
            enums::BadMsgNotification::BadServerSalt(n) => Some(n),
            _ => None,
        })
        .expect("bad_server_salt expected");
    assert_eq!(notice.error_code, 48);
    assert_eq!(notice.new_server_salt, good_salt);
    assert!(!conn.is_failed());

    // A resend under the asserted salt goes through.
    let replies = client.send(&mut conn, &call);
    assert!(TestClient::rpc_result(&replies).is_some());
}

#[test]
fn even_seq_no_on_a_call_is_rejected() {
    let api = new_api();
    let mut conn = Connection::new(Arc::clone(&api));
    let mut client = TestClient::handshake(&mut conn);

    let call = functions::help::GetConfig {}.to_bytes();
    let salt = client.helper.server_salt();
    // Content-bearing messages must use odd seq_no; 2 is a violation.
    let packet = client.encrypt_with(&call, salt, 2);
    let replies = client.decrypt_replies(conn.process_packet(&packet));

    assert!(TestClient::rpc_result(&replies).is_none());
    let notice = replies
        .iter()
        .find_map(|body| match enums::BadMsgNotification::from_bytes(body).ok()? {
            enums::BadMsgNotification::BadMsgNotification(n) => Some(n),
            _ => None,
        })
        .expect("bad_msg_notification expected");
    assert_eq!(notice.error_code, 35);
    assert!(!conn.is_failed());

    // The session keeps working with the proper parity.
    let replies = client.send(&mut conn, &call);
    assert!(TestClient::rpc_result(&replies).is_some());
}

#[test]
fn replies_carry_acks_for_content_messages() {
    let api = new_api();
    let mut conn = Connection::new(Arc::clone(&api));
    let mut client = TestClient::handshake(&mut conn);

    let replies = client.send(&mut conn, &functions::help::GetConfig {}.to_bytes());
    let acked = replies.iter().find_map(|body| {
        let enums::MsgsAck::MsgsAck(ack) = enums::MsgsAck::from_bytes(body).ok()?;
        Some(ack.msg_ids)
    });
    assert!(acked.map(|ids| !ids.is_empty()).unwrap_or(false), "expected piggybacked msgs_ack");
}
