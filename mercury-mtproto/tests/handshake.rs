//! Drives the client handshake steps directly against the server state
//! machine, without any transport in between.

use mercury_crypto::AuthKey;
use mercury_mtproto::{handshake, handshake_server::ServerHandshake};
use mercury_tl::{Deserializable, Serializable, enums};
use std::sync::Arc;

fn server() -> ServerHandshake {
    ServerHandshake::new(Arc::new(mercury_mtproto::dev_keys::private_key()))
}

fn client_keys() -> Vec<mercury_crypto::rsa::Key> {
    vec![mercury_mtproto::dev_keys::public_key()]
}

#[test]
fn both_sides_derive_the_same_auth_key() {
    let mut srv = server();

    let (req1, s1) = handshake::step1();
    let (reply, _) = srv.process_message(&req1.to_bytes()).unwrap();
    let res_pq = enums::ResPq::from_bytes(&reply).unwrap();

    let (req2, s2) = handshake::step2(s1, res_pq, &client_keys()).unwrap();
    let (reply, _) = srv.process_message(&req2.to_bytes()).unwrap();
    let dh_params = enums::ServerDhParams::from_bytes(&reply).unwrap();

    let (req3, s3) = handshake::step3(s2, dh_params).unwrap();
    let (reply, established) = srv.process_message(&req3.to_bytes()).unwrap();
    let answer = enums::SetClientDhParamsAnswer::from_bytes(&reply).unwrap();

    let done = handshake::finish(s3, answer).unwrap();
    let server_side = established.expect("server must report the key");

    assert!(srv.succeeded());
    assert_eq!(AuthKey::from_bytes(done.auth_key), server_side.auth_key);
    assert_eq!(done.auth_key, server_side.auth_key.to_bytes());
    assert_eq!(done.first_salt, server_side.first_salt);
}

#[test]
fn time_offset_is_small_between_local_peers() {
    let mut srv = server();

    let (req1, s1) = handshake::step1();
    let (reply, _) = srv.process_message(&req1.to_bytes()).unwrap();
    let (req2, s2) =
        handshake::step2(s1, enums::ResPq::from_bytes(&reply).unwrap(), &client_keys()).unwrap();
    let (reply, _) = srv.process_message(&req2.to_bytes()).unwrap();
    let (req3, s3) =
        handshake::step3(s2, enums::ServerDhParams::from_bytes(&reply).unwrap()).unwrap();
    let (reply, _) = srv.process_message(&req3.to_bytes()).unwrap();
    let done =
        handshake::finish(s3, enums::SetClientDhParamsAnswer::from_bytes(&reply).unwrap()).unwrap();

    assert!(done.time_offset.abs() <= 2, "local peers should agree on time");
}

#[test]
fn client_rejects_tampered_dh_answer() {
    let mut srv = server();

    let (req1, s1) = handshake::step1();
    let (reply, _) = srv.process_message(&req1.to_bytes()).unwrap();
    let (req2, s2) =
        handshake::step2(s1, enums::ResPq::from_bytes(&reply).unwrap(), &client_keys()).unwrap();
    let (reply, _) = srv.process_message(&req2.to_bytes()).unwrap();

    let mut dh_params = enums::ServerDhParams::from_bytes(&reply).unwrap();
    if let enums::ServerDhParams::Ok(ok) = &mut dh_params {
        ok.encrypted_answer[25] ^= 0x01;
    }

    // Garbled AES output shows up as either a broken SHA-1 answer hash or
    // unparseable inner data.
    assert!(handshake::step3(s2, dh_params).is_err());
}

#[test]
fn auth_key_id_matches_low_64_bits_of_sha1() {
    let mut srv = server();

    let (req1, s1) = handshake::step1();
    let (reply, _) = srv.process_message(&req1.to_bytes()).unwrap();
    let (req2, s2) =
        handshake::step2(s1, enums::ResPq::from_bytes(&reply).unwrap(), &client_keys()).unwrap();
    let (reply, _) = srv.process_message(&req2.to_bytes()).unwrap();
    let (req3, s3) =
        handshake::step3(s2, enums::ServerDhParams::from_bytes(&reply).unwrap()).unwrap();
    let (reply, established) = srv.process_message(&req3.to_bytes()).unwrap();
    let done =
        handshake::finish(s3, enums::SetClientDhParamsAnswer::from_bytes(&reply).unwrap()).unwrap();

    use sha1::{Digest, Sha1};
    let mut h = Sha1::new();
    h.update(done.auth_key);
    let sha: [u8; 20] = h.finalize().into();
    let expected = u64::from_le_bytes(sha[12..20].try_into().unwrap());
    assert_eq!(established.unwrap().auth_key.key_id(), expected);
}
