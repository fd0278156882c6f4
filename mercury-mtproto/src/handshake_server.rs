//! Sans-IO server side of the auth-key handshake.
//!
//! One instance per connection. Each inbound plaintext message drives
//! exactly one transition:
//!
//! ```text
//! Idle --req_pq_multi--> PqSent --req_DH_params--> DhParamsSent
//!      --set_client_DH_params--> Succeeded
//! ```
//!
//! Any malformed, out-of-order or cryptographically inconsistent message
//! moves the machine to `Failed`, where it stays.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use mercury_crypto::{AuthKey, aes, generate_key_data_from_nonce, rsa, sha1};
use mercury_tl::{Cursor, Deserializable, Identifiable, Serializable, enums, functions, types};
use num_bigint::BigUint;

use crate::handshake::{first_salt, trim_be};

/// The 2048-bit safe prime used for the DH exchange, with generator 3.
const DH_PRIME_HEX: &[u8] = b"C71CAEB9C6B1C9048E6C522F70F13F73980D40238E3E21C14934D037563D930F\
48198A0AA7C14058229493D22530F4DBFA336F6E0AC925139543AED44CCE7C37\
20FD51F69458705AC68CD4FE6B6B13ABDC9746512969328454F18FAF8C595F64\
2477FE96BB2A941D5BCD1D4AC8CC49880708FA9B378E3C4F3A9060BEE67CF9A4\
A4A695811051907E162753B56B0F6B410DBA74D8A84B2A14B3144E0EF1284754\
FD17ED950D5965B4B9DD46582DB1178D169C6BC465B0D6FF9CA3928FEF5B9AE4\
E418FC15E83EBEA0F87FA9FF5EED70050DED2849F47BF959D956850CE929851F\
0D8115F635B105EE2E4E15D04B2454BF6F4FADF034B10403119CD8E3B92FCC5B";

const DH_G: u32 = 3;

/// Pre-computed products of two 31-bit primes offered in `resPQ`.
const PQ_PAIRS: &[(u32, u32)] = &[
    (0x494C553B, 0x53911073),
    (0x5B6878A9, 0x76D39B39),
    (0x602D971B, 0x7BCD5EB1),
    (0x49CFFB5F, 0x5A059935),
    (0x5ED88A9F, 0x630B0A47),
    (0x53466E99, 0x560B1C21),
    (0x543FB55D, 0x7AD97AF3),
    (0x4A057875, 0x66D0FE17),
];

fn dh_prime() -> BigUint {
    BigUint::parse_bytes(DH_PRIME_HEX, 16).expect("embedded prime parses")
}

/// Errors that fail the server-side handshake.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    Tl(mercury_tl::deserialize::Error),
    UnexpectedMessage { id: u32 },
    NonceMismatch,
    UnknownFingerprint { got: i64 },
    RsaDecryptFailed,
    PqMismatch,
    EncryptedDataNotPadded { len: usize },
    InvalidAnswerHash,
    GParameterOutOfRange,
    Finished,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tl(e) => write!(f, "TL: {e}"),
            Self::UnexpectedMessage { id } => {
                write!(f, "unexpected handshake message {id:#010x} for current state")
            }
            Self::NonceMismatch => write!(f, "nonce mismatch"),
            Self::UnknownFingerprint { got } => write!(f, "unknown key fingerprint {got}"),
            Self::RsaDecryptFailed => write!(f, "RSA-PAD block failed to decrypt"),
            Self::PqMismatch => write!(f, "p_q_inner_data disagrees with offered pq"),
            Self::EncryptedDataNotPadded { len } => {
                write!(f, "encrypted data len {len} is not 16-byte aligned")
            }
            Self::InvalidAnswerHash => write!(f, "client inner data hash mismatch"),
            Self::GParameterOutOfRange => write!(f, "g_b outside the safe range"),
            Self::Finished => write!(f, "handshake already finished"),
        }
    }
}

impl std::error::Error for Error {}

impl From<mercury_tl::deserialize::Error> for Error {
    fn from(e: mercury_tl::deserialize::Error) -> Self {
        Self::Tl(e)
    }
}

/// A successfully established key, handed to the send helper.
pub struct Established {
    pub auth_key: AuthKey,
    pub first_salt: i64,
}

enum State {
    Idle,
    PqSent { nonce: [u8; 16], server_nonce: [u8; 16], pq: u64, p: u32, q: u32 },
    DhParamsSent { nonce: [u8; 16], server_nonce: [u8; 16], new_nonce: [u8; 32], a: BigUint },
    Succeeded,
    Failed,
}

/// Server-side handshake state machine.
pub struct ServerHandshake {
    key: Arc<rsa::Key>,
    state: State,
}

impl ServerHandshake {
    /// A fresh machine serving with the given RSA private key.
    pub fn new(key: Arc<rsa::Key>) -> Self {
        Self { key, state: State::Idle }
    }

    /// True once the machine reached `Succeeded`.
    pub fn succeeded(&self) -> bool {
        matches!(self.state, State::Succeeded)
    }

    /// True once the machine reached `Failed`.
    pub fn failed(&self) -> bool {
        matches!(self.state, State::Failed)
    }

    /// Feed one plaintext message body. Returns the TL reply body and,
    /// on the final step, the established key.
    pub fn process_message(&mut self, body: &[u8]) -> Result<(Vec<u8>, Option<Established>), Error> {
        match self.advance(body) {
            Ok(out) => Ok(out),
            Err(e) => {
                log::warn!(target: "dh.layer", "handshake failed: {e}");
                Err(e)
            }
        }
    }

    fn advance(&mut self, body: &[u8]) -> Result<(Vec<u8>, Option<Established>), Error> {
        let mut cur = Cursor::from_slice(body);
        let id = u32::deserialize(&mut cur)?;

        // Errors leave the machine in `Failed`; the happy paths below
        // store their successor state explicitly.
        match std::mem::replace(&mut self.state, State::Failed) {
            State::Idle if id == functions::ReqPqMulti::CONSTRUCTOR_ID => {
                let req = functions::ReqPqMulti::deserialize(&mut cur)?;
                self.serve_pq(req)
            }
            State::PqSent { nonce, server_nonce, pq, p, q }
                if id == functions::ReqDhParams::CONSTRUCTOR_ID =>
            {
                let req = functions::ReqDhParams::deserialize(&mut cur)?;
                self.serve_dh_params(req, nonce, server_nonce, pq, p, q)
            }
            State::DhParamsSent { nonce, server_nonce, new_nonce, a }
                if id == functions::SetClientDhParams::CONSTRUCTOR_ID =>
            {
                let req = functions::SetClientDhParams::deserialize(&mut cur)?;
                self.accept_client_dh(req, nonce, server_nonce, new_nonce, a)
            }
            State::Succeeded | State::Failed => Err(Error::Finished),
            _ => Err(Error::UnexpectedMessage { id }),
        }
    }

    fn serve_pq(&mut self, req: functions::ReqPqMulti) -> Result<(Vec<u8>, Option<Established>), Error> {
        let mut rnd = [0u8; 17];
        getrandom::getrandom(&mut rnd).expect("getrandom failed");

        let mut server_nonce = [0u8; 16];
        server_nonce.copy_from_slice(&rnd[..16]);
        let (p, q) = PQ_PAIRS[rnd[16] as usize % PQ_PAIRS.len()];
        let pq = p as u64 * q as u64;

        log::debug!(target: "dh.layer", "serving resPQ, pq={pq:#x}");

        let reply = enums::ResPq::ResPq(types::ResPq {
            nonce: req.nonce,
            server_nonce,
            pq: pq.to_be_bytes().to_vec(),
            server_public_key_fingerprints: vec![self.key.fingerprint()],
        })
        .to_bytes();

        self.state = State::PqSent { nonce: req.nonce, server_nonce, pq, p, q };
        Ok((reply, None))
    }

    fn serve_dh_params(
        &mut self,
        req: functions::ReqDhParams,
        nonce: [u8; 16],
        server_nonce: [u8; 16],
        pq: u64,
        p: u32,
        q: u32,
    ) -> Result<(Vec<u8>, Option<Established>), Error> {
        if req.nonce != nonce || req.server_nonce != server_nonce {
            return Err(Error::NonceMismatch);
        }
        if req.public_key_fingerprint != self.key.fingerprint() {
            return Err(Error::UnknownFingerprint { got: req.public_key_fingerprint });
        }
        if req.p != trim_be(p as u64) || req.q != trim_be(q as u64) {
            return Err(Error::PqMismatch);
        }

        let padded =
            rsa::decrypt_hashed(&req.encrypted_data, &self.key).ok_or(Error::RsaDecryptFailed)?;
        let enums::PqInnerData::PqInnerData(inner) =
            enums::PqInnerData::deserialize(&mut Cursor::from_slice(&padded))?;

        if inner.pq != pq.to_be_bytes().to_vec() || inner.p != req.p || inner.q != req.q {
            return Err(Error::PqMismatch);
        }
        if inner.nonce != nonce || inner.server_nonce != server_nonce {
            return Err(Error::NonceMismatch);
        }

        let mut rnd = [0u8; 256];
        getrandom::getrandom(&mut rnd).expect("getrandom failed");
        let a = BigUint::from_bytes_be(&rnd);

        let prime = dh_prime();
        let g_a = BigUint::from(DH_G).modpow(&a, &prime);

        let server_time =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i32;

        let inner_data = enums::ServerDhInnerData::ServerDhInnerData(types::ServerDhInnerData {
            nonce,
            server_nonce,
            g: DH_G as i32,
            dh_prime: prime.to_bytes_be(),
            g_a: g_a.to_bytes_be(),
            server_time,
        })
        .to_bytes();

        // answer = SHA1(inner) || inner || padding to a block boundary
        let digest = sha1!(&inner_data);
        let pad_len = (16 - (20 + inner_data.len()) % 16) % 16;
        let mut answer = Vec::with_capacity(20 + inner_data.len() + pad_len);
        answer.extend_from_slice(&digest);
        answer.extend_from_slice(&inner_data);
        let mut pad = [0u8; 16];
        getrandom::getrandom(&mut pad).expect("getrandom failed");
        answer.extend_from_slice(&pad[..pad_len]);

        let (aes_key, aes_iv) = generate_key_data_from_nonce(&server_nonce, &inner.new_nonce);
        aes::ige_encrypt(&mut answer, &aes_key, &aes_iv);

        let reply = enums::ServerDhParams::Ok(types::ServerDhParamsOk {
            nonce,
            server_nonce,
            encrypted_answer: answer,
        })
        .to_bytes();

        self.state = State::DhParamsSent { nonce, server_nonce, new_nonce: inner.new_nonce, a };
        Ok((reply, None))
    }

    fn accept_client_dh(
        &mut self,
        req: functions::SetClientDhParams,
        nonce: [u8; 16],
        server_nonce: [u8; 16],
        new_nonce: [u8; 32],
        a: BigUint,
    ) -> Result<(Vec<u8>, Option<Established>), Error> {
        if req.nonce != nonce || req.server_nonce != server_nonce {
            return Err(Error::NonceMismatch);
        }
        if req.encrypted_data.len() % 16 != 0 {
            return Err(Error::EncryptedDataNotPadded { len: req.encrypted_data.len() });
        }

        let (aes_key, aes_iv) = generate_key_data_from_nonce(&server_nonce, &new_nonce);
        let mut plain = req.encrypted_data;
        aes::ige_decrypt(&mut plain, &aes_key, &aes_iv);

        if plain.len() < 20 {
            return Err(Error::InvalidAnswerHash);
        }
        let got_hash: [u8; 20] = plain[..20].try_into().unwrap();
        let mut cur = Cursor::from_slice(&plain[20..]);
        let enums::ClientDhInnerData::ClientDhInnerData(inner) =
            enums::ClientDhInnerData::deserialize(&mut cur)?;
        if got_hash != sha1!(&plain[20..20 + cur.pos()]) {
            return Err(Error::InvalidAnswerHash);
        }
        if inner.nonce != nonce || inner.server_nonce != server_nonce {
            return Err(Error::NonceMismatch);
        }

        let prime = dh_prime();
        let g_b = BigUint::from_bytes_be(&inner.g_b);
        let one = BigUint::from(1u32);
        let safety = &one << (2048 - 64);
        if g_b <= safety || g_b >= &prime - &safety {
            return Err(Error::GParameterOutOfRange);
        }

        let g_ab = g_b.modpow(&a, &prime);
        let mut key_bytes = [0u8; 256];
        let g_ab_bytes = g_ab.to_bytes_be();
        key_bytes[256 - g_ab_bytes.len()..].copy_from_slice(&g_ab_bytes);
        let auth_key = AuthKey::from_bytes(key_bytes);

        log::info!(
            target: "dh.layer",
            "handshake complete, auth_key_id={:#018x}", auth_key.key_id()
        );

        let reply = enums::SetClientDhParamsAnswer::DhGenOk(types::DhGenOk {
            nonce,
            server_nonce,
            new_nonce_hash1: auth_key.calc_new_nonce_hash(&new_nonce, 1),
        })
        .to_bytes();

        let established =
            Established { auth_key, first_salt: first_salt(&new_nonce, &server_nonce) };

        self.state = State::Succeeded;
        Ok((reply, Some(established)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev_keys;

    fn test_key() -> Arc<rsa::Key> {
        Arc::new(dev_keys::private_key())
    }

    #[test]
    fn rejects_out_of_order_messages() {
        let mut hs = ServerHandshake::new(test_key());
        // set_client_DH_params before req_pq_multi
        let body = functions::SetClientDhParams {
            nonce: [0; 16],
            server_nonce: [0; 16],
            encrypted_data: vec![0; 16],
        }
        .to_bytes();
        assert!(matches!(hs.process_message(&body), Err(Error::UnexpectedMessage { .. })));
        assert!(hs.failed());
    }

    #[test]
    fn failed_machine_stays_failed() {
        let mut hs = ServerHandshake::new(test_key());
        let _ = hs.process_message(&0xdeadbeefu32.to_le_bytes());
        assert!(hs.failed());
        let body = functions::ReqPqMulti { nonce: [7; 16] }.to_bytes();
        assert!(matches!(hs.process_message(&body), Err(Error::Finished)));
        assert!(hs.failed());
    }

    #[test]
    fn res_pq_echoes_client_nonce_and_offers_fingerprint() {
        let mut hs = ServerHandshake::new(test_key());
        let nonce = [0x3E; 16];
        let body = functions::ReqPqMulti { nonce }.to_bytes();
        let (reply, established) = hs.process_message(&body).unwrap();
        assert!(established.is_none());

        let enums::ResPq::ResPq(res) = enums::ResPq::from_bytes(&reply).unwrap();
        assert_eq!(res.nonce, nonce);
        assert_eq!(res.pq.len(), 8);
        assert_eq!(res.server_public_key_fingerprints, vec![test_key().fingerprint()]);

        // The offered pq must factor into a pair from the table.
        let pq = u64::from_be_bytes(res.pq.try_into().unwrap());
        let (p, q) = mercury_crypto::factorize(pq);
        assert!(PQ_PAIRS.contains(&(p as u32, q as u32)));
    }

    #[test]
    fn wrong_nonce_in_dh_params_fails() {
        let mut hs = ServerHandshake::new(test_key());
        let body = functions::ReqPqMulti { nonce: [1; 16] }.to_bytes();
        hs.process_message(&body).unwrap();

        let body = functions::ReqDhParams {
            nonce: [9; 16],
            server_nonce: [9; 16],
            p: vec![],
            q: vec![],
            public_key_fingerprint: 0,
            encrypted_data: vec![],
        }
        .to_bytes();
        assert!(matches!(hs.process_message(&body), Err(Error::NonceMismatch)));
        assert!(hs.failed());
    }
}
