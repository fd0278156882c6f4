//! Sans-IO client side of the auth-key handshake.
//!
//! # Flow
//!
//! ```text
//! let (req, s1) = handshake::step1()?;
//! // send req, receive resp
//! let (req, s2) = handshake::step2(s1, resp, &server_keys)?;
//! // send req, receive resp
//! let (req, s3) = handshake::step3(s2, resp)?;
//! // send req, receive resp
//! let done = handshake::finish(s3, resp)?;
//! // done.auth_key is ready
//! ```
//!
//! Each state consumes exactly one reply; any nonce, hash or range
//! violation aborts with a typed [`Error`].

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use mercury_crypto::{AuthKey, aes, factorize, generate_key_data_from_nonce, rsa, sha1};
use mercury_tl::{Cursor, Deserializable, Serializable, enums, functions, types};
use num_bigint::BigUint;

/// Errors that can occur during client-side key generation.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    InvalidNonce { got: [u8; 16], expected: [u8; 16] },
    InvalidPqSize { size: usize },
    UnknownFingerprints { fingerprints: Vec<i64> },
    DhParamsFail,
    InvalidServerNonce { got: [u8; 16], expected: [u8; 16] },
    EncryptedResponseNotPadded { len: usize },
    InvalidDhInnerData { error: mercury_tl::deserialize::Error },
    GParameterOutOfRange { value: BigUint, low: BigUint, high: BigUint },
    DhGenRetry,
    DhGenFail,
    InvalidAnswerHash { got: [u8; 20], expected: [u8; 20] },
    InvalidNewNonceHash { got: [u8; 16], expected: [u8; 16] },
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNonce { got, expected } => {
                write!(f, "nonce mismatch: got {got:?}, expected {expected:?}")
            }
            Self::InvalidPqSize { size } => write!(f, "pq size {size} invalid (expected 8)"),
            Self::UnknownFingerprints { fingerprints } => {
                write!(f, "no known fingerprint in {fingerprints:?}")
            }
            Self::DhParamsFail => write!(f, "server returned DH params failure"),
            Self::InvalidServerNonce { got, expected } => {
                write!(f, "server_nonce mismatch: got {got:?}, expected {expected:?}")
            }
            Self::EncryptedResponseNotPadded { len } => {
                write!(f, "encrypted answer len {len} is not 16-byte aligned")
            }
            Self::InvalidDhInnerData { error } => {
                write!(f, "DH inner data deserialization error: {error}")
            }
            Self::GParameterOutOfRange { value, low, high } => {
                write!(f, "g={value} not in range ({low}, {high})")
            }
            Self::DhGenRetry => write!(f, "DH gen retry requested"),
            Self::DhGenFail => write!(f, "DH gen failed"),
            Self::InvalidAnswerHash { got, expected } => {
                write!(f, "answer hash mismatch: got {got:?}, expected {expected:?}")
            }
            Self::InvalidNewNonceHash { got, expected } => {
                write!(f, "new nonce hash mismatch: got {got:?}, expected {expected:?}")
            }
        }
    }
}

/// State after `req_pq_multi` went out.
pub struct PqRequested {
    nonce: [u8; 16],
}

/// State after `req_DH_params` went out.
pub struct DhParamsRequested {
    nonce: [u8; 16],
    server_nonce: [u8; 16],
    new_nonce: [u8; 32],
}

/// State after `set_client_DH_params` went out.
pub struct DhParamsSet {
    nonce: [u8; 16],
    server_nonce: [u8; 16],
    new_nonce: [u8; 32],
    g_ab: BigUint,
    time_offset: i32,
}

/// The output of a successful handshake.
#[derive(Clone, Debug, PartialEq)]
pub struct Finished {
    /// The 256-byte authorization key.
    pub auth_key: [u8; 256],
    /// Clock skew in seconds relative to the server.
    pub time_offset: i32,
    /// Initial server salt.
    pub first_salt: i64,
}

/// Generate `req_pq_multi`.
pub fn step1() -> (functions::ReqPqMulti, PqRequested) {
    let mut nonce = [0u8; 16];
    getrandom::getrandom(&mut nonce).expect("getrandom failed");
    (functions::ReqPqMulti { nonce }, PqRequested { nonce })
}

/// Process `resPQ` and generate `req_DH_params`.
///
/// `server_keys` are the RSA public keys this client trusts; the reply's
/// fingerprint list must name one of them.
pub fn step2(
    state: PqRequested,
    response: enums::ResPq,
    server_keys: &[rsa::Key],
) -> Result<(functions::ReqDhParams, DhParamsRequested), Error> {
    let mut rnd = [0u8; 256];
    getrandom::getrandom(&mut rnd).expect("getrandom failed");
    do_step2(state, response, server_keys, &rnd)
}

fn do_step2(
    state: PqRequested,
    response: enums::ResPq,
    server_keys: &[rsa::Key],
    random: &[u8; 256],
) -> Result<(functions::ReqDhParams, DhParamsRequested), Error> {
    let PqRequested { nonce } = state;
    let enums::ResPq::ResPq(res_pq) = response;

    check_nonce(&res_pq.nonce, &nonce)?;

    if res_pq.pq.len() != 8 {
        return Err(Error::InvalidPqSize { size: res_pq.pq.len() });
    }
    let pq = u64::from_be_bytes(res_pq.pq.as_slice().try_into().unwrap());
    let (p, q) = factorize(pq);

    let mut new_nonce = [0u8; 32];
    new_nonce.copy_from_slice(&random[..32]);

    // The remaining 224 random bytes feed the RSA-PAD scheme.
    let rnd224: &[u8; 224] = random[32..].try_into().unwrap();

    let key = server_keys
        .iter()
        .find(|k| res_pq.server_public_key_fingerprints.contains(&k.fingerprint()))
        .ok_or_else(|| Error::UnknownFingerprints {
            fingerprints: res_pq.server_public_key_fingerprints.clone(),
        })?;

    let p_bytes = trim_be(p);
    let q_bytes = trim_be(q);

    let inner = enums::PqInnerData::PqInnerData(types::PqInnerData {
        pq: res_pq.pq.clone(),
        p: p_bytes.clone(),
        q: q_bytes.clone(),
        nonce,
        server_nonce: res_pq.server_nonce,
        new_nonce,
    })
    .to_bytes();

    let encrypted_data = rsa::encrypt_hashed(&inner, key, rnd224);

    Ok((
        functions::ReqDhParams {
            nonce,
            server_nonce: res_pq.server_nonce,
            p: p_bytes,
            q: q_bytes,
            public_key_fingerprint: key.fingerprint(),
            encrypted_data,
        },
        DhParamsRequested { nonce, server_nonce: res_pq.server_nonce, new_nonce },
    ))
}

/// Process `Server_DH_Params` and generate `set_client_DH_params`.
pub fn step3(
    state: DhParamsRequested,
    response: enums::ServerDhParams,
) -> Result<(functions::SetClientDhParams, DhParamsSet), Error> {
    let mut rnd = [0u8; 272]; // 256 for the DH exponent b, 16 for padding
    getrandom::getrandom(&mut rnd).expect("getrandom failed");
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i32;
    do_step3(state, response, &rnd, now)
}

fn do_step3(
    state: DhParamsRequested,
    response: enums::ServerDhParams,
    random: &[u8; 272],
    now: i32,
) -> Result<(functions::SetClientDhParams, DhParamsSet), Error> {
    let DhParamsRequested { nonce, server_nonce, new_nonce } = state;

    let mut server_dh_ok = match response {
        enums::ServerDhParams::Fail(fail) => {
            check_nonce(&fail.nonce, &nonce)?;
            check_server_nonce(&fail.server_nonce, &server_nonce)?;
            let digest = sha1!(new_nonce);
            let mut expected = [0u8; 16];
            expected.copy_from_slice(&digest[4..]);
            check_new_nonce_hash(&fail.new_nonce_hash, &expected)?;
            return Err(Error::DhParamsFail);
        }
        enums::ServerDhParams::Ok(ok) => ok,
    };

    check_nonce(&server_dh_ok.nonce, &nonce)?;
    check_server_nonce(&server_dh_ok.server_nonce, &server_nonce)?;

    // Must hold at least the SHA-1 prefix and one data block.
    if server_dh_ok.encrypted_answer.len() % 16 != 0 || server_dh_ok.encrypted_answer.len() < 48 {
        return Err(Error::EncryptedResponseNotPadded { len: server_dh_ok.encrypted_answer.len() });
    }

    let (key, iv) = generate_key_data_from_nonce(&server_nonce, &new_nonce);
    aes::ige_decrypt(&mut server_dh_ok.encrypted_answer, &key, &iv);
    let plain = server_dh_ok.encrypted_answer;

    let got_hash: [u8; 20] = plain[..20].try_into().unwrap();
    let mut cursor = Cursor::from_slice(&plain[20..]);
    let inner = match enums::ServerDhInnerData::deserialize(&mut cursor) {
        Ok(enums::ServerDhInnerData::ServerDhInnerData(x)) => x,
        Err(e) => return Err(Error::InvalidDhInnerData { error: e }),
    };

    let expected_hash = sha1!(&plain[20..20 + cursor.pos()]);
    if got_hash != expected_hash {
        return Err(Error::InvalidAnswerHash { got: got_hash, expected: expected_hash });
    }

    check_nonce(&inner.nonce, &nonce)?;
    check_server_nonce(&inner.server_nonce, &server_nonce)?;

    let dh_prime = BigUint::from_bytes_be(&inner.dh_prime);
    let g = BigUint::from(inner.g as u32);
    let g_a = BigUint::from_bytes_be(&inner.g_a);
    let time_offset = inner.server_time - now;

    let b = BigUint::from_bytes_be(&random[..256]);
    let g_b = g.modpow(&b, &dh_prime);
    let g_ab = g_a.modpow(&b, &dh_prime);

    // DH parameter validation per the protocol's safety requirements.
    let one = BigUint::from(1u32);
    check_in_range(&g, &one, &(&dh_prime - &one))?;
    check_in_range(&g_a, &one, &(&dh_prime - &one))?;
    check_in_range(&g_b, &one, &(&dh_prime - &one))?;
    let safety = one << (2048 - 64);
    check_in_range(&g_a, &safety, &(&dh_prime - &safety))?;
    check_in_range(&g_b, &safety, &(&dh_prime - &safety))?;

    let client_inner = enums::ClientDhInnerData::ClientDhInnerData(types::ClientDhInnerData {
        nonce,
        server_nonce,
        retry_id: 0,
        g_b: g_b.to_bytes_be(),
    })
    .to_bytes();

    let digest = sha1!(&client_inner);
    let pad_len = (16 - (20 + client_inner.len()) % 16) % 16;

    let mut encrypted_data = Vec::with_capacity(20 + client_inner.len() + pad_len);
    encrypted_data.extend_from_slice(&digest);
    encrypted_data.extend_from_slice(&client_inner);
    encrypted_data.extend_from_slice(&random[256..256 + pad_len]);

    aes::ige_encrypt(&mut encrypted_data, &key, &iv);

    Ok((
        functions::SetClientDhParams { nonce, server_nonce, encrypted_data },
        DhParamsSet { nonce, server_nonce, new_nonce, g_ab, time_offset },
    ))
}

/// Finalize the handshake.
pub fn finish(state: DhParamsSet, response: enums::SetClientDhParamsAnswer) -> Result<Finished, Error> {
    let DhParamsSet { nonce, server_nonce, new_nonce, g_ab, time_offset } = state;

    struct DhAnswer {
        nonce: [u8; 16],
        server_nonce: [u8; 16],
        hash: [u8; 16],
        number: u8,
    }

    let answer = match response {
        enums::SetClientDhParamsAnswer::DhGenOk(x) => DhAnswer {
            nonce: x.nonce,
            server_nonce: x.server_nonce,
            hash: x.new_nonce_hash1,
            number: 1,
        },
        enums::SetClientDhParamsAnswer::DhGenRetry(x) => DhAnswer {
            nonce: x.nonce,
            server_nonce: x.server_nonce,
            hash: x.new_nonce_hash2,
            number: 2,
        },
        enums::SetClientDhParamsAnswer::DhGenFail(x) => DhAnswer {
            nonce: x.nonce,
            server_nonce: x.server_nonce,
            hash: x.new_nonce_hash3,
            number: 3,
        },
    };

    check_nonce(&answer.nonce, &nonce)?;
    check_server_nonce(&answer.server_nonce, &server_nonce)?;

    let mut key_bytes = [0u8; 256];
    let g_ab_bytes = g_ab.to_bytes_be();
    key_bytes[256 - g_ab_bytes.len()..].copy_from_slice(&g_ab_bytes);

    let auth_key = AuthKey::from_bytes(key_bytes);
    let expected = auth_key.calc_new_nonce_hash(&new_nonce, answer.number);
    check_new_nonce_hash(&answer.hash, &expected)?;

    match answer.number {
        1 => Ok(Finished { auth_key: auth_key.to_bytes(), time_offset, first_salt: first_salt(&new_nonce, &server_nonce) }),
        2 => Err(Error::DhGenRetry),
        _ => Err(Error::DhGenFail),
    }
}

/// `first_salt = new_nonce[0..8] XOR server_nonce[0..8]`.
pub(crate) fn first_salt(new_nonce: &[u8; 32], server_nonce: &[u8; 16]) -> i64 {
    let mut buf = [0u8; 8];
    for ((dst, a), b) in buf.iter_mut().zip(new_nonce).zip(server_nonce) {
        *dst = a ^ b;
    }
    i64::from_le_bytes(buf)
}

pub(crate) fn trim_be(v: u64) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let skip = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[skip..].to_vec()
}

fn check_nonce(got: &[u8; 16], expected: &[u8; 16]) -> Result<(), Error> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::InvalidNonce { got: *got, expected: *expected })
    }
}

fn check_server_nonce(got: &[u8; 16], expected: &[u8; 16]) -> Result<(), Error> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::InvalidServerNonce { got: *got, expected: *expected })
    }
}

fn check_new_nonce_hash(got: &[u8; 16], expected: &[u8; 16]) -> Result<(), Error> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::InvalidNewNonceHash { got: *got, expected: *expected })
    }
}

fn check_in_range(value: &BigUint, low: &BigUint, high: &BigUint) -> Result<(), Error> {
    if low < value && value < high {
        Ok(())
    } else {
        Err(Error::GParameterOutOfRange {
            value: value.clone(),
            low: low.clone(),
            high: high.clone(),
        })
    }
}
