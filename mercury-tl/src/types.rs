//! Concrete TL constructors as plain `struct`s.
//!
//! A constructor serializes *bare* (fields only); the boxed form with the
//! constructor id in front lives in [`crate::enums`]. Conditional fields
//! are `Option`s gated by a `flags` word computed during serialization.

use crate::deserialize::{Cursor, Result};
use crate::{Deserializable, Identifiable, Serializable, enums};

macro_rules! identifiable {
    ($ty:ty, $id:literal) => {
        impl Identifiable for $ty {
            const CONSTRUCTOR_ID: u32 = $id;
        }
    };
}

// ─── Handshake ───────────────────────────────────────────────────────────────

/// `resPQ#05162463`
#[derive(Clone, Debug, PartialEq)]
pub struct ResPq {
    pub nonce: [u8; 16],
    pub server_nonce: [u8; 16],
    /// Big-endian product of two 31-bit primes, 8 bytes.
    pub pq: Vec<u8>,
    pub server_public_key_fingerprints: Vec<i64>,
}
identifiable!(ResPq, 0x05162463);

impl Serializable for ResPq {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.pq.serialize(buf);
        self.server_public_key_fingerprints.serialize(buf);
    }
}

impl Deserializable for ResPq {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            nonce: <[u8; 16]>::deserialize(cur)?,
            server_nonce: <[u8; 16]>::deserialize(cur)?,
            pq: Vec::<u8>::deserialize(cur)?,
            server_public_key_fingerprints: Vec::<i64>::deserialize(cur)?,
        })
    }
}

/// `p_q_inner_data#83c95aec`
#[derive(Clone, Debug, PartialEq)]
pub struct PqInnerData {
    pub pq: Vec<u8>,
    pub p: Vec<u8>,
    pub q: Vec<u8>,
    pub nonce: [u8; 16],
    pub server_nonce: [u8; 16],
    pub new_nonce: [u8; 32],
}
identifiable!(PqInnerData, 0x83c95aec);

impl Serializable for PqInnerData {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.pq.serialize(buf);
        self.p.serialize(buf);
        self.q.serialize(buf);
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.new_nonce.serialize(buf);
    }
}

impl Deserializable for PqInnerData {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            pq: Vec::<u8>::deserialize(cur)?,
            p: Vec::<u8>::deserialize(cur)?,
            q: Vec::<u8>::deserialize(cur)?,
            nonce: <[u8; 16]>::deserialize(cur)?,
            server_nonce: <[u8; 16]>::deserialize(cur)?,
            new_nonce: <[u8; 32]>::deserialize(cur)?,
        })
    }
}

/// `server_DH_params_ok#d0e8075c`
#[derive(Clone, Debug, PartialEq)]
pub struct ServerDhParamsOk {
    pub nonce: [u8; 16],
    pub server_nonce: [u8; 16],
    pub encrypted_answer: Vec<u8>,
}
identifiable!(ServerDhParamsOk, 0xd0e8075c);

impl Serializable for ServerDhParamsOk {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.encrypted_answer.serialize(buf);
    }
}

impl Deserializable for ServerDhParamsOk {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            nonce: <[u8; 16]>::deserialize(cur)?,
            server_nonce: <[u8; 16]>::deserialize(cur)?,
            encrypted_answer: Vec::<u8>::deserialize(cur)?,
        })
    }
}

/// `server_DH_params_fail#79cb045d`
#[derive(Clone, Debug, PartialEq)]
pub struct ServerDhParamsFail {
    pub nonce: [u8; 16],
    pub server_nonce: [u8; 16],
    pub new_nonce_hash: [u8; 16],
}
identifiable!(ServerDhParamsFail, 0x79cb045d);

impl Serializable for ServerDhParamsFail {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.new_nonce_hash.serialize(buf);
    }
}

impl Deserializable for ServerDhParamsFail {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            nonce: <[u8; 16]>::deserialize(cur)?,
            server_nonce: <[u8; 16]>::deserialize(cur)?,
            new_nonce_hash: <[u8; 16]>::deserialize(cur)?,
        })
    }
}

/// `server_DH_inner_data#b5890dba`
#[derive(Clone, Debug, PartialEq)]
pub struct ServerDhInnerData {
    pub nonce: [u8; 16],
    pub server_nonce: [u8; 16],
    pub g: i32,
    pub dh_prime: Vec<u8>,
    pub g_a: Vec<u8>,
    pub server_time: i32,
}
identifiable!(ServerDhInnerData, 0xb5890dba);

impl Serializable for ServerDhInnerData {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.g.serialize(buf);
        self.dh_prime.serialize(buf);
        self.g_a.serialize(buf);
        self.server_time.serialize(buf);
    }
}

impl Deserializable for ServerDhInnerData {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            nonce: <[u8; 16]>::deserialize(cur)?,
            server_nonce: <[u8; 16]>::deserialize(cur)?,
            g: i32::deserialize(cur)?,
            dh_prime: Vec::<u8>::deserialize(cur)?,
            g_a: Vec::<u8>::deserialize(cur)?,
            server_time: i32::deserialize(cur)?,
        })
    }
}

/// `client_DH_inner_data#6643b654`
#[derive(Clone, Debug, PartialEq)]
pub struct ClientDhInnerData {
    pub nonce: [u8; 16],
    pub server_nonce: [u8; 16],
    pub retry_id: i64,
    pub g_b: Vec<u8>,
}
identifiable!(ClientDhInnerData, 0x6643b654);

impl Serializable for ClientDhInnerData {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.retry_id.serialize(buf);
        self.g_b.serialize(buf);
    }
}

impl Deserializable for ClientDhInnerData {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            nonce: <[u8; 16]>::deserialize(cur)?,
            server_nonce: <[u8; 16]>::deserialize(cur)?,
            retry_id: i64::deserialize(cur)?,
            g_b: Vec::<u8>::deserialize(cur)?,
        })
    }
}

/// `dh_gen_ok#3bcbf734`
#[derive(Clone, Debug, PartialEq)]
pub struct DhGenOk {
    pub nonce: [u8; 16],
    pub server_nonce: [u8; 16],
    pub new_nonce_hash1: [u8; 16],
}
identifiable!(DhGenOk, 0x3bcbf734);

impl Serializable for DhGenOk {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.new_nonce_hash1.serialize(buf);
    }
}

impl Deserializable for DhGenOk {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            nonce: <[u8; 16]>::deserialize(cur)?,
            server_nonce: <[u8; 16]>::deserialize(cur)?,
            new_nonce_hash1: <[u8; 16]>::deserialize(cur)?,
        })
    }
}

/// `dh_gen_retry#46dc1fb9`
#[derive(Clone, Debug, PartialEq)]
pub struct DhGenRetry {
    pub nonce: [u8; 16],
    pub server_nonce: [u8; 16],
    pub new_nonce_hash2: [u8; 16],
}
identifiable!(DhGenRetry, 0x46dc1fb9);

impl Serializable for DhGenRetry {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.new_nonce_hash2.serialize(buf);
    }
}

impl Deserializable for DhGenRetry {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            nonce: <[u8; 16]>::deserialize(cur)?,
            server_nonce: <[u8; 16]>::deserialize(cur)?,
            new_nonce_hash2: <[u8; 16]>::deserialize(cur)?,
        })
    }
}

/// `dh_gen_fail#a69dae02`
#[derive(Clone, Debug, PartialEq)]
pub struct DhGenFail {
    pub nonce: [u8; 16],
    pub server_nonce: [u8; 16],
    pub new_nonce_hash3: [u8; 16],
}
identifiable!(DhGenFail, 0xa69dae02);

impl Serializable for DhGenFail {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.new_nonce_hash3.serialize(buf);
    }
}

impl Deserializable for DhGenFail {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            nonce: <[u8; 16]>::deserialize(cur)?,
            server_nonce: <[u8; 16]>::deserialize(cur)?,
            new_nonce_hash3: <[u8; 16]>::deserialize(cur)?,
        })
    }
}

// ─── Service messages ────────────────────────────────────────────────────────

/// `msgs_ack#62d6b459`
#[derive(Clone, Debug, PartialEq)]
pub struct MsgsAck {
    pub msg_ids: Vec<i64>,
}
identifiable!(MsgsAck, 0x62d6b459);

impl Serializable for MsgsAck {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.msg_ids.serialize(buf);
    }
}

impl Deserializable for MsgsAck {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { msg_ids: Vec::<i64>::deserialize(cur)? })
    }
}

/// `pong#347773c5`
#[derive(Clone, Debug, PartialEq)]
pub struct Pong {
    pub msg_id: i64,
    pub ping_id: i64,
}
identifiable!(Pong, 0x347773c5);

impl Serializable for Pong {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.msg_id.serialize(buf);
        self.ping_id.serialize(buf);
    }
}

impl Deserializable for Pong {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { msg_id: i64::deserialize(cur)?, ping_id: i64::deserialize(cur)? })
    }
}

/// `rpc_error#2144ca19`
#[derive(Clone, Debug, PartialEq)]
pub struct RpcError {
    pub error_code: i32,
    pub error_message: String,
}
identifiable!(RpcError, 0x2144ca19);

impl Serializable for RpcError {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.error_code.serialize(buf);
        self.error_message.serialize(buf);
    }
}

impl Deserializable for RpcError {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            error_code: i32::deserialize(cur)?,
            error_message: String::deserialize(cur)?,
        })
    }
}

/// `bad_msg_notification#a7eff811`
#[derive(Clone, Debug, PartialEq)]
pub struct BadMsgNotification {
    pub bad_msg_id: i64,
    pub bad_msg_seqno: i32,
    pub error_code: i32,
}
identifiable!(BadMsgNotification, 0xa7eff811);

impl Serializable for BadMsgNotification {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.bad_msg_id.serialize(buf);
        self.bad_msg_seqno.serialize(buf);
        self.error_code.serialize(buf);
    }
}

impl Deserializable for BadMsgNotification {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            bad_msg_id: i64::deserialize(cur)?,
            bad_msg_seqno: i32::deserialize(cur)?,
            error_code: i32::deserialize(cur)?,
        })
    }
}

/// `bad_server_salt#edab447b`
#[derive(Clone, Debug, PartialEq)]
pub struct BadServerSalt {
    pub bad_msg_id: i64,
    pub bad_msg_seqno: i32,
    pub error_code: i32,
    pub new_server_salt: i64,
}
identifiable!(BadServerSalt, 0xedab447b);

impl Serializable for BadServerSalt {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.bad_msg_id.serialize(buf);
        self.bad_msg_seqno.serialize(buf);
        self.error_code.serialize(buf);
        self.new_server_salt.serialize(buf);
    }
}

impl Deserializable for BadServerSalt {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            bad_msg_id: i64::deserialize(cur)?,
            bad_msg_seqno: i32::deserialize(cur)?,
            error_code: i32::deserialize(cur)?,
            new_server_salt: i64::deserialize(cur)?,
        })
    }
}

/// `new_session_created#9ec20908`
#[derive(Clone, Debug, PartialEq)]
pub struct NewSessionCreated {
    pub first_msg_id: i64,
    pub unique_id: i64,
    pub server_salt: i64,
}
identifiable!(NewSessionCreated, 0x9ec20908);

impl Serializable for NewSessionCreated {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.first_msg_id.serialize(buf);
        self.unique_id.serialize(buf);
        self.server_salt.serialize(buf);
    }
}

impl Deserializable for NewSessionCreated {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            first_msg_id: i64::deserialize(cur)?,
            unique_id: i64::deserialize(cur)?,
            server_salt: i64::deserialize(cur)?,
        })
    }
}

// ─── Domain: config ──────────────────────────────────────────────────────────

/// `dcOption#05d8c6cc`
#[derive(Clone, Debug, PartialEq)]
pub struct DcOption {
    pub ipv6: bool,
    pub media_only: bool,
    pub id: i32,
    pub ip_address: String,
    pub port: i32,
}
identifiable!(DcOption, 0x05d8c6cc);

impl Serializable for DcOption {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let flags: u32 = if self.ipv6 { 1 } else { 0 } | if self.media_only { 2 } else { 0 };
        flags.serialize(buf);
        self.id.serialize(buf);
        self.ip_address.serialize(buf);
        self.port.serialize(buf);
    }
}

impl Deserializable for DcOption {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let flags = u32::deserialize(cur)?;
        Ok(Self {
            ipv6: flags & 1 != 0,
            media_only: flags & 2 != 0,
            id: i32::deserialize(cur)?,
            ip_address: String::deserialize(cur)?,
            port: i32::deserialize(cur)?,
        })
    }
}

/// `config#cb601684`
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub date: i32,
    pub expires: i32,
    pub test_mode: bool,
    pub this_dc: i32,
    pub dc_options: Vec<enums::DcOption>,
    pub chat_size_max: i32,
    pub megagroup_size_max: i32,
    pub offline_blur_timeout_ms: i32,
}
identifiable!(Config, 0xcb601684);

impl Serializable for Config {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.date.serialize(buf);
        self.expires.serialize(buf);
        self.test_mode.serialize(buf);
        self.this_dc.serialize(buf);
        self.dc_options.serialize(buf);
        self.chat_size_max.serialize(buf);
        self.megagroup_size_max.serialize(buf);
        self.offline_blur_timeout_ms.serialize(buf);
    }
}

impl Deserializable for Config {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            date: i32::deserialize(cur)?,
            expires: i32::deserialize(cur)?,
            test_mode: bool::deserialize(cur)?,
            this_dc: i32::deserialize(cur)?,
            dc_options: Vec::<enums::DcOption>::deserialize(cur)?,
            chat_size_max: i32::deserialize(cur)?,
            megagroup_size_max: i32::deserialize(cur)?,
            offline_blur_timeout_ms: i32::deserialize(cur)?,
        })
    }
}

/// `nearestDc#8e1a1775`
#[derive(Clone, Debug, PartialEq)]
pub struct NearestDc {
    pub country: String,
    pub this_dc: i32,
    pub nearest_dc: i32,
}
identifiable!(NearestDc, 0x8e1a1775);

impl Serializable for NearestDc {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.country.serialize(buf);
        self.this_dc.serialize(buf);
        self.nearest_dc.serialize(buf);
    }
}

impl Deserializable for NearestDc {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            country: String::deserialize(cur)?,
            this_dc: i32::deserialize(cur)?,
            nearest_dc: i32::deserialize(cur)?,
        })
    }
}

// ─── Domain: peers and users ─────────────────────────────────────────────────

/// `peerUser#9db1bc6d`
#[derive(Clone, Debug, PartialEq)]
pub struct PeerUser {
    pub user_id: i32,
}
identifiable!(PeerUser, 0x9db1bc6d);

impl Serializable for PeerUser {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.user_id.serialize(buf);
    }
}

impl Deserializable for PeerUser {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { user_id: i32::deserialize(cur)? })
    }
}

/// `peerChat#bad0e5bb`
#[derive(Clone, Debug, PartialEq)]
pub struct PeerChat {
    pub chat_id: i32,
}
identifiable!(PeerChat, 0xbad0e5bb);

impl Serializable for PeerChat {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.chat_id.serialize(buf);
    }
}

impl Deserializable for PeerChat {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { chat_id: i32::deserialize(cur)? })
    }
}

/// `peerChannel#bddde532`
#[derive(Clone, Debug, PartialEq)]
pub struct PeerChannel {
    pub channel_id: i32,
}
identifiable!(PeerChannel, 0xbddde532);

impl Serializable for PeerChannel {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.channel_id.serialize(buf);
    }
}

impl Deserializable for PeerChannel {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { channel_id: i32::deserialize(cur)? })
    }
}

/// `inputPeerUser#7b8e7de6`
#[derive(Clone, Debug, PartialEq)]
pub struct InputPeerUser {
    pub user_id: i32,
    pub access_hash: i64,
}
identifiable!(InputPeerUser, 0x7b8e7de6);

impl Serializable for InputPeerUser {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.user_id.serialize(buf);
        self.access_hash.serialize(buf);
    }
}

impl Deserializable for InputPeerUser {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { user_id: i32::deserialize(cur)?, access_hash: i64::deserialize(cur)? })
    }
}

/// `inputPeerChat#179be863`
#[derive(Clone, Debug, PartialEq)]
pub struct InputPeerChat {
    pub chat_id: i32,
}
identifiable!(InputPeerChat, 0x179be863);

impl Serializable for InputPeerChat {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.chat_id.serialize(buf);
    }
}

impl Deserializable for InputPeerChat {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { chat_id: i32::deserialize(cur)? })
    }
}

/// `inputPeerChannel#20adaef8`
#[derive(Clone, Debug, PartialEq)]
pub struct InputPeerChannel {
    pub channel_id: i32,
    pub access_hash: i64,
}
identifiable!(InputPeerChannel, 0x20adaef8);

impl Serializable for InputPeerChannel {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.channel_id.serialize(buf);
        self.access_hash.serialize(buf);
    }
}

impl Deserializable for InputPeerChannel {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { channel_id: i32::deserialize(cur)?, access_hash: i64::deserialize(cur)? })
    }
}

/// `inputUser#d8292816`
#[derive(Clone, Debug, PartialEq)]
pub struct InputUser {
    pub user_id: i32,
    pub access_hash: i64,
}
identifiable!(InputUser, 0xd8292816);

impl Serializable for InputUser {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.user_id.serialize(buf);
        self.access_hash.serialize(buf);
    }
}

impl Deserializable for InputUser {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { user_id: i32::deserialize(cur)?, access_hash: i64::deserialize(cur)? })
    }
}

/// `userEmpty#200250ba`
#[derive(Clone, Debug, PartialEq)]
pub struct UserEmpty {
    pub id: i32,
}
identifiable!(UserEmpty, 0x200250ba);

impl Serializable for UserEmpty {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.id.serialize(buf);
    }
}

impl Deserializable for UserEmpty {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { id: i32::deserialize(cur)? })
    }
}

/// `user#2e13f4c3`
///
/// Flag bits: `access_hash`:0, `first_name`:1, `last_name`:2, `username`:3,
/// `phone`:4, `self`:10, `contact`:11.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct User {
    pub is_self: bool,
    pub contact: bool,
    pub id: i32,
    pub access_hash: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
}
identifiable!(User, 0x2e13f4c3);

impl User {
    fn flags(&self) -> u32 {
        let mut flags = 0u32;
        if self.access_hash.is_some() {
            flags |= 1 << 0;
        }
        if self.first_name.is_some() {
            flags |= 1 << 1;
        }
        if self.last_name.is_some() {
            flags |= 1 << 2;
        }
        if self.username.is_some() {
            flags |= 1 << 3;
        }
        if self.phone.is_some() {
            flags |= 1 << 4;
        }
        if self.is_self {
            flags |= 1 << 10;
        }
        if self.contact {
            flags |= 1 << 11;
        }
        flags
    }
}

impl Serializable for User {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.flags().serialize(buf);
        self.id.serialize(buf);
        self.access_hash.serialize(buf);
        self.first_name.serialize(buf);
        self.last_name.serialize(buf);
        self.username.serialize(buf);
        self.phone.serialize(buf);
    }
}

impl Deserializable for User {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let flags = u32::deserialize(cur)?;
        let read_if = |cur: &mut Cursor<'_>, bit: u32| -> Result<Option<String>> {
            if flags & (1 << bit) != 0 { Ok(Some(String::deserialize(cur)?)) } else { Ok(None) }
        };
        let id = i32::deserialize(cur)?;
        let access_hash =
            if flags & 1 != 0 { Some(i64::deserialize(cur)?) } else { None };
        Ok(Self {
            is_self: flags & (1 << 10) != 0,
            contact: flags & (1 << 11) != 0,
            id,
            access_hash,
            first_name: read_if(cur, 1)?,
            last_name: read_if(cur, 2)?,
            username: read_if(cur, 3)?,
            phone: read_if(cur, 4)?,
        })
    }
}

/// `userFull#0f220f3f`
///
/// Flag bits: `about`:1.
#[derive(Clone, Debug, PartialEq)]
pub struct UserFull {
    pub user: enums::User,
    pub about: Option<String>,
    pub common_chats_count: i32,
}
identifiable!(UserFull, 0x0f220f3f);

impl Serializable for UserFull {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let flags: u32 = if self.about.is_some() { 1 << 1 } else { 0 };
        flags.serialize(buf);
        self.user.serialize(buf);
        self.about.serialize(buf);
        self.common_chats_count.serialize(buf);
    }
}

impl Deserializable for UserFull {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let flags = u32::deserialize(cur)?;
        Ok(Self {
            user: enums::User::deserialize(cur)?,
            about: if flags & (1 << 1) != 0 { Some(String::deserialize(cur)?) } else { None },
            common_chats_count: i32::deserialize(cur)?,
        })
    }
}

/// `contact#f911c994`
#[derive(Clone, Debug, PartialEq)]
pub struct Contact {
    pub user_id: i32,
    pub mutual: bool,
}
identifiable!(Contact, 0xf911c994);

impl Serializable for Contact {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.user_id.serialize(buf);
        self.mutual.serialize(buf);
    }
}

impl Deserializable for Contact {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { user_id: i32::deserialize(cur)?, mutual: bool::deserialize(cur)? })
    }
}

// ─── Domain: chats ───────────────────────────────────────────────────────────

/// `chatEmpty#9ba2d800`
#[derive(Clone, Debug, PartialEq)]
pub struct ChatEmpty {
    pub id: i32,
}
identifiable!(ChatEmpty, 0x9ba2d800);

impl Serializable for ChatEmpty {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.id.serialize(buf);
    }
}

impl Deserializable for ChatEmpty {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { id: i32::deserialize(cur)? })
    }
}

/// `chat#d91cdd54`
#[derive(Clone, Debug, PartialEq)]
pub struct Chat {
    pub id: i32,
    pub title: String,
    pub participants_count: i32,
    pub date: i32,
    pub version: i32,
}
identifiable!(Chat, 0xd91cdd54);

impl Serializable for Chat {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.id.serialize(buf);
        self.title.serialize(buf);
        self.participants_count.serialize(buf);
        self.date.serialize(buf);
        self.version.serialize(buf);
    }
}

impl Deserializable for Chat {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            id: i32::deserialize(cur)?,
            title: String::deserialize(cur)?,
            participants_count: i32::deserialize(cur)?,
            date: i32::deserialize(cur)?,
            version: i32::deserialize(cur)?,
        })
    }
}

/// `channel#450b7115`
///
/// Flag bits: `access_hash`:0, `username`:6, `megagroup`:8.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub megagroup: bool,
    pub id: i32,
    pub access_hash: Option<i64>,
    pub title: String,
    pub username: Option<String>,
}
identifiable!(Channel, 0x450b7115);

impl Serializable for Channel {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let mut flags = 0u32;
        if self.access_hash.is_some() {
            flags |= 1 << 0;
        }
        if self.username.is_some() {
            flags |= 1 << 6;
        }
        if self.megagroup {
            flags |= 1 << 8;
        }
        flags.serialize(buf);
        self.id.serialize(buf);
        self.access_hash.serialize(buf);
        self.title.serialize(buf);
        self.username.serialize(buf);
    }
}

impl Deserializable for Channel {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let flags = u32::deserialize(cur)?;
        Ok(Self {
            megagroup: flags & (1 << 8) != 0,
            id: i32::deserialize(cur)?,
            access_hash: if flags & 1 != 0 { Some(i64::deserialize(cur)?) } else { None },
            title: String::deserialize(cur)?,
            username: if flags & (1 << 6) != 0 { Some(String::deserialize(cur)?) } else { None },
        })
    }
}

// ─── Domain: messages and dialogs ────────────────────────────────────────────

/// `messageFwdHeader#559ebe6d`
///
/// Flag bits: `from_id`:0, `channel_id`:1.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageFwdHeader {
    pub from_id: Option<i32>,
    pub date: i32,
    pub channel_id: Option<i32>,
}
identifiable!(MessageFwdHeader, 0x559ebe6d);

impl Serializable for MessageFwdHeader {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let mut flags = 0u32;
        if self.from_id.is_some() {
            flags |= 1 << 0;
        }
        if self.channel_id.is_some() {
            flags |= 1 << 1;
        }
        flags.serialize(buf);
        self.from_id.serialize(buf);
        self.date.serialize(buf);
        self.channel_id.serialize(buf);
    }
}

impl Deserializable for MessageFwdHeader {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let flags = u32::deserialize(cur)?;
        Ok(Self {
            from_id: if flags & 1 != 0 { Some(i32::deserialize(cur)?) } else { None },
            date: i32::deserialize(cur)?,
            channel_id: if flags & 2 != 0 { Some(i32::deserialize(cur)?) } else { None },
        })
    }
}

/// `messageEmpty#83e5de54`
#[derive(Clone, Debug, PartialEq)]
pub struct MessageEmpty {
    pub id: i32,
}
identifiable!(MessageEmpty, 0x83e5de54);

impl Serializable for MessageEmpty {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.id.serialize(buf);
    }
}

impl Deserializable for MessageEmpty {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { id: i32::deserialize(cur)? })
    }
}

/// `message#90dddc11`
///
/// Flag bits: `out`:1, `fwd_from`:2, `from_id`:8.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub out: bool,
    pub id: i32,
    pub from_id: Option<i32>,
    pub to_id: enums::Peer,
    pub fwd_from: Option<MessageFwdHeader>,
    pub date: i32,
    pub message: String,
}
identifiable!(Message, 0x90dddc11);

impl Serializable for Message {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let mut flags = 0u32;
        if self.out {
            flags |= 1 << 1;
        }
        if self.fwd_from.is_some() {
            flags |= 1 << 2;
        }
        if self.from_id.is_some() {
            flags |= 1 << 8;
        }
        flags.serialize(buf);
        self.id.serialize(buf);
        self.from_id.serialize(buf);
        self.to_id.serialize(buf);
        if let Some(fwd) = &self.fwd_from {
            MessageFwdHeader::CONSTRUCTOR_ID.serialize(buf);
            fwd.serialize(buf);
        }
        self.date.serialize(buf);
        self.message.serialize(buf);
    }
}

impl Deserializable for Message {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let flags = u32::deserialize(cur)?;
        let id = i32::deserialize(cur)?;
        let from_id =
            if flags & (1 << 8) != 0 { Some(i32::deserialize(cur)?) } else { None };
        let to_id = enums::Peer::deserialize(cur)?;
        let fwd_from = if flags & (1 << 2) != 0 {
            let header_id = u32::deserialize(cur)?;
            if header_id != MessageFwdHeader::CONSTRUCTOR_ID {
                return Err(crate::deserialize::Error::UnexpectedConstructor { id: header_id });
            }
            Some(MessageFwdHeader::deserialize(cur)?)
        } else {
            None
        };
        Ok(Self {
            out: flags & (1 << 1) != 0,
            id,
            from_id,
            to_id,
            fwd_from,
            date: i32::deserialize(cur)?,
            message: String::deserialize(cur)?,
        })
    }
}

/// `dialog#e4def5db`
#[derive(Clone, Debug, PartialEq)]
pub struct Dialog {
    pub peer: enums::Peer,
    pub top_message: i32,
    pub read_inbox_max_id: i32,
    pub read_outbox_max_id: i32,
    pub unread_count: i32,
}
identifiable!(Dialog, 0xe4def5db);

impl Serializable for Dialog {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.peer.serialize(buf);
        self.top_message.serialize(buf);
        self.read_inbox_max_id.serialize(buf);
        self.read_outbox_max_id.serialize(buf);
        self.unread_count.serialize(buf);
    }
}

impl Deserializable for Dialog {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            peer: enums::Peer::deserialize(cur)?,
            top_message: i32::deserialize(cur)?,
            read_inbox_max_id: i32::deserialize(cur)?,
            read_outbox_max_id: i32::deserialize(cur)?,
            unread_count: i32::deserialize(cur)?,
        })
    }
}

/// `messages.dialogs#15ba6c40`
#[derive(Clone, Debug, PartialEq)]
pub struct MessagesDialogs {
    pub dialogs: Vec<enums::Dialog>,
    pub messages: Vec<enums::Message>,
    pub chats: Vec<enums::Chat>,
    pub users: Vec<enums::User>,
}
identifiable!(MessagesDialogs, 0x15ba6c40);

impl Serializable for MessagesDialogs {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.dialogs.serialize(buf);
        self.messages.serialize(buf);
        self.chats.serialize(buf);
        self.users.serialize(buf);
    }
}

impl Deserializable for MessagesDialogs {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            dialogs: Vec::<enums::Dialog>::deserialize(cur)?,
            messages: Vec::<enums::Message>::deserialize(cur)?,
            chats: Vec::<enums::Chat>::deserialize(cur)?,
            users: Vec::<enums::User>::deserialize(cur)?,
        })
    }
}

/// `messages.messages#8c718e87`
#[derive(Clone, Debug, PartialEq)]
pub struct MessagesMessages {
    pub messages: Vec<enums::Message>,
    pub chats: Vec<enums::Chat>,
    pub users: Vec<enums::User>,
}
identifiable!(MessagesMessages, 0x8c718e87);

impl Serializable for MessagesMessages {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.messages.serialize(buf);
        self.chats.serialize(buf);
        self.users.serialize(buf);
    }
}

impl Deserializable for MessagesMessages {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            messages: Vec::<enums::Message>::deserialize(cur)?,
            chats: Vec::<enums::Chat>::deserialize(cur)?,
            users: Vec::<enums::User>::deserialize(cur)?,
        })
    }
}

/// `auth.authorization#cd050916`
#[derive(Clone, Debug, PartialEq)]
pub struct AuthAuthorization {
    pub user: enums::User,
}
identifiable!(AuthAuthorization, 0xcd050916);

impl Serializable for AuthAuthorization {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        0u32.serialize(buf); // flags, all bits unused
        self.user.serialize(buf);
    }
}

impl Deserializable for AuthAuthorization {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let _flags = u32::deserialize(cur)?;
        Ok(Self { user: enums::User::deserialize(cur)? })
    }
}
