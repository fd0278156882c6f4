//! RPC functions. A function always serializes boxed (id first) and knows
//! the boxed type of its reply via [`RemoteCall`].

use crate::deserialize::{Cursor, Result};
use crate::{Deserializable, Identifiable, RemoteCall, Serializable, enums};

macro_rules! remote_call {
    ($ty:ty, $id:literal, $ret:ty) => {
        impl Identifiable for $ty {
            const CONSTRUCTOR_ID: u32 = $id;
        }
        impl RemoteCall for $ty {
            type Return = $ret;
        }
    };
}

// ─── Handshake ───────────────────────────────────────────────────────────────

/// `req_pq_multi#be7e8ef1`
#[derive(Clone, Debug, PartialEq)]
pub struct ReqPqMulti {
    pub nonce: [u8; 16],
}
remote_call!(ReqPqMulti, 0xbe7e8ef1, enums::ResPq);

impl Serializable for ReqPqMulti {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.nonce.serialize(buf);
    }
}

impl Deserializable for ReqPqMulti {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { nonce: <[u8; 16]>::deserialize(cur)? })
    }
}

/// `req_DH_params#d712e4be`
#[derive(Clone, Debug, PartialEq)]
pub struct ReqDhParams {
    pub nonce: [u8; 16],
    pub server_nonce: [u8; 16],
    pub p: Vec<u8>,
    pub q: Vec<u8>,
    pub public_key_fingerprint: i64,
    pub encrypted_data: Vec<u8>,
}
remote_call!(ReqDhParams, 0xd712e4be, enums::ServerDhParams);

impl Serializable for ReqDhParams {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.p.serialize(buf);
        self.q.serialize(buf);
        self.public_key_fingerprint.serialize(buf);
        self.encrypted_data.serialize(buf);
    }
}

impl Deserializable for ReqDhParams {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            nonce: <[u8; 16]>::deserialize(cur)?,
            server_nonce: <[u8; 16]>::deserialize(cur)?,
            p: Vec::<u8>::deserialize(cur)?,
            q: Vec::<u8>::deserialize(cur)?,
            public_key_fingerprint: i64::deserialize(cur)?,
            encrypted_data: Vec::<u8>::deserialize(cur)?,
        })
    }
}

/// `set_client_DH_params#f5045f1f`
#[derive(Clone, Debug, PartialEq)]
pub struct SetClientDhParams {
    pub nonce: [u8; 16],
    pub server_nonce: [u8; 16],
    pub encrypted_data: Vec<u8>,
}
remote_call!(SetClientDhParams, 0xf5045f1f, enums::SetClientDhParamsAnswer);

impl Serializable for SetClientDhParams {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.nonce.serialize(buf);
        self.server_nonce.serialize(buf);
        self.encrypted_data.serialize(buf);
    }
}

impl Deserializable for SetClientDhParams {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            nonce: <[u8; 16]>::deserialize(cur)?,
            server_nonce: <[u8; 16]>::deserialize(cur)?,
            encrypted_data: Vec::<u8>::deserialize(cur)?,
        })
    }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// `ping#7abe77ec`
#[derive(Clone, Debug, PartialEq)]
pub struct Ping {
    pub ping_id: i64,
}
remote_call!(Ping, 0x7abe77ec, enums::Pong);

impl Serializable for Ping {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.ping_id.serialize(buf);
    }
}

impl Deserializable for Ping {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { ping_id: i64::deserialize(cur)? })
    }
}

pub mod help {
    //! Functions in the `help.` namespace.

    use super::*;

    /// `help.getConfig#c4f9186b`
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetConfig {}
    remote_call!(GetConfig, 0xc4f9186b, enums::Config);

    impl Serializable for GetConfig {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
        }
    }

    impl Deserializable for GetConfig {
        fn deserialize(_cur: &mut Cursor<'_>) -> Result<Self> {
            Ok(Self {})
        }
    }

    /// `help.getNearestDc#1fb33026`
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetNearestDc {}
    remote_call!(GetNearestDc, 0x1fb33026, enums::NearestDc);

    impl Serializable for GetNearestDc {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
        }
    }

    impl Deserializable for GetNearestDc {
        fn deserialize(_cur: &mut Cursor<'_>) -> Result<Self> {
            Ok(Self {})
        }
    }
}

pub mod users {
    //! Functions in the `users.` namespace.

    use super::*;

    /// `users.getFullUser#ca30a5b1`
    #[derive(Clone, Debug, PartialEq)]
    pub struct GetFullUser {
        pub id: enums::InputUser,
    }
    remote_call!(GetFullUser, 0xca30a5b1, enums::UserFull);

    impl Serializable for GetFullUser {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
            self.id.serialize(buf);
        }
    }

    impl Deserializable for GetFullUser {
        fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
            Ok(Self { id: enums::InputUser::deserialize(cur)? })
        }
    }

    /// `users.getUsers#0d91a548`
    #[derive(Clone, Debug, PartialEq)]
    pub struct GetUsers {
        pub id: Vec<enums::InputUser>,
    }
    remote_call!(GetUsers, 0x0d91a548, Vec<enums::User>);

    impl Serializable for GetUsers {
        fn serialize(&self, buf: &mut impl Extend<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
            self.id.serialize(buf);
        }
    }

    impl Deserializable for GetUsers {
        fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
            Ok(Self { id: Vec::<enums::InputUser>::deserialize(cur)? })
        }
    }
}
