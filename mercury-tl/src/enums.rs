//! Boxed TL types as `enum`s.
//!
//! A boxed value is its 32-bit constructor id followed by the bare
//! constructor body; deserialization reads the id and dispatches into the
//! matching [`crate::types`] struct. Types with a single constructor still
//! get a single-variant enum so every boxed type reads the same way.

use crate::deserialize::{Cursor, Error, Result};
use crate::{Deserializable, Identifiable, Serializable, types};

macro_rules! boxed_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident($ty:path) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub enum $name {
            $( $variant($ty), )+
        }

        impl Serializable for $name {
            fn serialize(&self, buf: &mut impl Extend<u8>) {
                match self {
                    $(
                        Self::$variant(x) => {
                            <$ty as Identifiable>::CONSTRUCTOR_ID.serialize(buf);
                            x.serialize(buf);
                        }
                    )+
                }
            }
        }

        impl Deserializable for $name {
            fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
                let id = u32::deserialize(cur)?;
                $(
                    if id == <$ty as Identifiable>::CONSTRUCTOR_ID {
                        return Ok(Self::$variant(<$ty>::deserialize(cur)?));
                    }
                )+
                Err(Error::UnexpectedConstructor { id })
            }
        }
    };
}

// ─── Handshake ───────────────────────────────────────────────────────────────

boxed_enum! {
    /// `ResPQ`
    pub enum ResPq {
        ResPq(types::ResPq),
    }
}

boxed_enum! {
    /// `P_Q_inner_data`
    pub enum PqInnerData {
        PqInnerData(types::PqInnerData),
    }
}

boxed_enum! {
    /// `Server_DH_Params`
    pub enum ServerDhParams {
        Ok(types::ServerDhParamsOk),
        Fail(types::ServerDhParamsFail),
    }
}

boxed_enum! {
    /// `Server_DH_inner_data`
    pub enum ServerDhInnerData {
        ServerDhInnerData(types::ServerDhInnerData),
    }
}

boxed_enum! {
    /// `Client_DH_Inner_Data`
    pub enum ClientDhInnerData {
        ClientDhInnerData(types::ClientDhInnerData),
    }
}

boxed_enum! {
    /// `Set_client_DH_params_answer`
    pub enum SetClientDhParamsAnswer {
        DhGenOk(types::DhGenOk),
        DhGenRetry(types::DhGenRetry),
        DhGenFail(types::DhGenFail),
    }
}

// ─── Service ─────────────────────────────────────────────────────────────────

boxed_enum! {
    /// `MsgsAck`
    pub enum MsgsAck {
        MsgsAck(types::MsgsAck),
    }
}

boxed_enum! {
    /// `Pong`
    pub enum Pong {
        Pong(types::Pong),
    }
}

boxed_enum! {
    /// `RpcError`
    pub enum RpcError {
        RpcError(types::RpcError),
    }
}

boxed_enum! {
    /// `BadMsgNotification`
    pub enum BadMsgNotification {
        BadMsgNotification(types::BadMsgNotification),
        BadServerSalt(types::BadServerSalt),
    }
}

boxed_enum! {
    /// `NewSession`
    pub enum NewSession {
        NewSessionCreated(types::NewSessionCreated),
    }
}

// ─── Domain ──────────────────────────────────────────────────────────────────

boxed_enum! {
    /// `DcOption`
    pub enum DcOption {
        DcOption(types::DcOption),
    }
}

boxed_enum! {
    /// `Config`
    pub enum Config {
        Config(types::Config),
    }
}

boxed_enum! {
    /// `NearestDc`
    pub enum NearestDc {
        NearestDc(types::NearestDc),
    }
}

boxed_enum! {
    /// `Peer`
    pub enum Peer {
        User(types::PeerUser),
        Chat(types::PeerChat),
        Channel(types::PeerChannel),
    }
}

/// `inputPeerEmpty#7f3b18ea` — fieldless, so no backing struct.
#[derive(Clone, Debug, PartialEq)]
pub enum InputPeer {
    Empty,
    SelfPeer,
    Chat(types::InputPeerChat),
    User(types::InputPeerUser),
    Channel(types::InputPeerChannel),
}

impl InputPeer {
    const EMPTY_ID: u32 = 0x7f3b18ea;
    const SELF_ID: u32 = 0x7da07ec9;
}

impl Serializable for InputPeer {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        match self {
            Self::Empty => Self::EMPTY_ID.serialize(buf),
            Self::SelfPeer => Self::SELF_ID.serialize(buf),
            Self::Chat(x) => {
                types::InputPeerChat::CONSTRUCTOR_ID.serialize(buf);
                x.serialize(buf);
            }
            Self::User(x) => {
                types::InputPeerUser::CONSTRUCTOR_ID.serialize(buf);
                x.serialize(buf);
            }
            Self::Channel(x) => {
                types::InputPeerChannel::CONSTRUCTOR_ID.serialize(buf);
                x.serialize(buf);
            }
        }
    }
}

impl Deserializable for InputPeer {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let id = u32::deserialize(cur)?;
        if id == Self::EMPTY_ID {
            Ok(Self::Empty)
        } else if id == Self::SELF_ID {
            Ok(Self::SelfPeer)
        } else if id == types::InputPeerChat::CONSTRUCTOR_ID {
            Ok(Self::Chat(types::InputPeerChat::deserialize(cur)?))
        } else if id == types::InputPeerUser::CONSTRUCTOR_ID {
            Ok(Self::User(types::InputPeerUser::deserialize(cur)?))
        } else if id == types::InputPeerChannel::CONSTRUCTOR_ID {
            Ok(Self::Channel(types::InputPeerChannel::deserialize(cur)?))
        } else {
            Err(Error::UnexpectedConstructor { id })
        }
    }
}

/// `InputUser` — `inputUserEmpty#b98886cf` and `inputUserSelf#f7c1b13f`
/// are fieldless.
#[derive(Clone, Debug, PartialEq)]
pub enum InputUser {
    Empty,
    SelfUser,
    User(types::InputUser),
}

impl InputUser {
    const EMPTY_ID: u32 = 0xb98886cf;
    const SELF_ID: u32 = 0xf7c1b13f;
}

impl Serializable for InputUser {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        match self {
            Self::Empty => Self::EMPTY_ID.serialize(buf),
            Self::SelfUser => Self::SELF_ID.serialize(buf),
            Self::User(x) => {
                types::InputUser::CONSTRUCTOR_ID.serialize(buf);
                x.serialize(buf);
            }
        }
    }
}

impl Deserializable for InputUser {
    fn deserialize(cur: &mut Cursor<'_>) -> Result<Self> {
        let id = u32::deserialize(cur)?;
        if id == Self::EMPTY_ID {
            Ok(Self::Empty)
        } else if id == Self::SELF_ID {
            Ok(Self::SelfUser)
        } else if id == types::InputUser::CONSTRUCTOR_ID {
            Ok(Self::User(types::InputUser::deserialize(cur)?))
        } else {
            Err(Error::UnexpectedConstructor { id })
        }
    }
}

boxed_enum! {
    /// `User`
    pub enum User {
        Empty(types::UserEmpty),
        User(types::User),
    }
}

boxed_enum! {
    /// `UserFull`
    pub enum UserFull {
        UserFull(types::UserFull),
    }
}

boxed_enum! {
    /// `Contact`
    pub enum Contact {
        Contact(types::Contact),
    }
}

boxed_enum! {
    /// `Chat`
    pub enum Chat {
        Empty(types::ChatEmpty),
        Chat(types::Chat),
        Channel(types::Channel),
    }
}

boxed_enum! {
    /// `Message`
    pub enum Message {
        Empty(types::MessageEmpty),
        Message(types::Message),
    }
}

boxed_enum! {
    /// `Dialog`
    pub enum Dialog {
        Dialog(types::Dialog),
    }
}

pub mod messages {
    //! Boxed types in the `messages.` namespace.

    use super::*;

    boxed_enum! {
        /// `messages.Dialogs`
        pub enum Dialogs {
            Dialogs(types::MessagesDialogs),
        }
    }

    boxed_enum! {
        /// `messages.Messages`
        pub enum Messages {
            Messages(types::MessagesMessages),
        }
    }
}

pub mod auth {
    //! Boxed types in the `auth.` namespace.

    use super::*;

    boxed_enum! {
        /// `auth.Authorization`
        pub enum Authorization {
            Authorization(types::AuthAuthorization),
        }
    }
}
