//! In-memory client-side cache of users, chats, dialogs and messages.
//!
//! Everything here is a write-through cache of the last authoritative
//! value the server sent: ingestion is an idempotent upsert, lookups
//! return snapshots, and a miss is a soft failure (logged at debug,
//! `None` returned). Eviction is the embedder's concern.

use std::collections::HashMap;

use mercury_tl::{enums, types};

/// A conversation partner.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Peer {
    User(u32),
    Chat(u32),
    Channel(u32),
}

impl Peer {
    /// Convert the wire form.
    pub fn from_tl(peer: &enums::Peer) -> Self {
        match peer {
            enums::Peer::User(p) => Peer::User(p.user_id as u32),
            enums::Peer::Chat(p) => Peer::Chat(p.chat_id as u32),
            enums::Peer::Channel(p) => Peer::Channel(p.channel_id as u32),
        }
    }
}

/// A renderable view of one stored message.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageSnapshot {
    pub from_id: Option<u32>,
    pub timestamp: i32,
    pub text: String,
    pub outgoing: bool,
    /// Set when the message carries a forward header. The header's
    /// origin peer is intentionally not surfaced.
    pub forwarded: bool,
}

/// The client's data store.
#[derive(Default)]
pub struct DataStore {
    users: HashMap<u32, types::User>,
    chats: HashMap<u32, enums::Chat>,
    dialogs: Vec<types::Dialog>,
    client_messages: HashMap<u32, types::Message>,
    channel_messages: HashMap<u64, types::Message>,
    contact_list: Vec<u32>,
    self_user_id: u32,
}

/// Channel messages are keyed per channel so they can never collide with
/// plain-chat message ids, which are used alone.
pub fn channel_message_key(channel_id: u32, message_id: u32) -> u64 {
    ((channel_id as u64) << 32) | message_id as u64
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Our own user id, or 0 while unknown.
    pub fn self_user_id(&self) -> u32 {
        self.self_user_id
    }

    // ── Ingestion ────────────────────────────────────────────────────────

    pub fn ingest_user(&mut self, user: &enums::User) {
        let user = match user {
            enums::User::User(u) => u,
            enums::User::Empty(_) => return,
        };
        if user.is_self {
            if self.self_user_id != 0 && self.self_user_id != user.id as u32 {
                log::warn!(target: "data.store", "got self user with different id");
            }
            self.self_user_id = user.id as u32;
        }
        self.users.insert(user.id as u32, user.clone());
    }

    pub fn ingest_users(&mut self, users: &[enums::User]) {
        for user in users {
            self.ingest_user(user);
        }
    }

    pub fn ingest_chat(&mut self, chat: &enums::Chat) {
        let id = match chat {
            enums::Chat::Empty(c) => c.id,
            enums::Chat::Chat(c) => c.id,
            enums::Chat::Channel(c) => c.id,
        };
        self.chats.insert(id as u32, chat.clone());
    }

    pub fn ingest_chats(&mut self, chats: &[enums::Chat]) {
        for chat in chats {
            self.ingest_chat(chat);
        }
    }

    pub fn ingest_message(&mut self, message: &enums::Message) {
        let message = match message {
            enums::Message::Message(m) => m,
            enums::Message::Empty(_) => return,
        };
        match &message.to_id {
            enums::Peer::Channel(channel) => {
                let key = channel_message_key(channel.channel_id as u32, message.id as u32);
                self.channel_messages.insert(key, message.clone());
            }
            _ => {
                self.client_messages.insert(message.id as u32, message.clone());
            }
        }
    }

    /// Ingest a dialog batch: the list plus every referenced entity.
    pub fn ingest_dialogs(&mut self, dialogs: &types::MessagesDialogs) {
        self.dialogs = dialogs
            .dialogs
            .iter()
            .map(|enums::Dialog::Dialog(d)| d.clone())
            .collect();
        self.ingest_users(&dialogs.users);
        self.ingest_chats(&dialogs.chats);
        for message in &dialogs.messages {
            self.ingest_message(message);
        }
    }

    /// Ingest a message batch.
    pub fn ingest_messages(&mut self, messages: &types::MessagesMessages) {
        self.ingest_users(&messages.users);
        self.ingest_chats(&messages.chats);
        for message in &messages.messages {
            self.ingest_message(message);
        }
    }

    /// Ingest a sign-in result.
    pub fn ingest_authorization(&mut self, authorization: &types::AuthAuthorization) {
        self.ingest_user(&authorization.user);
    }

    pub fn set_contact_list(&mut self, contacts: &[enums::Contact]) {
        self.contact_list = contacts
            .iter()
            .map(|enums::Contact::Contact(c)| c.user_id as u32)
            .collect();
    }

    // ── Lookups ──────────────────────────────────────────────────────────

    pub fn user(&self, user_id: u32) -> Option<&types::User> {
        let user = self.users.get(&user_id);
        if user.is_none() {
            log::debug!(target: "data.store", "unknown user {user_id}");
        }
        user
    }

    pub fn chat(&self, chat_id: u32) -> Option<&enums::Chat> {
        let chat = self.chats.get(&chat_id);
        if chat.is_none() {
            log::debug!(target: "data.store", "unknown chat {chat_id}");
        }
        chat
    }

    /// The dialog list as peers, in server order.
    pub fn dialogs(&self) -> Vec<Peer> {
        self.dialogs.iter().map(|d| Peer::from_tl(&d.peer)).collect()
    }

    pub fn dialog(&self, peer: Peer) -> Option<&types::Dialog> {
        let dialog = self.dialogs.iter().find(|d| Peer::from_tl(&d.peer) == peer);
        if dialog.is_none() {
            log::debug!(target: "data.store", "unknown dialog {peer:?}");
        }
        dialog
    }

    pub fn contact_list(&self) -> Vec<Peer> {
        self.contact_list.iter().map(|&id| Peer::User(id)).collect()
    }

    /// Look up a message by peer and id.
    pub fn message(&self, peer: Peer, message_id: u32) -> Option<MessageSnapshot> {
        let stored = match peer {
            Peer::Channel(channel_id) => {
                self.channel_messages.get(&channel_message_key(channel_id, message_id))
            }
            _ => self.client_messages.get(&message_id),
        };
        let Some(m) = stored else {
            log::debug!(target: "data.store", "unknown message {message_id} in {peer:?}");
            return None;
        };
        Some(MessageSnapshot {
            from_id: m.from_id.map(|id| id as u32),
            timestamp: m.date,
            text: m.message.clone(),
            outgoing: m.out,
            forwarded: m.fwd_from.is_some(),
        })
    }

    /// Resolve a peer into its caller-side input form.
    ///
    /// The self shortcut applies exactly when the peer is our own user.
    /// Users and channels need a cached access hash; without one the
    /// lookup degrades to `InputPeer::Empty` with a warning.
    pub fn to_input_peer(&self, peer: Peer) -> enums::InputPeer {
        match peer {
            Peer::Chat(chat_id) => {
                enums::InputPeer::Chat(types::InputPeerChat { chat_id: chat_id as i32 })
            }
            Peer::Channel(channel_id) => match self.chats.get(&channel_id) {
                Some(enums::Chat::Channel(channel)) => match channel.access_hash {
                    Some(access_hash) => enums::InputPeer::Channel(types::InputPeerChannel {
                        channel_id: channel_id as i32,
                        access_hash,
                    }),
                    None => {
                        log::warn!(target: "data.store", "channel {channel_id} has no access hash");
                        enums::InputPeer::Empty
                    }
                },
                _ => {
                    log::warn!(target: "data.store", "unknown channel {channel_id}");
                    enums::InputPeer::Empty
                }
            },
            Peer::User(user_id) => {
                if user_id == self.self_user_id {
                    return enums::InputPeer::SelfPeer;
                }
                match self.users.get(&user_id).and_then(|u| u.access_hash) {
                    Some(access_hash) => enums::InputPeer::User(types::InputPeerUser {
                        user_id: user_id as i32,
                        access_hash,
                    }),
                    None => {
                        log::warn!(target: "data.store", "unknown user {user_id}");
                        enums::InputPeer::Empty
                    }
                }
            }
        }
    }
}
