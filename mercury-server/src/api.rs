//! The server API: the one resource shared by every connection.
//!
//! All registries live behind a single mutex so each public method is
//! atomic from a caller's point of view. The RPC routing table and RSA
//! key are immutable after startup and shared without locking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};

use mercury_crypto::{AuthKey, rsa};
use mercury_mtproto::dc::DcConfiguration;
use mercury_tl::enums;

use crate::config::ServerConfig;
use crate::rpc::RpcRouter;
use crate::session::Session;
use crate::user::LocalUser;

/// The configured RSA key material did not parse.
#[derive(Clone, Debug, PartialEq)]
pub struct InvalidKeyConfig;

impl std::fmt::Display for InvalidKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configured RSA key material is invalid")
    }
}

impl std::error::Error for InvalidKeyConfig {}

struct Registries {
    users: HashMap<u32, LocalUser>,
    auth_keys: HashMap<u64, AuthKey>,
    sessions: HashMap<i64, Arc<Mutex<Session>>>,
    next_user_id: u32,
}

/// Authoritative registries plus startup-time immutable state.
pub struct ServerApi {
    config: ServerConfig,
    rsa_key: Arc<rsa::Key>,
    router: RpcRouter,
    server_salt: i64,
    next_connection_id: AtomicU64,
    inner: Mutex<Registries>,
}

impl ServerApi {
    /// Build the API from configuration. The RPC routing table is fixed
    /// here and never changes afterwards.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, InvalidKeyConfig> {
        let rsa_key = Arc::new(config.private_key().ok_or(InvalidKeyConfig)?);
        let mut salt = [0u8; 8];
        getrandom::getrandom(&mut salt).expect("getrandom failed");
        Ok(Arc::new(Self {
            config,
            rsa_key,
            router: RpcRouter::with_builtin_factories(),
            server_salt: i64::from_le_bytes(salt),
            next_connection_id: AtomicU64::new(1),
            inner: Mutex::new(Registries {
                users: HashMap::new(),
                auth_keys: HashMap::new(),
                sessions: HashMap::new(),
                next_user_id: 1,
            }),
        }))
    }

    fn lock(&self) -> MutexGuard<'_, Registries> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn rsa_key(&self) -> Arc<rsa::Key> {
        Arc::clone(&self.rsa_key)
    }

    pub fn router(&self) -> &RpcRouter {
        &self.router
    }

    pub fn dc_configuration(&self) -> DcConfiguration {
        self.config.dc_configuration()
    }

    /// The salt the server currently asserts.
    pub fn current_server_salt(&self) -> i64 {
        self.server_salt
    }

    /// Allocate an id for a new connection.
    pub fn next_connection_id(&self) -> u64 {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    // ── Users ────────────────────────────────────────────────────────────

    /// Create and register an account for `phone`.
    pub fn add_user(&self, phone: &str) -> LocalUser {
        let mut inner = self.lock();
        let id = inner.next_user_id;
        inner.next_user_id += 1;
        let user = LocalUser::new(id, phone);
        inner.users.insert(id, user.clone());
        user
    }

    /// Snapshot of the user with `id`.
    pub fn get_user_by_id(&self, id: u32) -> Option<LocalUser> {
        self.lock().users.get(&id).cloned()
    }

    /// Resolve an `InputUser` on behalf of `requester`. A wrong
    /// `access_hash` resolves to nothing, exactly like an unknown id.
    pub fn get_user(&self, input: &enums::InputUser, requester: Option<u32>) -> Option<LocalUser> {
        match input {
            enums::InputUser::Empty => None,
            enums::InputUser::SelfUser => self.get_user_by_id(requester?),
            enums::InputUser::User(u) => {
                let found = self.get_user_by_id(u.user_id as u32)?;
                if found.access_hash == u.access_hash || requester == Some(found.id) {
                    Some(found)
                } else {
                    log::debug!(target: "rpc.layer", "access_hash mismatch for user {}", u.user_id);
                    None
                }
            }
        }
    }

    // ── Auth keys ────────────────────────────────────────────────────────

    /// Register a freshly established key. Keys are immutable and live as
    /// long as the registry.
    pub fn store_auth_key(&self, key: AuthKey) {
        self.lock().auth_keys.insert(key.key_id(), key);
    }

    /// Look up a key by the id presented in a packet header.
    pub fn get_auth_key_by_id(&self, key_id: u64) -> Option<AuthKey> {
        self.lock().auth_keys.get(&key_id).cloned()
    }

    // ── Sessions ─────────────────────────────────────────────────────────

    /// Find the session for `(auth_key_id, session_id)`, creating it on
    /// first sight, and attach it to `connection_id`. Returns the session
    /// and whether it was newly created.
    pub fn find_or_create_session(
        &self,
        auth_key_id: u64,
        session_id: i64,
        connection_id: u64,
    ) -> (Arc<Mutex<Session>>, bool) {
        let mut inner = self.lock();
        let (session, created) = match inner.sessions.get(&session_id) {
            Some(existing) => (Arc::clone(existing), false),
            None => {
                let fresh = Arc::new(Mutex::new(Session::new(auth_key_id, session_id)));
                inner.sessions.insert(session_id, Arc::clone(&fresh));
                (fresh, true)
            }
        };
        drop(inner);

        let previous = session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .bind_connection(connection_id);
        match previous {
            Some(old) if old != connection_id => {
                log::info!(
                    target: "rpc.layer",
                    "session {session_id:#x} rebound from connection {old} to {connection_id}"
                );
            }
            _ => {}
        }
        (session, created)
    }

    /// Drop a session for good (explicit invalidation).
    pub fn invalidate_session(&self, session_id: i64) -> bool {
        self.lock().sessions.remove(&session_id).is_some()
    }

    /// Authorize an existing session as `user_id`. Returns false when the
    /// session is unknown.
    pub fn bind_session_user(&self, session_id: i64, user_id: u32) -> bool {
        let session = match self.lock().sessions.get(&session_id) {
            Some(s) => Arc::clone(s),
            None => return false,
        };
        session.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).set_user_id(user_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercury_tl::types;

    fn api() -> Arc<ServerApi> {
        ServerApi::new(ServerConfig::default()).unwrap()
    }

    #[test]
    fn add_user_assigns_sequential_ids() {
        let api = api();
        assert_eq!(api.add_user("+1000").id, 1);
        assert_eq!(api.add_user("+1001").id, 2);
    }

    #[test]
    fn input_user_resolution() {
        let api = api();
        let alice = api.add_user("+1000");

        // Bare id with the right hash resolves.
        let input = enums::InputUser::User(types::InputUser {
            user_id: alice.id as i32,
            access_hash: alice.access_hash,
        });
        assert_eq!(api.get_user(&input, None), Some(alice.clone()));

        // Wrong hash resolves to nothing for strangers...
        let wrong = enums::InputUser::User(types::InputUser {
            user_id: alice.id as i32,
            access_hash: 0,
        });
        assert_eq!(api.get_user(&wrong, None), None);
        // ...but the account owner may always reference themselves.
        assert_eq!(api.get_user(&wrong, Some(alice.id)), Some(alice.clone()));

        // Self shortcut needs a signed-in requester.
        assert_eq!(api.get_user(&enums::InputUser::SelfUser, None), None);
        assert_eq!(api.get_user(&enums::InputUser::SelfUser, Some(alice.id)), Some(alice));

        assert_eq!(api.get_user(&enums::InputUser::Empty, None), None);
    }

    #[test]
    fn auth_keys_are_looked_up_by_id() {
        let api = api();
        let key = AuthKey::from_bytes([3u8; 256]);
        api.store_auth_key(key.clone());
        assert_eq!(api.get_auth_key_by_id(key.key_id()), Some(key));
        assert_eq!(api.get_auth_key_by_id(0xDEADBEEFDEADBEEF), None);
    }

    #[test]
    fn session_is_created_once_and_rebound() {
        let api = api();
        let (s1, created) = api.find_or_create_session(7, 100, 1);
        assert!(created);
        let (s2, created) = api.find_or_create_session(7, 100, 2);
        assert!(!created);
        assert!(Arc::ptr_eq(&s1, &s2));
        assert_eq!(s1.lock().unwrap().connection_id(), Some(2));
    }

    #[test]
    fn invalidated_sessions_are_gone() {
        let api = api();
        api.find_or_create_session(7, 100, 1);
        assert!(api.invalidate_session(100));
        assert!(!api.invalidate_session(100));
        let (_, created) = api.find_or_create_session(7, 100, 1);
        assert!(created);
    }
}
