//! The server-side user model.

use mercury_tl::{enums, types};

/// An account registered with this server.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalUser {
    pub id: u32,
    pub access_hash: i64,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
}

impl LocalUser {
    pub fn new(id: u32, phone: &str) -> Self {
        Self {
            id,
            access_hash: derive_access_hash(id, phone),
            phone: phone.to_owned(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    /// Project into the wire `User`, from `requester`'s point of view:
    /// the `self` flag is set iff the requester is looking at themselves.
    pub fn to_tl(&self, requester_id: Option<u32>) -> enums::User {
        let is_self = requester_id == Some(self.id);
        enums::User::User(types::User {
            is_self,
            contact: false,
            id: self.id as i32,
            access_hash: Some(self.access_hash),
            first_name: some_unless_empty(&self.first_name),
            last_name: some_unless_empty(&self.last_name),
            username: None,
            phone: some_unless_empty(&self.phone),
        })
    }
}

fn some_unless_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_owned()) }
}

// Stable per-user hash; not a secret, just an opaque token clients must
// echo back.
fn derive_access_hash(id: u32, phone: &str) -> i64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in id.to_le_bytes().iter().chain(phone.as_bytes()) {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_flag_follows_requester() {
        let user = LocalUser::new(5, "+1000");
        let enums::User::User(tl) = user.to_tl(Some(5)) else { panic!() };
        assert!(tl.is_self);
        let enums::User::User(tl) = user.to_tl(Some(6)) else { panic!() };
        assert!(!tl.is_self);
        let enums::User::User(tl) = user.to_tl(None) else { panic!() };
        assert!(!tl.is_self);
    }

    #[test]
    fn access_hash_is_stable_and_distinct() {
        let a = LocalUser::new(1, "+1000");
        let b = LocalUser::new(2, "+1000");
        assert_eq!(a.access_hash, LocalUser::new(1, "+1000").access_hash);
        assert_ne!(a.access_hash, b.access_hash);
    }

    #[test]
    fn empty_profile_fields_are_omitted() {
        let user = LocalUser::new(5, "+1000");
        let enums::User::User(tl) = user.to_tl(None) else { panic!() };
        assert_eq!(tl.first_name, None);
        assert_eq!(tl.phone.as_deref(), Some("+1000"));
    }
}
