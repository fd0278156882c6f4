//! Per-client session state: one logical message stream under an auth key.

use std::time::{SystemTime, UNIX_EPOCH};

use mercury_mtproto::{MsgIdError, MsgIdGen, MsgIdWindow};

/// A session created lazily when a client first presents an unknown
/// `session_id` under a known auth key. Survives connection drops; a
/// reconnect under the same auth key rebinds it.
pub struct Session {
    session_id: i64,
    auth_key_id: u64,
    /// The connection currently driving this session, if any. Exactly one
    /// connection may be attached at a time.
    connection_id: Option<u64>,
    /// The user this session is authorized as, once sign-in completed.
    user_id: Option<u32>,
    inbound: MsgIdWindow,
    outbound_ids: MsgIdGen,
    /// Drives the outbound seq_no parity: content messages get odd
    /// numbers and advance the counter, service messages even numbers.
    sequence: i32,
    pending_acks: Vec<i64>,
}

impl Session {
    pub fn new(auth_key_id: u64, session_id: i64) -> Self {
        Self {
            session_id,
            auth_key_id,
            connection_id: None,
            user_id: None,
            inbound: MsgIdWindow::new(),
            outbound_ids: MsgIdGen::new(),
            sequence: 0,
            pending_acks: Vec::new(),
        }
    }

    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    pub fn auth_key_id(&self) -> u64 {
        self.auth_key_id
    }

    /// Attach to a connection, detaching from the previous one.
    pub fn bind_connection(&mut self, connection_id: u64) -> Option<u64> {
        self.connection_id.replace(connection_id)
    }

    /// The currently attached connection.
    pub fn connection_id(&self) -> Option<u64> {
        self.connection_id
    }

    pub fn user_id(&self) -> Option<u32> {
        self.user_id
    }

    pub fn set_user_id(&mut self, user_id: u32) {
        self.user_id = Some(user_id);
    }

    /// Validate an inbound message id against the replay window.
    pub fn accept_msg_id(&mut self, msg_id: i64) -> Result<(), MsgIdError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64;
        self.inbound.accept(msg_id, now)
    }

    /// Allocate an outbound message id.
    pub fn next_msg_id(&mut self) -> i64 {
        self.outbound_ids.next()
    }

    /// Next content-related seq_no (odd, advances the counter).
    pub fn next_seq_no(&mut self) -> i32 {
        let n = self.sequence * 2 + 1;
        self.sequence += 1;
        n
    }

    /// Next content-unrelated seq_no (even, does not advance).
    pub fn next_seq_no_unrelated(&self) -> i32 {
        self.sequence * 2
    }

    /// Remember a content message we still owe an ack for.
    pub fn push_ack(&mut self, msg_id: i64) {
        self.pending_acks.push(msg_id);
    }

    /// Drain the pending acks for flushing.
    pub fn take_acks(&mut self) -> Vec<i64> {
        std::mem::take(&mut self.pending_acks)
    }

    /// Whether any acks are waiting.
    pub fn has_pending_acks(&self) -> bool {
        !self.pending_acks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_seq_nos_are_odd_and_increasing() {
        let mut s = Session::new(1, 2);
        let a = s.next_seq_no();
        let b = s.next_seq_no();
        assert_eq!(a % 2, 1);
        assert_eq!(b % 2, 1);
        assert!(b > a);
    }

    #[test]
    fn service_seq_nos_are_even_and_do_not_advance() {
        let mut s = Session::new(1, 2);
        assert_eq!(s.next_seq_no_unrelated(), 0);
        assert_eq!(s.next_seq_no_unrelated(), 0);
        s.next_seq_no();
        assert_eq!(s.next_seq_no_unrelated(), 2);
    }

    #[test]
    fn rebind_detaches_previous_connection() {
        let mut s = Session::new(1, 2);
        assert_eq!(s.bind_connection(10), None);
        assert_eq!(s.bind_connection(11), Some(10));
        assert_eq!(s.connection_id(), Some(11));
    }

    #[test]
    fn acks_accumulate_and_drain() {
        let mut s = Session::new(1, 2);
        s.push_ack(100);
        s.push_ack(104);
        assert!(s.has_pending_acks());
        assert_eq!(s.take_acks(), vec![100, 104]);
        assert!(!s.has_pending_acks());
    }
}
