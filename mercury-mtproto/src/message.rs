//! Message-id generation and the receiver-side acceptance window.

use std::time::{SystemTime, UNIX_EPOCH};

/// How far (in seconds) a message id's timestamp may deviate from server
/// time before the message is dropped.
pub const MSG_ID_WINDOW_SECS: i64 = 300;

fn unix_now() -> (u64, u32) {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    (now.as_secs(), now.subsec_nanos())
}

/// Generates strictly monotonic 64-bit message ids.
///
/// The upper 32 bits are unix seconds (corrected by `time_offset`), the
/// lower 32 encode sub-second ordering with the two least significant bits
/// clear. Colliding ids are bumped by 4 so the sequence never repeats.
#[derive(Debug, Default)]
pub struct MsgIdGen {
    last: i64,
    time_offset: i32,
}

impl MsgIdGen {
    /// A generator using the local clock as-is.
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose clock is skewed by `time_offset` seconds, as
    /// learned during the handshake.
    pub fn with_offset(time_offset: i32) -> Self {
        Self { last: 0, time_offset }
    }

    /// Produce the next message id.
    pub fn next(&mut self) -> i64 {
        let (secs, nanos) = unix_now();
        let secs = (secs as i64 + self.time_offset as i64) as u64;
        let mut id = ((secs << 32) | ((nanos as u64) << 2)) as i64;
        if self.last >= id {
            id = self.last + 4;
        }
        self.last = id;
        id
    }
}

/// Why an inbound message id was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MsgIdError {
    /// At or below the session's high-water mark: a duplicate or a replay.
    Replayed,
    /// Timestamp more than the window behind server time.
    TooOld,
    /// Timestamp more than the window ahead of server time.
    TooNew,
}

impl std::fmt::Display for MsgIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replayed => write!(f, "message id replayed"),
            Self::TooOld => write!(f, "message id too far in the past"),
            Self::TooNew => write!(f, "message id too far in the future"),
        }
    }
}

impl std::error::Error for MsgIdError {}

/// Receiver-side message-id validation for one session direction.
///
/// Accepted ids must be strictly greater than every id seen before and
/// carry a timestamp within [`MSG_ID_WINDOW_SECS`] of server time.
#[derive(Debug, Default)]
pub struct MsgIdWindow {
    high_water: i64,
}

impl MsgIdWindow {
    /// An empty window that accepts any in-window id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `msg_id` against `server_time` (unix seconds) and, if it
    /// passes, advance the high-water mark.
    pub fn accept(&mut self, msg_id: i64, server_time: i64) -> Result<(), MsgIdError> {
        let stamp = msg_id >> 32;
        if stamp < server_time - MSG_ID_WINDOW_SECS {
            return Err(MsgIdError::TooOld);
        }
        if stamp > server_time + MSG_ID_WINDOW_SECS {
            return Err(MsgIdError::TooNew);
        }
        if msg_id <= self.high_water {
            return Err(MsgIdError::Replayed);
        }
        self.high_water = msg_id;
        Ok(())
    }

    /// The highest id accepted so far.
    pub fn high_water(&self) -> i64 {
        self.high_water
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_strictly_increase() {
        let mut gen = MsgIdGen::new();
        let mut prev = gen.next();
        for _ in 0..1000 {
            let id = gen.next();
            assert!(id > prev);
            assert_eq!(id & 0b11, 0, "two LSBs must be clear");
            prev = id;
        }
    }

    #[test]
    fn offset_shifts_the_second_stamp() {
        let base = MsgIdGen::new().next() >> 32;
        let skewed = MsgIdGen::with_offset(1000).next() >> 32;
        assert!((skewed - base - 1000).abs() <= 1);
    }

    #[test]
    fn window_accepts_increasing_rejects_replay() {
        let now = 1_700_000_000i64;
        let mut w = MsgIdWindow::new();
        let id = now << 32 | 4;
        assert_eq!(w.accept(id, now), Ok(()));
        assert_eq!(w.accept(id, now), Err(MsgIdError::Replayed));
        assert_eq!(w.accept(id - 4, now), Err(MsgIdError::Replayed));
        assert_eq!(w.accept(id + 4, now), Ok(()));
    }

    #[test]
    fn window_rejects_out_of_band_timestamps() {
        let now = 1_700_000_000i64;
        let mut w = MsgIdWindow::new();
        assert_eq!(w.accept((now - 301) << 32, now), Err(MsgIdError::TooOld));
        assert_eq!(w.accept((now + 301) << 32, now), Err(MsgIdError::TooNew));
        assert_eq!(w.accept((now - 299) << 32, now), Ok(()));
    }
}
