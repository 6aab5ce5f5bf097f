//! Server clock offset.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Offset between the exchange clock and the local clock.
///
/// `offset_ms = server_time - local_time`
/// - Positive: server clock is ahead of local
/// - Negative: server clock is behind local
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClockOffset(pub i64);

impl ClockOffset {
    /// Measure from a server timestamp and the local time it was received at.
    pub fn measure(server_ms: u64, local_at_receipt_ms: u64) -> Self {
        Self(server_ms as i64 - local_at_receipt_ms as i64)
    }

    #[inline]
    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Translate a local timestamp to exchange time.
    #[inline]
    pub fn to_server(&self, local_ms: u64) -> u64 {
        shift(local_ms, self.0)
    }

    /// Translate an exchange timestamp to local time.
    #[inline]
    pub fn to_local(&self, server_ms: u64) -> u64 {
        shift(server_ms, -self.0)
    }
}

fn shift(ms: u64, by: i64) -> u64 {
    if by >= 0 {
        ms.saturating_add(by as u64)
    } else {
        ms.saturating_sub(by.unsigned_abs())
    }
}

impl fmt::Display for ClockOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
