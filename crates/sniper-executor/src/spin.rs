//! Exact-deadline waiting.
//!
//! Cooperative sleep until shortly before the deadline, then a pure spin
//! on the monotonic clock. The spin holds the worker thread, so the spin
//! window must stay short.

use std::time::{Duration, Instant};

/// Wait until `deadline`, spinning only for the last `spin_window`.
///
/// Returns immediately when the deadline has passed.
pub async fn precise_wait_until(deadline: Instant, spin_window: Duration) {
    let now = Instant::now();
    if deadline <= now {
        return;
    }
    if let Some(wake) = deadline.checked_sub(spin_window) {
        if wake > now {
            tokio::time::sleep_until(tokio::time::Instant::from_std(wake)).await;
        }
    }
    spin_until(deadline);
}

/// Busy-wait on the monotonic clock.
#[inline]
pub fn spin_until(deadline: Instant) {
    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
}

/// `base + offset_ms`, clamped to `base` if the subtraction underflows.
pub fn offset_instant(base: Instant, offset_ms: i64) -> Instant {
    let delta = Duration::from_millis(offset_ms.unsigned_abs());
    if offset_ms >= 0 {
        base + delta
    } else {
        base.checked_sub(delta).unwrap_or(base)
    }
}
