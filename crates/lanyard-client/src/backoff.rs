//! Reconnect backoff curve.

use std::time::Duration;

const BASE_DELAY_MS: u64 = 1_000;
const MAX_DELAY_MS: u64 = 30_000;

/// Delay before reconnect attempt number `attempt` (1-based).
///
/// `min(1000 * 2^attempt, 30000)` ms: 2s, 4s, 8s, 16s, then 30s.
pub fn reconnect_delay(attempt: u32) -> Duration {
    let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(BASE_DELAY_MS.saturating_mul(factor).min(MAX_DELAY_MS))
}
