// Lifecycle constants (no magic values)
use std::time::Duration;

/// Pending orders older than this are abandoned by helpers (30 minutes)
pub const DEFAULT_PICKUP_GRACE_MS: i64 = 30 * 60 * 1000;

/// Interval between in-process sweep passes (1 minute)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
