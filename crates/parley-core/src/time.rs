use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as unix seconds
///
/// Falls back to zero if the system clock is set before the epoch
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
