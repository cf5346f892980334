//! ---
//! tbus_section: "01-core-functionality"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Shared primitives and utilities for the command runtime."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::time::{Duration, Instant};

/// Capture an instant suitable for deadline comparisons.
pub fn monotonic_now() -> Instant {
    Instant::now()
}

/// Time left before `deadline`, zero once it has passed.
pub fn remaining_until(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

/// Convert fractional seconds into a duration truncated to whole milliseconds.
///
/// Negative and NaN inputs yield `None` ("no bound"); values too large for
/// `u64` milliseconds saturate.
pub fn truncated_millis_from_secs(seconds: f64) -> Option<Duration> {
    if seconds.is_nan() || seconds < 0.0 {
        return None;
    }
    // `as` saturates for out-of-range floats.
    Some(Duration::from_millis((seconds * 1000.0) as u64))
}
