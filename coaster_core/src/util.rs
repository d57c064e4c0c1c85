//! Tick timing helpers.

use std::time::Duration;

const MICROS_PER_SEC: u64 = 1_000_000;

/// Tick period in microseconds for `hz`, never below 1 µs.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    debug_assert!(hz > 0, "rate_hz must be > 0");
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Tick period for the control loop at `hz`.
///
/// Microsecond resolution keeps rates such as 600 Hz or 7 Hz within one
/// microsecond of the requested period.
#[inline]
pub fn tick_period(hz: u32) -> Duration {
    Duration::from_micros(period_us(hz))
}
