//! Corrected device time.
//!
//! The board's wall clock may start anywhere (no RTC). A peer sends the true
//! epoch with `setTime`; we keep the difference as a signed offset and apply it
//! to every subsequent reading. The raw clock is never adjusted.

use crate::error::ClockError;
use chrono::{Local, TimeZone};
use coaster_traits::WallClock;
use std::sync::Arc;

/// Local timestamp layout used in `getNow`/`setTime` replies.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

pub struct ClockService {
    wall: Arc<dyn WallClock + Send + Sync>,
    offset: i64,
}

impl std::fmt::Debug for ClockService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockService")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl ClockService {
    pub fn new(wall: Arc<dyn WallClock + Send + Sync>) -> Self {
        Self { wall, offset: 0 }
    }

    /// Raw device seconds, without the offset.
    pub fn raw_time(&self) -> i64 {
        self.wall.epoch_secs()
    }

    /// Raw device seconds plus the offset.
    pub fn corrected_time(&self) -> i64 {
        self.raw_time().saturating_add(self.offset)
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Align corrected time with `target` (epoch seconds).
    ///
    /// Rejects `target <= 0`; the offset is left untouched in that case.
    /// Returns the new offset.
    pub fn set_time(&mut self, target: i64) -> Result<i64, ClockError> {
        if target <= 0 {
            return Err(ClockError::InvalidArgument(target));
        }
        self.offset = target.saturating_sub(self.raw_time());
        tracing::info!(target, offset = self.offset, "device time set");
        Ok(self.offset)
    }

    /// Corrected time rendered in the host's local zone.
    pub fn timestamp(&self) -> String {
        format_local(self.corrected_time())
    }
}

/// Render epoch seconds as `YYYY-MM-DD HH:MM:SS±hhmm` in the local zone.
///
/// Out-of-range values render as an empty string.
pub fn format_local(epoch_secs: i64) -> String {
    Local
        .timestamp_opt(epoch_secs, 0)
        .earliest()
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coaster_traits::clock::test_clock::ManualWallClock;

    fn service(raw: i64) -> (ClockService, ManualWallClock) {
        let wall = ManualWallClock::new(raw);
        (ClockService::new(Arc::new(wall.clone())), wall)
    }

    #[test]
    fn offset_starts_at_zero() {
        let (svc, _) = service(42);
        assert_eq!(svc.offset(), 0);
        assert_eq!(svc.corrected_time(), 42);
    }

    #[test]
    fn set_time_tracks_raw_clock_afterwards() {
        let (mut svc, wall) = service(100);
        assert_eq!(svc.set_time(1_700_000_000), Ok(1_699_999_900));
        wall.advance(5);
        assert_eq!(svc.corrected_time(), 1_700_000_005);
        assert_eq!(svc.raw_time(), 105);
    }

    #[test]
    fn non_positive_target_keeps_offset() {
        let (mut svc, _) = service(100);
        svc.set_time(1_000).unwrap();
        assert_eq!(svc.set_time(0), Err(ClockError::InvalidArgument(0)));
        assert_eq!(svc.set_time(-5), Err(ClockError::InvalidArgument(-5)));
        assert_eq!(svc.offset(), 900);
    }

    #[test]
    fn timestamp_has_zone_suffix() {
        let (mut svc, _) = service(1);
        svc.set_time(1_700_000_000).unwrap();
        let ts = svc.timestamp();
        // "2023-11-14 22:13:20+0000" in UTC; the zone varies by host.
        assert_eq!(ts.len(), 24, "{ts}");
        assert!(ts.starts_with("2023-11-1"), "{ts}");
        let sign = ts.as_bytes()[19];
        assert!(sign == b'+' || sign == b'-', "{ts}");
    }
}
