pub mod clock;

pub use clock::{Clock, MonotonicClock, SystemWallClock, WallClock};

/// Load-cell driver: one filtered weight reading in grams per call.
pub trait Scale {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<f32, Box<dyn std::error::Error + Send + Sync>>;
}

/// Outbound side of the wireless link (one notification per response).
pub trait Notifier {
    /// Whether a peer is currently attached.
    fn is_connected(&self) -> bool;
    fn notify(&mut self, payload: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
