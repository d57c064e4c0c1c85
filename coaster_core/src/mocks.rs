//! Test and helper mocks for coaster_core

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A scale that always errors on read; useful when driving the controller
/// with externally sampled values via `tick`.
pub struct NoopScale;

impl coaster_traits::Scale for NoopScale {
    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop scale")))
    }
}

/// Notifier that records every payload in memory. Clones share the log.
#[derive(Debug, Clone)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    connected: Arc<AtomicBool>,
}

impl Default for MemoryNotifier {
    fn default() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, on: bool) {
        self.connected.store(on, Ordering::Relaxed);
    }

    /// Remove and return everything sent so far.
    pub fn take(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|mut v| std::mem::take(&mut *v))
            .unwrap_or_default()
    }
}

impl coaster_traits::Notifier for MemoryNotifier {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn notify(&mut self, payload: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent
            .lock()
            .map_err(|_| std::io::Error::other("notifier log poisoned"))?
            .push(payload.to_string());
        Ok(())
    }
}
