use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Wait until the provided `is_high` predicate becomes false (i.e., line goes low),
/// or a timeout expires. Sleeps in small intervals to avoid CPU spinning.
pub fn wait_until_low_with_timeout(
    mut is_high: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while is_high() {
        if Instant::now() >= deadline {
            return Err(HwError::DataReadyTimeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}

/// Mean of the last `window` raw counts.
#[derive(Debug, Clone)]
pub struct RollingAverage {
    buf: VecDeque<i32>,
    window: usize,
    sum: i64,
}

impl RollingAverage {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            buf: VecDeque::with_capacity(window),
            window,
            sum: 0,
        }
    }

    /// Add a sample and return the mean over what the window holds now.
    pub fn push(&mut self, raw: i32) -> f64 {
        if self.buf.len() == self.window
            && let Some(old) = self.buf.pop_front()
        {
            self.sum -= i64::from(old);
        }
        self.buf.push_back(raw);
        self.sum += i64::from(raw);
        self.sum as f64 / self.buf.len() as f64
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.sum = 0;
    }
}
