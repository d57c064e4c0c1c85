//! Signal conditioning: zero clamp, exponential smoothing and stability.
//!
//! Each raw weight passes through three stages:
//! - values below `zero_epsilon_g` are clamped to exactly 0 g
//! - an EMA smooths the clamped value (`y = y + alpha * (x - y)`)
//! - the smoothed value enters a fixed-size circular window; the signal is
//!   stable once the window is full and `max - min <= tolerance_g`
//!
//! A non-finite raw value resets all state and is reported unstable.

use crate::config::ConditionerCfg;

/// Exponential moving average seeded by its first input.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f32,
    value: Option<f32>,
}

impl Ema {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(f32::MIN_POSITIVE, 1.0),
            value: None,
        }
    }

    /// Fold `x` into the average and return the new value.
    ///
    /// Written in incremental form so a constant input is a fixed point.
    pub fn update(&mut self, x: f32) -> f32 {
        let y = match self.value {
            Some(prev) => prev + self.alpha * (x - prev),
            None => x,
        };
        self.value = Some(y);
        y
    }

    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Circular window of the last `capacity` values.
#[derive(Debug, Clone)]
pub struct StabilityWindow {
    buf: Vec<f32>,
    capacity: usize,
    next: usize,
    tolerance: f32,
}

impl StabilityWindow {
    pub fn new(capacity: usize, tolerance: f32) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            next: 0,
            tolerance,
        }
    }

    /// Insert `x`, overwriting the oldest entry once full, and report stability.
    pub fn push(&mut self, x: f32) -> bool {
        if self.buf.len() < self.capacity {
            self.buf.push(x);
        } else {
            self.buf[self.next] = x;
        }
        self.next = (self.next + 1) % self.capacity;
        self.is_stable()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    /// `max - min` over the current contents, or `None` while empty.
    pub fn spread(&self) -> Option<f32> {
        let first = *self.buf.first()?;
        let (lo, hi) = self
            .buf
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(hi - lo)
    }

    pub fn is_stable(&self) -> bool {
        self.is_full() && self.spread().is_some_and(|s| s <= self.tolerance)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.next = 0;
    }
}

/// One conditioned sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditioned {
    /// Smoothed weight in grams.
    pub grams: f32,
    pub stable: bool,
}

#[derive(Debug, Clone)]
pub struct SignalConditioner {
    ema: Ema,
    window: StabilityWindow,
    zero_epsilon: f32,
}

impl SignalConditioner {
    pub fn new(cfg: &ConditionerCfg) -> Self {
        Self {
            ema: Ema::new(cfg.ema_alpha),
            window: StabilityWindow::new(cfg.window, cfg.tolerance_g),
            zero_epsilon: cfg.zero_epsilon_g,
        }
    }

    /// Clamp and smooth one raw value; does not touch the stability window.
    pub fn update(&mut self, raw: f32) -> f32 {
        let x = if raw < self.zero_epsilon { 0.0 } else { raw };
        self.ema.update(x)
    }

    /// Push a conditioned value into the window and report stability.
    pub fn is_stable(&mut self, value: f32) -> bool {
        self.window.push(value)
    }

    /// Full pipeline for one raw reading.
    pub fn condition(&mut self, raw: f32) -> Conditioned {
        if !raw.is_finite() {
            tracing::warn!(raw, "non-finite reading; conditioner reset");
            self.reset();
            return Conditioned {
                grams: 0.0,
                stable: false,
            };
        }
        let grams = self.update(raw);
        let stable = self.is_stable(grams);
        Conditioned { grams, stable }
    }

    /// Last smoothed value, if any reading has been seen since reset.
    pub fn last(&self) -> Option<f32> {
        self.ema.value()
    }

    pub fn window(&self) -> &StabilityWindow {
        &self.window
    }

    pub fn reset(&mut self) {
        self.ema.reset();
        self.window.reset();
    }
}
