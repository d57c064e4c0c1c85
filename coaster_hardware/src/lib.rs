//! Scale drivers for the coaster.
//!
//! - `ScriptedScale` replays a list of weights (host runs and tests).
//! - `SimulatedScale` reports a weight set from another thread.
//! - `CalibratedScale` turns raw load-cell counts into grams with a rolling
//!   average and two-point calibration; with the `hardware` feature it wraps
//!   the HX711 driver.

pub mod error;
#[cfg(feature = "hardware")]
pub mod hx711;
pub mod util;

use coaster_config::Calibration;
use coaster_traits::Scale;
use error::{HwError, Result};
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use util::RollingAverage;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Replays a fixed weight sequence, looping at the end.
#[derive(Debug, Clone)]
pub struct ScriptedScale {
    weights: Vec<f32>,
    next: usize,
}

impl ScriptedScale {
    pub fn new(weights: Vec<f32>) -> Result<Self> {
        if weights.is_empty() {
            return Err(HwError::Script {
                line: 0,
                msg: "no weights".into(),
            });
        }
        Ok(Self { weights, next: 0 })
    }

    /// Parse one weight (grams) per line; blank lines and `#` comments are skipped.
    pub fn from_reader(r: impl BufRead) -> Result<Self> {
        let mut weights = Vec::new();
        for (i, line) in r.lines().enumerate() {
            let line = line?;
            let t = line.trim();
            if t.is_empty() || t.starts_with('#') {
                continue;
            }
            let w = t.parse::<f32>().map_err(|e| HwError::Script {
                line: i + 1,
                msg: format!("{t:?}: {e}"),
            })?;
            weights.push(w);
        }
        Self::new(weights)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let f = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(f))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl Scale for ScriptedScale {
    fn read(&mut self, _timeout: Duration) -> std::result::Result<f32, BoxError> {
        let w = self.weights[self.next];
        self.next = (self.next + 1) % self.weights.len();
        Ok(w)
    }
}

/// Shared handle for setting a `SimulatedScale`'s weight.
#[derive(Debug, Clone)]
pub struct WeightHandle(Arc<AtomicU32>);

impl WeightHandle {
    pub fn set(&self, grams: f32) {
        self.0.store(grams.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Reports whatever weight was last set through its handle.
#[derive(Debug, Clone)]
pub struct SimulatedScale {
    weight: WeightHandle,
}

impl Default for SimulatedScale {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl SimulatedScale {
    pub fn new(grams: f32) -> Self {
        let weight = WeightHandle(Arc::new(AtomicU32::new(grams.to_bits())));
        Self { weight }
    }

    pub fn handle(&self) -> WeightHandle {
        self.weight.clone()
    }
}

impl Scale for SimulatedScale {
    fn read(&mut self, _timeout: Duration) -> std::result::Result<f32, BoxError> {
        let w = self.weight.get();
        tracing::trace!(grams = w, "simulated scale read");
        Ok(w)
    }
}

/// Source of raw ADC counts (e.g. an HX711).
pub trait CountSource {
    fn read_counts(&mut self, timeout: Duration) -> Result<i32>;
}

/// Raw counts → rolling average → calibrated grams (clamped at 0).
pub struct CalibratedScale<C: CountSource> {
    source: C,
    average: RollingAverage,
    calibration: Calibration,
    max_retries: u32,
}

impl<C: CountSource> CalibratedScale<C> {
    pub fn new(source: C, average_window: usize, calibration: Calibration) -> Self {
        Self {
            source,
            average: RollingAverage::new(average_window),
            calibration,
            max_retries: 3,
        }
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Swap calibration points; the averaging window is kept.
    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = calibration;
    }
}

impl<C: CountSource> Scale for CalibratedScale<C> {
    fn read(&mut self, timeout: Duration) -> std::result::Result<f32, BoxError> {
        let mut attempts = 0;
        loop {
            match self.source.read_counts(timeout) {
                Ok(raw) => {
                    let mean = self.average.push(raw);
                    let grams = self.calibration.to_grams(mean);
                    tracing::trace!(raw, mean, grams, "calibrated sample");
                    return Ok(grams);
                }
                Err(HwError::Timeout | HwError::DataReadyTimeout) if attempts < self.max_retries => {
                    attempts += 1;
                    tracing::warn!(retries = attempts, "scale timeout, retrying");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scale read error");
                    return Err(Box::new(e));
                }
            }
        }
    }
}

/// HX711 on the configured pins with the configured calibration.
#[cfg(feature = "hardware")]
pub type HardwareScale = CalibratedScale<hx711::Hx711>;

#[cfg(feature = "hardware")]
pub fn open_hardware_scale(cfg: &coaster_config::Config) -> Result<HardwareScale> {
    let hx = hx711::Hx711::open(&cfg.hardware)?;
    tracing::info!(
        dt = cfg.hardware.hx711_dt,
        sck = cfg.hardware.hx711_sck,
        "hx711 opened"
    );
    Ok(CalibratedScale::new(
        hx,
        cfg.hardware.average_window,
        cfg.calibration,
    ))
}
