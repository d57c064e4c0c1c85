#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the coaster firmware host.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; an empty file yields the factory defaults.
//! - Two-point load-cell calibration lives here because it is loaded with the
//!   rest of the bring-up constants.
use serde::Deserialize;
use std::path::Path;

/// Highest control-loop rate accepted from config or `setSamplingRate`.
pub const MAX_RATE_HZ: u32 = 1000;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Sampling {
    /// Control-loop rate in Hz (one tick per period). Changeable at runtime.
    pub rate_hz: u32,
    /// Max time to wait for one scale reading (ms).
    pub sensor_timeout_ms: u64,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            rate_hz: 40,
            sensor_timeout_ms: 150,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterCfg {
    /// EMA smoothing factor in (0.0, 1.0].
    pub ema_alpha: f32,
    /// Raw readings below this are clamped to exactly 0 g.
    pub zero_epsilon_g: f32,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            ema_alpha: 0.6,
            zero_epsilon_g: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StabilityCfg {
    /// Number of conditioned samples in the stability window.
    pub window: usize,
    /// Max spread (max - min) of the window to count as stable (grams).
    pub tolerance_g: f32,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self {
            window: 10,
            tolerance_g: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EventsCfg {
    /// Stable weights at or below this are "no cup" (grams).
    pub zero_threshold_g: f32,
    /// Plateau deltas smaller than this are treated as noise (grams).
    pub confirmation_threshold_g: f32,
    /// Max difference for a stable reading to extend an open measurement (grams).
    pub measurement_tolerance_g: f32,
    /// Keep the continuous Measurement trace in the record store.
    pub record_measurements: bool,
}

impl Default for EventsCfg {
    fn default() -> Self {
        Self {
            zero_threshold_g: 1.0,
            confirmation_threshold_g: 2.0,
            measurement_tolerance_g: 1.0,
            record_measurements: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommandsCfg {
    /// Queued commands older than this at drain time are dropped (ms).
    pub stale_ms: u64,
    /// Max pending command lines; pushes beyond this are rejected.
    pub queue_capacity: usize,
}

impl Default for CommandsCfg {
    fn default() -> Self {
        Self {
            stale_ms: 1000,
            queue_capacity: 64,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
    /// Initial verbosity (0-3) of the `raw` diagnostic printer.
    pub raw_level: u8,
    /// Initial verbosity (0-3) of the `event` diagnostic printer.
    pub event_level: u8,
    /// Initial verbosity (0-3) of the `status` diagnostic printer.
    pub status_level: u8,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            file: None,
            level: None,
            rotation: None,
            raw_level: 0,
            event_level: 1,
            status_level: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Hardware {
    /// HX711 data pin (BCM numbering).
    pub hx711_dt: u8,
    /// HX711 clock pin (BCM numbering).
    pub hx711_sck: u8,
    /// Trailing clock pulses selecting gain/channel for the next read (25..=27).
    pub gain_pulses: u8,
    /// Rolling-average window applied to raw counts before calibration.
    pub average_window: usize,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            hx711_dt: 21,
            hx711_sck: 22,
            gain_pulses: 25,
            average_window: 10,
        }
    }
}

/// Two-point linear calibration: `low` counts read 0 g, `high` counts read `weight_g`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Calibration {
    pub low: i64,
    pub high: i64,
    pub weight_g: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            low: -400,
            high: 998_000,
            weight_g: 950.0,
        }
    }
}

impl Calibration {
    /// Build a calibration from two reference points.
    pub fn from_points(low: i64, high: i64, weight_g: f32) -> eyre::Result<Self> {
        let c = Self {
            low,
            high,
            weight_g,
        };
        c.check()?;
        Ok(c)
    }

    fn check(&self) -> eyre::Result<()> {
        if self.high == self.low {
            eyre::bail!("calibration.high must differ from calibration.low");
        }
        if !(self.weight_g.is_finite() && self.weight_g > 0.0) {
            eyre::bail!("calibration.weight_g must be > 0");
        }
        Ok(())
    }

    /// Map raw counts to grams, clamping negative results to 0.
    pub fn to_grams(&self, raw: f64) -> f32 {
        let span = (self.high - self.low) as f64;
        if span == 0.0 {
            return 0.0;
        }
        let g = (raw - self.low as f64) * f64::from(self.weight_g) / span;
        (g as f32).max(0.0)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub sampling: Sampling,
    pub filter: FilterCfg,
    pub stability: StabilityCfg,
    pub events: EventsCfg,
    pub commands: CommandsCfg,
    pub logging: Logging,
    pub hardware: Hardware,
    pub calibration: Calibration,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

#[inline]
fn non_negative(x: f32) -> bool {
    x.is_finite() && x >= 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sampling
        if self.sampling.rate_hz == 0 {
            eyre::bail!("sampling.rate_hz must be > 0");
        }
        if self.sampling.rate_hz > MAX_RATE_HZ {
            eyre::bail!("sampling.rate_hz is unreasonably large (>{MAX_RATE_HZ})");
        }
        if self.sampling.sensor_timeout_ms == 0 {
            eyre::bail!("sampling.sensor_timeout_ms must be >= 1");
        }

        // Filter
        let alpha = self.filter.ema_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            eyre::bail!("filter.ema_alpha must be in (0.0, 1.0]");
        }
        if !non_negative(self.filter.zero_epsilon_g) {
            eyre::bail!("filter.zero_epsilon_g must be >= 0");
        }

        // Stability
        if self.stability.window == 0 {
            eyre::bail!("stability.window must be >= 1");
        }
        if self.stability.window > 10_000 {
            eyre::bail!("stability.window is unreasonably large (>10000)");
        }
        if !non_negative(self.stability.tolerance_g) {
            eyre::bail!("stability.tolerance_g must be >= 0");
        }

        // Events
        if !non_negative(self.events.zero_threshold_g) {
            eyre::bail!("events.zero_threshold_g must be >= 0");
        }
        if !non_negative(self.events.confirmation_threshold_g) {
            eyre::bail!("events.confirmation_threshold_g must be >= 0");
        }
        if !non_negative(self.events.measurement_tolerance_g) {
            eyre::bail!("events.measurement_tolerance_g must be >= 0");
        }

        // Commands
        if self.commands.stale_ms == 0 {
            eyre::bail!("commands.stale_ms must be >= 1");
        }
        if self.commands.queue_capacity == 0 {
            eyre::bail!("commands.queue_capacity must be >= 1");
        }

        // Logging
        for (name, level) in [
            ("raw_level", self.logging.raw_level),
            ("event_level", self.logging.event_level),
            ("status_level", self.logging.status_level),
        ] {
            if level > 3 {
                eyre::bail!("logging.{name} must be in 0..=3");
            }
        }
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Hardware
        if !(25..=27).contains(&self.hardware.gain_pulses) {
            eyre::bail!("hardware.gain_pulses must be in 25..=27");
        }
        if self.hardware.average_window == 0 {
            eyre::bail!("hardware.average_window must be >= 1");
        }

        // Calibration
        self.calibration.check()?;

        Ok(())
    }
}
