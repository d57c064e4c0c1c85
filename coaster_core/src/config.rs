//! Runtime configuration types for the device core.
//!
//! These are separate from the TOML-deserialized config in `coaster_config`;
//! see `conversions` for the bridging `From` impls.

/// Signal conditioning: zero clamp, EMA smoothing and the stability window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionerCfg {
    /// EMA smoothing factor in (0.0, 1.0]. 1.0 disables smoothing.
    pub ema_alpha: f32,
    /// Raw readings below this are clamped to exactly 0 g.
    pub zero_epsilon_g: f32,
    /// Number of conditioned samples in the stability window.
    pub window: usize,
    /// Max spread (max - min) of a full window to count as stable.
    pub tolerance_g: f32,
}

impl Default for ConditionerCfg {
    fn default() -> Self {
        Self {
            ema_alpha: 0.6,
            zero_epsilon_g: 0.1,
            window: 10,
            tolerance_g: 1.0,
        }
    }
}

/// Event inference thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceCfg {
    /// Stable weights at or below this mean "no cup".
    pub zero_threshold_g: f32,
    /// Plateau deltas smaller than this are noise, not sips or refills.
    pub confirmation_threshold_g: f32,
    /// Max difference for a stable reading to close an open measurement.
    pub measurement_tolerance_g: f32,
    /// Append the continuous Measurement trace to the record store.
    pub record_measurements: bool,
}

impl Default for InferenceCfg {
    fn default() -> Self {
        Self {
            zero_threshold_g: 1.0,
            confirmation_threshold_g: 2.0,
            measurement_tolerance_g: 1.0,
            record_measurements: true,
        }
    }
}

/// Command intake limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandCfg {
    /// Commands older than this when drained are discarded (ms).
    pub stale_ms: u64,
    /// Max pending lines in the command queue.
    pub queue_capacity: usize,
}

impl Default for CommandCfg {
    fn default() -> Self {
        Self {
            stale_ms: 1000,
            queue_capacity: 64,
        }
    }
}

/// Initial verbosity (0-3) of each diagnostic printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterLevels {
    pub raw: u8,
    pub event: u8,
    pub status: u8,
}

impl Default for PrinterLevels {
    fn default() -> Self {
        Self {
            raw: 0,
            event: 1,
            status: 1,
        }
    }
}

/// Everything needed to (re)build a `DeviceContext` and its controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceCfg {
    /// Initial sampling rate (Hz); `setSamplingRate` changes it at runtime.
    pub rate_hz: u32,
    /// Per-read scale timeout (ms).
    pub sensor_timeout_ms: u64,
    pub conditioner: ConditionerCfg,
    pub inference: InferenceCfg,
    pub commands: CommandCfg,
    pub printers: PrinterLevels,
}

impl Default for DeviceCfg {
    fn default() -> Self {
        Self {
            rate_hz: 40,
            sensor_timeout_ms: 150,
            conditioner: ConditionerCfg::default(),
            inference: InferenceCfg::default(),
            commands: CommandCfg::default(),
            printers: PrinterLevels::default(),
        }
    }
}
