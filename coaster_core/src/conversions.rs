//! `From` implementations bridging `coaster_config` types to `coaster_core` types.

use crate::config::{CommandCfg, ConditionerCfg, DeviceCfg, InferenceCfg, PrinterLevels};

// ── ConditionerCfg ───────────────────────────────────────────────────────────

impl From<&coaster_config::Config> for ConditionerCfg {
    fn from(c: &coaster_config::Config) -> Self {
        Self {
            ema_alpha: c.filter.ema_alpha,
            zero_epsilon_g: c.filter.zero_epsilon_g,
            window: c.stability.window,
            tolerance_g: c.stability.tolerance_g,
        }
    }
}

// ── InferenceCfg ─────────────────────────────────────────────────────────────

impl From<&coaster_config::EventsCfg> for InferenceCfg {
    fn from(c: &coaster_config::EventsCfg) -> Self {
        Self {
            zero_threshold_g: c.zero_threshold_g,
            confirmation_threshold_g: c.confirmation_threshold_g,
            measurement_tolerance_g: c.measurement_tolerance_g,
            record_measurements: c.record_measurements,
        }
    }
}

// ── CommandCfg ───────────────────────────────────────────────────────────────

impl From<&coaster_config::CommandsCfg> for CommandCfg {
    fn from(c: &coaster_config::CommandsCfg) -> Self {
        Self {
            stale_ms: c.stale_ms,
            queue_capacity: c.queue_capacity,
        }
    }
}

// ── PrinterLevels ────────────────────────────────────────────────────────────

impl From<&coaster_config::Logging> for PrinterLevels {
    fn from(c: &coaster_config::Logging) -> Self {
        Self {
            raw: c.raw_level,
            event: c.event_level,
            status: c.status_level,
        }
    }
}

// ── DeviceCfg ────────────────────────────────────────────────────────────────

impl From<&coaster_config::Config> for DeviceCfg {
    fn from(c: &coaster_config::Config) -> Self {
        Self {
            rate_hz: c.sampling.rate_hz,
            sensor_timeout_ms: c.sampling.sensor_timeout_ms,
            conditioner: ConditionerCfg::from(c),
            inference: InferenceCfg::from(&c.events),
            commands: CommandCfg::from(&c.commands),
            printers: PrinterLevels::from(&c.logging),
        }
    }
}
