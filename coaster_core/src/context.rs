//! The device's RAM state, owned by the control loop.
//!
//! Everything a command or a tick may touch lives here and is passed by
//! `&mut` into the dispatcher and the inference engine. A device restart is
//! modelled by rebuilding the context from its `DeviceCfg`.

use crate::clock_service::ClockService;
use crate::conditioner::SignalConditioner;
use crate::config::DeviceCfg;
use crate::error::BuildError;
use crate::inference::EventInferenceEngine;
use crate::printers::Printers;
use crate::records::RecordStore;
use coaster_config::MAX_RATE_HZ;
use coaster_traits::WallClock;
use std::sync::Arc;

#[derive(Debug)]
pub struct DeviceContext {
    pub clock: ClockService,
    pub records: RecordStore,
    pub printers: Printers,
    pub conditioner: SignalConditioner,
    pub engine: EventInferenceEngine,
    rate_hz: u32,
}

impl DeviceContext {
    pub fn new(
        cfg: &DeviceCfg,
        wall: Arc<dyn WallClock + Send + Sync>,
    ) -> Result<Self, BuildError> {
        if !(1..=MAX_RATE_HZ).contains(&cfg.rate_hz) {
            return Err(BuildError::InvalidConfig("rate_hz must be in 1..=1000"));
        }
        if cfg.conditioner.window == 0 {
            return Err(BuildError::InvalidConfig("stability window must be >= 1"));
        }
        let alpha = cfg.conditioner.ema_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(BuildError::InvalidConfig("ema_alpha must be in (0.0, 1.0]"));
        }
        Ok(Self {
            clock: ClockService::new(wall),
            records: RecordStore::new(),
            printers: Printers::from(&cfg.printers),
            conditioner: SignalConditioner::new(&cfg.conditioner),
            engine: EventInferenceEngine::new(cfg.inference),
            rate_hz: cfg.rate_hz,
        })
    }

    pub fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    /// Change the sampling rate; values outside `1..=MAX_RATE_HZ` are ignored.
    pub fn set_rate_hz(&mut self, hz: u32) -> bool {
        if !(1..=MAX_RATE_HZ).contains(&hz) {
            return false;
        }
        self.rate_hz = hz;
        true
    }

    pub fn is_logging(&self) -> bool {
        self.records.is_logging()
    }
}
