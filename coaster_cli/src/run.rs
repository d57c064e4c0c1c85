//! `coaster run`: wire the link and a scale to the controller and loop.

use crate::link::{spawn_reader, spawn_writer};
use coaster_core::{Controller, DeviceCfg, RunStats};
use coaster_traits::{MonotonicClock, Scale, SystemWallClock};
use eyre::WrapErr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Scale selection: a replay script wins, then real hardware when built in,
/// then an idle simulated coaster.
pub fn open_scale(
    cfg: &coaster_config::Config,
    script: Option<&Path>,
) -> eyre::Result<Box<dyn Scale + Send>> {
    if let Some(path) = script {
        let s = coaster_hardware::ScriptedScale::from_file(path)?;
        tracing::info!(path = %path.display(), weights = s.len(), "replaying weight script");
        return Ok(Box::new(s));
    }
    #[cfg(feature = "hardware")]
    {
        let s = coaster_hardware::open_hardware_scale(cfg)?;
        return Ok(Box::new(s));
    }
    #[cfg(not(feature = "hardware"))]
    {
        let _ = cfg;
        tracing::info!("no scale configured; using simulated empty coaster");
        Ok(Box::new(coaster_hardware::SimulatedScale::default()))
    }
}

pub fn run(
    cfg: &coaster_config::Config,
    ticks: Option<u64>,
    script: Option<&Path>,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<RunStats> {
    let mut scale = open_scale(cfg, script)?;

    let (notifier, writer) = spawn_writer(std::io::stdout()).wrap_err("spawn link writer")?;
    let mut controller = Controller::new(
        DeviceCfg::from(cfg),
        Arc::new(MonotonicClock::new()),
        Arc::new(SystemWallClock),
        notifier,
    )?;

    // The reader is left detached: it may be parked in a blocking stdin read.
    let _reader = spawn_reader(
        std::io::stdin(),
        controller.ingress(),
        Arc::clone(shutdown),
        ticks.is_none(),
    )
    .wrap_err("spawn link reader")?;

    let stats = coaster_core::run(&mut controller, &mut *scale, shutdown, ticks);

    // Answer whatever arrived after the last tick.
    let tail = controller.drain_commands();
    if tail.dispatched > 0 {
        tracing::debug!(dispatched = tail.dispatched, "final drain");
    }

    drop(controller);
    if writer.join().is_err() {
        tracing::warn!("link writer panicked");
    }
    Ok(stats)
}
