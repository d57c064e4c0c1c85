//! Host-side pacing loop around `Controller::run_once`.

use crate::controller::Controller;
use coaster_traits::{Notifier, Scale};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Counters accumulated over a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub commands: u64,
    pub stale: u64,
    pub events: u64,
    pub read_errors: u64,
    pub restarts: u64,
}

/// Time left in the period after `elapsed` of work; zero on overrun.
fn remaining_sleep(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

/// Run ticks until `shutdown` is raised or `max_ticks` iterations have run.
///
/// The period is re-read every iteration so rate changes apply on the next
/// tick.
pub fn run<S, N>(
    controller: &mut Controller<N>,
    scale: &mut S,
    shutdown: &AtomicBool,
    max_ticks: Option<u64>,
) -> RunStats
where
    S: Scale + ?Sized,
    N: Notifier,
{
    let clock = std::sync::Arc::clone(controller.clock());
    let mut stats = RunStats::default();
    tracing::info!(rate_hz = controller.context().rate_hz(), ?max_ticks, "control loop start");

    while !shutdown.load(Ordering::Relaxed) && max_ticks.is_none_or(|n| stats.ticks < n) {
        let started = clock.now();
        let report = controller.run_once(scale);

        stats.ticks += 1;
        stats.commands += report.drain.dispatched as u64;
        stats.stale += report.drain.stale as u64;
        stats.events += report.events.len() as u64;
        stats.read_errors += u64::from(report.read_error.is_some());
        stats.restarts += u64::from(report.drain.restart);

        let period = controller.period();
        let elapsed = clock.now().saturating_duration_since(started);
        if elapsed > period {
            tracing::debug!(
                elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
                "tick overran its period"
            );
        }
        clock.sleep(remaining_sleep(period, elapsed));
    }

    tracing::info!(
        ticks = stats.ticks,
        commands = stats.commands,
        stale = stats.stale,
        events = stats.events,
        "control loop stop"
    );
    stats
}
