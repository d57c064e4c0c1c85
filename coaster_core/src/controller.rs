//! One control-loop iteration: drain commands, then sample and infer.

use crate::config::DeviceCfg;
use crate::context::DeviceContext;
use crate::dispatcher::{Reply, dispatch};
use crate::error::{BuildError, CoreError};
use crate::hw_error::{map_notify_error, map_scale_error};
use crate::inference::InferenceEvent;
use crate::printers::PrinterId;
use crate::queue::{CommandIngress, CommandQueue};
use coaster_traits::{Clock, Notifier, Scale, WallClock};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one `drain_commands` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub dispatched: usize,
    pub stale: usize,
    /// A `reset` was handled; the context has been rebuilt.
    pub restart: bool,
}

/// Outcome of one full iteration (`run_once`).
#[derive(Debug, Default)]
pub struct TickReport {
    pub drain: DrainReport,
    pub events: Vec<InferenceEvent>,
    /// Set when the scale read failed and sensing was skipped.
    pub read_error: Option<CoreError>,
}

pub struct Controller<N: Notifier> {
    cfg: DeviceCfg,
    ctx: DeviceContext,
    wall: Arc<dyn WallClock + Send + Sync>,
    clock: Arc<dyn Clock + Send + Sync>,
    queue: CommandQueue,
    ingress: CommandIngress,
    notifier: N,
}

impl<N: Notifier> Controller<N> {
    pub fn new(
        cfg: DeviceCfg,
        clock: Arc<dyn Clock + Send + Sync>,
        wall: Arc<dyn WallClock + Send + Sync>,
        notifier: N,
    ) -> Result<Self, BuildError> {
        if cfg.commands.stale_ms == 0 {
            return Err(BuildError::InvalidConfig("stale_ms must be >= 1"));
        }
        let ctx = DeviceContext::new(&cfg, Arc::clone(&wall))?;
        let queue = CommandQueue::new(cfg.commands.queue_capacity);
        let ingress = CommandIngress::new(queue.clone(), Arc::clone(&clock));
        Ok(Self {
            cfg,
            ctx,
            wall,
            clock,
            queue,
            ingress,
            notifier,
        })
    }

    /// Producer handle for the transport context.
    pub fn ingress(&self) -> CommandIngress {
        self.ingress.clone()
    }

    pub fn context(&self) -> &DeviceContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut DeviceContext {
        &mut self.ctx
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// Current tick period, following `setSamplingRate`.
    pub fn period(&self) -> Duration {
        crate::util::tick_period(self.ctx.rate_hz())
    }

    /// Dispatch every queued command in FIFO order, dropping stale ones.
    pub fn drain_commands(&mut self) -> DrainReport {
        let batch = self.queue.take_all();
        let mut report = DrainReport::default();
        if batch.is_empty() {
            return report;
        }
        let stale_after = Duration::from_millis(self.cfg.commands.stale_ms);
        let now = self.clock.now();
        let mut pending = batch.into_iter();
        for cmd in pending.by_ref() {
            let age = now.saturating_duration_since(cmd.enqueued_at);
            if age > stale_after {
                report.stale += 1;
                tracing::warn!(
                    age_ms = u64::try_from(age.as_millis()).unwrap_or(u64::MAX),
                    command = %cmd.text,
                    "stale command dropped"
                );
                continue;
            }
            report.dispatched += 1;
            match dispatch(&mut self.ctx, &cmd.text) {
                Reply::Text(body) => self.send(&body),
                Reply::Silent => {}
                Reply::Restart => {
                    report.restart = true;
                    break;
                }
            }
        }
        if report.restart {
            let discarded = pending.count();
            self.restart();
            if discarded > 0 {
                tracing::info!(discarded, "commands after reset discarded");
            }
        }
        report
    }

    /// Condition one raw weight and run inference on it.
    pub fn tick(&mut self, raw: f32) -> Vec<InferenceEvent> {
        let ctx = &mut self.ctx;
        let sample = ctx.conditioner.condition(raw);
        let now = ctx.clock.corrected_time();

        if ctx.printers.get(PrinterId::Raw).level() > 0 {
            let line = format!("raw={raw:.2} g={:.2} stable={}", sample.grams, sample.stable);
            ctx.printers.print(PrinterId::Raw, 1, &line);
        }

        let before = ctx.engine.state();
        let events = ctx.engine.step(sample, now, &mut ctx.records);
        let after = ctx.engine.state();

        for ev in &events {
            ctx.printers.print(PrinterId::Event, 1, &ev.to_string());
        }
        if before != after {
            let line = format!("state {} -> {}", before.as_str(), after.as_str());
            ctx.printers.print(PrinterId::Status, 1, &line);
        }
        events
    }

    /// Full iteration: commands first, then one scale reading.
    pub fn run_once<S: Scale + ?Sized>(&mut self, scale: &mut S) -> TickReport {
        let drain = self.drain_commands();
        let timeout = Duration::from_millis(self.cfg.sensor_timeout_ms);
        match scale.read(timeout) {
            Ok(raw) => TickReport {
                drain,
                events: self.tick(raw),
                read_error: None,
            },
            Err(e) => {
                let err = map_scale_error(&*e);
                tracing::warn!(error = %err, "scale read failed; tick skipped");
                TickReport {
                    drain,
                    events: Vec::new(),
                    read_error: Some(err),
                }
            }
        }
    }

    /// Return all RAM state to its configured defaults.
    pub fn restart(&mut self) {
        let queued = self.queue.take_all().len();
        if queued > 0 {
            tracing::info!(discarded = queued, "queued commands discarded by reset");
        }
        match DeviceContext::new(&self.cfg, Arc::clone(&self.wall)) {
            Ok(ctx) => {
                self.ctx = ctx;
                tracing::warn!("device state reset");
            }
            Err(e) => tracing::error!(error = %e, "reset failed; state kept"),
        }
    }

    fn send(&mut self, body: &str) {
        if !self.notifier.is_connected() {
            tracing::trace!("no peer attached; response discarded");
            return;
        }
        if let Err(e) = self.notifier.notify(body) {
            let err = map_notify_error(&*e);
            tracing::warn!(error = %err, "response not delivered");
        }
    }
}
