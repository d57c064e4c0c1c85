//! Drink-event inference.
//!
//! A four-state machine driven by one conditioned sample per tick:
//!
//! ```text
//! Waiting ──stable > zero──▶ CupOnStable ──stability lost──▶ Transition
//!                                 ▲                              │
//!                                 └──── stable > zero ◀──────────┤
//!                            CupOffStable ◀── stable <= zero ────┘
//! ```
//!
//! Settling from `Transition` compares the new plateau with the previous one:
//! a drop is a sip, a rise is a refill, anything under the confirmation
//! threshold is noise. Independently, every tick feeds the Measurement trace.

use crate::conditioner::Conditioned;
use crate::config::InferenceCfg;
use crate::records::{Record, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventState {
    Waiting,
    CupOnStable,
    CupOffStable,
    Transition,
}

impl EventState {
    pub const fn as_str(self) -> &'static str {
        match self {
            EventState::Waiting => "waiting",
            EventState::CupOnStable => "cup_on_stable",
            EventState::CupOffStable => "cup_off_stable",
            EventState::Transition => "transition",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    CupPlaced { grams: f32 },
    CupRemoved { grams: f32 },
    Sip { grams: f32 },
    Refill { grams: f32 },
}

/// Something the engine decided on this tick; `at` is corrected epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceEvent {
    pub kind: EventKind,
    pub at: i64,
}

impl std::fmt::Display for InferenceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            EventKind::CupPlaced { grams } => write!(f, "cup placed {grams:.1} g"),
            EventKind::CupRemoved { grams } => write!(f, "cup removed {grams:.1} g"),
            EventKind::Sip { grams } => write!(f, "sip {grams:.1} g"),
            EventKind::Refill { grams } => write!(f, "refill {grams:.1} g"),
        }?;
        write!(f, " at {}", self.at)
    }
}

#[derive(Debug, Clone)]
pub struct EventInferenceEngine {
    cfg: InferenceCfg,
    state: EventState,
    /// State that entered the current `Transition`.
    from: EventState,
    was_stable: bool,
    plateau_g: f32,
    /// When the cup plateau was last left.
    left_at: i64,
}

impl EventInferenceEngine {
    pub fn new(cfg: InferenceCfg) -> Self {
        Self {
            cfg,
            state: EventState::Waiting,
            from: EventState::Waiting,
            was_stable: false,
            plateau_g: 0.0,
            left_at: 0,
        }
    }

    pub fn state(&self) -> EventState {
        self.state
    }

    /// Weight of the last confirmed cup plateau, once one exists.
    pub fn plateau(&self) -> Option<f32> {
        (self.state != EventState::Waiting).then_some(self.plateau_g)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.cfg);
    }

    /// Advance one tick. Sip/Refill and Measurement records go to `records`.
    pub fn step(
        &mut self,
        sample: Conditioned,
        now: i64,
        records: &mut RecordStore,
    ) -> Vec<InferenceEvent> {
        let Conditioned { grams, stable } = sample;
        let lost_stability = self.was_stable && !stable;
        let mut events = Vec::new();

        match self.state {
            EventState::Waiting => {
                if stable && grams > self.cfg.zero_threshold_g {
                    self.plateau_g = grams;
                    self.state = EventState::CupOnStable;
                    events.push(InferenceEvent {
                        kind: EventKind::CupPlaced { grams },
                        at: now,
                    });
                }
            }
            EventState::CupOnStable => {
                if lost_stability {
                    self.left_at = now;
                    self.from = EventState::CupOnStable;
                    self.state = EventState::Transition;
                }
            }
            EventState::CupOffStable => {
                if lost_stability {
                    self.from = EventState::CupOffStable;
                    self.state = EventState::Transition;
                }
            }
            EventState::Transition => {
                if stable {
                    self.settle(grams, now, records, &mut events);
                }
            }
        }

        if self.cfg.record_measurements {
            self.accrete(sample, now, records);
        }
        self.was_stable = stable;
        events
    }

    fn settle(
        &mut self,
        grams: f32,
        now: i64,
        records: &mut RecordStore,
        events: &mut Vec<InferenceEvent>,
    ) {
        if grams <= self.cfg.zero_threshold_g {
            if self.from == EventState::CupOnStable {
                events.push(InferenceEvent {
                    kind: EventKind::CupRemoved {
                        grams: self.plateau_g,
                    },
                    at: self.left_at,
                });
            }
            self.state = EventState::CupOffStable;
            return;
        }

        let delta = self.plateau_g - grams;
        if delta.abs() < self.cfg.confirmation_threshold_g {
            tracing::trace!(delta, "plateau shift below confirmation threshold");
        } else if delta > 0.0 {
            records.append(Record::sip(self.left_at, now, delta));
            events.push(InferenceEvent {
                kind: EventKind::Sip { grams: delta },
                at: now,
            });
        } else {
            records.append(Record::refill(self.left_at, now, -delta));
            events.push(InferenceEvent {
                kind: EventKind::Refill { grams: -delta },
                at: now,
            });
        }
        self.plateau_g = grams;
        self.state = EventState::CupOnStable;
    }

    fn accrete(&self, sample: Conditioned, now: i64, records: &mut RecordStore) {
        if sample.stable
            && records.close_last_measurement(now, sample.grams, self.cfg.measurement_tolerance_g)
        {
            return;
        }
        let end = if sample.stable { now } else { 0 };
        records.append(Record::measurement(now, end, sample.grams));
    }
}
