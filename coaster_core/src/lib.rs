#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core coaster logic (hardware-agnostic).
//!
//! This crate turns a stream of weight readings into drink events and serves
//! the command protocol spoken over the wireless link. Hardware and transport
//! sit behind `coaster_traits::Scale` and `coaster_traits::Notifier`.
//!
//! ## Architecture
//!
//! - **Clock** (`clock_service`): corrected epoch time via a settable offset
//! - **Conditioning** (`conditioner`): zero clamp, EMA, stability window
//! - **Inference** (`inference`): four-state cup/sip/refill classifier
//! - **Records** (`records`): in-memory log with pagination and JSON encoding
//! - **Commands** (`queue`, `dispatcher`): per-connection framing, bounded
//!   FIFO, verb table
//! - **Context** (`context`): all device RAM state, passed explicitly
//! - **Loop** (`controller`, `runner`): drain, sample, infer, pace
//!
//! ## Threads
//!
//! Only `CommandQueue` crosses threads. Everything else is owned by the
//! control loop.

pub mod clock_service;
pub mod conditioner;
pub mod config;
pub mod context;
pub mod controller;
pub mod conversions;
pub mod dispatcher;
pub mod error;
pub mod hw_error;
pub mod inference;
pub mod mocks;
pub mod printers;
pub mod queue;
pub mod records;
pub mod runner;
pub mod util;

pub use clock_service::ClockService;
pub use conditioner::{Conditioned, SignalConditioner};
pub use config::{CommandCfg, ConditionerCfg, DeviceCfg, InferenceCfg, PrinterLevels};
pub use context::DeviceContext;
pub use controller::{Controller, DrainReport, TickReport};
pub use dispatcher::{Reply, VERSION, dispatch};
pub use error::{BuildError, ClockError, CommandError, CoreError, Result};
pub use inference::{EventInferenceEngine, EventKind, EventState, InferenceEvent};
pub use printers::{PrinterId, PrinterSelector, Printers};
pub use queue::{CommandIngress, CommandQueue, Connection, LineAccumulator, QueuedCommand};
pub use records::{Record, RecordKind, RecordStore};
pub use runner::{RunStats, run};
