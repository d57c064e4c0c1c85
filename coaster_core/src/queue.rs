//! Command intake: per-connection line framing and a shared FIFO queue.
//!
//! The link delivers arbitrary byte chunks on its own thread. Each connection
//! owns a `LineAccumulator`; complete lines are stamped with the monotonic
//! clock and pushed onto a bounded queue that the control loop drains once per
//! iteration.

use coaster_traits::Clock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Longest accepted line; longer input is discarded up to the next newline.
pub const MAX_LINE_BYTES: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    pub text: String,
    pub enqueued_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

impl std::fmt::Display for QueueFull {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("command queue full")
    }
}

impl std::error::Error for QueueFull {}

#[derive(Debug)]
struct Shared {
    items: Mutex<VecDeque<QueuedCommand>>,
    capacity: usize,
    rejected: AtomicU64,
}

/// Bounded multi-producer FIFO. Clones share the same queue.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    shared: Arc<Shared>,
}

impl CommandQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                items: Mutex::new(VecDeque::new()),
                capacity: capacity.max(1),
                rejected: AtomicU64::new(0),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<QueuedCommand>> {
        // A producer panicking mid-push leaves the deque itself consistent.
        self.shared
            .items
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn push(&self, cmd: QueuedCommand) -> Result<(), QueueFull> {
        let mut q = self.lock();
        if q.len() >= self.shared.capacity {
            self.shared.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(QueueFull);
        }
        q.push_back(cmd);
        Ok(())
    }

    /// Remove and return everything queued, oldest first, under one lock.
    pub fn take_all(&self) -> VecDeque<QueuedCommand> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Lines refused because the queue was full.
    pub fn rejected(&self) -> u64 {
        self.shared.rejected.load(Ordering::Relaxed)
    }
}

/// Splits a byte stream into newline-terminated lines.
///
/// `\r` is stripped, empty lines are skipped and invalid UTF-8 is decoded
/// lossily.
#[derive(Debug, Default)]
pub struct LineAccumulator {
    buf: Vec<u8>,
    overflow: bool,
}

impl LineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; `emit` is called once per completed, non-empty line.
    pub fn feed(&mut self, bytes: &[u8], mut emit: impl FnMut(String)) {
        for &b in bytes {
            match b {
                b'\n' => {
                    if self.overflow {
                        tracing::warn!(max = MAX_LINE_BYTES, "over-long command line discarded");
                    } else if !self.buf.is_empty() {
                        emit(String::from_utf8_lossy(&self.buf).into_owned());
                    }
                    self.buf.clear();
                    self.overflow = false;
                }
                b'\r' => {}
                _ if self.overflow => {}
                _ if self.buf.len() >= MAX_LINE_BYTES => {
                    self.overflow = true;
                    self.buf.clear();
                }
                _ => self.buf.push(b),
            }
        }
    }

    /// Bytes of the partial line held so far.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Producer handle given to the transport. Cheap to clone.
#[derive(Clone)]
pub struct CommandIngress {
    queue: CommandQueue,
    clock: Arc<dyn Clock + Send + Sync>,
    next_id: Arc<AtomicU64>,
}

impl CommandIngress {
    pub fn new(queue: CommandQueue, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            queue,
            clock,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Open a connection with its own line buffer.
    pub fn connect(&self) -> Connection {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(conn = id, "link connected");
        Connection {
            ingress: self.clone(),
            acc: LineAccumulator::new(),
            id,
        }
    }

    /// Stamp and enqueue one complete line. Returns whether it was accepted.
    pub fn submit_line(&self, line: String) -> bool {
        let cmd = QueuedCommand {
            text: line,
            enqueued_at: self.clock.now(),
        };
        match self.queue.push(cmd) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, capacity = self.queue.capacity(), "command dropped");
                false
            }
        }
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }
}

/// One peer session. Dropping it discards any partial line.
pub struct Connection {
    ingress: CommandIngress,
    acc: LineAccumulator,
    id: u64,
}

impl Connection {
    /// Feed received bytes; returns the number of lines queued.
    pub fn on_bytes(&mut self, bytes: &[u8]) -> usize {
        let ingress = &self.ingress;
        let mut queued = 0;
        self.acc.feed(bytes, |line| {
            if ingress.submit_line(line) {
                queued += 1;
            }
        });
        queued
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.acc.pending() > 0 {
            tracing::debug!(conn = self.id, bytes = self.acc.pending(), "partial line discarded");
        }
        tracing::debug!(conn = self.id, "link disconnected");
    }
}
