//! Process-wide state shared between producer threads and the dispatcher
//! thread (§2 "Ring queue", "Sink registry", "Spool adapter").
//!
//! DESIGN NOTES "Process-wide singletons via pointers": the teacher's
//! module-level static handles become the fields of one explicit, owned
//! value (`Shared`), reached through an `Arc` rather than a global pointer.
//! `RemoteLogger` (in `lib.rs`) is the handle callers actually see; `Shared`
//! is its interior.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use crate::clock::Clock;
use crate::format::WireFormat;
use crate::queue::RingQueue;
use crate::record::{Record, Severity};
use crate::sink::SinkRegistry;
use crate::spool::SpoolAdapter;
use crate::wake::{WakeEvents, NEW_MSG};

/// Dispatcher state machine (§4.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatcherState {
    Running = 0,
    Terminating = 1,
    Dead = 2,
}

impl DispatcherState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Running,
            1 => Self::Terminating,
            _ => Self::Dead,
        }
    }
}

/// Read-only diagnostics surface (§6 `stats()`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stats {
    pub queue_count: usize,
    pub queue_overflow_count: u64,
    pub queue_max_count_seen: usize,
    pub spool_len: usize,
    pub format_drops: u64,
    pub heartbeats_sent: u64,
}

pub struct Shared {
    pub queue: RingQueue,
    pub registry: SinkRegistry,
    pub spool: SpoolAdapter,
    pub wake: WakeEvents,
    pub clock: Box<dyn Clock>,
    pub hostname: String,
    pub format: WireFormat,
    pub min_severity: Severity,
    state: AtomicU8,
    terminate: AtomicBool,
    format_drops: AtomicU64,
    heartbeats_sent: AtomicU64,
    dispatcher_started: AtomicBool,
    pub(crate) heartbeat_ticks: u32,
    pub(crate) tick: std::time::Duration,
}

impl Shared {
    pub fn new(
        queue: RingQueue,
        registry: SinkRegistry,
        spool: SpoolAdapter,
        clock: Box<dyn Clock>,
        hostname: String,
        format: WireFormat,
        min_severity: Severity,
        heartbeat_ticks: u32,
        tick: std::time::Duration,
    ) -> Self {
        Self {
            queue,
            registry,
            spool,
            wake: WakeEvents::new(),
            clock,
            hostname,
            format,
            min_severity,
            state: AtomicU8::new(DispatcherState::Running as u8),
            terminate: AtomicBool::new(false),
            format_drops: AtomicU64::new(0),
            heartbeats_sent: AtomicU64::new(0),
            dispatcher_started: AtomicBool::new(false),
            heartbeat_ticks,
            tick,
        }
    }

    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: DispatcherState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn terminate_requested(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }

    pub fn request_terminate(&self) {
        self.terminate.store(true, Ordering::Release);
    }

    pub fn mark_dispatcher_started(&self) -> bool {
        !self.dispatcher_started.swap(true, Ordering::AcqRel)
    }

    pub fn dispatcher_started(&self) -> bool {
        self.dispatcher_started.load(Ordering::Acquire)
    }

    /// Push a record straight onto the queue and raise `NEW_MSG`, without the
    /// severity filter `RemoteLogger::log` applies — used both by the
    /// producer path (after it decides the record passes the filter) and by
    /// the dispatcher's own heartbeat emission, which is not itself subject
    /// to filtering (§4.7).
    pub(crate) fn enqueue(&self, severity: Severity, proc: &str, msg: &str) {
        let record = Record::new(self.clock.now(), severity, proc, msg);
        self.queue.put(record);
        self.wake.signal(NEW_MSG);
    }

    pub(crate) fn record_format_drop(&self) {
        self.format_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_heartbeat(&self) {
        self.heartbeats_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> Stats {
        let qstats = self.queue.stats();
        Stats {
            queue_count: qstats.count,
            queue_overflow_count: qstats.overflow_count,
            queue_max_count_seen: qstats.max_count_seen,
            spool_len: self.spool.approx_len(),
            format_drops: self.format_drops.load(Ordering::Relaxed),
            heartbeats_sent: self.heartbeats_sent.load(Ordering::Relaxed),
        }
    }
}
