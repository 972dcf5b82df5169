//! # rlogd
//!
//! Embedded remote-logging dispatcher: a bounded ring queue, a multi-sink
//! fan-out registry, and a disk-spool overflow path, tied together by a
//! single dispatcher thread and driven through a non-blocking producer API.
//!
//! ## Architecture
//!
//! Producers call [`RemoteLogger::log`] (or [`logf!`]) from any thread; the
//! call never blocks and never fails observably. Records land in a bounded
//! [`RingQueue`](queue::RingQueue) and raise a wake-event. A single
//! dispatcher thread (§ `dispatcher`) owns every sink in the
//! [`SinkRegistry`](sink::SinkRegistry), fans formatted lines out to the
//! live ones, and spills to the [`SpoolAdapter`](spool::SpoolAdapter) when
//! nothing is live, replaying it first on reconnect.

pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod log;
pub mod queue;
pub mod record;
pub mod shared;
pub mod sink;
pub mod spool;
pub mod stdout_sink;
pub mod wake;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub use clock::{Clock, SystemClock, Timestamp};
pub use config::{Config, ConfigBuilder};
pub use error::{FormatError, InitError, SinkError, SpoolError};
pub use format::WireFormat;
pub use record::Severity;
pub use shared::{DispatcherState, Stats};
pub use sink::Sink;
pub use spool::{MemSpool, SpoolBackend};
pub use stdout_sink::StdoutSink;

use queue::RingQueue;
use shared::Shared;
use sink::SinkRegistry;
use spool::SpoolAdapter;

/// The logger handle. Construct with [`RemoteLogger::init`], install sinks,
/// then call [`RemoteLogger::start`]; [`RemoteLogger::log`] is safe to call
/// from any thread once `init` returns.
pub struct RemoteLogger {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl RemoteLogger {
    /// Construct the queue, registry, spool adapter and clock from `config`,
    /// but do not start the dispatcher thread yet — sinks can still be
    /// installed via [`RemoteLogger::install_interface`] until [`Self::start`] is
    /// called (§4.2, §4.8).
    pub fn init(config: Config) -> Result<Self, InitError> {
        config.validate()?;

        let spool_backend: Box<dyn SpoolBackend> = Box::new(MemSpool::new(config.spool_max_entries));
        let spool = SpoolAdapter::new(spool_backend);
        spool.open().map_err(InitError::SpoolOpenFailed)?;

        let shared = Shared::new(
            RingQueue::new(config.queue_capacity),
            SinkRegistry::new(config.max_sinks),
            spool,
            Box::new(SystemClock),
            config.hostname(),
            config.format,
            config.min_severity,
            config.heartbeat_ticks,
            config::DEFAULT_TICK,
        );

        Ok(Self {
            shared: Arc::new(shared),
            thread: None,
        })
    }

    /// Register a sink. Must succeed before the dispatcher is started (§4.2,
    /// §6), else the sink may miss startup records.
    pub fn install_interface(&mut self, sink: Box<dyn Sink>) -> Result<(), SinkError> {
        if self.shared.dispatcher_started() {
            return Err(SinkError::AlreadyStarted);
        }
        self.shared.registry.install(sink)
    }

    /// Spawn the dispatcher thread. Idempotent: calling this twice is a
    /// no-op on the second call.
    pub fn start(&mut self) {
        if !self.shared.mark_dispatcher_started() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        self.thread = Some(thread::spawn(move || dispatcher::run(&shared)));
    }

    /// Request shutdown: set the terminate flag, wake the dispatcher so it
    /// doesn't wait out a full tick, and join its thread (§4.8).
    pub fn kill(&mut self) {
        self.shared.request_terminate();
        self.shared.wake.signal(wake::NEW_MSG);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    /// Current dispatcher state (§4.5).
    pub fn state(&self) -> DispatcherState {
        self.shared.state()
    }

    /// Diagnostics snapshot (§6).
    pub fn stats(&self) -> Stats {
        self.shared.stats()
    }

    /// §4.6 `log`: non-blocking; severity below the configured filter is
    /// dropped before it ever reaches the queue. `proc` is captured from the
    /// calling thread's name (`-` if unset), mirroring the teacher's
    /// per-task log tagging.
    pub fn log(&self, severity: Severity, msg: &str) {
        if severity > self.shared.min_severity {
            return;
        }
        let proc = thread::current().name().unwrap_or("-").to_string();
        self.shared.enqueue(severity, &proc, msg);
    }
}

impl Drop for RemoteLogger {
    fn drop(&mut self) {
        self.kill();
    }
}

/// §4.6 `logf!`: render a formatted message into a stack buffer, then log
/// it. Mirrors the teacher's `rt_log!` macro family, generalized from a
/// single global stream to an explicit logger handle.
#[macro_export]
macro_rules! logf {
    ($logger:expr, $severity:expr, $($arg:tt)*) => {{
        use std::fmt::Write as _;
        let mut buf = $crate::FmtBuf::new();
        let _ = write!(buf, $($arg)*);
        $logger.log($severity, buf.as_str());
    }};
}

/// Backing buffer for [`logf!`]: a fixed-size stack string that truncates
/// rather than allocates, matching the rest of the crate's fixed-capacity
/// discipline. Not part of the supported API surface; use `logf!`.
#[doc(hidden)]
pub struct FmtBuf {
    bytes: [u8; record::RLOG_MAX_SIZE],
    len: usize,
}

impl FmtBuf {
    pub fn new() -> Self {
        Self {
            bytes: [0u8; record::RLOG_MAX_SIZE],
            len: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len]).unwrap_or("")
    }
}

impl std::fmt::Write for FmtBuf {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.bytes.len() - self.len;
        let n = bytes.len().min(remaining);
        self.bytes[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        Ok(())
    }
}
