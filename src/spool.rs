//! Spool adapter (§3 "Spool", §4.3): a thin wrapper over an external
//! durable-FIFO backend, plus a bounded in-memory reference backend for
//! hosts and tests that have no flash-backed implementation wired in.
//!
//! Grounded on the teacher's `config/nvs.rs` persistence adapter: both wrap
//! an external store behind a small `Result<_, _Error>` surface rather than
//! trusting the caller to get the sequencing right.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::SpoolError;
use crate::sink::SinkRegistry;

/// Contract with the external durable-FIFO primitive (`dlog` in the prior
/// art). Implementations persist formatted lines and replay them in FIFO
/// order; overflow policy is drop-oldest, matching the ring queue.
pub trait SpoolBackend: Send {
    /// One-time initialization (open the backing file/partition).
    fn open(&mut self) -> Result<(), SpoolError>;

    /// Enqueue a pre-formatted line. Drop-oldest on saturation.
    fn put(&mut self, line: &[u8]) -> Result<(), SpoolError>;

    /// Load the oldest line without removing it.
    fn peek(&mut self) -> Result<Option<Vec<u8>>, SpoolError>;

    /// Remove the line last returned by `peek` (advance the cursor).
    fn commit(&mut self) -> Result<(), SpoolError>;

    /// Best-effort entry count, for diagnostics only.
    fn approx_len(&self) -> usize {
        0
    }
}

/// Bounded in-memory FIFO implementing [`SpoolBackend`], for hosts/tests
/// with no real flash-backed spool wired in. Honors the same drop-oldest
/// contract a production backend must.
pub struct MemSpool {
    lines: VecDeque<Vec<u8>>,
    max_entries: usize,
    peeked: bool,
}

impl MemSpool {
    pub fn new(max_entries: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_entries,
            peeked: false,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl SpoolBackend for MemSpool {
    fn open(&mut self) -> Result<(), SpoolError> {
        Ok(())
    }

    fn put(&mut self, line: &[u8]) -> Result<(), SpoolError> {
        if self.lines.len() == self.max_entries {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_vec());
        Ok(())
    }

    fn peek(&mut self) -> Result<Option<Vec<u8>>, SpoolError> {
        self.peeked = true;
        Ok(self.lines.front().cloned())
    }

    fn commit(&mut self) -> Result<(), SpoolError> {
        if self.peeked {
            self.lines.pop_front();
            self.peeked = false;
        }
        Ok(())
    }

    fn approx_len(&self) -> usize {
        self.lines.len()
    }
}

/// Adapter exposing the §4.3 peek/commit/put/drain semantics over a boxed
/// [`SpoolBackend`].
pub struct SpoolAdapter {
    backend: Mutex<Box<dyn SpoolBackend>>,
}

impl SpoolAdapter {
    pub fn new(backend: Box<dyn SpoolBackend>) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    pub fn open(&self) -> Result<(), SpoolError> {
        self.backend.lock().expect("spool mutex poisoned").open()
    }

    pub fn push(&self, line: &[u8]) -> Result<(), SpoolError> {
        self.backend.lock().expect("spool mutex poisoned").put(line)
    }

    /// Best-effort depth for diagnostics (§6 `stats()`). Not part of the
    /// peek/commit contract; backends without a cheap length just report 0.
    pub fn approx_len(&self) -> usize {
        self.backend.lock().expect("spool mutex poisoned").approx_len()
    }

    fn peek(&self) -> Result<Option<Vec<u8>>, SpoolError> {
        self.backend.lock().expect("spool mutex poisoned").peek()
    }

    fn commit(&self) -> Result<(), SpoolError> {
        self.backend.lock().expect("spool mutex poisoned").commit()
    }

    /// §4.3 `drain_to_sinks`: peek-then-send-then-commit until the spool is
    /// empty or a send fails, leaving the unsent line in place.
    ///
    /// Peek-then-commit (rather than pop-then-send) means a crash between
    /// send and commit replays the line; a crash after commit loses at most
    /// the in-flight line. Returns `true` if the spool was fully drained.
    pub fn drain_to_sinks(&self, registry: &SinkRegistry) -> bool {
        loop {
            let line = match self.peek() {
                Ok(Some(line)) => line,
                Ok(None) => return true,
                Err(err) => {
                    tracing::error!(?err, "spool peek failed");
                    return false;
                }
            };

            if !registry.send_all(&line) {
                return false;
            }

            if let Err(err) = self.commit() {
                tracing::error!(?err, "spool commit failed");
                return false;
            }
        }
    }
}
