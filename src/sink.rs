//! Sink capability and registry (§3 "SinkRegistry", §4.2).
//!
//! DESIGN NOTES: the teacher's C-shaped struct-of-callbacks-plus-`ctx`
//! pattern becomes a plain trait object here; the `ctx` pointer disappears
//! into `&mut self`.

use std::sync::Mutex;

use crate::error::SinkError;

/// A transport capable of receiving formatted log lines.
///
/// Implementations are the external collaborators described in §1/§6 (UDP,
/// TCP client/server, stdout, ...); this crate only defines the boundary and
/// drives it from the dispatcher.
pub trait Sink: Send {
    /// One-time initialization. Called once, from `SinkRegistry::install`.
    fn init(&mut self) -> Result<(), SinkError>;

    /// Optional teardown, called once from `deinit_all` on shutdown.
    fn deinit(&mut self) {}

    /// Non-blocking liveness probe. For connectionless transports this
    /// typically just returns `true` once configured; for connection-oriented
    /// transports it may accept pending connections.
    fn poll(&mut self) -> bool;

    /// Non-blocking transmit attempt. Returns `false` on loss-of-link or any
    /// transient failure; the dispatcher will treat the sink as not-live
    /// until the next `poll` cycle restores it.
    fn send(&mut self, bytes: &[u8]) -> bool;
}

struct Entry {
    sink: Box<dyn Sink>,
    live: bool,
}

/// Ordered collection of installed sinks plus a parallel liveness vector
/// (§3 "SinkRegistry").
///
/// Guarded by its own mutex, distinct from the ring queue's, so sinks can be
/// installed from any thread at startup (§4.2 "Concurrency"); during the
/// steady-state event loop only the dispatcher touches it.
pub struct SinkRegistry {
    entries: Mutex<Vec<Entry>>,
    max_sinks: usize,
}

impl SinkRegistry {
    pub fn new(max_sinks: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            max_sinks,
        }
    }

    /// §4.2 `install`: init the sink, then append it if the K-limit isn't
    /// reached. Valid only before the dispatcher has started.
    pub fn install(&self, mut sink: Box<dyn Sink>) -> Result<(), SinkError> {
        let mut entries = self.entries.lock().expect("registry mutex poisoned");
        if entries.len() >= self.max_sinks {
            return Err(SinkError::RegistryFull {
                max: self.max_sinks,
            });
        }
        sink.init().map_err(|_| SinkError::InitFailed)?;
        entries.push(Entry { sink, live: false });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// §4.2 `poll_all`: refresh every sink's liveness; `true` iff any sink is live.
    pub fn poll_all(&self) -> bool {
        let mut entries = self.entries.lock().expect("registry mutex poisoned");
        let mut any = false;
        for entry in entries.iter_mut() {
            entry.live = entry.sink.poll();
            any |= entry.live;
        }
        any
    }

    /// §4.2 `send_all`: send to every currently-live sink. Returns whether at
    /// least one send succeeded; a per-sink failure does not clear `live[i]`
    /// until the next `poll_all` (the caller decides whether to break the batch).
    pub fn send_all(&self, bytes: &[u8]) -> bool {
        let mut entries = self.entries.lock().expect("registry mutex poisoned");
        let mut successes = 0usize;
        for entry in entries.iter_mut() {
            if entry.live && entry.sink.send(bytes) {
                successes += 1;
            }
        }
        successes > 0
    }

    /// §4.2 `deinit_all`: called once on terminate.
    pub fn deinit_all(&self) {
        let mut entries = self.entries.lock().expect("registry mutex poisoned");
        for entry in entries.iter_mut() {
            entry.sink.deinit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixtureSink {
        live: Arc<AtomicBool>,
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
        send_ok: Arc<AtomicBool>,
        deinit_called: Arc<AtomicUsize>,
    }

    impl Sink for FixtureSink {
        fn init(&mut self) -> Result<(), SinkError> {
            Ok(())
        }
        fn deinit(&mut self) {
            self.deinit_called.fetch_add(1, Ordering::SeqCst);
        }
        fn poll(&mut self) -> bool {
            self.live.load(Ordering::SeqCst)
        }
        fn send(&mut self, bytes: &[u8]) -> bool {
            if self.send_ok.load(Ordering::SeqCst) {
                self.sent.lock().unwrap().push(bytes.to_vec());
                true
            } else {
                false
            }
        }
    }

    fn fixture() -> (
        FixtureSink,
        Arc<AtomicBool>,
        Arc<Mutex<Vec<Vec<u8>>>>,
        Arc<AtomicBool>,
    ) {
        let live = Arc::new(AtomicBool::new(true));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let send_ok = Arc::new(AtomicBool::new(true));
        (
            FixtureSink {
                live: live.clone(),
                sent: sent.clone(),
                send_ok: send_ok.clone(),
                deinit_called: Arc::new(AtomicUsize::new(0)),
            },
            live,
            sent,
            send_ok,
        )
    }

    #[test]
    fn install_respects_max_sinks() {
        let reg = SinkRegistry::new(1);
        let (a, ..) = fixture();
        let (b, ..) = fixture();
        reg.install(Box::new(a)).unwrap();
        let err = reg.install(Box::new(b)).unwrap_err();
        assert_eq!(err, SinkError::RegistryFull { max: 1 });
    }

    #[test]
    fn poll_all_true_iff_any_live() {
        let reg = SinkRegistry::new(2);
        let (a, a_live, ..) = fixture();
        let (b, b_live, ..) = fixture();
        a_live.store(false, Ordering::SeqCst);
        b_live.store(false, Ordering::SeqCst);
        reg.install(Box::new(a)).unwrap();
        reg.install(Box::new(b)).unwrap();

        assert!(!reg.poll_all());
        b_live.store(true, Ordering::SeqCst);
        assert!(reg.poll_all());
    }

    #[test]
    fn send_all_only_targets_live_sinks() {
        let reg = SinkRegistry::new(2);
        let (a, a_live, a_sent, _) = fixture();
        let (b, b_live, b_sent, _) = fixture();
        a_live.store(true, Ordering::SeqCst);
        b_live.store(false, Ordering::SeqCst);
        reg.install(Box::new(a)).unwrap();
        reg.install(Box::new(b)).unwrap();

        reg.poll_all();
        assert!(reg.send_all(b"hello"));
        assert_eq!(a_sent.lock().unwrap().len(), 1);
        assert_eq!(b_sent.lock().unwrap().len(), 0);
    }

    #[test]
    fn send_all_false_when_no_sink_accepts() {
        let reg = SinkRegistry::new(1);
        let (a, a_live, _, a_send_ok) = fixture();
        a_live.store(true, Ordering::SeqCst);
        a_send_ok.store(false, Ordering::SeqCst);
        reg.install(Box::new(a)).unwrap();
        reg.poll_all();
        assert!(!reg.send_all(b"x"));
    }
}
