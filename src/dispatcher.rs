//! The dispatcher event loop (§4.5): the single thread that owns `send`,
//! spool-cursor advancement, and heartbeat emission.
//!
//! The teacher has no run loop to ground this on: its `main.rs` is a bare
//! `vTaskDelay`-polling loop with no event wait, and `consumer.rs` only
//! exposes externally-driven `tick()` pulls, never an internal loop. The
//! real structural precedent is `original_source/rlog.c`'s `server_thread`
//! (`os_event_wait`/`os_event_clear`, then branch: live → drain backlog,
//! heartbeat only when no event fired, drain queue only on `EVENT_NEW_MSG`;
//! not live → spill queue to the backlog). This loop mirrors that shape,
//! with the state machine made explicit rather than implied by a
//! `while (!terminate)` with scattered `#if` branches.

use std::time::Duration;

use crate::format::{self, FORMAT_BUF_SIZE};
use crate::record::Severity;
use crate::shared::{DispatcherState, Shared};
use crate::wake::NEW_MSG;

const HEARTBEAT_PROC: &str = "rlogd";
const HEARTBEAT_MSG: &str = "Heartbeat";

/// Run the event loop until `shared.request_terminate()` is observed.
/// Intended to run on its own OS thread, started by `RemoteLogger::start`.
pub fn run(shared: &Shared) {
    let mut silent_ticks: u32 = 0;

    loop {
        if shared.terminate_requested() {
            break;
        }

        let observed = shared.wake.wait_and_clear(shared.tick);
        let new_msg = observed & NEW_MSG != 0;
        let live_any = shared.registry.poll_all();

        if live_any {
            let spool_had_backlog = shared.spool.approx_len() > 0;
            shared.spool.drain_to_sinks(&shared.registry);

            if new_msg || spool_had_backlog {
                silent_ticks = 0;
            } else {
                silent_ticks += 1;
                if silent_ticks >= shared.heartbeat_ticks.max(1) {
                    silent_ticks = 0;
                    emit_heartbeat(shared);
                }
            }

            if new_msg {
                drain_queue_to_sinks(shared);
            }
        } else {
            // `rlog.c`'s `send_heartbeat` only ever runs from inside the
            // live branch, so `heartbeat_timer` is simply never touched
            // while disconnected. Mirror that: leave `silent_ticks` frozen
            // rather than zeroing it, so a reconnect resumes counting from
            // where an outage interrupted it instead of requiring a full
            // fresh heartbeat period.
            drain_queue_to_spool(shared);
        }
    }

    shared.set_state(DispatcherState::Terminating);
    shared.registry.deinit_all();
    shared.set_state(DispatcherState::Dead);
}

/// §4.5 step 3c: drain the queue to live sinks, spilling to the spool and
/// stopping the batch as soon as a send fails.
fn drain_queue_to_sinks(shared: &Shared) {
    while let Some(record) = shared.queue.get() {
        let mut buf = [0u8; FORMAT_BUF_SIZE];
        match format::render(&record, &shared.hostname, shared.format, &mut buf) {
            Ok(len) => {
                if !shared.registry.send_all(&buf[..len]) {
                    if let Err(err) = shared.spool.push(&buf[..len]) {
                        tracing::error!(?err, "failed to spool record after send failure");
                    }
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(?err, "dropping oversized record");
                shared.record_format_drop();
            }
        }
    }
}

/// §4.5 step 4: no sink is live, so the queue's contents become a durable
/// backlog instead of being attempted and lost.
fn drain_queue_to_spool(shared: &Shared) {
    while let Some(record) = shared.queue.get() {
        let mut buf = [0u8; FORMAT_BUF_SIZE];
        match format::render(&record, &shared.hostname, shared.format, &mut buf) {
            Ok(len) => {
                if let Err(err) = shared.spool.push(&buf[..len]) {
                    tracing::error!(?err, "failed to spool record");
                }
            }
            Err(err) => {
                tracing::warn!(?err, "dropping oversized record");
                shared.record_format_drop();
            }
        }
    }
}

/// §4.7: synthesize a DEBUG record carrying "Heartbeat" through the normal
/// queue/wake mechanics. Not subject to the severity filter producers go
/// through — a liveness signal, not a leveled log call.
fn emit_heartbeat(shared: &Shared) {
    shared.enqueue(Severity::Debug, HEARTBEAT_PROC, HEARTBEAT_MSG);
    shared.record_heartbeat();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::FakeClock;
    use crate::config::DEFAULT_TICK;
    use crate::queue::RingQueue;
    use crate::record::Record;
    use crate::sink::{Sink, SinkRegistry};
    use crate::spool::{MemSpool, SpoolAdapter};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    struct CollectingSink {
        live: Arc<AtomicBool>,
        lines: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl Sink for CollectingSink {
        fn init(&mut self) -> Result<(), crate::error::SinkError> {
            Ok(())
        }
        fn poll(&mut self) -> bool {
            self.live.load(Ordering::SeqCst)
        }
        fn send(&mut self, bytes: &[u8]) -> bool {
            self.lines.lock().unwrap().push(bytes.to_vec());
            true
        }
    }

    fn make_shared(heartbeat_ticks: u32, tick: Duration) -> (Arc<Shared>, Arc<Mutex<Vec<Vec<u8>>>>, Arc<AtomicBool>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let live = Arc::new(AtomicBool::new(true));
        let registry = SinkRegistry::new(2);
        registry
            .install(Box::new(CollectingSink {
                live: live.clone(),
                lines: lines.clone(),
            }))
            .unwrap();

        let shared = Shared::new(
            RingQueue::new(16),
            registry,
            SpoolAdapter::new(Box::new(MemSpool::new(16))),
            Box::new(FakeClock::new(0)),
            "dev1".to_string(),
            crate::format::WireFormat::Rfc3164,
            Severity::Debug,
            heartbeat_ticks,
            tick,
        );
        (Arc::new(shared), lines, live)
    }

    #[test]
    fn queue_to_sink_drain_delivers_record() {
        let (shared, lines, _live) = make_shared(1_000_000, Duration::from_millis(20));
        shared.queue.put(Record::new(
            shared.clock.now(),
            Severity::Error,
            "p",
            "m",
        ));
        drain_queue_to_sinks(&shared);
        assert_eq!(lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn s4_outage_then_reconnect_preserves_order() {
        let (shared, lines, live) = make_shared(1_000_000, Duration::from_millis(20));
        live.store(false, Ordering::SeqCst);

        // While down: queue drains straight to the spool.
        shared.queue.put(Record::new(shared.clock.now(), Severity::Info, "p", "a"));
        shared.queue.put(Record::new(shared.clock.now(), Severity::Info, "p", "b"));
        drain_queue_to_spool(&shared);
        assert_eq!(shared.spool.approx_len(), 2);

        // Reconnect, then a fresh record arrives before the next drain.
        live.store(true, Ordering::SeqCst);
        shared.queue.put(Record::new(shared.clock.now(), Severity::Info, "p", "c"));

        let live_any = shared.registry.poll_all();
        assert!(live_any);
        shared.spool.drain_to_sinks(&shared.registry);
        drain_queue_to_sinks(&shared);

        let sent = lines.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert!(std::str::from_utf8(&sent[0]).unwrap().contains(": a\r\n"));
        assert!(std::str::from_utf8(&sent[1]).unwrap().contains(": b\r\n"));
        assert!(std::str::from_utf8(&sent[2]).unwrap().contains(": c\r\n"));
    }

    #[test]
    fn s5_heartbeat_after_silent_ticks() {
        let tick = Duration::from_millis(15);
        let (shared, lines, _live) = make_shared(2, tick);
        let shared_clone = Arc::clone(&shared);
        let handle = thread::spawn(move || run(&shared_clone));

        thread::sleep(tick * 6);
        shared.request_terminate();
        shared.wake.signal(NEW_MSG);
        handle.join().unwrap();

        let sent = lines.lock().unwrap();
        assert!(sent.iter().any(|l| std::str::from_utf8(l).unwrap().contains("Heartbeat")));
        assert!(shared.stats().heartbeats_sent >= 1);
    }

    #[test]
    fn state_transitions_to_dead_on_terminate() {
        let (shared, _lines, _live) = make_shared(1_000_000, DEFAULT_TICK);
        assert_eq!(shared.state(), DispatcherState::Running);
        shared.request_terminate();
        run(&shared);
        assert_eq!(shared.state(), DispatcherState::Dead);
    }
}
