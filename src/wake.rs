//! Wake-event primitive (§4.5 step 1, DESIGN NOTES "Event-bit waits").
//!
//! The teacher has no event-bit wait anywhere in its tree (its one loop
//! polls on a fixed delay). The real precedent is `original_source/rlog.c`'s
//! `server_thread`, which waits on a FreeRTOS event group via
//! `os_event_wait(wakeup_events, EVENTS_MASK, EVENT_TIMEOUT)` and clears it
//! with `os_event_clear`. Re-expressed here as a `Condvar` plus a small
//! bitmask protected by a `Mutex<u8>`, the direct `std` equivalent of that
//! FreeRTOS event group.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Set when a producer enqueues a new record.
pub const NEW_MSG: u8 = 1 << 0;

/// The dispatcher's wake-event: a bitmask producers set and the dispatcher
/// waits on and clears.
pub struct WakeEvents {
    bits: Mutex<u8>,
    condvar: Condvar,
}

impl WakeEvents {
    pub fn new() -> Self {
        Self {
            bits: Mutex::new(0),
            condvar: Condvar::new(),
        }
    }

    /// Raise the given bits and wake anyone waiting.
    pub fn signal(&self, bits: u8) {
        let mut guard = self.bits.lock().expect("wake mutex poisoned");
        *guard |= bits;
        self.condvar.notify_one();
    }

    /// Wait up to `timeout` for any bit to be set, then clear and return the
    /// bits observed (possibly 0, on a timeout with nothing raised).
    pub fn wait_and_clear(&self, timeout: Duration) -> u8 {
        let guard = self.bits.lock().expect("wake mutex poisoned");
        let (mut guard, _) = self
            .condvar
            .wait_timeout_while(guard, timeout, |bits| *bits == 0)
            .expect("wake mutex poisoned");
        let observed = *guard;
        *guard = 0;
        observed
    }
}

impl Default for WakeEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn wait_times_out_with_no_signal() {
        let events = WakeEvents::new();
        let start = Instant::now();
        let bits = events.wait_and_clear(Duration::from_millis(50));
        assert_eq!(bits, 0);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn signal_wakes_waiter_immediately() {
        let events = Arc::new(WakeEvents::new());
        let waiter = Arc::clone(&events);
        let handle = thread::spawn(move || waiter.wait_and_clear(Duration::from_secs(5)));

        thread::sleep(Duration::from_millis(20));
        events.signal(NEW_MSG);

        let bits = handle.join().unwrap();
        assert_eq!(bits, NEW_MSG);
    }

    #[test]
    fn bits_clear_after_wait() {
        let events = WakeEvents::new();
        events.signal(NEW_MSG);
        assert_eq!(events.wait_and_clear(Duration::from_millis(10)), NEW_MSG);
        assert_eq!(events.wait_and_clear(Duration::from_millis(10)), 0);
    }
}
