//! The bounded in-memory record queue (§3, §4.1 "Ring queue").
//!
//! Grounded on the teacher's `LogStream`: a fixed-capacity ring of slots with
//! head/tail/count bookkeeping and a drop-oldest overflow policy. The
//! teacher's version is lock-free (SPMC via atomics); this spec calls for a
//! mutex-guarded queue instead (§5, DESIGN NOTES "Event-bit waits"), so the
//! atomics become a single `Mutex<Inner>` and the public methods stay O(1)
//! under the lock.

use std::sync::Mutex;

use crate::record::Record;

struct Inner {
    slots: Vec<Option<Record>>,
    head: usize,
    tail: usize,
    count: usize,
    overflow_count: u64,
    max_count_seen: usize,
}

/// Bounded FIFO of [`Record`]s, mutex-guarded, with drop-oldest overflow.
///
/// `put` never blocks on backpressure and never fails: once the queue is
/// full, the oldest record is silently discarded to make room (§4.1 "Tie-break").
pub struct RingQueue {
    inner: Mutex<Inner>,
    capacity: usize,
}

/// A snapshot of the queue's bookkeeping counters, for `RemoteLogger::stats()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueStats {
    pub count: usize,
    pub overflow_count: u64,
    pub max_count_seen: usize,
}

impl RingQueue {
    /// Create a queue with room for `capacity` records. `capacity` must be
    /// nonzero; validated by `Config::validate` before this is ever called.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingQueue capacity must be nonzero");
        Self {
            inner: Mutex::new(Inner {
                slots: vec![None; capacity],
                head: 0,
                tail: 0,
                count: 0,
                overflow_count: 0,
                max_count_seen: 0,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// §4.1 `put`: copy `record` into the next free slot, overwriting the
    /// oldest entry on overflow. O(1), never blocks beyond the mutex.
    pub fn put(&self, record: Record) {
        let mut inner = self.inner.lock().expect("ring queue mutex poisoned");
        let cap = self.capacity;

        if inner.count == cap {
            inner.overflow_count += 1;
            inner.head = (inner.head + 1) % cap;
        } else {
            inner.count += 1;
        }

        let tail = inner.tail;
        inner.slots[tail] = Some(record);
        inner.tail = (inner.tail + 1) % cap;

        if inner.count > inner.max_count_seen {
            inner.max_count_seen = inner.count;
        }
    }

    /// §4.1 `get`: pop the oldest record, if any. Formatting happens outside
    /// the lock — the caller receives an owned `Record`, so the mutex is
    /// never held across anything but this O(1) bookkeeping.
    pub fn get(&self) -> Option<Record> {
        let mut inner = self.inner.lock().expect("ring queue mutex poisoned");
        if inner.count == 0 {
            return None;
        }
        let head = inner.head;
        let record = inner.slots[head].take();
        inner.head = (inner.head + 1) % self.capacity;
        inner.count -= 1;
        record
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().expect("ring queue mutex poisoned").count == 0
    }

    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock().expect("ring queue mutex poisoned");
        QueueStats {
            count: inner.count,
            overflow_count: inner.overflow_count,
            max_count_seen: inner.max_count_seen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Timestamp;
    use crate::record::Severity;

    fn rec(tag: &str) -> Record {
        Record::new(Timestamp(0), Severity::Info, "t", tag)
    }

    #[test]
    fn put_then_get_round_trips() {
        let q = RingQueue::new(4);
        q.put(rec("m1"));
        let got = q.get().unwrap();
        assert_eq!(got.msg.as_str(), "m1");
        assert!(q.get().is_none());
    }

    #[test]
    fn drop_oldest_on_overflow() {
        // Testable property #10: N=4, 2N puts with no get -> last N survive.
        let q = RingQueue::new(4);
        for i in 1..=8 {
            q.put(rec(&format!("m{i}")));
        }
        let stats = q.stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.overflow_count, 4);

        let mut seen = vec![];
        while let Some(r) = q.get() {
            seen.push(r.msg.as_str().to_string());
        }
        assert_eq!(seen, vec!["m5", "m6", "m7", "m8"]);
    }

    #[test]
    fn scenario_s3_drop_oldest_specific_sequence() {
        let q = RingQueue::new(4);
        for tag in ["m1", "m2", "m3", "m4", "m5", "m6"] {
            q.put(rec(tag));
        }
        assert_eq!(q.stats().overflow_count, 2);

        let mut seen = vec![];
        while let Some(r) = q.get() {
            seen.push(r.msg.as_str().to_string());
        }
        assert_eq!(seen, vec!["m3", "m4", "m5", "m6"]);
    }

    #[test]
    fn max_count_seen_is_monotonic_and_bounded() {
        let q = RingQueue::new(4);
        for i in 0..3 {
            q.put(rec(&i.to_string()));
        }
        assert_eq!(q.stats().max_count_seen, 3);
        q.get();
        q.get();
        // Dropping below the high-water mark must not lower it.
        assert_eq!(q.stats().max_count_seen, 3);
        for i in 0..10 {
            q.put(rec(&i.to_string()));
        }
        assert_eq!(q.stats().max_count_seen, 4);
        assert!(q.stats().max_count_seen <= q.capacity());
    }

    #[test]
    fn overflow_count_matches_invariant_2() {
        let q = RingQueue::new(3);
        let puts = 10;
        let mut gets = 0;
        for i in 0..puts {
            q.put(rec(&i.to_string()));
            if i % 2 == 0 {
                if q.get().is_some() {
                    gets += 1;
                }
            }
        }
        let stats = q.stats();
        assert_eq!(
            stats.overflow_count as i64,
            puts as i64 - gets as i64 - stats.count as i64
        );
    }

    #[test]
    fn concurrent_producers_never_exceed_capacity() {
        use std::sync::Arc;
        use std::thread;

        let q = Arc::new(RingQueue::new(16));
        let mut handles = vec![];
        for t in 0..8 {
            let q = Arc::clone(&q);
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    q.put(rec(&format!("t{t}-{i}")));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert!(q.stats().count <= q.capacity());
        assert!(q.stats().max_count_seen <= q.capacity());
    }
}
