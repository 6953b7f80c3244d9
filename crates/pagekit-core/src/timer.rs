#![forbid(unsafe_code)]

//! Keyed, cancelable one-shot timers.
//!
//! A [`TimerQueue`] holds at most one pending deadline per key. Keys name the
//! owning entity and the purpose of the timer (for example "auto-dismiss of
//! notification 7"), so a manual action can cancel the automatic one before
//! it fires.
//!
//! # Invariants
//!
//! 1. **One deadline per key**: scheduling an existing key replaces it.
//! 2. **Ordered firing**: [`pop_due`](TimerQueue::pop_due) yields keys by
//!    deadline, ties broken by scheduling order.
//! 3. **Fire once**: a popped or cancelled key is gone; it can only fire again
//!    if it is scheduled again.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::Duration;

/// Ordering slot for a pending timer.
type Slot = (Duration, u64);

/// A set of pending one-shot timers keyed by `K`.
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    by_deadline: BTreeMap<Slot, K>,
    by_key: HashMap<K, Slot>,
    next_seq: u64,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            by_deadline: BTreeMap::new(),
            by_key: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<K: Clone + Eq + Hash> TimerQueue<K> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to fire at `deadline`, replacing any pending timer for it.
    pub fn schedule(&mut self, key: K, deadline: Duration) {
        self.cancel(&key);
        let slot = (deadline, self.next_seq);
        self.next_seq += 1;
        self.by_deadline.insert(slot, key.clone());
        self.by_key.insert(key, slot);
    }

    /// Cancel the pending timer for `key`.
    ///
    /// Returns `true` if a timer was pending.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.by_key.remove(key) {
            Some(slot) => {
                self.by_deadline.remove(&slot);
                true
            }
            None => false,
        }
    }

    /// Cancel every pending timer whose key matches `predicate`.
    ///
    /// Returns the number of timers cancelled.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&K) -> bool) -> usize {
        let doomed: Vec<K> = self.by_key.keys().filter(|k| predicate(*k)).cloned().collect();
        for key in &doomed {
            self.cancel(key);
        }
        doomed.len()
    }

    /// Whether a timer is pending for `key`.
    #[must_use]
    pub fn is_scheduled(&self, key: &K) -> bool {
        self.by_key.contains_key(key)
    }

    /// Deadline of the pending timer for `key`.
    #[must_use]
    pub fn deadline_of(&self, key: &K) -> Option<Duration> {
        self.by_key.get(key).map(|(deadline, _)| *deadline)
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.by_deadline.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove and return every key whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Vec<K> {
        self.pop_due_timed(now).into_iter().map(|(_, key)| key).collect()
    }

    /// Like [`pop_due`](Self::pop_due), paired with each key's deadline.
    pub fn pop_due_timed(&mut self, now: Duration) -> Vec<(Duration, K)> {
        let mut due = Vec::new();
        while let Some(entry) = self.by_deadline.first_entry() {
            let deadline = entry.key().0;
            if deadline > now {
                break;
            }
            let key = entry.remove();
            self.by_key.remove(&key);
            due.push((deadline, key));
        }
        due
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether no timers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.by_deadline.clear();
        self.by_key.clear();
    }
}
