//! Cooperative deferred-callback scheduler
//!
//! Single-threaded timer queue driven by the host's frame loop. Timers carry
//! a payload instead of a closure; the owner pops due payloads and dispatches
//! them itself, so a handler can freely schedule follow-up timers.

use std::collections::{BTreeMap, HashMap};

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Millisecond timer queue with stable FIFO order for equal due times
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    now_ms: u64,
    next_seq: u64,
    /// (due, seq) -> payload
    queue: BTreeMap<(u64, u64), T>,
    /// seq -> due, for cancellation
    due_by_id: HashMap<u64, u64>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            due_by_id: HashMap::new(),
        }
    }

    /// Current queue time
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `payload` to fire `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u64, payload: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due = self.now_ms.saturating_add(delay_ms);
        self.queue.insert((due, seq), payload);
        self.due_by_id.insert(seq, due);
        TimerId(seq)
    }

    /// Cancel a pending timer. Cancelling a fired or unknown timer is a no-op.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_by_id.remove(&id.0) {
            Some(due) => self.queue.remove(&(due, id.0)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_by_id.contains_key(&id.0)
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Move the clock forward
    pub fn advance(&mut self, dt_ms: u64) {
        self.now_ms = self.now_ms.saturating_add(dt_ms);
    }

    /// Pop the earliest timer that is due at the current time
    pub fn pop_due(&mut self) -> Option<(TimerId, T)> {
        let (&(due, seq), _) = self.queue.first_key_value()?;
        if due > self.now_ms {
            return None;
        }
        self.due_by_id.remove(&seq);
        self.queue
            .remove(&(due, seq))
            .map(|payload| (TimerId(seq), payload))
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.queue.clear();
        self.due_by_id.clear();
    }
}
