//! Bounded worker gate for thumbnail generation.
//!
//! A counting semaphore built on `Mutex` + `Condvar`: callers block until a
//! slot is free instead of polling. The limit can change while callers are
//! waiting; raising it wakes them immediately, lowering it lets running work
//! finish and admits nobody new until the count drops below the new limit.
//!
//! Interactive requests ([`Priority::High`]) jump ahead of batch prefetch
//! ([`Priority::Low`]): a low-priority caller is only admitted when no
//! high-priority caller is waiting.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Who is asking for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// A thumbnail the user is looking at right now.
    High,
    /// Prefetch for thumbnails that may scroll into view.
    Low,
}

#[derive(Debug)]
struct GateState {
    limit: usize,
    active: usize,
    high_waiting: usize,
}

#[derive(Debug)]
pub struct WorkerGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl WorkerGate {
    pub fn new(limit: usize) -> Self {
        Self {
            state: Mutex::new(GateState {
                limit: limit.max(1),
                active: 0,
                high_waiting: 0,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until a slot is free, then hold it until the permit drops.
    pub fn acquire(&self, priority: Priority) -> Permit<'_> {
        let mut state = self.lock();
        if priority == Priority::High {
            state.high_waiting += 1;
        }

        while state.active >= state.limit
            || (priority == Priority::Low && state.high_waiting > 0)
        {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        state.active += 1;
        if priority == Priority::High {
            state.high_waiting -= 1;
            if state.high_waiting == 0 {
                // Low waiters may now take any remaining slots
                self.changed.notify_all();
            }
        }
        Permit { gate: self }
    }

    /// Change the slot count. Values below 1 are raised to 1.
    pub fn set_limit(&self, limit: usize) {
        self.lock().limit = limit.max(1);
        self.changed.notify_all();
    }

    pub fn limit(&self) -> usize {
        self.lock().limit
    }

    /// Slots currently held.
    pub fn active(&self) -> usize {
        self.lock().active
    }

    fn release(&self) {
        self.lock().active -= 1;
        self.changed.notify_all();
    }
}

/// A held slot; released on drop.
#[derive(Debug)]
pub struct Permit<'a> {
    gate: &'a WorkerGate,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}
