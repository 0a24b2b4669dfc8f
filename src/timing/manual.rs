use super::{Callback, TimerHandle, TimerProvider, TimerSlot};
use crate::error::TimerError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

struct ManualEntry {
    deadline: Duration,
    seq: u64,
    slot: Arc<TimerSlot>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    seq: u64,
    entries: Vec<ManualEntry>,
}

/// Timer driven by an external clock. Nothing fires until the host calls
/// `advance`, and then callbacks run on the host's thread.
#[derive(Default)]
pub struct ManualTimer {
    state: Mutex<ManualState>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Armed callbacks that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.slot.is_pending())
            .count()
    }

    /// Moves the clock forward and fires everything now due. Returns how many
    /// callbacks actually ran.
    pub fn advance(&self, by: Duration) -> usize {
        let due = {
            let mut state = self.state.lock();
            state.now += by;
            let now = state.now;

            let (mut due, rest): (Vec<_>, Vec<_>) = state
                .entries
                .drain(..)
                .partition(|entry| entry.deadline <= now);
            state.entries = rest;
            due.sort_by_key(|entry| (entry.deadline, entry.seq));
            due
        };

        // Fired outside the lock so callbacks may arm new timers.
        due.into_iter().filter(|entry| entry.slot.fire()).count()
    }
}

impl TimerProvider for ManualTimer {
    fn arm(&self, delay: Duration, callback: Callback) -> Result<TimerHandle, TimerError> {
        let slot = TimerSlot::new(callback);
        let mut state = self.state.lock();
        let entry = ManualEntry {
            deadline: state.now + delay,
            seq: state.seq,
            slot: slot.clone(),
        };
        state.seq += 1;
        state.entries.push(entry);
        Ok(TimerHandle::new(slot))
    }
}
