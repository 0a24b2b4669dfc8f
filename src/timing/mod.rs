mod manual;
mod service;

pub use manual::ManualTimer;
pub use service::TimerService;

use crate::error::TimerError;
use crate::events::DurationMs;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// One-shot delayed callbacks. The callback must run on a context other
/// than the one calling `arm`.
pub trait TimerProvider: Send + Sync {
    fn arm(&self, delay: Duration, callback: Callback) -> Result<TimerHandle, TimerError>;
}

/// Shared between a handle and the timer queue. Whoever takes the callback
/// first (fire or cancel) wins.
pub(crate) struct TimerSlot {
    callback: Mutex<Option<Callback>>,
}

impl TimerSlot {
    pub(crate) fn new(callback: Callback) -> Arc<Self> {
        Arc::new(Self {
            callback: Mutex::new(Some(callback)),
        })
    }

    pub(crate) fn fire(&self) -> bool {
        let callback = self.callback.lock().take();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    fn cancel(&self) -> bool {
        self.callback.lock().take().is_some()
    }

    fn is_pending(&self) -> bool {
        self.callback.lock().is_some()
    }
}

/// Handle to an armed callback. Dropping it does not cancel.
pub struct TimerHandle {
    slot: Arc<TimerSlot>,
}

impl TimerHandle {
    pub(crate) fn new(slot: Arc<TimerSlot>) -> Self {
        Self { slot }
    }

    /// Returns true if the callback was prevented from running. A callback
    /// that already fired, or is firing right now, is unaffected.
    pub fn cancel(&self) -> bool {
        self.slot.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("pending", &self.is_pending())
            .finish()
    }
}

pub fn delay_from_ms(duration: DurationMs) -> Duration {
    Duration::from_millis(duration.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn non_positive_durations_are_immediate() {
        assert_eq!(delay_from_ms(-20), Duration::ZERO);
        assert_eq!(delay_from_ms(0), Duration::ZERO);
        assert_eq!(delay_from_ms(15), Duration::from_millis(15));
    }

    #[test]
    fn slot_runs_at_most_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let slot = TimerSlot::new(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let handle = TimerHandle::new(slot.clone());

        assert!(slot.fire());
        assert!(!slot.fire());
        assert!(!handle.cancel());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancelled_slot_never_fires() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let slot = TimerSlot::new(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let handle = TimerHandle::new(slot.clone());

        assert!(handle.is_pending());
        assert!(handle.cancel());
        assert!(!handle.is_pending());
        assert!(!slot.fire());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
