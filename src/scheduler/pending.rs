use crate::events::{DurationMs, Pitch, Velocity};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// The next note to be triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNote {
    pub pitch: Pitch,
    pub velocity: Velocity,
    pub duration_ms: DurationMs,
}

impl Default for PendingNote {
    fn default() -> Self {
        Self {
            pitch: 60,
            velocity: 100,
            duration_ms: 250,
        }
    }
}

/// Pending parameters written from the control path. Every update swaps in a
/// whole new snapshot, so a reader never sees a half-written triple. Two
/// writers racing a trigger can still decide which values the trigger sees.
pub(crate) struct PendingParams {
    current: ArcSwap<PendingNote>,
}

impl PendingParams {
    pub(crate) fn new(initial: PendingNote) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    pub(crate) fn snapshot(&self) -> PendingNote {
        **self.current.load()
    }

    pub(crate) fn update(&self, apply: impl Fn(&mut PendingNote)) {
        self.current.rcu(|current| {
            let mut next = **current;
            apply(&mut next);
            next
        });
    }
}
