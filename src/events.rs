use std::fmt;

pub type Pitch = i32;
pub type Velocity = i32;
/// Milliseconds. Values at or below zero mean "as soon as possible".
pub type DurationMs = i64;

/// Identity of one scheduled note. Issued in strictly increasing order by a
/// `NoteScheduler` and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub(crate) u64);

impl NoteId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A note-on (velocity != 0) or note-off (velocity == 0) notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub pitch: Pitch,
    pub velocity: Velocity,
}

impl NoteEvent {
    pub fn on(pitch: Pitch, velocity: Velocity) -> Self {
        Self { pitch, velocity }
    }

    pub fn off(pitch: Pitch) -> Self {
        Self { pitch, velocity: 0 }
    }

    pub fn is_note_off(&self) -> bool {
        self.velocity == 0
    }
}
