use super::Shared;
use crate::error::TimerError;
use crate::events::{DurationMs, NoteEvent, NoteId, Pitch};
use crate::timing::{TimerHandle, TimerProvider, delay_from_ms};
use std::sync::Weak;

/// One note-on already sent, paired with the timer that will send its
/// note-off. Payload is fixed at construction.
#[derive(Debug)]
pub struct Note {
    id: NoteId,
    pitch: Pitch,
    timer: TimerHandle,
}

impl Note {
    /// Arms the note-off. When the timer fires the off-action emits the
    /// note-off first and only then removes the note from its registry.
    pub(super) fn schedule(
        owner: Weak<Shared>,
        id: NoteId,
        pitch: Pitch,
        duration_ms: DurationMs,
        timers: &dyn TimerProvider,
    ) -> Result<Self, TimerError> {
        let off_action = move || {
            let Some(owner) = owner.upgrade() else {
                tracing::trace!(%id, pitch, "registry gone before note-off");
                return;
            };
            owner.sink.send(NoteEvent::off(pitch));
            owner.remove(id);
        };

        let timer = timers.arm(delay_from_ms(duration_ms), Box::new(off_action))?;

        Ok(Self { id, pitch, timer })
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    /// True if this call stopped the note-off from ever running.
    pub(super) fn cancel(&self) -> bool {
        self.timer.cancel()
    }
}
