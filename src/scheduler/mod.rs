//! Note-on / note-off pairing.
//!
//! `NoteScheduler` emits a note-on for every trigger and keeps a live
//! [`Note`] per trigger until that note's own timer has emitted the matching
//! note-off. Notes are independent: each has its own deadline, and nothing
//! merges or replaces overlapping notes of the same pitch.

mod note;
mod pending;

pub use note::Note;
pub use pending::PendingNote;

use crate::error::SchedulerError;
use crate::events::{DurationMs, NoteEvent, NoteId, Pitch, Velocity};
use crate::sink::EventSink;
use crate::timing::TimerProvider;
use parking_lot::Mutex;
use pending::PendingParams;
use std::collections::BTreeMap;
use std::sync::Arc;

struct Registry {
    // Keyed by identity; identities increase, so iteration is arrival order.
    live: BTreeMap<NoteId, Note>,
    next_id: u64,
    open: bool,
}

pub(crate) struct Shared {
    pub(crate) sink: Arc<dyn EventSink>,
    timers: Arc<dyn TimerProvider>,
    pending: PendingParams,
    registry: Mutex<Registry>,
}

impl Shared {
    pub(crate) fn remove(&self, id: NoteId) {
        let mut registry = self.registry.lock();
        if let Some(note) = registry.live.remove(&id) {
            // No-op when called from the note's own off-action.
            if note.cancel() {
                tracing::debug!(%id, "note removed before its note-off");
            }
            tracing::trace!(%id, live = registry.live.len(), "note retired");
            return;
        }

        if !registry.open {
            // A note-off that was already running when shutdown cancelled the rest.
            tracing::debug!(%id, "late note-off after shutdown");
            return;
        }

        drop(registry);
        tracing::error!(%id, "removing a note that is not registered");
        if cfg!(debug_assertions) {
            panic!("note {id} is not registered: fired twice or lost");
        }
    }

    /// Cancels every live note whose timer has not started firing and
    /// returns their pitches in arrival order. Notes caught mid-fire stay
    /// registered; their own off-action removes them.
    fn cancel_live(&self, close: bool) -> Vec<(NoteId, Pitch)> {
        let mut registry = self.registry.lock();
        if close {
            registry.open = false;
        }

        let mut cancelled = Vec::new();
        registry.live.retain(|id, note| {
            if note.cancel() {
                cancelled.push((*id, note.pitch()));
                false
            } else {
                true
            }
        });
        cancelled
    }
}

/// Registry of pending note-offs.
///
/// Control-path calls (`set_pending_*`, `trigger`, `stop`, ...) may come from
/// any thread. Note-offs are emitted from the timer's own context.
pub struct NoteScheduler {
    shared: Arc<Shared>,
}

impl NoteScheduler {
    pub fn new(
        sink: Arc<dyn EventSink>,
        timers: Arc<dyn TimerProvider>,
        initial: PendingNote,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                sink,
                timers,
                pending: PendingParams::new(initial),
                registry: Mutex::new(Registry {
                    live: BTreeMap::new(),
                    next_id: 1,
                    open: true,
                }),
            }),
        }
    }

    pub fn set_pending_pitch(&self, pitch: Pitch) {
        self.shared.pending.update(|note| note.pitch = pitch);
    }

    pub fn set_pending_velocity(&self, velocity: Velocity) {
        self.shared.pending.update(|note| note.velocity = velocity);
    }

    pub fn set_pending_duration(&self, duration_ms: DurationMs) {
        self.shared.pending.update(|note| note.duration_ms = duration_ms);
    }

    pub fn pending(&self) -> PendingNote {
        self.shared.pending.snapshot()
    }

    /// Sets the pitch and triggers, the way a pitch arriving on the control
    /// path does.
    pub fn play(&self, pitch: Pitch) -> Result<NoteId, SchedulerError> {
        self.set_pending_pitch(pitch);
        self.trigger()
    }

    /// Emits a note-on for the current pending values and schedules its
    /// note-off.
    pub fn trigger(&self) -> Result<NoteId, SchedulerError> {
        self.schedule(self.pending())
    }

    /// Like `trigger`, for an explicit note that bypasses the pending values.
    ///
    /// If the note-off cannot be scheduled the note-off is sent right away,
    /// so every note-on that went out is still paired.
    pub fn schedule(&self, note: PendingNote) -> Result<NoteId, SchedulerError> {
        let shared = &self.shared;
        if !shared.registry.lock().open {
            return Err(SchedulerError::ShutDown);
        }

        shared.sink.send(NoteEvent::on(note.pitch, note.velocity));

        let scheduled = {
            let mut registry = shared.registry.lock();
            if registry.open {
                let id = NoteId(registry.next_id);
                registry.next_id += 1;

                // Armed under the lock: an immediate note-off waits in `remove`
                // until the note is registered.
                match Note::schedule(
                    Arc::downgrade(shared),
                    id,
                    note.pitch,
                    note.duration_ms,
                    shared.timers.as_ref(),
                ) {
                    Ok(scheduled) => {
                        registry.live.insert(id, scheduled);
                        Ok(id)
                    }
                    Err(e) => Err(SchedulerError::from(e)),
                }
            } else {
                Err(SchedulerError::ShutDown)
            }
        };

        match &scheduled {
            Ok(id) => tracing::debug!(
                %id,
                pitch = note.pitch,
                velocity = note.velocity,
                duration_ms = note.duration_ms,
                "note scheduled"
            ),
            Err(e) => {
                tracing::warn!(pitch = note.pitch, error = %e, "note-off sent early");
                shared.sink.send(NoteEvent::off(note.pitch));
            }
        }

        scheduled
    }

    /// Retires a note by identity. The identity must be live: an unknown
    /// identity means a note-off ran twice or a note was lost, which panics
    /// in debug builds and is logged as an error otherwise.
    pub fn remove(&self, id: NoteId) {
        self.shared.remove(id);
    }

    /// Sends every pending note-off now and cancels the timers.
    pub fn stop(&self) -> usize {
        let flushed = self.shared.cancel_live(false);
        for (_, pitch) in &flushed {
            self.shared.sink.send(NoteEvent::off(*pitch));
        }
        tracing::debug!(count = flushed.len(), "flushed pending note-offs");
        flushed.len()
    }

    /// Forgets every pending note-off without sending it.
    pub fn clear(&self) -> usize {
        let cleared = self.shared.cancel_live(false).len();
        tracing::debug!(count = cleared, "cleared pending note-offs");
        cleared
    }

    /// Closes the registry and cancels all outstanding timers. Later
    /// triggers fail with `SchedulerError::ShutDown`. Safe to call twice.
    pub fn shutdown(&self) {
        let cancelled = self.shared.cancel_live(true);
        if !cancelled.is_empty() {
            tracing::info!(count = cancelled.len(), "cancelled pending note-offs on shutdown");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        !self.shared.registry.lock().open
    }

    pub fn active_count(&self) -> usize {
        self.shared.registry.lock().live.len()
    }

    pub fn is_active(&self, id: NoteId) -> bool {
        self.shared.registry.lock().live.contains_key(&id)
    }

    /// Live notes in arrival order.
    pub fn active_notes(&self) -> Vec<(NoteId, Pitch)> {
        self.shared
            .registry
            .lock()
            .live
            .values()
            .map(|note| (note.id(), note.pitch()))
            .collect()
    }
}

impl Drop for NoteScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
