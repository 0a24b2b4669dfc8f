//! Turns each note-on into a note-on / note-off pair, with every note-off
//! fired by its own timer.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod midi;
pub mod scheduler;
pub mod sink;
pub mod timing;
pub mod watch;

pub use config::{Config, MidiSettings};
pub use engine::{EngineCommand, EngineHandle, EngineUpdate, spawn_engine};
pub use error::{ConfigError, MidiError, SchedulerError, TimerError};
pub use events::{DurationMs, NoteEvent, NoteId, Pitch, Velocity};
pub use scheduler::{Note, NoteScheduler, PendingNote};
pub use sink::{EventSink, RingSink};
pub use timing::{ManualTimer, TimerHandle, TimerProvider, TimerService};
