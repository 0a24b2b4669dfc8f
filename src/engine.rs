use crate::events::{DurationMs, NoteId, Pitch, Velocity};
use crate::scheduler::NoteScheduler;
use crossbeam::channel::{Receiver, Sender};
use std::thread::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Sets the pitch and triggers a note.
    Pitch(Pitch),
    Velocity(Velocity),
    Duration(DurationMs),
    Stop,
    Clear,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineUpdate {
    NoteScheduled { id: NoteId, pitch: Pitch },
    Flushed { count: usize },
    Error { message: String },
}

pub struct EngineHandle {
    pub command_tx: Sender<EngineCommand>,
    pub update_rx: Receiver<EngineUpdate>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Stops the control thread and waits for it; the scheduler is shut
    /// down on the way out.
    pub fn shutdown(mut self) {
        let _ = self.command_tx.send(EngineCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Runs the scheduler on its own control thread, fed by commands.
pub fn spawn_engine(scheduler: NoteScheduler) -> EngineHandle {
    let (command_tx, command_rx) = crossbeam::channel::unbounded();
    let (update_tx, update_rx) = crossbeam::channel::unbounded();

    let thread = std::thread::spawn(move || {
        engine_thread(scheduler, command_rx, update_tx);
    });

    EngineHandle {
        command_tx,
        update_rx,
        thread: Some(thread),
    }
}

fn engine_thread(
    scheduler: NoteScheduler,
    command_rx: Receiver<EngineCommand>,
    update_tx: Sender<EngineUpdate>,
) {
    loop {
        match command_rx.recv() {
            Ok(EngineCommand::Pitch(pitch)) => match scheduler.play(pitch) {
                Ok(id) => {
                    let _ = update_tx.send(EngineUpdate::NoteScheduled { id, pitch });
                }
                Err(e) => {
                    let _ = update_tx.send(EngineUpdate::Error {
                        message: format!("Failed to schedule note {}: {}", pitch, e),
                    });
                }
            },
            Ok(EngineCommand::Velocity(velocity)) => scheduler.set_pending_velocity(velocity),
            Ok(EngineCommand::Duration(duration_ms)) => scheduler.set_pending_duration(duration_ms),
            Ok(EngineCommand::Stop) => {
                let count = scheduler.stop();
                let _ = update_tx.send(EngineUpdate::Flushed { count });
            }
            Ok(EngineCommand::Clear) => {
                scheduler.clear();
            }
            Ok(EngineCommand::Shutdown) => break,
            Err(crossbeam::channel::RecvError) => break,
        }
    }

    scheduler.shutdown();
    tracing::info!("engine stopped");
}
