use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("timer service has stopped")]
    Stopped,
    #[error("failed to start timer thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("note scheduler has been shut down")]
    ShutDown,
    #[error("could not arm note-off timer: {0}")]
    Timer(#[from] TimerError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("config serialize: {0}")]
    Serialize(#[from] ron::Error),
}

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("MIDI init: {0}")]
    Init(#[from] midir::InitError),
    #[error("no MIDI {0} ports available")]
    NoPorts(&'static str),
    #[error("MIDI device matching '{0}' not found")]
    NotFound(String),
    #[error("MIDI connect: {0}")]
    Connect(String),
}
