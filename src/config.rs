use crate::error::ConfigError;
use crate::events::{DurationMs, Velocity};
use crate::scheduler::PendingNote;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiSettings {
    /// Substring of the input port name. None = first available port.
    pub input_port: Option<String>,
    /// Substring of the output port name. None = first available port.
    pub output_port: Option<String>,
    /// 0-15, used both as input filter and output channel.
    pub channel: u8,
    /// Control change number that sets the note duration.
    pub duration_cc: Option<u8>,
    /// Milliseconds per CC step.
    pub duration_scale_ms: DurationMs,
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            input_port: None,
            output_port: None,
            channel: 0,
            duration_cc: None,
            duration_scale_ms: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub velocity: Velocity,
    pub duration_ms: DurationMs,
    pub log_filter: String,
    pub midi: MidiSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            velocity: 100,
            duration_ms: 250,
            log_filter: "info".to_string(),
            midi: MidiSettings::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ron_string = fs::read_to_string(path)?;
        let config: Config = ron::from_str(&ron_string)?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, ron_string)?;

        Ok(())
    }

    /// Pending values the scheduler starts from.
    pub fn initial_note(&self) -> PendingNote {
        PendingNote {
            velocity: self.velocity,
            duration_ms: self.duration_ms,
            ..PendingNote::default()
        }
    }
}
