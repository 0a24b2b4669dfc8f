//! MIDI host bridge: note-ons arriving on an input port drive the engine,
//! scheduled note events leave through an output port.

use crate::config::MidiSettings;
use crate::engine::EngineCommand;
use crate::error::MidiError;
use crate::events::NoteEvent;
use crate::sink::EventSink;
use crossbeam::channel::Sender;
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
}

impl MidiMessage {
    pub fn from_event(event: NoteEvent) -> Self {
        let pitch = clamp_data(event.pitch);
        if event.is_note_off() {
            MidiMessage::NoteOff { pitch }
        } else {
            // Clamping a negative velocity to 0 would turn it into a note-off.
            MidiMessage::NoteOn {
                pitch,
                velocity: clamp_data(event.velocity).max(1),
            }
        }
    }
}

fn clamp_data(value: i32) -> u8 {
    value.clamp(0, 127) as u8
}

pub fn encode(event: NoteEvent, channel: u8) -> [u8; 3] {
    let channel = channel & 0x0F;
    match MidiMessage::from_event(event) {
        MidiMessage::NoteOn { pitch, velocity } => [0x90 | channel, pitch, velocity],
        MidiMessage::NoteOff { pitch } => [0x80 | channel, pitch, 0],
    }
}

/// Translates an incoming message into engine commands. Velocity is sent
/// before pitch so the triggered note picks it up.
pub fn parse_control(message: &[u8], settings: &MidiSettings) -> Vec<EngineCommand> {
    let [status, data1, data2] = match message {
        [status, data1, data2, ..] => [*status, *data1, *data2],
        _ => return Vec::new(),
    };
    if status & 0x0F != settings.channel & 0x0F {
        return Vec::new();
    }

    match status & 0xF0 {
        0x90 if data2 > 0 => vec![
            EngineCommand::Velocity(data2 as i32),
            EngineCommand::Pitch(data1 as i32),
        ],
        0xB0 if settings.duration_cc == Some(data1) => vec![EngineCommand::Duration(
            (data2 as i64).saturating_mul(settings.duration_scale_ms),
        )],
        _ => Vec::new(),
    }
}

/// Sends note events to a MIDI output port.
pub struct MidiOutSink {
    connection: Mutex<MidiOutputConnection>,
    channel: u8,
    port_name: String,
}

impl MidiOutSink {
    pub fn connect(settings: &MidiSettings) -> Result<Self, MidiError> {
        let midi_out = MidiOutput::new("notemake")?;

        let ports = midi_out.ports();
        let port = match &settings.output_port {
            Some(filter) => ports
                .iter()
                .find(|p| midi_out.port_name(p).unwrap_or_default().contains(filter.as_str()))
                .ok_or_else(|| MidiError::NotFound(filter.clone()))?,
            None => ports.first().ok_or(MidiError::NoPorts("output"))?,
        };
        let port_name = midi_out
            .port_name(port)
            .unwrap_or_else(|_| "unknown".to_string());

        let connection = midi_out
            .connect(port, "notemake-output")
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        tracing::info!(port = %port_name, channel = settings.channel, "MIDI output connected");

        Ok(Self {
            connection: Mutex::new(connection),
            channel: settings.channel,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl EventSink for MidiOutSink {
    fn send(&self, event: NoteEvent) {
        let bytes = encode(event, self.channel);
        if let Err(e) = self.connection.lock().send(&bytes) {
            tracing::warn!(error = %e, pitch = event.pitch, "MIDI send failed");
        }
    }
}

/// Forwards note-ons from a MIDI input port to the engine.
pub struct MidiBridge {
    _connection: MidiInputConnection<()>,
    port_name: String,
}

impl MidiBridge {
    pub fn connect(
        settings: &MidiSettings,
        command_tx: Sender<EngineCommand>,
    ) -> Result<Self, MidiError> {
        let midi_in = MidiInput::new("notemake")?;

        let ports = midi_in.ports();
        let port = match &settings.input_port {
            Some(filter) => ports
                .iter()
                .find(|p| midi_in.port_name(p).unwrap_or_default().contains(filter.as_str()))
                .ok_or_else(|| MidiError::NotFound(filter.clone()))?,
            None => ports.first().ok_or(MidiError::NoPorts("input"))?,
        }
        .clone();
        let port_name = midi_in
            .port_name(&port)
            .unwrap_or_else(|_| "unknown".to_string());

        let settings = settings.clone();
        let connection = midi_in
            .connect(
                &port,
                "notemake-input",
                move |_timestamp, message, _| {
                    for command in parse_control(message, &settings) {
                        let _ = command_tx.send(command);
                    }
                },
                (),
            )
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        tracing::info!(port = %port_name, "MIDI input connected");

        Ok(Self {
            _connection: connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// Input and output port names, in that order.
pub fn list_ports() -> Result<(Vec<String>, Vec<String>), MidiError> {
    let midi_in = MidiInput::new("notemake-list")?;
    let midi_out = MidiOutput::new("notemake-list")?;

    let inputs = midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect();
    let outputs = midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();

    Ok((inputs, outputs))
}
