//! MIDI messages for REAPER's in-project MIDI sources
//!
//! REAPER stores MIDI items as lines of `E <offset> <status> <data1> <data2>`
//! with hex bytes and offsets in ticks since the previous line. `Em` marks an
//! event of a muted note.

use std::fmt;

use delrpp_core::{TriggerEvent, TriggerKind};
use serde::{Deserialize, Serialize};

use crate::error::Warning;

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const CONTROL_CHANGE: u8 = 0xB0;
/// CC 123
pub const ALL_NOTES_OFF: u8 = 0x7B;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiMessage {
    pub muted: bool,
    /// Ticks since the previous message
    pub offset: u64,
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

impl MidiMessage {
    pub fn is_note_on(&self) -> bool {
        self.status & 0xF0 == NOTE_ON
    }

    pub fn is_note_off(&self) -> bool {
        self.status & 0xF0 == NOTE_OFF
    }

    /// Render as a REAPER MIDI event line
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let command = if self.muted { "Em" } else { "E" };
        write!(f, "{} {} {:x} {:x} {:x}", command, self.offset, self.status, self.data1, self.data2)
    }
}

fn midi_note(row: i32, warnings: &mut Vec<Warning>) -> u8 {
    if (0..=127).contains(&row) {
        return row as u8;
    }
    let warning = Warning::RowOutOfRange { row };
    if !warnings.contains(&warning) {
        tracing::warn!("{}", warning);
        warnings.push(warning);
    }
    row.clamp(0, 127) as u8
}

/// Encode trigger events on `channel` (0-15)
pub fn encode_events(
    channel: u8,
    events: &[TriggerEvent],
    warnings: &mut Vec<Warning>,
) -> Vec<MidiMessage> {
    let channel = channel & 0x0F;

    events
        .iter()
        .map(|event| match event.kind {
            TriggerKind::NoteOn | TriggerKind::NoteOff => {
                let status = if event.kind == TriggerKind::NoteOn { NOTE_ON } else { NOTE_OFF };
                MidiMessage {
                    muted: event.muted,
                    offset: event.delta,
                    status: status | channel,
                    data1: midi_note(event.row, warnings),
                    data2: event.velocity & 0x7F,
                }
            }
            TriggerKind::AllNotesOff => MidiMessage {
                muted: false,
                offset: event.delta,
                status: CONTROL_CHANGE,
                data1: ALL_NOTES_OFF,
                data2: 0,
            },
        })
        .collect()
}
