//! Instrument clips and their note lists

use delrpp_core::{decode_checked, link_conditions, Condition, LinkReport, Note};
use serde::{Deserialize, Serialize};

use crate::error::Warning;
use crate::note_row::NoteRow;

/// Notes of one clip with their conditions decoded and linked
#[derive(Debug, Clone, Default)]
pub struct ClipNotes {
    /// Sorted by start, then row
    pub notes: Vec<Note>,
    pub links: LinkReport,
    pub warnings: Vec<Warning>,
}

/// Flatten note rows into linked notes.
///
/// Unrecognized condition bytes are reported as warnings and the note plays
/// unconditionally.
pub fn notes_from_rows(rows: &[NoteRow]) -> ClipNotes {
    let mut notes = Vec::with_capacity(rows.iter().map(|r| r.notes.len()).sum());
    let mut warnings = Vec::new();

    for row in rows {
        for raw in &row.notes {
            let condition = match decode_checked(raw.condition_value) {
                Ok(condition) => condition,
                Err(e) => {
                    tracing::warn!("Row {} at {}: {}", row.row, raw.start, e);
                    warnings.push(Warning::UnrecognizedCondition {
                        row: row.row,
                        start: raw.start,
                        value: raw.condition_value,
                    });
                    Condition::Always
                }
            };

            notes.push(Note {
                row: row.row,
                start: raw.start,
                length: raw.length,
                velocity: raw.velocity,
                condition,
                muted: row.muted,
            });
        }
    }

    let links = link_conditions(&mut notes);
    ClipNotes {
        notes,
        links,
        warnings,
    }
}

/// MIDI, synth or kit clip
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstrumentClip {
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Loop length in pulses
    pub length: u64,
    pub note_rows: Vec<NoteRow>,
}

impl InstrumentClip {
    pub fn new(channel: u8, length: u64) -> Self {
        Self {
            channel,
            length,
            note_rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: NoteRow) {
        self.note_rows.push(row);
    }

    /// Decode and link the clip's notes. Every call builds fresh condition state.
    pub fn notes(&self) -> ClipNotes {
        notes_from_rows(&self.note_rows)
    }

    pub fn note_count(&self) -> usize {
        self.note_rows.iter().map(|r| r.notes.len()).sum()
    }
}
