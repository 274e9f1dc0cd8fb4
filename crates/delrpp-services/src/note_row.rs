//! Deluge note row data
//!
//! Each note row stores its notes as one hex string, 20 digits per note:
//! start (8), length (8), velocity (2), condition (2). Start and length are
//! in pulses, so a start of 48 is one quarter note into the clip.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Hex digits per note record
pub const NOTE_RECORD_LEN: usize = 20;

/// A note as stored in a note row, before its condition is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRowNote {
    pub start: u64,
    pub length: u64,
    pub velocity: u8,
    pub condition_value: u8,
}

fn hex_field(record: &str, from: usize, to: usize, field: &'static str) -> Result<u32> {
    let digits = &record[from..to];
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ServiceError::InvalidHex {
            field,
            value: digits.to_string(),
        });
    }
    u32::from_str_radix(digits, 16).map_err(|_| ServiceError::InvalidHex {
        field,
        value: digits.to_string(),
    })
}

impl NoteRowNote {
    pub fn new(start: u64, length: u64, velocity: u8, condition_value: u8) -> Self {
        Self {
            start,
            length,
            velocity,
            condition_value,
        }
    }

    /// Parse one 20 digit record
    pub fn from_hex(record: &str) -> Result<Self> {
        if record.len() != NOTE_RECORD_LEN || !record.is_ascii() {
            return Err(ServiceError::InvalidNoteData {
                found: record.len(),
                record: NOTE_RECORD_LEN,
            });
        }

        Ok(Self {
            start: u64::from(hex_field(record, 0, 8, "start")?),
            length: u64::from(hex_field(record, 8, 16, "length")?),
            velocity: hex_field(record, 16, 18, "velocity")? as u8,
            condition_value: hex_field(record, 18, 20, "condition")? as u8,
        })
    }

    /// Format as a 20 digit record
    pub fn to_hex(&self) -> String {
        format!(
            "{:08X}{:08X}{:02X}{:02X}",
            self.start as u32, self.length as u32, self.velocity, self.condition_value
        )
    }
}

/// Parse a `noteData` attribute, with or without its `0x` prefix
pub fn parse_note_data(note_data: &str) -> Result<Vec<NoteRowNote>> {
    let data = note_data.strip_prefix("0x").unwrap_or(note_data);
    if data.len() % NOTE_RECORD_LEN != 0 || !data.is_ascii() {
        return Err(ServiceError::InvalidNoteData {
            found: data.len(),
            record: NOTE_RECORD_LEN,
        });
    }

    (0..data.len())
        .step_by(NOTE_RECORD_LEN)
        .map(|from| NoteRowNote::from_hex(&data[from..from + NOTE_RECORD_LEN]))
        .collect()
}

/// One row of a clip: a pitch, or a drum for kit clips
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRow {
    /// MIDI pitch, or drum index for kits
    pub row: i32,
    pub muted: bool,
    pub notes: Vec<NoteRowNote>,
}

impl NoteRow {
    pub fn new(row: i32, muted: bool) -> Self {
        Self {
            row,
            muted,
            notes: Vec::new(),
        }
    }

    pub fn from_note_data(row: i32, muted: bool, note_data: &str) -> Result<Self> {
        Ok(Self {
            row,
            muted,
            notes: parse_note_data(note_data)?,
        })
    }

    pub fn with_note(mut self, note: NoteRowNote) -> Self {
        self.notes.push(note);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let note = NoteRowNote::from_hex("00000030000000186414").unwrap();
        assert_eq!(note, NoteRowNote::new(48, 24, 100, 0x14));
    }

    #[test]
    fn test_to_hex() {
        let note = NoteRowNote::new(192, 12, 0x7F, 0x8E);
        assert_eq!(note.to_hex(), "000000C00000000C7F8E");
        assert_eq!(NoteRowNote::from_hex(&note.to_hex()).unwrap(), note);
    }

    #[test]
    fn test_parse_note_data_with_prefix() {
        let notes = parse_note_data("0x0000000000000018641400000060000000184016").unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1], NoteRowNote::new(96, 24, 0x40, 0x16));
    }

    #[test]
    fn test_parse_empty_note_data() {
        assert!(parse_note_data("").unwrap().is_empty());
        assert!(parse_note_data("0x").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_truncated_data() {
        let err = parse_note_data("0x000000000000001864").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidNoteData { found: 18, .. }));
    }

    #[test]
    fn test_rejects_bad_digits() {
        let err = NoteRowNote::from_hex("0000000G000000186414").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidHex { field: "start", .. }));
    }

    #[test]
    fn test_note_row_from_note_data() {
        let row = NoteRow::from_note_data(36, true, "0x00000000000000186414").unwrap();
        assert_eq!(row.row, 36);
        assert!(row.muted);
        assert_eq!(row.notes.len(), 1);
    }
}
