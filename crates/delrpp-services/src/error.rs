//! Service error and warning types

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid note data: {found} hex digits is not a multiple of {record}")]
    InvalidNoteData { found: usize, record: usize },
    #[error("Invalid hex in {field}: {value:?}")]
    InvalidHex { field: &'static str, value: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Config serialization error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Recoverable problem found while rendering a clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Condition byte outside the known ranges, note rendered unconditionally
    UnrecognizedCondition { row: i32, start: u64, value: u8 },
    /// Row cannot be expressed as a MIDI note, clamped into 0-127
    RowOutOfRange { row: i32 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedCondition { row, start, value } => {
                write!(f, "unrecognized condition {value:#04x} on row {row} at pulse {start}")
            }
            Self::RowOutOfRange { row } => write!(f, "row {row} is outside the MIDI note range"),
        }
    }
}
