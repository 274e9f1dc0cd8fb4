//! Clip notes

use crate::condition::Condition;

/// Pulses per quarter note on the Deluge
pub const PPQN: u32 = 48;

/// A single note of a clip
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// MIDI pitch, or drum row index for kits
    pub row: i32,
    /// Start position in pulses, relative to the clip start
    pub start: u64,
    /// Length in pulses
    pub length: u64,
    /// Velocity (0-127)
    pub velocity: u8,
    pub condition: Condition,
    /// Inherited from the note's row
    pub muted: bool,
}

impl Note {
    pub fn new(row: i32, start: u64, length: u64, velocity: u8) -> Self {
        Self {
            row,
            start,
            length,
            velocity,
            condition: Condition::Always,
            muted: false,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    /// End position (start + length)
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    /// Copy of this note at `start` with the condition already resolved
    pub fn concrete_at(&self, start: u64) -> Self {
        Self {
            start,
            condition: Condition::Always,
            ..self.clone()
        }
    }
}
