//! delrpp-services: Deluge note data in, REAPER MIDI messages out

pub mod clip;
pub mod config;
mod error;
pub mod midi;
pub mod note_row;
pub mod render;
pub mod time;

pub use clip::{notes_from_rows, ClipNotes, InstrumentClip};
pub use config::RenderConfig;
pub use error::{Result, ServiceError, Warning};
pub use midi::{encode_events, MidiMessage};
pub use note_row::{parse_note_data, NoteRow, NoteRowNote};
pub use render::{ClipRenderer, RenderedClip};
pub use time::{pulses_to_seconds, seconds_to_pulses};
