//! On/off trigger events with delta timing

use serde::{Deserialize, Serialize};

use crate::note::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    NoteOn,
    NoteOff,
    /// Closing event padding the stream to the content length
    AllNotesOff,
}

/// A trigger event, timed relative to the previous event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Pulses since the previous event (since 0 for the first)
    pub delta: u64,
    pub kind: TriggerKind,
    /// MIDI pitch or drum row of the source note
    pub row: i32,
    /// 0 for note off
    pub velocity: u8,
    /// Display only, does not affect timing
    pub muted: bool,
}

impl TriggerEvent {
    fn closing(delta: u64) -> Self {
        Self {
            delta,
            kind: TriggerKind::AllNotesOff,
            row: 0,
            velocity: 0,
            muted: false,
        }
    }

    pub fn is_note_on(&self) -> bool {
        self.kind == TriggerKind::NoteOn
    }
}

/// Total length spanned by `events`
pub fn span(events: &[TriggerEvent]) -> u64 {
    events.iter().map(|e| e.delta).sum()
}

/// Convert concrete notes to paired on/off events.
///
/// Events are ordered by position, keeping note order for events at the
/// same position. Positions past `content_length` are clamped to it, and the
/// stream always ends with an [`TriggerKind::AllNotesOff`] event so its
/// deltas add up to exactly `content_length`.
pub fn to_trigger_events(notes: &[Note], content_length: u64) -> Vec<TriggerEvent> {
    let mut timed: Vec<(u64, TriggerEvent)> = Vec::with_capacity(notes.len() * 2);
    let mut clamped = 0usize;

    for note in notes {
        if note.end() > content_length {
            clamped += 1;
        }
        let on = TriggerEvent {
            delta: 0,
            kind: TriggerKind::NoteOn,
            row: note.row,
            velocity: note.velocity,
            muted: note.muted,
        };
        let off = TriggerEvent {
            kind: TriggerKind::NoteOff,
            velocity: 0,
            ..on
        };
        timed.push((note.start.min(content_length), on));
        timed.push((note.end().min(content_length), off));
    }

    if clamped > 0 {
        tracing::debug!("Clamped {} notes to content length {}", clamped, content_length);
    }

    // Stable, so same-position events keep note order
    timed.sort_by_key(|(pos, _)| *pos);

    let mut events = Vec::with_capacity(timed.len() + 1);
    let mut last = 0u64;
    for (pos, mut event) in timed {
        event.delta = pos - last;
        last = pos;
        events.push(event);
    }
    events.push(TriggerEvent::closing(content_length - last));

    events
}
