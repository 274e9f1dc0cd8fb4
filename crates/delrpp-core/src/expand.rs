//! Expansion of conditional clips into concrete notes
//!
//! A clip instance on the arranger can be longer than the clip itself, in
//! which case the clip loops. Conditions depend on the loop iteration, so a
//! conditional clip is unrolled over the whole instance and every condition
//! is resolved once per pass.

use crate::note::Note;
use crate::random::RandomSource;

/// Result of [`expand`]
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// Concrete notes in start order
    pub notes: Vec<Note>,
    /// Loop length downstream consumers must use for these notes
    pub content_length: u64,
    /// Whether the clip was unrolled over the instance
    pub expanded: bool,
}

/// Whether any note's condition varies between iterations
pub fn needs_expansion(notes: &[Note]) -> bool {
    notes.iter().any(|note| !note.condition.is_static())
}

/// Resolve conditions over an instance of `instance_length` pulses.
///
/// Clips whose conditions are all static keep their notes and their own
/// `clip_length`, so they continue to loop natively. Anything else is
/// unrolled and the content length becomes `instance_length`.
pub fn expand(
    notes: &[Note],
    clip_length: u64,
    instance_length: u64,
    rng: &mut dyn RandomSource,
) -> Expansion {
    if !needs_expansion(notes) {
        let mut sorted = notes.to_vec();
        sorted.sort_by_key(|note| note.start);
        return Expansion {
            notes: sorted,
            content_length: clip_length,
            expanded: false,
        };
    }

    unroll(notes, clip_length, instance_length, rng)
}

/// Unroll `notes` over the instance regardless of their conditions
pub fn unroll(
    notes: &[Note],
    clip_length: u64,
    instance_length: u64,
    rng: &mut dyn RandomSource,
) -> Expansion {
    let mut sorted = notes.to_vec();
    sorted.sort_by_key(|note| note.start);

    if clip_length == 0 {
        tracing::warn!("Clip has zero length, leaving {} notes unexpanded", sorted.len());
        return Expansion {
            notes: sorted,
            content_length: clip_length,
            expanded: false,
        };
    }

    let notes = expand_iterations(&sorted, clip_length, instance_length, rng);
    tracing::debug!(
        "Expanded {} notes into {} over {} pulses (clip length {})",
        sorted.len(),
        notes.len(),
        instance_length,
        clip_length
    );

    Expansion {
        notes,
        content_length: instance_length,
        expanded: true,
    }
}

/// Walk `notes` cyclically from the instance start, evaluating each note
/// once per iteration, and emit the notes that play.
///
/// `notes` must be sorted by start and `clip_length` must be non-zero.
/// Unlike [`expand`] this always unrolls, even for static conditions.
pub fn expand_iterations(
    notes: &[Note],
    clip_length: u64,
    instance_length: u64,
    rng: &mut dyn RandomSource,
) -> Vec<Note> {
    let mut expanded = Vec::new();
    if notes.is_empty() || clip_length == 0 {
        return expanded;
    }

    for note in notes {
        note.condition.reset();
    }

    let mut pos = 0u64;
    let mut note_idx = 0usize;
    let mut iteration = 0u64;
    let mut last_start = 0u64;

    while pos < instance_length {
        let note = &notes[note_idx];
        note_idx = (note_idx + 1) % notes.len();
        pos += note.start.saturating_sub(last_start);

        if pos < instance_length && note.condition.evaluate(iteration, rng) {
            expanded.push(note.concrete_at(pos));
        }

        if note_idx == 0 {
            iteration += 1;
            last_start = 0;
            // Snap to the next loop boundary
            pos = clip_length * iteration;
        } else {
            last_start = note.start;
        }
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::linker::link_conditions;
    use crate::random::Scripted;

    fn periodic(numerator: u32, denominator: u32) -> Condition {
        Condition::Periodic { numerator, denominator }
    }

    fn starts(notes: &[Note]) -> Vec<u64> {
        notes.iter().map(|n| n.start).collect()
    }

    #[test]
    fn test_static_clip_is_not_expanded() {
        let notes = vec![Note::new(60, 48, 24, 100), Note::new(62, 0, 24, 90)];
        let mut rng = fastrand::Rng::with_seed(1);

        for instance_length in [0, 96, 1000] {
            let result = expand(&notes, 96, instance_length, &mut rng);
            assert!(!result.expanded);
            assert_eq!(result.content_length, 96);
            assert_eq!(result.notes, vec![notes[1].clone(), notes[0].clone()]);
        }
    }

    #[test]
    fn test_inverted_static_is_not_expanded() {
        let inverted = Condition::Invert(Box::new(Condition::Always));
        let notes = vec![Note::new(60, 0, 24, 100).with_condition(inverted)];
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(!expand(&notes, 96, 384, &mut rng).expanded);
    }

    #[test]
    fn test_wraps_at_clip_boundaries() {
        let notes = vec![Note::new(60, 0, 48, 100)];
        let mut rng = fastrand::Rng::with_seed(1);
        let expanded = expand_iterations(&notes, 96, 300, &mut rng);
        assert_eq!(starts(&expanded), vec![0, 96, 192, 288]);
        assert!(expanded.iter().all(|n| n.length == 48));
    }

    #[test]
    fn test_unroll_static_clip() {
        let notes = vec![Note::new(60, 0, 48, 100)];
        let mut rng = fastrand::Rng::with_seed(1);
        let result = unroll(&notes, 96, 300, &mut rng);
        assert!(result.expanded);
        assert_eq!(result.content_length, 300);
        assert_eq!(starts(&result.notes), vec![0, 96, 192, 288]);
    }

    #[test]
    fn test_periodic_expansion() {
        let notes = vec![Note::new(60, 0, 24, 100).with_condition(periodic(1, 2))];
        let mut rng = fastrand::Rng::with_seed(1);
        let result = expand(&notes, 96, 384, &mut rng);

        assert!(result.expanded);
        assert_eq!(result.content_length, 384);
        assert_eq!(starts(&result.notes), vec![0, 192]);
        assert!(result.notes.iter().all(|n| n.condition == Condition::Always));
    }

    #[test]
    fn test_positions_follow_note_offsets() {
        let notes = vec![
            Note::new(62, 48, 12, 80).with_muted(true),
            Note::new(60, 0, 24, 100).with_condition(periodic(1, 2)),
        ];
        let mut rng = fastrand::Rng::with_seed(1);
        let result = expand(&notes, 96, 192, &mut rng);

        assert_eq!(starts(&result.notes), vec![0, 48, 144]);
        let last = &result.notes[2];
        assert_eq!((last.row, last.length, last.velocity, last.muted), (62, 12, 80, true));
    }

    #[test]
    fn test_notes_past_instance_end_are_dropped() {
        let notes = vec![
            Note::new(60, 0, 24, 100).with_condition(periodic(1, 1)),
            Note::new(61, 80, 8, 100),
        ];
        let mut rng = fastrand::Rng::with_seed(1);
        let result = expand(&notes, 96, 100, &mut rng);
        assert_eq!(starts(&result.notes), vec![0, 80, 96]);
    }

    #[test]
    fn test_linked_notes_expand_repeatedly() {
        let chance = Condition::Probability { probability: 0.3, dotted: false };
        let mut notes = vec![
            Note::new(60, 0, 24, 100).with_condition(chance.clone()),
            Note::new(64, 0, 24, 100).with_condition(chance),
        ];
        assert_eq!(link_conditions(&mut notes).unanimous_stacks, 1);
        // Even iterations draw 0.1 and play, odd ones draw 0.9 and do not
        let mut rng = Scripted::units(&[0.1, 0.9]);

        // A second instance restarts at iteration 0
        for _ in 0..2 {
            let result = expand(&notes, 96, 96 * 32, &mut rng);
            assert_eq!(result.notes.len(), 32);
            for pair in result.notes.chunk_by(|a, b| a.start == b.start) {
                assert_eq!(pair.len(), 2, "stack members must play together");
                assert_eq!(pair[0].start % 192, 0);
            }
        }
    }

    #[test]
    fn test_empty_clip() {
        let mut rng = fastrand::Rng::with_seed(1);
        let result = expand(&[], 96, 384, &mut rng);
        assert!(result.notes.is_empty());
        assert!(!result.expanded);
        assert!(expand_iterations(&[], 96, 384, &mut rng).is_empty());
    }

    #[test]
    fn test_zero_length_conditional_clip_falls_back() {
        let notes = vec![Note::new(60, 0, 24, 100).with_condition(periodic(1, 2))];
        let mut rng = fastrand::Rng::with_seed(1);
        let result = expand(&notes, 0, 384, &mut rng);
        assert!(!result.expanded);
        assert_eq!(result.notes.len(), 1);
    }
}
