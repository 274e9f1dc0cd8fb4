//! Linking of stacked and dotted probability notes
//!
//! The Deluge stores one condition byte per note, but some conditions only
//! make sense in context:
//!
//! * Notes stacked on the same start whose probabilities add up to 100% play
//!   exactly one note of the stack.
//! * Stacked notes sharing one probability play all together or not at all.
//! * A dotted note plays if the previous note with the same probability
//!   played, or if the previous note with the complementary probability
//!   (e.g. 30% after 70%) did not.
//!
//! [`link_conditions`] rewrites the affected notes' conditions to shared
//! handles so expansion sees these relationships.

use crate::condition::{Condition, OneOfStack, SharedGroup};
use crate::note::Note;

/// Tolerance for comparing probabilities; complements of 5% steps are not
/// exact in binary floating point.
const PROBABILITY_EPSILON: f64 = 1e-9;

/// What [`link_conditions`] changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Stacks summing to 100%, one note plays
    pub exclusive_stacks: usize,
    /// Stacks of equal probability, all or nothing
    pub unanimous_stacks: usize,
    /// Dotted notes following a base note
    pub dotted_links: usize,
    /// Dotted notes playing when the complementary base did not
    pub complementary_links: usize,
}

impl LinkReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn same_probability(a: f64, b: f64) -> bool {
    (a - b).abs() < PROBABILITY_EPSILON
}

/// Rewrite stacked and dotted notes' conditions to shared conditions.
///
/// Sorts `notes` by `(start, row)`; both passes depend on that order.
pub fn link_conditions(notes: &mut [Note]) -> LinkReport {
    notes.sort_by_key(|note| (note.start, note.row));

    let mut report = LinkReport::default();
    link_stacked(notes, &mut report);
    link_dotted(notes, &mut report);

    if !report.is_empty() {
        tracing::debug!("Linked conditions: {:?}", report);
    }
    report
}

fn link_stacked(notes: &mut [Note], report: &mut LinkReport) {
    let candidates: Vec<(u64, usize)> = notes
        .iter()
        .enumerate()
        .filter(|(_, note)| note.condition.probability().is_some())
        .map(|(idx, note)| (note.start, idx))
        .collect();

    for stack in candidates.chunk_by(|a, b| a.0 == b.0) {
        if stack.len() <= 1 {
            continue;
        }

        let probabilities: Vec<f64> = stack
            .iter()
            .filter_map(|&(_, idx)| notes[idx].condition.probability())
            .collect();
        let start = stack[0].0;

        let summed: f64 = probabilities.iter().sum();
        if same_probability(summed, 1.0) {
            tracing::debug!("Stack of {} notes at {} sums to 100%", stack.len(), start);
            let condition = Condition::OneOfStack(OneOfStack::new(stack.len()));
            for &(_, idx) in stack {
                notes[idx].condition = condition.clone();
            }
            report.exclusive_stacks += 1;
            continue;
        }

        let first = probabilities[0];
        if probabilities.iter().all(|&p| same_probability(p, first)) {
            tracing::debug!(
                "Stack of {} notes at {} shares probability {}",
                stack.len(),
                start,
                first
            );
            let group = SharedGroup::new(notes[stack[0].1].condition.clone());
            let condition = Condition::Shared(group);
            for &(_, idx) in stack {
                notes[idx].condition = condition.clone();
            }
            report.unanimous_stacks += 1;
        }
    }
}

/// Probability notes sharing `min(p, 1 - p)`, in `(start, probability)` order
struct Bucket {
    normalized: f64,
    members: Vec<(usize, f64)>,
}

fn link_dotted(notes: &mut [Note], report: &mut LinkReport) {
    let mut candidates: Vec<(usize, f64)> = notes
        .iter()
        .enumerate()
        .filter_map(|(idx, note)| note.condition.probability().map(|p| (idx, p)))
        .collect();
    candidates.sort_by(|a, b| {
        notes[a.0]
            .start
            .cmp(&notes[b.0].start)
            .then(a.1.total_cmp(&b.1))
    });

    let mut buckets: Vec<Bucket> = Vec::new();
    for (idx, p) in candidates {
        let normalized = p.min(1.0 - p);
        match buckets.iter_mut().find(|b| same_probability(b.normalized, normalized)) {
            Some(bucket) => bucket.members.push((idx, p)),
            None => buckets.push(Bucket {
                normalized,
                members: vec![(idx, p)],
            }),
        }
    }

    for bucket in &buckets {
        link_bucket(notes, bucket, report);
    }
}

fn link_bucket(notes: &mut [Note], bucket: &Bucket, report: &mut LinkReport) {
    let p = bucket.normalized;
    let q = 1.0 - p;
    // Latest non-dotted notes for p and its complement q: (index, probability)
    let mut base_p: Option<(usize, f64)> = None;
    let mut base_q: Option<(usize, f64)> = None;

    for &(idx, note_p) in &bucket.members {
        if !notes[idx].condition.is_dotted() {
            if same_probability(note_p, p) {
                base_p = Some((idx, note_p));
            }
            if same_probability(note_p, q) {
                base_q = Some((idx, note_p));
            }
            continue;
        }

        let (same_side, other_side) = if same_probability(note_p, p) {
            (base_p, base_q)
        } else {
            (base_q, base_p)
        };

        if let Some((base, _)) =
            same_side.filter(|&(_, base_prob)| same_probability(note_p, base_prob))
        {
            let group = share(notes, base);
            notes[idx].condition = Condition::Shared(group);
            report.dotted_links += 1;
            tracing::debug!(
                "Dotted note at {} follows note at {}",
                notes[idx].start,
                notes[base].start
            );
        } else if let Some((base, _)) =
            other_side.filter(|&(_, base_prob)| same_probability(1.0 - note_p, base_prob))
        {
            let group = share(notes, base);
            notes[idx].condition = Condition::Invert(Box::new(Condition::Shared(group)));
            report.complementary_links += 1;
            tracing::debug!(
                "Dotted note at {} plays when note at {} does not",
                notes[idx].start,
                notes[base].start
            );
        }
    }
}

/// Shared handle for a base note, wrapping its condition on first use
fn share(notes: &mut [Note], base: usize) -> SharedGroup {
    if let Condition::Shared(group) = &notes[base].condition {
        return group.clone();
    }
    let group = SharedGroup::new(notes[base].condition.clone());
    notes[base].condition = Condition::Shared(group.clone());
    group
}
