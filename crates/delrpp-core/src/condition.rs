//! Note trigger conditions and the one-byte condition codec

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{DelrppError, Result};
use crate::random::RandomSource;

/// Condition byte for notes that always play
pub const ALWAYS_VALUE: u8 = 0x14;

const DOTTED_BIT: u8 = 0x80;
/// Probabilities are stored in steps of 5%
const PROBABILITY_STEPS: f64 = 20.0;
/// Largest periodic offset that still fits below the dotted bit
const MAX_PERIODIC_OFFSET: u32 = (0x7F - ALWAYS_VALUE) as u32;

/// Trigger condition attached to a note.
///
/// `Shared` and `OneOfStack` are handles to state shared between several
/// notes; cloning them clones the handle, not the state.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// No condition, the note always plays
    Always,
    /// "numerator of denominator": plays on one iteration out of every `denominator`
    Periodic { numerator: u32, denominator: u32 },
    /// Plays with `probability` (0.0-1.0) on every poll
    Probability { probability: f64, dotted: bool },
    /// Inner condition evaluated once per iteration for all holders
    Shared(SharedGroup),
    /// Exactly one note of a stack plays per iteration
    OneOfStack(OneOfStack),
    /// Negation of the inner condition
    Invert(Box<Condition>),
}

impl Condition {
    /// Whether the note plays on `iteration`.
    ///
    /// Notes holding `Shared` or `OneOfStack` handles must be polled in
    /// non-decreasing iteration order, in note order within an iteration.
    pub fn evaluate(&self, iteration: u64, rng: &mut dyn RandomSource) -> bool {
        match self {
            Self::Always => true,
            Self::Periodic { numerator, denominator } => {
                *denominator != 0
                    && iteration % u64::from(*denominator) + 1 == u64::from(*numerator)
            }
            Self::Probability { probability, .. } => rng.unit() < *probability,
            Self::Shared(group) => group.evaluate(iteration, rng),
            Self::OneOfStack(stack) => stack.evaluate(iteration, rng),
            Self::Invert(inner) => !inner.evaluate(iteration, rng),
        }
    }

    /// A static condition evaluates the same on every iteration
    pub fn is_static(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Periodic { .. }
            | Self::Probability { .. }
            | Self::Shared(_)
            | Self::OneOfStack(_) => false,
            Self::Invert(inner) => inner.is_static(),
        }
    }

    /// Clear per-iteration caches so evaluation can restart at iteration 0
    pub fn reset(&self) {
        match self {
            Self::Shared(group) => group.reset(),
            Self::OneOfStack(stack) => stack.reset(),
            Self::Invert(inner) => inner.reset(),
            Self::Always | Self::Periodic { .. } | Self::Probability { .. } => {}
        }
    }

    /// Probability of a plain `Probability` condition
    pub fn probability(&self) -> Option<f64> {
        match self {
            Self::Probability { probability, .. } => Some(*probability),
            _ => None,
        }
    }

    pub fn is_dotted(&self) -> bool {
        matches!(self, Self::Probability { dotted: true, .. })
    }

    /// Decode a raw condition byte, falling back to `Always` with a warning
    pub fn from_value(value: u8) -> Self {
        decode(value)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::Periodic { numerator, denominator } => write!(f, "{numerator}:{denominator}"),
            Self::Probability { probability, dotted } => {
                let dot = if *dotted { "." } else { "" };
                write!(f, "{dot}{:.0}%", probability * 100.0)
            }
            Self::Shared(group) => write!(f, "shared({})", group.inner()),
            Self::OneOfStack(stack) => write!(f, "one-of-{}", stack.stack_size()),
            Self::Invert(inner) => write!(f, "not({inner})"),
        }
    }
}

// ============================================================================
// Shared state
// ============================================================================

#[derive(Debug)]
struct SharedState {
    inner: Condition,
    last_iteration: Option<u64>,
    cached: bool,
}

/// Shared handle caching one inner result per iteration.
///
/// Used for stacks of equal-probability notes (all or nothing) and for
/// dotted notes following a base note. Two handles compare equal only when
/// they point at the same instance.
#[derive(Debug, Clone)]
pub struct SharedGroup(Rc<RefCell<SharedState>>);

impl SharedGroup {
    pub fn new(inner: Condition) -> Self {
        Self(Rc::new(RefCell::new(SharedState {
            inner,
            last_iteration: None,
            cached: false,
        })))
    }

    /// Copy of the wrapped condition
    pub fn inner(&self) -> Condition {
        self.0.borrow().inner.clone()
    }

    /// Number of live handles to this group
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn same_instance(&self, other: &SharedGroup) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn evaluate(&self, iteration: u64, rng: &mut dyn RandomSource) -> bool {
        let mut state = self.0.borrow_mut();
        if state.last_iteration != Some(iteration) {
            debug_assert!(
                state.last_iteration.is_none_or(|last| iteration > last),
                "shared condition polled out of order: iteration {iteration} after {:?}",
                state.last_iteration
            );
            let result = state.inner.evaluate(iteration, rng);
            state.cached = result;
            state.last_iteration = Some(iteration);
        }
        state.cached
    }

    fn reset(&self) {
        let mut state = self.0.borrow_mut();
        state.last_iteration = None;
        state.cached = false;
        state.inner.reset();
    }
}

impl PartialEq for SharedGroup {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

#[derive(Debug)]
struct StackState {
    stack_size: usize,
    chosen: usize,
    cursor: usize,
    last_iteration: Option<u64>,
}

/// Shared handle selecting exactly one note of a stack per iteration.
///
/// Stack members poll in note order; the member whose position matches the
/// index drawn at the start of the iteration plays.
#[derive(Debug, Clone)]
pub struct OneOfStack(Rc<RefCell<StackState>>);

impl OneOfStack {
    pub fn new(stack_size: usize) -> Self {
        Self(Rc::new(RefCell::new(StackState {
            stack_size: stack_size.max(1),
            chosen: 0,
            cursor: 0,
            last_iteration: None,
        })))
    }

    pub fn stack_size(&self) -> usize {
        self.0.borrow().stack_size
    }

    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn same_instance(&self, other: &OneOfStack) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn evaluate(&self, iteration: u64, rng: &mut dyn RandomSource) -> bool {
        let mut state = self.0.borrow_mut();
        if state.last_iteration != Some(iteration) {
            debug_assert!(
                state.last_iteration.is_none_or(|last| iteration > last),
                "stack condition polled out of order: iteration {iteration} after {:?}",
                state.last_iteration
            );
            state.chosen = rng.index(state.stack_size);
            state.cursor = 0;
            state.last_iteration = Some(iteration);
        }

        let triggered = state.cursor == state.chosen;
        // Wraps by stack size, not by iteration number. Wrapping by iteration
        // divides by zero on iteration 0 and lets several members of the
        // stack fire together on later iterations.
        state.cursor = (state.cursor + 1) % state.stack_size;
        triggered
    }

    fn reset(&self) {
        let mut state = self.0.borrow_mut();
        state.chosen = 0;
        state.cursor = 0;
        state.last_iteration = None;
    }
}

impl PartialEq for OneOfStack {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Decode a condition byte, reporting values outside the known ranges
pub fn decode_checked(value: u8) -> Result<Condition> {
    match value {
        ALWAYS_VALUE => Ok(Condition::Always),
        v if v & DOTTED_BIT != 0 || v < ALWAYS_VALUE => {
            let dotted = v & DOTTED_BIT != 0;
            let steps = f64::from(v & !DOTTED_BIT);
            Ok(Condition::Probability {
                probability: (steps / PROBABILITY_STEPS).min(1.0),
                dotted,
            })
        }
        v if v > ALWAYS_VALUE => {
            let (numerator, denominator) = periodic_from_offset(u32::from(v - ALWAYS_VALUE));
            Ok(Condition::Periodic { numerator, denominator })
        }
        v => Err(DelrppError::UnrecognizedCondition(v)),
    }
}

/// Decode a condition byte. Never fails: unknown values become `Always`.
pub fn decode(value: u8) -> Condition {
    decode_checked(value).unwrap_or_else(|e| {
        tracing::warn!("{e}, treating note as unconditional");
        Condition::Always
    })
}

/// Encode a condition back to its byte, where the byte format can express it
pub fn encode(condition: &Condition) -> Option<u8> {
    match condition {
        Condition::Always => Some(ALWAYS_VALUE),
        Condition::Probability { probability, dotted } => {
            let steps = (probability.clamp(0.0, 1.0) * PROBABILITY_STEPS).round() as u8;
            Some(if *dotted { steps | DOTTED_BIT } else { steps })
        }
        Condition::Periodic { numerator, denominator } => {
            if *numerator == 0 || numerator > denominator {
                return None;
            }
            // 1:1 would land on the `Always` byte
            let offset = periodic_offset(*numerator, *denominator);
            (offset != 0 && offset <= MAX_PERIODIC_OFFSET).then(|| ALWAYS_VALUE + offset as u8)
        }
        Condition::Shared(_) | Condition::OneOfStack(_) | Condition::Invert(_) => None,
    }
}

fn triangular(n: u64) -> u64 {
    n * (n + 1) / 2
}

/// Map an offset above `ALWAYS_VALUE` to `(numerator, denominator)`.
///
/// Offsets enumerate 1:1, 1:2, 2:2, 1:3, 2:3, 3:3, ... so the denominator is
/// the inverse of the triangular numbers. Offset 0 is the `Always` byte, so
/// condition bytes start at 1:2.
pub fn periodic_from_offset(offset: u32) -> (u32, u32) {
    let x = u64::from(offset);
    let mut denominator = (((1.0 + 8.0 * x as f64).sqrt() - 1.0) / 2.0).floor() as u64 + 1;
    // Float rounding can land one off for large offsets
    while triangular(denominator - 1) > x {
        denominator -= 1;
    }
    while triangular(denominator) <= x {
        denominator += 1;
    }
    let numerator = x - triangular(denominator - 1) + 1;
    (numerator as u32, denominator as u32)
}

/// Inverse of [`periodic_from_offset`]
pub fn periodic_offset(numerator: u32, denominator: u32) -> u32 {
    let base = triangular(u64::from(denominator.saturating_sub(1)));
    (base + u64::from(numerator.saturating_sub(1))) as u32
}
