//! Pulse and wall-clock time conversion

use delrpp_core::PPQN;

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Duration of `pulses` at `tempo` quarter notes per minute
pub fn pulses_to_seconds(pulses: u64, tempo: f64) -> f64 {
    (pulses as f64 / f64::from(PPQN)) / tempo * SECONDS_PER_MINUTE
}

/// Inverse of [`pulses_to_seconds`], rounded to the nearest pulse
pub fn seconds_to_pulses(secs: f64, tempo: f64) -> u64 {
    (secs / SECONDS_PER_MINUTE * tempo * f64::from(PPQN)).round().max(0.0) as u64
}
