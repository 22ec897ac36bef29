//! Exploration-rate schedules.
//!
//! The learner evaluates the schedule once per step and publishes the
//! result to every actor.
//!
//! # Data Integrity
//!
//! Constructors validate their inputs in debug builds. Outputs are clamped
//! to `[0, 1]` so a bad configuration that slipped past validation cannot
//! publish a non-probability.

use crate::config::{ExplorationConfig, ScheduleKind};

/// Lowest exploration rate the two-phase linear schedule reaches.
pub const EPSILON_FLOOR: f64 = 0.01;

/// Step-dependent exploration rate.
pub trait ExplorationSchedule: Send + Sync {
    fn epsilon(&self, step: u64) -> f64;
}

fn clamp_probability(eps: f64) -> f64 {
    if eps.is_finite() {
        eps.clamp(0.0, 1.0)
    } else {
        EPSILON_FLOOR
    }
}

/// `ε(t) = end + (start - end) · exp(-t / decay)`.
#[derive(Debug, Clone)]
pub struct ExponentialDecay {
    start: f64,
    end: f64,
    decay: f64,
}

impl ExponentialDecay {
    pub fn new(start: f64, end: f64, decay: f64) -> Self {
        debug_assert!(
            decay.is_finite() && decay > 0.0,
            "ExponentialDecay: decay must be finite and positive, got {}",
            decay
        );
        Self { start, end, decay }
    }
}

impl ExplorationSchedule for ExponentialDecay {
    fn epsilon(&self, step: u64) -> f64 {
        let eps = self.end + (self.start - self.end) * (-(step as f64) / self.decay).exp();
        clamp_probability(eps)
    }
}

/// Two-phase linear decay.
///
/// - `t < decay`: from `start` to `end` over `decay` steps
/// - `decay <= t < decay2`: from `end` toward [`EPSILON_FLOOR`] at a rate of
///   `(end - floor) / decay2` per step
/// - `t >= decay2`: [`EPSILON_FLOOR`]
#[derive(Debug, Clone)]
pub struct TwoPhaseLinearDecay {
    start: f64,
    end: f64,
    decay: f64,
    decay2: f64,
}

impl TwoPhaseLinearDecay {
    pub fn new(start: f64, end: f64, decay: f64, decay2: f64) -> Self {
        debug_assert!(
            decay.is_finite() && decay > 0.0,
            "TwoPhaseLinearDecay: decay must be finite and positive, got {}",
            decay
        );
        debug_assert!(
            decay2.is_finite() && decay2 >= decay,
            "TwoPhaseLinearDecay: decay2 must be finite and >= decay, got {}",
            decay2
        );
        Self {
            start,
            end,
            decay,
            decay2,
        }
    }
}

impl ExplorationSchedule for TwoPhaseLinearDecay {
    fn epsilon(&self, step: u64) -> f64 {
        let t = step as f64;
        let eps = if t < self.decay {
            self.start - (self.start - self.end) * t / self.decay
        } else if t < self.decay2 {
            self.end - (self.end - EPSILON_FLOOR) * (t - self.decay) / self.decay2
        } else {
            EPSILON_FLOOR
        };
        clamp_probability(eps)
    }
}

/// Build the schedule named by `config.kind`.
pub fn build_schedule(config: &ExplorationConfig) -> Box<dyn ExplorationSchedule> {
    match config.kind {
        ScheduleKind::Exponential => Box::new(ExponentialDecay::new(config.start, config.end, config.decay)),
        ScheduleKind::Linear => Box::new(TwoPhaseLinearDecay::new(
            config.start,
            config.end,
            config.decay,
            config.decay2,
        )),
    }
}
