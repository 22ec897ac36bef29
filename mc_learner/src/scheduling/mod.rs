//! Exploration-rate scheduling.
//!
//! ## Available Schedules
//!
//! - [`ExponentialDecay`]: single-phase exponential decay toward `end`
//! - [`TwoPhaseLinearDecay`]: linear to `end`, then linear toward a fixed floor
//!
//! ## Example
//!
//! ```rust,ignore
//! let schedule = TwoPhaseLinearDecay::new(1.0, 0.1, 5_000_000.0, 30_000_000.0);
//! epsilon_writer.publish(schedule.epsilon(step));
//! ```

pub mod exploration;

#[cfg(test)]
mod tests;

pub use exploration::{build_schedule, ExplorationSchedule, ExponentialDecay, TwoPhaseLinearDecay, EPSILON_FLOOR};
