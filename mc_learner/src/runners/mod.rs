//! End-to-end training runs.
//!
//! [`Pipeline`] validates a [`TrainingConfig`](crate::config::TrainingConfig),
//! starts the actor pool and the batch assemblers, runs the learner on the
//! calling thread and tears everything down in order once it returns.

pub mod pipeline;

pub use pipeline::{Pipeline, TrainingOutcome};
