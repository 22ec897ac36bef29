//! Curriculum: ratchets the difficulty index up as the agent starts winning.

pub mod controller;

pub use controller::{win_rate, CurriculumController, CurriculumUpdate};
