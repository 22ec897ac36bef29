//! Environment abstraction for actors.
//!
//! Actors build a fresh environment for every episode from a factory that
//! takes the difficulty name, reset it with a per-episode seed and step it
//! until it reports `done`. Observations are flat `f32` vectors; masked
//! action spaces append the legality mask to the end of every observation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::error::ConfigError;

/// Failure reported by an environment.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct EnvError(pub String);

impl EnvError {
    pub fn new(message: impl Into<String>) -> Self {
        EnvError(message.into())
    }
}

/// Result of one environment step.
#[derive(Debug, Clone, Default)]
pub struct EnvStep {
    pub observation: Vec<f32>,
    pub reward: f32,
    pub done: bool,
    /// Free-form diagnostics, ignored by the pipeline.
    pub info: HashMap<String, f64>,
}

impl EnvStep {
    pub fn new(observation: Vec<f32>, reward: f32, done: bool) -> Self {
        Self {
            observation,
            reward,
            done,
            info: HashMap::new(),
        }
    }
}

/// Single-agent episodic environment.
pub trait Environment {
    /// Start a new episode and return the initial observation.
    fn reset(&mut self, seed: u64) -> Result<Vec<f32>, EnvError>;

    /// Apply `action` and return the resulting transition.
    fn step(&mut self, action: usize) -> Result<EnvStep, EnvError>;

    /// Release any resources. Called once per episode, also after faults.
    fn close(&mut self) {}
}

/// Closes the wrapped environment when dropped, including on unwind.
pub(crate) struct ClosingEnv<E: Environment>(pub E);

impl<E: Environment> Drop for ClosingEnv<E> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Discrete action space descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ActionSpace {
    /// `n` actions, all always legal.
    Discrete { n: usize },
    /// `n` actions; the last `n` observation values are the legality mask
    /// (non-zero = legal).
    MaskedDiscrete { n: usize },
}

impl ActionSpace {
    /// Build from a textual kind, rejecting anything but the two discrete
    /// variants.
    pub fn from_descriptor(kind: &str, n: usize) -> Result<Self, ConfigError> {
        let space = match kind.trim().to_ascii_lowercase().as_str() {
            "discrete" => ActionSpace::Discrete { n },
            "masked_discrete" | "masked" => ActionSpace::MaskedDiscrete { n },
            _ => return Err(ConfigError::UnsupportedActionSpace(kind.to_string())),
        };
        if n == 0 {
            return Err(ConfigError::invalid("action_space.n", "must be positive"));
        }
        Ok(space)
    }

    pub fn n_actions(&self) -> usize {
        match *self {
            ActionSpace::Discrete { n } | ActionSpace::MaskedDiscrete { n } => n,
        }
    }

    pub fn is_masked(&self) -> bool {
        matches!(self, ActionSpace::MaskedDiscrete { .. })
    }

    /// Split a raw observation into model features and the optional mask.
    pub fn split<'a>(&self, observation: &'a [f32]) -> Result<(&'a [f32], Option<&'a [f32]>), EnvError> {
        match *self {
            ActionSpace::Discrete { .. } => Ok((observation, None)),
            ActionSpace::MaskedDiscrete { n } => {
                if observation.len() < n {
                    return Err(EnvError::new(format!(
                        "observation has {} values, too short for an action mask of {n}",
                        observation.len()
                    )));
                }
                let (features, mask) = observation.split_at(observation.len() - n);
                Ok((features, Some(mask)))
            }
        }
    }

    /// Feature count the model sees for a raw observation of `raw_len`.
    pub fn feature_size(&self, raw_len: usize) -> usize {
        match *self {
            ActionSpace::Discrete { .. } => raw_len,
            ActionSpace::MaskedDiscrete { n } => raw_len.saturating_sub(n),
        }
    }
}
