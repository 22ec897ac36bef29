//! Random hyperparameter search.
//!
//! A [`SearchSpace`] maps hyperparameter names to sampling patterns. Each
//! draw renders values as text and feeds them through
//! [`TrainingConfig::apply_override`], so the search speaks the same
//! vocabulary as configuration overrides and an impossible draw surfaces as
//! a [`ConfigError`].

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{is_integer_setting, TrainingConfig};
use crate::error::ConfigError;

/// How one hyperparameter is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pattern {
    /// Uniform on `[low, high)`.
    Uniform { low: f64, high: f64 },
    /// `10^u` with `u` uniform on `[low_exp, high_exp)`.
    LogUniform { low_exp: f64, high_exp: f64 },
    /// One of the listed values.
    Choice { values: Vec<String> },
    /// `true` or `false` with equal probability.
    Flag,
}

impl Pattern {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.sample_as(rng, false)
    }

    /// Like [`sample`](Self::sample), but numeric draws are rounded to the
    /// nearest non-negative integer when `integer` is set.
    pub fn sample_as<R: Rng + ?Sized>(&self, rng: &mut R, integer: bool) -> String {
        let number = match self {
            Pattern::Uniform { low, high } => draw(rng, *low, *high),
            Pattern::LogUniform { low_exp, high_exp } => 10f64.powf(draw(rng, *low_exp, *high_exp)),
            Pattern::Choice { values } => return values.choose(rng).cloned().unwrap_or_default(),
            Pattern::Flag => return rng.gen_bool(0.5).to_string(),
        };
        if integer {
            (number.round().max(0.0) as u64).to_string()
        } else {
            number.to_string()
        }
    }
}

fn draw<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// Named sampling patterns, drawn in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    params: Vec<(String, Pattern)>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the pattern for `name`.
    pub fn with(mut self, name: impl Into<String>, pattern: Pattern) -> Self {
        let name = name.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = pattern,
            None => self.params.push((name, pattern)),
        }
        self
    }

    pub fn uniform(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.with(name, Pattern::Uniform { low, high })
    }

    pub fn log_uniform(self, name: impl Into<String>, low_exp: f64, high_exp: f64) -> Self {
        self.with(name, Pattern::LogUniform { low_exp, high_exp })
    }

    pub fn choice<I, S>(self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.with(name, Pattern::Choice { values })
    }

    pub fn flag(self, name: impl Into<String>) -> Self {
        self.with(name, Pattern::Flag)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// One `(name, value)` override per parameter. Numeric draws for
    /// integer settings are rounded.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(name, pattern)| (name.clone(), pattern.sample_as(rng, is_integer_setting(name))))
            .collect()
    }
}

/// Draw from `space`, apply the draw on top of `base` and validate.
pub fn sample_config<R: Rng + ?Sized>(
    base: &TrainingConfig,
    space: &SearchSpace,
    rng: &mut R,
) -> Result<(TrainingConfig, Vec<(String, String)>), ConfigError> {
    let overrides = space.sample(rng);
    let mut config = base.clone();
    for (name, value) in &overrides {
        config.apply_override(name, value)?;
    }
    config.validate()?;
    Ok((config, overrides))
}
