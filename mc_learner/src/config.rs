//! Training configuration.
//!
//! `TrainingConfig` is plain data: serde derives for JSON files, `with_*`
//! builders for code, and [`TrainingConfig::validate`] as the single gate
//! both paths go through before a pipeline is built.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = TrainingConfig::default()
//!     .with_n_actors(8)
//!     .with_batch_size(256)
//!     .with_optimizer(OptimizerConfig::adam(1e-4))
//!     .with_difficulties(["easy", "medium", "hard"]);
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::buffers::batch_assembler::DrainPolicy;
use crate::error::ConfigError;

// ============================================================================
// Kind enums
// ============================================================================

/// Gradient-descent variant used by the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OptimizerKind {
    RmsProp,
    Adam,
    Sgd,
}

impl OptimizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizerKind::RmsProp => "rmsprop",
            OptimizerKind::Adam => "adam",
            OptimizerKind::Sgd => "sgd",
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rmsprop" => Ok(OptimizerKind::RmsProp),
            "adam" => Ok(OptimizerKind::Adam),
            "sgd" => Ok(OptimizerKind::Sgd),
            _ => Err(ConfigError::UnknownOptimizer(s.to_string())),
        }
    }
}

/// Shape of the exploration-rate decay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScheduleKind {
    Exponential,
    Linear,
}

impl ScheduleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleKind::Exponential => "exponential",
            ScheduleKind::Linear => "linear",
        }
    }
}

impl FromStr for ScheduleKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exponential" => Ok(ScheduleKind::Exponential),
            "linear" => Ok(ScheduleKind::Linear),
            _ => Err(ConfigError::UnknownSchedule(s.to_string())),
        }
    }
}

/// Regression loss between predicted action values and returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LossKind {
    Mse,
    SmoothL1,
}

impl LossKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossKind::Mse => "mse",
            LossKind::SmoothL1 => "smooth_l1",
        }
    }
}

impl FromStr for LossKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mse" => Ok(LossKind::Mse),
            "smooth_l1" => Ok(LossKind::SmoothL1),
            _ => Err(ConfigError::UnknownLoss(s.to_string())),
        }
    }
}

macro_rules! kind_string_conversions {
    ($($kind:ty),*) => {$(
        impl fmt::Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<String> for $kind {
            type Error = ConfigError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$kind> for String {
            fn from(kind: $kind) -> Self {
                kind.as_str().to_string()
            }
        }
    )*};
}

kind_string_conversions!(OptimizerKind, ScheduleKind, LossKind);

// ============================================================================
// Sections
// ============================================================================

/// Optimizer selection and its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub kind: OptimizerKind,
    pub learning_rate: f64,
    /// Momentum for RMSProp and SGD.
    pub momentum: f64,
    /// Numerical-stability epsilon for Adam.
    pub adam_epsilon: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            kind: OptimizerKind::Adam,
            learning_rate: 1e-4,
            momentum: 0.9,
            adam_epsilon: 1e-8,
        }
    }
}

impl OptimizerConfig {
    pub fn adam(learning_rate: f64) -> Self {
        Self {
            kind: OptimizerKind::Adam,
            learning_rate,
            ..Default::default()
        }
    }

    pub fn rmsprop(learning_rate: f64, momentum: f64) -> Self {
        Self {
            kind: OptimizerKind::RmsProp,
            learning_rate,
            momentum,
            ..Default::default()
        }
    }

    pub fn sgd(learning_rate: f64, momentum: f64) -> Self {
        Self {
            kind: OptimizerKind::Sgd,
            learning_rate,
            momentum,
            ..Default::default()
        }
    }
}

/// Exploration-rate schedule parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    pub kind: ScheduleKind,
    pub start: f64,
    pub end: f64,
    /// Decay constant (exponential) or first-phase length (linear).
    pub decay: f64,
    /// Step at which the linear schedule's second phase ends.
    pub decay2: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            kind: ScheduleKind::Linear,
            start: 1.0,
            end: 0.1,
            decay: 1_000_000.0,
            decay2: 10_000_000.0,
        }
    }
}

/// Difficulty ladder and advancement rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurriculumConfig {
    /// When false actors draw a uniformly random difficulty per episode.
    pub enabled: bool,
    /// Win rate a full window must reach to move up one level.
    pub win_rate_threshold: f64,
    /// Number of outcomes in the evaluation window.
    pub window_size: usize,
    /// Ordered difficulty names, easiest first.
    pub difficulties: Vec<String>,
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            win_rate_threshold: 0.65,
            window_size: 1000,
            difficulties: vec!["default".to_string()],
        }
    }
}

/// Periodic checkpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Checkpoints are disabled when unset.
    pub dir: Option<PathBuf>,
    pub interval: u64,
    /// Number of recent checkpoints to keep (0 = keep all).
    pub keep_last_n: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            dir: None,
            interval: 50_000,
            keep_last_n: 0,
        }
    }
}

/// Capacities of the three pipeline conduits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub transition_capacity: usize,
    pub outcome_capacity: usize,
    pub batch_capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            transition_capacity: 128,
            outcome_capacity: 200_000,
            batch_capacity: 8,
        }
    }
}

// ============================================================================
// TrainingConfig
// ============================================================================

/// Every knob of the actor-learner pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub optimizer: OptimizerConfig,
    pub batch_size: usize,
    pub discount: f64,
    pub exploration: ExplorationConfig,
    /// Total replay capacity, split evenly across assemblers.
    pub memory_size: usize,
    /// Transitions buffered (in total) before batches are produced.
    pub warmup_memory_size: usize,
    /// Transitions drained per assembler iteration; values below one drain
    /// one transition every `1 / ratio` iterations.
    pub frame_step_ratio: f64,
    /// Per-component gradient clamp.
    pub gradient_clipping: f64,
    /// Carried for compatibility; Monte Carlo targets never bootstrap.
    pub double_q: bool,
    pub target_update_interval: u64,
    pub loss: LossKind,
    pub curriculum: CurriculumConfig,
    pub checkpoint: CheckpointConfig,
    pub report_interval: u64,
    pub n_actors: usize,
    pub n_assemblers: usize,
    pub channels: ChannelConfig,
    /// Checkpoint to resume from.
    pub init_checkpoint: Option<PathBuf>,
    /// Stop after this many learner steps; run until shutdown when unset.
    pub max_train_steps: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            optimizer: OptimizerConfig::default(),
            batch_size: 128,
            discount: 0.99,
            exploration: ExplorationConfig::default(),
            memory_size: 1_000_000,
            warmup_memory_size: 100_000,
            frame_step_ratio: 1.0,
            gradient_clipping: 1.0,
            double_q: false,
            target_update_interval: 10_000,
            loss: LossKind::Mse,
            curriculum: CurriculumConfig::default(),
            checkpoint: CheckpointConfig::default(),
            report_interval: 1_000,
            n_actors: 4,
            n_assemblers: 4,
            channels: ChannelConfig::default(),
            init_checkpoint: None,
            max_train_steps: None,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // Builders ---------------------------------------------------------------

    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_exploration(mut self, exploration: ExplorationConfig) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_memory(mut self, memory_size: usize, warmup_memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self.warmup_memory_size = warmup_memory_size;
        self
    }

    pub fn with_frame_step_ratio(mut self, ratio: f64) -> Self {
        self.frame_step_ratio = ratio;
        self
    }

    pub fn with_gradient_clipping(mut self, clip: f64) -> Self {
        self.gradient_clipping = clip;
        self
    }

    pub fn with_target_update_interval(mut self, interval: u64) -> Self {
        self.target_update_interval = interval;
        self
    }

    pub fn with_loss(mut self, loss: LossKind) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_curriculum(mut self, curriculum: CurriculumConfig) -> Self {
        self.curriculum = curriculum;
        self
    }

    pub fn with_difficulties<I, S>(mut self, difficulties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.curriculum.difficulties = difficulties.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: CheckpointConfig) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    pub fn with_report_interval(mut self, interval: u64) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn with_n_actors(mut self, n: usize) -> Self {
        self.n_actors = n;
        self
    }

    pub fn with_n_assemblers(mut self, n: usize) -> Self {
        self.n_assemblers = n;
        self
    }

    pub fn with_channels(mut self, channels: ChannelConfig) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_init_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.init_checkpoint = Some(path.into());
        self
    }

    pub fn with_max_train_steps(mut self, steps: u64) -> Self {
        self.max_train_steps = Some(steps);
        self
    }

    // Derived quantities ------------------------------------------------------

    /// Replay capacity owned by each assembler.
    pub fn per_assembler_capacity(&self) -> usize {
        self.memory_size / self.n_assemblers.max(1)
    }

    /// Buffered transitions each assembler needs before it emits batches.
    pub fn per_assembler_warmup(&self) -> usize {
        let total = self.warmup_memory_size.max(self.batch_size);
        total.div_ceil(self.n_assemblers.max(1)).max(self.batch_size)
    }

    pub fn drain_policy(&self) -> DrainPolicy {
        DrainPolicy::from_ratio(self.frame_step_ratio)
    }

    // Validation ---------------------------------------------------------------

    /// Check every invariant the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let opt = &self.optimizer;
        if !(opt.learning_rate.is_finite() && opt.learning_rate > 0.0) {
            return Err(ConfigError::invalid("learning_rate", format!("must be finite and positive, got {}", opt.learning_rate)));
        }
        if !(opt.momentum.is_finite() && (0.0..1.0).contains(&opt.momentum)) {
            return Err(ConfigError::invalid("momentum", format!("must be in [0, 1), got {}", opt.momentum)));
        }
        if !(opt.adam_epsilon.is_finite() && opt.adam_epsilon > 0.0) {
            return Err(ConfigError::invalid("adam_epsilon", "must be finite and positive"));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::invalid("batch_size", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(ConfigError::invalid("discount", format!("must be in [0, 1], got {}", self.discount)));
        }

        let eps = &self.exploration;
        for (field, value) in [("exploration.start", eps.start), ("exploration.end", eps.end)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, format!("must be in [0, 1], got {value}")));
            }
        }
        if !(eps.decay.is_finite() && eps.decay > 0.0) {
            return Err(ConfigError::invalid("exploration.decay", "must be finite and positive"));
        }
        if eps.kind == ScheduleKind::Linear && !(eps.decay2.is_finite() && eps.decay2 >= eps.decay) {
            return Err(ConfigError::invalid(
                "exploration.decay2",
                format!("must be finite and at least decay ({}), got {}", eps.decay, eps.decay2),
            ));
        }

        if self.n_actors == 0 {
            return Err(ConfigError::invalid("n_actors", "must be positive"));
        }
        if self.n_assemblers == 0 {
            return Err(ConfigError::invalid("n_assemblers", "must be positive"));
        }
        if self.per_assembler_capacity() < self.batch_size {
            return Err(ConfigError::invalid(
                "memory_size",
                format!(
                    "each of the {} assemblers needs room for a batch of {}, memory {} is too small",
                    self.n_assemblers, self.batch_size, self.memory_size
                ),
            ));
        }
        if self.warmup_memory_size > self.memory_size || self.per_assembler_warmup() > self.per_assembler_capacity() {
            return Err(ConfigError::invalid("warmup_memory_size", "must not exceed memory_size"));
        }
        if !(self.frame_step_ratio.is_finite() && self.frame_step_ratio > 0.0) {
            return Err(ConfigError::invalid("frame_step_ratio", "must be finite and positive"));
        }
        if !(self.gradient_clipping.is_finite() && self.gradient_clipping > 0.0) {
            return Err(ConfigError::invalid("gradient_clipping", "must be finite and positive"));
        }
        if self.target_update_interval == 0 {
            return Err(ConfigError::invalid("target_update_interval", "must be positive"));
        }
        if self.report_interval == 0 {
            return Err(ConfigError::invalid("report_interval", "must be positive"));
        }

        let curriculum = &self.curriculum;
        if curriculum.difficulties.is_empty() {
            return Err(ConfigError::invalid("curriculum.difficulties", "at least one difficulty is required"));
        }
        if !(0.0..=1.0).contains(&curriculum.win_rate_threshold) {
            return Err(ConfigError::invalid("curriculum.win_rate_threshold", "must be in [0, 1]"));
        }
        if curriculum.window_size == 0 {
            return Err(ConfigError::invalid("curriculum.window_size", "must be positive"));
        }

        if self.checkpoint.dir.is_some() && self.checkpoint.interval == 0 {
            return Err(ConfigError::invalid("checkpoint.interval", "must be positive"));
        }

        let channels = &self.channels;
        if channels.transition_capacity == 0 || channels.outcome_capacity == 0 || channels.batch_capacity == 0 {
            return Err(ConfigError::invalid("channels", "capacities must be positive"));
        }

        Ok(())
    }

    // Overrides ----------------------------------------------------------------

    /// Set one hyperparameter from its textual value.
    ///
    /// Does not validate; call [`validate`](Self::validate) after the last
    /// override.
    pub fn apply_override(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        match name {
            "optimizer" => self.optimizer.kind = value.parse()?,
            "learning_rate" => self.optimizer.learning_rate = parse_value(name, value)?,
            "momentum" => self.optimizer.momentum = parse_value(name, value)?,
            "adam_epsilon" => self.optimizer.adam_epsilon = parse_value(name, value)?,
            "batch_size" => self.batch_size = parse_value(name, value)?,
            "discount" => self.discount = parse_value(name, value)?,
            "exploration" => self.exploration.kind = value.parse()?,
            "eps_start" => self.exploration.start = parse_value(name, value)?,
            "eps_end" => self.exploration.end = parse_value(name, value)?,
            "eps_decay" => self.exploration.decay = parse_value(name, value)?,
            "eps_decay2" => self.exploration.decay2 = parse_value(name, value)?,
            "memory_size" => self.memory_size = parse_value(name, value)?,
            "warmup_memory_size" => self.warmup_memory_size = parse_value(name, value)?,
            "frame_step_ratio" => self.frame_step_ratio = parse_value(name, value)?,
            "gradient_clipping" => self.gradient_clipping = parse_value(name, value)?,
            "double_q" => self.double_q = parse_value(name, value)?,
            "target_update_interval" => self.target_update_interval = parse_value(name, value)?,
            "loss" => self.loss = value.parse()?,
            "win_rate_threshold" => self.curriculum.win_rate_threshold = parse_value(name, value)?,
            "curriculum_window" => self.curriculum.window_size = parse_value(name, value)?,
            _ => return Err(ConfigError::UnknownParameter(name.to_string())),
        }
        Ok(())
    }
}

/// Override names whose values parse as unsigned integers.
pub const INTEGER_SETTINGS: &[&str] = &[
    "batch_size",
    "memory_size",
    "warmup_memory_size",
    "target_update_interval",
    "curriculum_window",
];

pub fn is_integer_setting(name: &str) -> bool {
    INTEGER_SETTINGS.contains(&name)
}

fn parse_value<T: FromStr>(field: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Unparsable {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> TrainingConfig {
        TrainingConfig::default()
            .with_batch_size(8)
            .with_memory(100, 20)
            .with_n_assemblers(2)
    }

    #[test]
    fn test_default_is_valid() {
        TrainingConfig::default().validate().unwrap();
        small().validate().unwrap();
    }

    #[test]
    fn test_kind_names_parse() {
        assert_eq!("rmsprop".parse::<OptimizerKind>().unwrap(), OptimizerKind::RmsProp);
        assert_eq!("Adam".parse::<OptimizerKind>().unwrap(), OptimizerKind::Adam);
        assert_eq!("sgd".parse::<OptimizerKind>().unwrap(), OptimizerKind::Sgd);
        assert_eq!("linear".parse::<ScheduleKind>().unwrap(), ScheduleKind::Linear);
        assert_eq!("exponential".parse::<ScheduleKind>().unwrap(), ScheduleKind::Exponential);
        assert_eq!("smooth_l1".parse::<LossKind>().unwrap(), LossKind::SmoothL1);
        assert_eq!(LossKind::SmoothL1.to_string(), "smooth_l1");
    }

    #[test]
    fn test_unknown_kinds_are_config_errors() {
        assert!(matches!("adagrad".parse::<OptimizerKind>(), Err(ConfigError::UnknownOptimizer(s)) if s == "adagrad"));
        assert!(matches!("cosine".parse::<ScheduleKind>(), Err(ConfigError::UnknownSchedule(_))));
        assert!(matches!("huber".parse::<LossKind>(), Err(ConfigError::UnknownLoss(_))));
    }

    #[test]
    fn test_json_partial_document_takes_defaults() {
        let config = TrainingConfig::from_json_str(
            r#"{
                "batch_size": 8,
                "memory_size": 100,
                "warmup_memory_size": 20,
                "n_assemblers": 2,
                "optimizer": { "kind": "rmsprop", "learning_rate": 0.001 },
                "exploration": { "kind": "exponential", "decay": 500.0 },
                "loss": "smooth_l1"
            }"#,
        )
        .unwrap();

        assert_eq!(config.optimizer.kind, OptimizerKind::RmsProp);
        assert_eq!(config.optimizer.momentum, OptimizerConfig::default().momentum);
        assert_eq!(config.exploration.kind, ScheduleKind::Exponential);
        assert_eq!(config.loss, LossKind::SmoothL1);
        assert_eq!(config.channels, ChannelConfig::default());
    }

    #[test]
    fn test_json_unknown_optimizer_is_rejected() {
        let err = TrainingConfig::from_json_str(r#"{ "optimizer": { "kind": "adagrad" } }"#).unwrap_err();
        assert!(err.to_string().contains("adagrad"));
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = small().with_difficulties(["a", "b"]);
        std::fs::write(&path, config.to_json_string().unwrap()).unwrap();

        assert_eq!(TrainingConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            small().with_batch_size(0),
            small().with_discount(1.5),
            small().with_n_actors(0),
            small().with_memory(10, 5),
            small().with_memory(100, 200),
            small().with_frame_step_ratio(0.0),
            small().with_gradient_clipping(-1.0),
            small().with_target_update_interval(0),
            small().with_difficulties(Vec::<String>::new()),
            small().with_optimizer(OptimizerConfig::adam(f64::NAN)),
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })), "{config:?}");
        }
    }

    #[test]
    fn test_linear_schedule_requires_ordered_phases() {
        let config = small().with_exploration(ExplorationConfig {
            kind: ScheduleKind::Linear,
            decay: 100.0,
            decay2: 50.0,
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_per_assembler_derivations() {
        let config = small();
        assert_eq!(config.per_assembler_capacity(), 50);
        assert_eq!(config.per_assembler_warmup(), 10);

        let config = small().with_memory(100, 4);
        assert_eq!(config.per_assembler_warmup(), 8);
    }

    #[test]
    fn test_apply_override() {
        let mut config = small();
        config.apply_override("learning_rate", "0.003").unwrap();
        config.apply_override("optimizer", "sgd").unwrap();
        config.apply_override("double_q", "true").unwrap();
        config.apply_override("loss", "smooth_l1").unwrap();

        assert_eq!(config.optimizer.learning_rate, 0.003);
        assert_eq!(config.optimizer.kind, OptimizerKind::Sgd);
        assert!(config.double_q);
        assert_eq!(config.loss, LossKind::SmoothL1);

        assert!(matches!(config.apply_override("warp_factor", "9"), Err(ConfigError::UnknownParameter(_))));
        assert!(matches!(config.apply_override("batch_size", "many"), Err(ConfigError::Unparsable { .. })));
    }
}
