//! # mc_learner: Monte Carlo Q-learning with parallel actors
//!
//! Actor threads play whole episodes against a snapshot of the value model,
//! label every step with its discounted return and stream the resulting
//! transitions to batch assemblers. Each assembler owns a ring replay buffer
//! and samples training batches for a single learner, which regresses the
//! chosen actions' values toward those returns.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Actor 0        Actor 1        Actor N        (one OS thread each)  │
//! │  env + model    env + model    env + model                          │
//! │     │  ▲           │  ▲           │  ▲                             │
//! │     │  └───────────┴──┴───────────┴──┴── epsilon, difficulty,       │
//! │     │              │              │         target snapshot         │
//! │     ▼              ▼              ▼                                  │
//! │  ┌───────────── transition channel ─────────────┐   outcome channel │
//! │  ▼                  ▼                  ▼        │         │         │
//! │ Assembler 0     Assembler 1      Assembler M    │         │         │
//! │ (ring buffer)   (ring buffer)    (ring buffer)  │         │         │
//! │  └──────────────────┼──────────────────┘        │         │         │
//! │                     ▼ batch channel                       ▼         │
//! │              ┌──────────────┐                 ┌────────────────┐   │
//! │              │   Learner    │────────────────▶│   Curriculum   │   │
//! │              │ (calling thd)│                 │   controller   │   │
//! │              └──────────────┘                 └────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every conduit is bounded and blocking; a shared [`ShutdownSignal`] lets
//! each stage drain and exit.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mc_learner::{ActionSpace, Pipeline, ShutdownSignal, TracingSink, TrainingConfig};
//!
//! let config = TrainingConfig::from_json_file("train.json")?
//!     .with_difficulties(["easy", "medium", "hard"]);
//! let pipeline = Pipeline::new(config, ActionSpace::MaskedDiscrete { n: 9 })?;
//! let outcome = pipeline.run::<MyBackend, _, _, _, _>(
//!     |device| QNet::new(device),
//!     |difficulty| MyEnv::new(difficulty),
//!     Box::new(TracingSink),
//!     ShutdownSignal::new(),
//! )?;
//! ```

pub mod actors;
pub mod buffers;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod curriculum;
pub mod environment;
pub mod error;
pub mod evaluation;
pub mod learner;
pub mod metrics;
pub mod model;
pub mod runners;
pub mod scheduling;
pub mod tuning;

#[cfg(test)]
mod test_utils;

pub use crate::core::channel::{bounded, ChannelError, ChannelReceiver, ChannelSender};
pub use crate::core::control::{
    difficulty_index, exploration_rate, DifficultyReader, DifficultyWriter, ExplorationReader, ExplorationWriter,
};
pub use crate::core::shutdown::ShutdownSignal;
pub use crate::core::target_slot::{target_slot, ModelSnapshot, TargetPublisher, TargetReader};
pub use crate::core::transition::{discounted_returns, Step, Trajectory, Transition};

pub use actors::{ActorConfig, ActorLinks, ActorPool, ActorPoolConfig, ActorStats, ActorWorker, EpisodeError};
pub use buffers::{AssemblerConfig, AssemblerStats, Batch, BatchAssembler, DrainPolicy, ReplayBuffer};
pub use checkpoint::{load_checkpoint, CheckpointError, Checkpointer, CheckpointerConfig};
pub use config::{
    ChannelConfig, CheckpointConfig, CurriculumConfig, ExplorationConfig, LossKind, OptimizerConfig,
    OptimizerKind, ScheduleKind, TrainingConfig,
};
pub use curriculum::{CurriculumController, CurriculumUpdate};
pub use environment::{ActionSpace, EnvError, EnvStep, Environment};
pub use error::{ConfigError, PipelineError};
pub use evaluation::{evaluate, EvaluationConfig, EvaluationReport};
pub use learner::{Learner, LearnerError, LearnerLinks};
pub use metrics::{CsvSink, MultiSink, PipelineMetrics, ReportSink, TracingSink, TrainingReport};
pub use model::{decode_weights, encode_weights, SnapshotError, ValueModel};
pub use runners::{Pipeline, TrainingOutcome};
pub use scheduling::{build_schedule, ExplorationSchedule, ExponentialDecay, TwoPhaseLinearDecay};
pub use tuning::{sample_config, Pattern, SearchSpace};
