//! Crate-level error types.
//!
//! Module-local failures (`ChannelError`, `SnapshotError`, `CheckpointError`,
//! `EpisodeError`, `LearnerError`) live next to the code that raises them;
//! this module holds the configuration error and the pipeline error that
//! folds everything else together.

use std::io;
use thiserror::Error;

use crate::actors::EpisodeError;
use crate::buffers::replay_buffer::ReplayAllocError;
use crate::checkpoint::CheckpointError;
use crate::learner::LearnerError;
use crate::model::SnapshotError;

/// Invalid or unrecognized configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unrecognized optimizer kind `{0}` (expected rmsprop, adam or sgd)")]
    UnknownOptimizer(String),

    #[error("unrecognized exploration schedule `{0}` (expected exponential or linear)")]
    UnknownSchedule(String),

    #[error("unrecognized loss kind `{0}` (expected mse or smooth_l1)")]
    UnknownLoss(String),

    #[error("unsupported action space `{0}` (expected discrete or masked_discrete)")]
    UnsupportedActionSpace(String),

    #[error("unknown hyperparameter `{0}`")]
    UnknownParameter(String),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("cannot parse `{value}` for `{field}`")]
    Unparsable { field: String, value: String },

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read configuration: {0}")]
    Io(#[from] io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Failure that stops the whole training pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ReplayAllocation(#[from] ReplayAllocError),

    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        role: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Learner(#[from] LearnerError),

    #[error("evaluation episode failed: {0}")]
    Episode(#[from] EpisodeError),

    #[error("{0} thread panicked")]
    Panicked(String),
}
