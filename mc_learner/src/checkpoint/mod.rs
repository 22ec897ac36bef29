//! Model checkpointing.
//!
//! Checkpoints are written as `checkpoint-<step>.bin` with burn's binary
//! file recorder, one file per save. The step a checkpoint was taken at is
//! recovered from the text after the last `-` of the file stem, which is
//! how training resumes from `init_checkpoint`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mc_learner::checkpoint::{Checkpointer, CheckpointerConfig};
//!
//! let config = CheckpointerConfig::new("./checkpoints")
//!     .with_save_interval(50_000)
//!     .with_keep_last_n(5);
//! let mut checkpointer = Checkpointer::new(config)?;
//!
//! if checkpointer.should_save(step) {
//!     checkpointer.save(&model, step)?;
//! }
//!
//! let (model, step) = load_checkpoint(template, &path, &device)?;
//! ```

pub mod checkpointer;

pub use checkpointer::{
    find_latest_checkpoint, list_checkpoints, load_checkpoint, step_from_path, CheckpointError,
    CheckpointInfo, Checkpointer, CheckpointerConfig,
};
