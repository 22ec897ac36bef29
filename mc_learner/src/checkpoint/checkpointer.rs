//! Step-tagged model checkpoints on disk.

use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const PREFIX: &str = "checkpoint-";
const EXTENSION: &str = "bin";

/// Configuration for the checkpointer.
#[derive(Debug, Clone)]
pub struct CheckpointerConfig {
    pub checkpoint_dir: PathBuf,
    /// Learner steps between saves.
    pub save_interval: u64,
    /// Number of recent checkpoints to keep (0 = keep all).
    pub keep_last_n: usize,
}

impl CheckpointerConfig {
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            save_interval: 50_000,
            keep_last_n: 0,
        }
    }

    pub fn with_save_interval(mut self, interval: u64) -> Self {
        self.save_interval = interval;
        self
    }

    pub fn with_keep_last_n(mut self, n: usize) -> Self {
        self.keep_last_n = n;
        self
    }
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint io: {0}")]
    Io(#[from] io::Error),

    #[error("checkpoint recorder: {0}")]
    Recorder(String),

    #[error("no checkpoints found")]
    NoCheckpoints,

    #[error("cannot read a step count from checkpoint name {0:?}")]
    InvalidName(PathBuf),
}

/// A checkpoint file and the step it was taken at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointInfo {
    pub path: PathBuf,
    pub step: u64,
}

/// Writes checkpoints at a fixed step interval and prunes old ones.
pub struct Checkpointer {
    config: CheckpointerConfig,
    last_saved: Option<u64>,
}

impl Checkpointer {
    /// Creates the checkpoint directory if it doesn't exist.
    pub fn new(config: CheckpointerConfig) -> Result<Self, CheckpointError> {
        fs::create_dir_all(&config.checkpoint_dir)?;
        Ok(Self {
            config,
            last_saved: None,
        })
    }

    pub fn config(&self) -> &CheckpointerConfig {
        &self.config
    }

    pub fn should_save(&self, step: u64) -> bool {
        self.config.save_interval > 0 && step > 0 && step % self.config.save_interval == 0
    }

    /// Step of the most recent save made by this checkpointer.
    pub fn last_saved(&self) -> Option<u64> {
        self.last_saved
    }

    /// Path a checkpoint for `step` is written to.
    pub fn path_for(&self, step: u64) -> PathBuf {
        self.config
            .checkpoint_dir
            .join(format!("{PREFIX}{step:010}.{EXTENSION}"))
    }

    /// Save `model` tagged with `step`, then prune beyond `keep_last_n`.
    pub fn save<B: Backend, M: Module<B>>(&mut self, model: &M, step: u64) -> Result<PathBuf, CheckpointError> {
        let path = self.path_for(step);
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        model
            .clone()
            .save_file(path.clone(), &recorder)
            .map_err(|e| CheckpointError::Recorder(e.to_string()))?;
        self.last_saved = Some(step);
        info!(step, path = %path.display(), "checkpoint saved");

        self.cleanup_old_checkpoints()?;
        Ok(path)
    }

    pub fn list(&self) -> Result<Vec<CheckpointInfo>, CheckpointError> {
        list_checkpoints(&self.config.checkpoint_dir)
    }

    fn cleanup_old_checkpoints(&self) -> Result<(), CheckpointError> {
        if self.config.keep_last_n == 0 {
            return Ok(());
        }
        let checkpoints = self.list()?;
        let excess = checkpoints.len().saturating_sub(self.config.keep_last_n);
        for old in &checkpoints[..excess] {
            debug!(step = old.step, "removing old checkpoint");
            fs::remove_file(&old.path)?;
        }
        Ok(())
    }
}

/// Step count embedded in a checkpoint path: the text after the last `-`
/// of the file stem. A stem without a `-` is not a checkpoint name.
pub fn step_from_path(path: &Path) -> Result<u64, CheckpointError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit_once('-'))
        .map(|(_, suffix)| suffix)
        .and_then(|suffix| suffix.parse().ok())
        .ok_or_else(|| CheckpointError::InvalidName(path.to_path_buf()))
}

/// Load `path` into `template`, returning the model and its step.
pub fn load_checkpoint<B: Backend, M: Module<B>>(
    template: M,
    path: &Path,
    device: &B::Device,
) -> Result<(M, u64), CheckpointError> {
    let step = step_from_path(path)?;
    if !path.exists() {
        return Err(CheckpointError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    let model = template
        .load_file(path.to_path_buf(), &recorder, device)
        .map_err(|e| CheckpointError::Recorder(e.to_string()))?;
    Ok((model, step))
}

/// Checkpoints in `dir`, ordered by step.
pub fn list_checkpoints(dir: &Path) -> Result<Vec<CheckpointInfo>, CheckpointError> {
    let mut checkpoints: Vec<CheckpointInfo> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let path = e.path();
            let name = path.file_name()?.to_str()?;
            if !name.starts_with(PREFIX) || path.extension()? != EXTENSION {
                return None;
            }
            let step = step_from_path(&path).ok()?;
            Some(CheckpointInfo { path, step })
        })
        .collect();
    checkpoints.sort_by_key(|c| c.step);
    Ok(checkpoints)
}

pub fn find_latest_checkpoint(dir: &Path) -> Result<CheckpointInfo, CheckpointError> {
    list_checkpoints(dir)?
        .pop()
        .ok_or(CheckpointError::NoCheckpoints)
}
