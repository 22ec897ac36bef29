//! The learner loop: the only component that mutates the trainable model.
//!
//! Each step, in order:
//!
//! 1. Refresh the target snapshot when the step is a multiple of the
//!    target-update interval
//! 2. Publish the scheduled exploration rate
//! 3. Run the curriculum update
//! 4. Take one batch (blocking)
//! 5. Regress the chosen actions' values toward the labeled returns and
//!    apply one clipped optimizer step
//! 6. Advance the step counter, then checkpoint and report on their
//!    intervals
//!
//! The loop ends at `max_train_steps` or when the batch channel reports
//! shutdown; a final checkpoint is written if the last step was not saved.

use burn::module::AutodiffModule;
use burn::optim::GradientsParams;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::loss::value_loss;
use super::optimizer::ValueOptimizer;
use crate::buffers::batch::Batch;
use crate::checkpoint::{CheckpointError, Checkpointer, CheckpointerConfig};
use crate::config::{LossKind, TrainingConfig};
use crate::core::channel::{ChannelError, ChannelReceiver};
use crate::core::control::ExplorationWriter;
use crate::core::target_slot::TargetPublisher;
use crate::curriculum::CurriculumController;
use crate::metrics::{ReportSink, SharedPipelineMetrics, TracingSink, TrainingReport};
use crate::model::{encode_weights, SnapshotError, ValueModel};
use crate::scheduling::{build_schedule, ExplorationSchedule};

/// Failures that stop the learner.
#[derive(Debug, Error)]
pub enum LearnerError {
    /// The batch channel shut down or lost every assembler. [`Learner::run`]
    /// treats `Shutdown` as a normal stop.
    #[error("batch channel: {0}")]
    Channel(#[from] ChannelError),
    /// Weights could not be serialized for the target slot.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// Shared state the learner publishes to and consumes from.
pub struct LearnerLinks {
    /// Training batches from the assemblers
    pub batches: ChannelReceiver<Batch>,
    /// Sole writer of the exploration rate
    pub exploration: ExplorationWriter,
    /// Sole publisher of target snapshots
    pub target: TargetPublisher,
    /// Driven once per step; owns the outcome channel and difficulty index
    pub curriculum: CurriculumController,
    /// Read for reports only
    pub metrics: SharedPipelineMetrics,
}

/// Result of a single learner step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Step count after this step.
    pub step: u64,
    /// Loss on the batch, measured before the update.
    pub loss: f64,
    /// Exploration rate published at the start of the step.
    pub epsilon: f64,
    /// Whether the target snapshot was refreshed before training.
    pub target_synced: bool,
}

/// Owns the trainable model and runs the training loop on the calling
/// thread.
pub struct Learner<B: AutodiffBackend, M: AutodiffModule<B> + ValueModel<B>> {
    model: M,
    device: B::Device,
    optimizer: ValueOptimizer<M>,
    loss_kind: LossKind,
    schedule: Box<dyn ExplorationSchedule>,
    links: LearnerLinks,
    checkpointer: Option<Checkpointer>,
    reporter: Box<dyn ReportSink>,
    target_update_interval: u64,
    report_interval: u64,
    max_train_steps: Option<u64>,
    step: u64,
    last_synced: Option<u64>,
    loss_sum: f64,
    loss_count: u64,
    started: Instant,
    last_report: (Instant, u64),
}

impl<B, M> Learner<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ValueModel<B> + 'static,
{
    /// Build a learner around `model`, resuming the step counter at
    /// `start_step`.
    ///
    /// Creates the checkpoint directory when checkpointing is configured.
    pub fn new(
        config: &TrainingConfig,
        model: M,
        device: B::Device,
        links: LearnerLinks,
        start_step: u64,
    ) -> Result<Self, LearnerError> {
        let checkpointer = match &config.checkpoint.dir {
            Some(dir) => Some(Checkpointer::new(
                CheckpointerConfig::new(dir)
                    .with_save_interval(config.checkpoint.interval)
                    .with_keep_last_n(config.checkpoint.keep_last_n),
            )?),
            None => None,
        };
        if config.double_q {
            warn!("double_q has no effect: Monte Carlo returns never bootstrap");
        }
        let now = Instant::now();
        Ok(Self {
            model,
            device,
            optimizer: ValueOptimizer::new::<B>(&config.optimizer, config.gradient_clipping),
            loss_kind: config.loss,
            schedule: build_schedule(&config.exploration),
            links,
            checkpointer,
            reporter: Box::new(TracingSink),
            target_update_interval: config.target_update_interval.max(1),
            report_interval: config.report_interval.max(1),
            max_train_steps: config.max_train_steps,
            step: start_step,
            last_synced: None,
            loss_sum: 0.0,
            loss_count: 0,
            started: now,
            last_report: (now, start_step),
        })
    }

    /// Replace the default [`TracingSink`].
    pub fn with_reporter(mut self, reporter: Box<dyn ReportSink>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Completed steps, counting those before a resume.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Consume the learner, keeping the trained model.
    pub fn into_model(self) -> M {
        self.model
    }

    pub fn curriculum(&self) -> &CurriculumController {
        &self.links.curriculum
    }

    /// Publish a snapshot of the current weights to the target slot.
    ///
    /// Returns the new slot version. A sync made at the current step is not
    /// repeated by [`train_step`](Self::train_step).
    pub fn sync_target(&mut self) -> Result<u64, LearnerError> {
        let bytes = encode_weights(&self.model)?;
        let version = self.links.target.publish(bytes, self.step);
        self.last_synced = Some(self.step);
        debug!(step = self.step, version, "target snapshot published");
        Ok(version)
    }

    /// One full learner iteration, blocking until a batch arrives.
    pub fn train_step(&mut self) -> Result<StepOutcome, LearnerError> {
        let mut target_synced = false;
        if self.step % self.target_update_interval == 0 && self.last_synced != Some(self.step) {
            self.sync_target()?;
            target_synced = true;
        }

        let epsilon = self.schedule.epsilon(self.step);
        self.links.exploration.publish(epsilon);

        self.links.curriculum.update();

        let batch = self.links.batches.get()?;
        let loss = self.optimize(&batch);
        self.step += 1;

        if let Some(checkpointer) = self.checkpointer.as_mut() {
            if checkpointer.should_save(self.step) {
                checkpointer.save(&self.model, self.step)?;
            }
        }
        if self.step % self.report_interval == 0 {
            self.report();
        }

        Ok(StepOutcome {
            step: self.step,
            loss,
            epsilon,
            target_synced,
        })
    }

    /// Gradient step on one batch; returns the loss before the update.
    fn optimize(&mut self, batch: &Batch) -> f64 {
        let tensors = batch.to_tensors::<B>(&self.device);
        let n = batch.len();

        let values = self.model.forward(tensors.observations);
        let chosen = values.gather(1, tensors.actions).reshape([n]);
        let loss = value_loss(chosen, tensors.returns, self.loss_kind);
        let loss_value = loss.clone().into_scalar().elem::<f64>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self.optimizer.step(self.model.clone(), grads);

        if loss_value.is_finite() {
            self.loss_sum += loss_value;
            self.loss_count += 1;
        } else {
            warn!(step = self.step, loss = loss_value, "non-finite loss");
        }
        loss_value
    }

    fn report(&mut self) {
        let now = Instant::now();
        let (since, since_step) = self.last_report;
        let interval_secs = now.duration_since(since).as_secs_f64();
        let steps = self.step.saturating_sub(since_step);
        let curriculum = &self.links.curriculum;

        let report = TrainingReport {
            step: self.step,
            elapsed_secs: now.duration_since(self.started).as_secs_f64(),
            steps_per_sec: if interval_secs > 0.0 { steps as f64 / interval_secs } else { 0.0 },
            epsilon: self.links.exploration.current(),
            mean_loss: if self.loss_count > 0 { self.loss_sum / self.loss_count as f64 } else { 0.0 },
            difficulty: if curriculum.is_enabled() {
                curriculum.current_difficulty().to_string()
            } else {
                "uniform".to_string()
            },
            win_rate: curriculum.last_win_rate(),
            episodes: self.links.metrics.episodes(),
            episode_faults: self.links.metrics.episode_faults(),
        };
        self.reporter.report(&report);

        self.loss_sum = 0.0;
        self.loss_count = 0;
        self.last_report = (now, self.step);
    }

    /// Train until `max_train_steps` or shutdown.
    ///
    /// Returns the number of steps taken by this call.
    pub fn run(&mut self) -> Result<u64, LearnerError> {
        let first_step = self.step;
        info!(
            step = self.step,
            optimizer = %self.optimizer.kind(),
            learning_rate = self.optimizer.learning_rate(),
            "learner started"
        );

        let stopped = loop {
            if self.max_train_steps.is_some_and(|max| self.step >= max) {
                break Ok(());
            }
            match self.train_step() {
                Ok(_) => {}
                Err(LearnerError::Channel(ChannelError::Shutdown)) => break Ok(()),
                Err(err) => break Err(err),
            }
        };

        // Persist progress even when the loop failed.
        let finished = self.finish();
        stopped?;
        finished?;

        info!(step = self.step, trained = self.step - first_step, "learner stopped");
        Ok(self.step - first_step)
    }

    /// Write the final checkpoint if needed and flush the reporter.
    pub fn finish(&mut self) -> Result<(), LearnerError> {
        self.reporter.flush();
        if let Some(checkpointer) = self.checkpointer.as_mut() {
            if self.step > 0 && checkpointer.last_saved() != Some(self.step) {
                checkpointer.save(&self.model, self.step)?;
            }
        }
        Ok(())
    }
}
