//! Actor worker: plays whole episodes and feeds the pipeline.
//!
//! Each worker owns its environment, a local inference copy of the target
//! model and its own RNG. Per episode it:
//!
//! 1. Refreshes the local model if a newer target snapshot exists
//! 2. Picks a difficulty (curriculum index, or uniform when disabled)
//! 3. Builds and resets a fresh environment with a per-episode seed
//! 4. Steps epsilon-greedily until `done`, re-reading epsilon every step
//! 5. Labels every step with its discounted return and enqueues the
//!    transitions, then the episode outcome
//!
//! A failing or panicking episode is logged, counted and abandoned; the
//! worker moves on to the next one. Only shutdown (or a disconnected
//! channel) ends the worker.

use burn::module::AutodiffModule;
use burn::tensor::backend::{AutodiffBackend, Backend};
use std::io;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::policy::epsilon_greedy;
use crate::core::channel::{ChannelError, ChannelSender};
use crate::core::control::{DifficultyReader, ExplorationReader};
use crate::core::shutdown::{ShutdownSignal, POLL_INTERVAL};
use crate::core::target_slot::TargetReader;
use crate::core::transition::{Step, Trajectory, Transition};
use crate::environment::{ActionSpace, ClosingEnv, EnvError, Environment};
use crate::metrics::SharedPipelineMetrics;
use crate::model::{action_values, decode_weights, SnapshotError, ValueModel};

/// Why an episode was abandoned.
#[derive(Debug, Error)]
pub enum EpisodeError {
    /// The environment factory, `reset` or `step` failed, or an observation
    /// was too short to carry its action mask.
    #[error("environment fault: {0}")]
    Env(#[from] EnvError),
    /// The model could not score the current observation.
    #[error("model inference failed: {0}")]
    Inference(String),
    /// The target snapshot was missing or could not be decoded.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("action mask allows no actions")]
    NoLegalAction,
    /// A channel shut down or lost its consumer; ends the worker.
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Actor configuration.
#[derive(Debug, Clone)]
pub struct ActorConfig {
    /// Worker ID (for logging and seed differentiation)
    pub worker_id: usize,
    /// Discount applied when labelling returns
    pub discount: f64,
    /// Follow the curriculum index instead of sampling difficulties
    pub use_curriculum: bool,
    pub action_space: ActionSpace,
    /// Stop after this many episodes (unbounded when unset)
    pub max_episodes: Option<u64>,
}

impl ActorConfig {
    /// Defaults for worker `worker_id`: discount 0.99, curriculum on, no
    /// episode limit.
    pub fn for_worker(worker_id: usize, action_space: ActionSpace) -> Self {
        Self {
            worker_id,
            discount: 0.99,
            use_curriculum: true,
            action_space,
            max_episodes: None,
        }
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_curriculum(mut self, enabled: bool) -> Self {
        self.use_curriculum = enabled;
        self
    }

    pub fn with_max_episodes(mut self, episodes: u64) -> Self {
        self.max_episodes = Some(episodes);
        self
    }
}

/// Shared handles an actor reads from and writes to.
///
/// Cloned once per worker; every handle is cheap to clone.
#[derive(Clone)]
pub struct ActorLinks {
    /// Labelled transitions, consumed by the batch assemblers
    pub transitions: ChannelSender<Transition>,
    /// One outcome per finished episode, consumed by the curriculum
    pub outcomes: ChannelSender<f64>,
    /// Exploration rate published by the learner
    pub epsilon: ExplorationReader,
    /// Difficulty index advanced by the curriculum
    pub difficulty: DifficultyReader,
    /// Latest target snapshot
    pub target: TargetReader,
    pub metrics: SharedPipelineMetrics,
    pub shutdown: ShutdownSignal,
}

/// Per-worker totals returned when the worker exits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActorStats {
    pub worker_id: usize,
    /// Episodes whose transitions and outcome were all enqueued
    pub episodes: u64,
    /// Environment steps across those episodes
    pub frames: u64,
    /// Episodes abandoned after an error or panic
    pub faults: u64,
    /// Outcome of the most recent completed episode
    pub last_outcome: Option<f64>,
}

/// Summary of one completed episode.
#[derive(Debug, Clone)]
pub struct EpisodeSummary {
    /// Episode counter within this worker.
    pub episode: u64,
    /// Difficulty index the episode ran at.
    pub difficulty: usize,
    pub frames: usize,
    /// Full-episode discounted return, as sent on the outcome channel.
    pub outcome: f64,
    /// Undiscounted sum of rewards.
    pub total_reward: f64,
    /// Exploration rate used for the last action.
    pub epsilon: f64,
}

struct LocalModel<M> {
    version: u64,
    model: M,
}

/// Seed for one episode: worker id and wall-clock millis, so seeds differ
/// across workers and runs, plus the episode counter.
pub fn episode_seed(worker_id: usize, episode: u64) -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    (worker_id as u64)
        .wrapping_mul(11_111_111)
        .wrapping_add(millis)
        .wrapping_add(episode)
        & 0xFFFF_FFFF
}

/// Actor worker bound to one environment factory and one model factory.
pub struct ActorWorker<B, M, MF, EF>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    config: ActorConfig,
    links: ActorLinks,
    difficulties: Arc<[String]>,
    model_factory: MF,
    env_factory: EF,
    device: B::Device,
    inner_device: <B::InnerBackend as Backend>::Device,
    local: Option<LocalModel<M::InnerModule>>,
    rng: fastrand::Rng,
    stats: ActorStats,
    _backend: PhantomData<B>,
}

impl<B, M, MF, EF, E> ActorWorker<B, M, MF, EF>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ValueModel<B>,
    M::InnerModule: ValueModel<B::InnerBackend>,
    MF: Fn(&B::Device) -> M,
    EF: Fn(&str) -> Result<E, EnvError>,
    E: Environment,
{
    /// Build a worker. Nothing runs until [`run`](Self::run) or
    /// [`spawn`](Self::spawn); the local model is built from the first
    /// target snapshot.
    pub fn new(
        config: ActorConfig,
        links: ActorLinks,
        difficulties: Arc<[String]>,
        model_factory: MF,
        env_factory: EF,
    ) -> Self {
        let rng = fastrand::Rng::with_seed(episode_seed(config.worker_id, 0));
        let stats = ActorStats {
            worker_id: config.worker_id,
            ..Default::default()
        };
        Self {
            config,
            links,
            difficulties,
            model_factory,
            env_factory,
            device: B::Device::default(),
            inner_device: <B::InnerBackend as Backend>::Device::default(),
            local: None,
            rng,
            stats,
            _backend: PhantomData,
        }
    }

    /// Totals so far.
    pub fn stats(&self) -> &ActorStats {
        &self.stats
    }

    /// Play episodes until shutdown or `max_episodes`.
    pub fn run(mut self) -> ActorStats {
        let id = self.config.worker_id;
        if !self.wait_for_target() {
            return self.stats;
        }
        info!(worker = id, "actor started");

        let mut episode = 0u64;
        while !self.links.shutdown.is_requested() {
            if self.config.max_episodes.is_some_and(|max| episode >= max) {
                break;
            }

            match panic::catch_unwind(AssertUnwindSafe(|| self.run_episode(episode))) {
                Ok(Ok(summary)) => {
                    self.stats.episodes += 1;
                    self.stats.frames += summary.frames as u64;
                    self.stats.last_outcome = Some(summary.outcome);
                    self.links.metrics.record_episode(summary.frames);
                    debug!(
                        worker = id,
                        episode,
                        frames = summary.frames,
                        difficulty = %self.difficulties[summary.difficulty],
                        epsilon = summary.epsilon,
                        outcome = summary.outcome,
                        total_reward = summary.total_reward,
                        "episode finished"
                    );
                }
                Ok(Err(EpisodeError::Channel(reason))) => {
                    debug!(worker = id, %reason, "actor leaving episode loop");
                    break;
                }
                Ok(Err(err)) => {
                    self.stats.faults += 1;
                    self.links.metrics.record_fault();
                    warn!(worker = id, episode, error = %err, "episode abandoned");
                }
                Err(payload) => {
                    self.stats.faults += 1;
                    self.links.metrics.record_fault();
                    error!(worker = id, episode, panic = panic_message(&payload), "episode panicked");
                }
            }
            episode += 1;
        }

        info!(
            worker = id,
            episodes = self.stats.episodes,
            frames = self.stats.frames,
            faults = self.stats.faults,
            "actor stopped"
        );
        self.stats
    }

    /// Play one episode end to end.
    ///
    /// Transitions are enqueued in step order, then the outcome. An error
    /// before the first `put` leaves nothing behind in the channels.
    pub fn run_episode(&mut self, episode: u64) -> Result<EpisodeSummary, EpisodeError> {
        self.refresh_model()?;
        let level = self.select_difficulty();
        let difficulty = self.difficulties[level].clone();

        let mut env = ClosingEnv((self.env_factory)(&difficulty)?);
        let mut observation = env.0.reset(episode_seed(self.config.worker_id, episode))?;
        let mut trajectory = Trajectory::new();
        let mut epsilon;

        loop {
            if self.links.shutdown.is_requested() {
                return Err(ChannelError::Shutdown.into());
            }
            self.refresh_model()?;
            epsilon = self.links.epsilon.get();

            let (features, mask) = self.config.action_space.split(&observation)?;
            let action = self.choose_action(features, mask, epsilon)?;
            let step = env.0.step(action)?;

            trajectory.push(Step {
                observation: features.to_vec(),
                action: action as u32,
                reward: step.reward,
            });
            observation = step.observation;
            if step.done {
                break;
            }
        }
        drop(env);

        let frames = trajectory.len();
        let total_reward = trajectory.total_reward();
        let (transitions, outcome) = trajectory.into_transitions(self.config.discount);
        for transition in transitions {
            self.links.transitions.put(transition)?;
        }
        self.links.outcomes.put(outcome)?;

        Ok(EpisodeSummary {
            episode,
            difficulty: level,
            frames,
            outcome,
            total_reward,
            epsilon,
        })
    }

    fn choose_action(&mut self, features: &[f32], mask: Option<&[f32]>, epsilon: f64) -> Result<usize, EpisodeError> {
        let model = &self.local.as_ref().ok_or(SnapshotError::Missing)?.model;
        let device = &self.inner_device;
        let n_actions = self.config.action_space.n_actions();

        epsilon_greedy(&mut self.rng, epsilon, n_actions, mask, || {
            action_values::<B::InnerBackend, _>(model, features, device).map_err(EpisodeError::Inference)
        })?
        .ok_or(EpisodeError::NoLegalAction)
    }

    fn select_difficulty(&mut self) -> usize {
        let n_levels = self.difficulties.len();
        if self.config.use_curriculum {
            self.links.difficulty.get().min(n_levels - 1)
        } else {
            self.rng.usize(0..n_levels)
        }
    }

    /// Rebuild the local model when the learner published a newer target.
    fn refresh_model(&mut self) -> Result<(), EpisodeError> {
        let seen = self.local.as_ref().map_or(0, |local| local.version);
        let Some(snapshot) = self.links.target.newer_than(seen) else {
            return match self.local {
                Some(_) => Ok(()),
                None => Err(SnapshotError::Missing.into()),
            };
        };

        let template = (self.model_factory)(&self.device);
        let model = decode_weights::<B, M>(template, snapshot.bytes(), &self.device)?;
        self.local = Some(LocalModel {
            version: snapshot.version(),
            model: model.valid(),
        });
        debug!(
            worker = self.config.worker_id,
            version = snapshot.version(),
            step = snapshot.step(),
            "loaded target snapshot"
        );
        Ok(())
    }

    /// Block until the first target snapshot exists. False on shutdown.
    fn wait_for_target(&self) -> bool {
        while self.links.target.version() == 0 {
            if self.links.shutdown.is_requested() {
                return false;
            }
            thread::sleep(POLL_INTERVAL);
        }
        true
    }
}

impl<B, M, MF, EF, E> ActorWorker<B, M, MF, EF>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ValueModel<B> + Send + 'static,
    M::InnerModule: ValueModel<B::InnerBackend> + Send,
    MF: Fn(&B::Device) -> M + Send + 'static,
    EF: Fn(&str) -> Result<E, EnvError> + Send + 'static,
    E: Environment,
{
    /// Run the worker on a named thread.
    pub fn spawn(self) -> io::Result<JoinHandle<ActorStats>> {
        thread::Builder::new()
            .name(format!("actor-{}", self.config.worker_id))
            .spawn(move || self.run())
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
