//! Wires actors, assemblers and the learner into one training run.
//!
//! ```text
//!   actors ──transitions──▶ assemblers ──batches──▶ learner
//!     │                                               │
//!     └──────────────outcomes────────────▶ curriculum ◀┘
//!     ▲                                               │
//!     └──── epsilon / difficulty / target snapshot ───┘
//! ```
//!
//! Startup order: model (and resume), conduits and shared cells, every
//! replay buffer, initial target snapshot, actors, assemblers. The learner
//! then runs on the calling thread. Once it returns the shutdown signal is
//! raised and actors, then assemblers, are joined.

use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{info, warn};

use crate::actors::{ActorLinks, ActorPool, ActorPoolConfig, ActorStats};
use crate::buffers::{AssemblerConfig, AssemblerLinks, AssemblerStats, BatchAssembler};
use crate::checkpoint::load_checkpoint;
use crate::config::TrainingConfig;
use crate::core::channel::bounded;
use crate::core::control::{difficulty_index, exploration_rate};
use crate::core::shutdown::ShutdownSignal;
use crate::core::target_slot::target_slot;
use crate::curriculum::CurriculumController;
use crate::environment::{ActionSpace, EnvError, Environment};
use crate::error::{ConfigError, PipelineError};
use crate::learner::{Learner, LearnerLinks};
use crate::metrics::{pipeline_metrics, ReportSink};
use crate::model::ValueModel;
use crate::scheduling::build_schedule;

/// What a finished run hands back.
pub struct TrainingOutcome<M> {
    pub model: M,
    /// Step the run resumed from.
    pub start_step: u64,
    /// Step count when the learner stopped.
    pub final_step: u64,
    pub actor_stats: Vec<ActorStats>,
    pub assembler_stats: Vec<AssemblerStats>,
    pub final_level: usize,
    pub final_difficulty: String,
}

impl<M> TrainingOutcome<M> {
    /// Learner steps taken by this run.
    pub fn steps(&self) -> u64 {
        self.final_step - self.start_step
    }
}

/// A validated training setup.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: TrainingConfig,
    action_space: ActionSpace,
}

impl Pipeline {
    pub fn new(config: TrainingConfig, action_space: ActionSpace) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, action_space })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn action_space(&self) -> ActionSpace {
        self.action_space
    }

    /// Train until `max_train_steps` or until `shutdown` is requested.
    ///
    /// `model_factory` builds a freshly initialized model on a device; it is
    /// used for the learner's model and for every actor's local copy.
    /// `env_factory` builds an environment for a difficulty name and is
    /// called once per episode.
    pub fn run<B, M, MF, EF, E>(
        &self,
        model_factory: MF,
        env_factory: EF,
        reporter: Box<dyn ReportSink>,
        shutdown: ShutdownSignal,
    ) -> Result<TrainingOutcome<M>, PipelineError>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + ValueModel<B> + Send + 'static,
        M::InnerModule: ValueModel<B::InnerBackend> + Send,
        MF: Fn(&B::Device) -> M + Clone + Send + 'static,
        EF: Fn(&str) -> Result<E, EnvError> + Clone + Send + 'static,
        E: Environment,
    {
        let config = &self.config;
        let device = B::Device::default();

        let mut model = model_factory(&device);
        if model.n_actions() != self.action_space.n_actions() {
            return Err(ConfigError::invalid(
                "action_space",
                format!(
                    "model scores {} actions but the action space has {}",
                    model.n_actions(),
                    self.action_space.n_actions()
                ),
            )
            .into());
        }
        let obs_size = model.obs_size();
        let mut start_step = 0;
        if let Some(path) = &config.init_checkpoint {
            let (restored, step) = load_checkpoint::<B, M>(model, path, &device)?;
            info!(path = %path.display(), step, "resumed from checkpoint");
            model = restored;
            start_step = step;
        }

        let channels = &config.channels;
        let (transition_tx, transition_rx) = bounded(channels.transition_capacity, &shutdown);
        let (outcome_tx, outcome_rx) = bounded(channels.outcome_capacity, &shutdown);
        let (batch_tx, batch_rx) = bounded(channels.batch_capacity, &shutdown);

        let difficulties: Arc<[String]> = config.curriculum.difficulties.clone().into();
        let (epsilon_writer, epsilon_reader) =
            exploration_rate(build_schedule(&config.exploration).epsilon(start_step));
        let (difficulty_writer, difficulty_reader) = difficulty_index(difficulties.len());
        let (target_publisher, target_reader) = target_slot();
        let metrics = pipeline_metrics();

        // Every replay buffer is reserved before any thread starts.
        let assembler_links = AssemblerLinks {
            transitions: transition_rx,
            batches: batch_tx,
            metrics: Arc::clone(&metrics),
            shutdown: shutdown.clone(),
        };
        let seed_base: u64 = rand::random();
        let assemblers = (0..config.n_assemblers)
            .map(|id| {
                let assembler_config = AssemblerConfig::new(
                    id,
                    config.per_assembler_capacity(),
                    config.per_assembler_warmup(),
                    config.batch_size,
                )
                .with_drain(config.drain_policy())
                .with_obs_size(obs_size)
                .with_seed(seed_base.wrapping_add(id as u64));
                BatchAssembler::new(assembler_config, assembler_links.clone())
            })
            .collect::<Result<Vec<_>, _>>()?;
        drop(assembler_links);

        let curriculum = CurriculumController::new(&config.curriculum, outcome_rx, difficulty_writer);
        let mut learner = Learner::<B, M>::new(
            config,
            model,
            device,
            LearnerLinks {
                batches: batch_rx,
                exploration: epsilon_writer,
                target: target_publisher,
                curriculum,
                metrics: Arc::clone(&metrics),
            },
            start_step,
        )?
        .with_reporter(reporter);
        learner.sync_target()?;

        info!(
            actors = config.n_actors,
            assemblers = config.n_assemblers,
            per_assembler_capacity = config.per_assembler_capacity(),
            per_assembler_warmup = config.per_assembler_warmup(),
            batch_size = config.batch_size,
            start_step,
            "pipeline starting"
        );

        let actor_links = ActorLinks {
            transitions: transition_tx,
            outcomes: outcome_tx,
            epsilon: epsilon_reader,
            difficulty: difficulty_reader,
            target: target_reader,
            metrics,
            shutdown: shutdown.clone(),
        };
        let pool_config = ActorPoolConfig::new(config.n_actors, self.action_space)
            .with_discount(config.discount)
            .with_curriculum(config.curriculum.enabled);
        let mut pool = ActorPool::new(pool_config);
        if let Err(err) = pool.spawn_all::<B, M, MF, EF, E>(&actor_links, &difficulties, model_factory, env_factory) {
            shutdown.request();
            let _ = pool.join_all();
            return Err(err);
        }
        drop(actor_links);

        let mut assembler_handles: Vec<(usize, JoinHandle<AssemblerStats>)> = Vec::with_capacity(assemblers.len());
        for (id, assembler) in assemblers.into_iter().enumerate() {
            match assembler.spawn() {
                Ok(handle) => assembler_handles.push((id, handle)),
                Err(source) => {
                    shutdown.request();
                    let _ = pool.join_all();
                    let _ = join_assemblers(assembler_handles);
                    return Err(PipelineError::Spawn {
                        role: format!("assembler-{id}"),
                        source,
                    });
                }
            }
        }

        let trained = learner.run();

        shutdown.request();
        let actor_stats = pool.join_all();
        let assembler_stats = join_assemblers(assembler_handles);

        trained?;
        let actor_stats = actor_stats?;
        let assembler_stats = assembler_stats?;

        let final_step = learner.step();
        let final_level = learner.curriculum().level();
        let final_difficulty = learner.curriculum().current_difficulty().to_string();
        info!(
            steps = final_step - start_step,
            final_step,
            difficulty = %final_difficulty,
            "pipeline finished"
        );

        Ok(TrainingOutcome {
            model: learner.into_model(),
            start_step,
            final_step,
            actor_stats,
            assembler_stats,
            final_level,
            final_difficulty,
        })
    }
}

/// Join every assembler, reporting the first panic after all have exited.
fn join_assemblers(handles: Vec<(usize, JoinHandle<AssemblerStats>)>) -> Result<Vec<AssemblerStats>, PipelineError> {
    let mut stats = Vec::with_capacity(handles.len());
    let mut panicked = None;
    for (id, handle) in handles {
        match handle.join() {
            Ok(s) => stats.push(s),
            Err(_) => {
                warn!(assembler = id, "assembler panicked");
                panicked.get_or_insert(format!("assembler-{id}"));
            }
        }
    }
    match panicked {
        Some(role) => Err(PipelineError::Panicked(role)),
        None => Ok(stats),
    }
}
