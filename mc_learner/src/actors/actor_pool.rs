//! Pool of actor threads.
//!
//! The pool spawns one named thread per worker, all sharing the same
//! [`ActorLinks`], and joins them once the pipeline shuts down.

use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;
use std::sync::Arc;
use std::thread::JoinHandle;

use super::actor::{ActorConfig, ActorLinks, ActorStats, ActorWorker};
use crate::environment::{ActionSpace, EnvError, Environment};
use crate::error::PipelineError;
use crate::model::ValueModel;

/// Configuration for actor pool.
#[derive(Debug, Clone)]
pub struct ActorPoolConfig {
    /// Number of actors
    pub n_actors: usize,
    pub discount: f64,
    pub use_curriculum: bool,
    pub action_space: ActionSpace,
}

impl ActorPoolConfig {
    pub fn new(n_actors: usize, action_space: ActionSpace) -> Self {
        Self {
            n_actors,
            discount: 0.99,
            use_curriculum: true,
            action_space,
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

    /// Create ActorConfig for a specific worker ID.
    pub fn actor_config(&self, worker_id: usize) -> ActorConfig {
        ActorConfig::for_worker(worker_id, self.action_space)
            .with_discount(self.discount)
            .with_curriculum(self.use_curriculum)
    }
}

/// Running actor threads.
pub struct ActorPool {
    handles: Vec<(usize, JoinHandle<ActorStats>)>,
    config: ActorPoolConfig,
}

impl ActorPool {
    pub fn new(config: ActorPoolConfig) -> Self {
        Self {
            handles: Vec::with_capacity(config.n_actors),
            config,
        }
    }

    pub fn config(&self) -> &ActorPoolConfig {
        &self.config
    }

    /// Spawn every worker. Stops at the first thread that fails to start;
    /// workers already running stay in the pool so they can be joined.
    pub fn spawn_all<B, M, MF, EF, E>(
        &mut self,
        links: &ActorLinks,
        difficulties: &Arc<[String]>,
        model_factory: MF,
        env_factory: EF,
    ) -> Result<(), PipelineError>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + ValueModel<B> + Send + 'static,
        M::InnerModule: ValueModel<B::InnerBackend> + Send,
        MF: Fn(&B::Device) -> M + Clone + Send + 'static,
        EF: Fn(&str) -> Result<E, EnvError> + Clone + Send + 'static,
        E: Environment,
    {
        for worker_id in self.handles.len()..self.config.n_actors {
            let worker = ActorWorker::<B, M, MF, EF>::new(
                self.config.actor_config(worker_id),
                links.clone(),
                Arc::clone(difficulties),
                model_factory.clone(),
                env_factory.clone(),
            );
            let handle = worker.spawn().map_err(|source| PipelineError::Spawn {
                role: format!("actor-{worker_id}"),
                source,
            })?;
            self.handles.push((worker_id, handle));
        }
        Ok(())
    }

    /// Number of spawned actors.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of actor threads that already exited.
    pub fn finished_count(&self) -> usize {
        self.handles.iter().filter(|(_, h)| h.is_finished()).count()
    }

    /// Wait for every actor. All threads are joined even if some panicked;
    /// the first panic is reported afterwards.
    pub fn join_all(self) -> Result<Vec<ActorStats>, PipelineError> {
        let mut stats = Vec::with_capacity(self.handles.len());
        let mut panicked = None;
        for (worker_id, handle) in self.handles {
            match handle.join() {
                Ok(s) => stats.push(s),
                Err(_) => {
                    panicked.get_or_insert(format!("actor-{worker_id}"));
                }
            }
        }
        match panicked {
            Some(role) => Err(PipelineError::Panicked(role)),
            None => Ok(stats),
        }
    }
}

/// Sum per-worker totals.
pub fn aggregate_stats(stats: &[ActorStats]) -> ActorStats {
    stats.iter().fold(ActorStats::default(), |mut acc, s| {
        acc.episodes += s.episodes;
        acc.frames += s.frames;
        acc.faults += s.faults;
        acc.last_outcome = s.last_outcome.or(acc.last_outcome);
        acc
    })
}
