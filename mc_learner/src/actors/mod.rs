//! Actor system.
//!
//! - `ActorWorker`: plays episodes and feeds transitions and outcomes
//! - `ActorPool`: spawns and joins the worker threads
//! - `policy`: epsilon-greedy selection over masked discrete actions

pub mod actor;
pub mod actor_pool;
pub mod policy;

pub use actor::{episode_seed, ActorConfig, ActorLinks, ActorStats, ActorWorker, EpisodeError, EpisodeSummary};
pub use actor_pool::{aggregate_stats, ActorPool, ActorPoolConfig};
