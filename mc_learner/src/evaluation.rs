//! Offline evaluation of a trained value model.
//!
//! Plays a fixed number of episodes at one difficulty with a small fixed
//! exploration rate, using the same masking and epsilon-greedy rules as the
//! actors. Nothing is sent to the training pipeline.

use burn::tensor::backend::Backend;
use tracing::info;

use crate::actors::policy::epsilon_greedy;
use crate::actors::EpisodeError;
use crate::curriculum::win_rate;
use crate::environment::{ActionSpace, ClosingEnv, EnvError, Environment};
use crate::error::{ConfigError, PipelineError};
use crate::model::{action_values, ValueModel};

#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    pub episodes: usize,
    pub epsilon: f64,
    /// Difficulty name handed to the environment factory.
    pub difficulty: String,
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            episodes: 100,
            epsilon: 0.05,
            difficulty: "default".to_string(),
            seed: 0,
        }
    }
}

impl EvaluationConfig {
    pub fn new(episodes: usize, difficulty: impl Into<String>) -> Self {
        Self {
            episodes,
            difficulty: difficulty.into(),
            ..Default::default()
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub episodes: usize,
    pub frames: u64,
    /// Mean undiscounted episode return.
    pub mean_return: f64,
    /// `(mean_return + 1) / 2`, clamped to `[0, 1]`.
    pub win_rate: f64,
    /// How often each action was taken.
    pub action_counts: Vec<u64>,
}

/// Play `config.episodes` episodes with `model`.
///
/// The model must score exactly as many actions as `action_space` holds;
/// a mismatch is rejected before any environment is built. The first
/// faulting episode aborts the evaluation.
pub fn evaluate<B, M, EF, E>(
    model: &M,
    action_space: ActionSpace,
    env_factory: EF,
    config: &EvaluationConfig,
) -> Result<EvaluationReport, PipelineError>
where
    B: Backend,
    M: ValueModel<B>,
    EF: Fn(&str) -> Result<E, EnvError>,
    E: Environment,
{
    let n_actions = action_space.n_actions();
    if model.n_actions() != n_actions {
        return Err(ConfigError::invalid(
            "action_space",
            format!("model scores {} actions but the action space has {}", model.n_actions(), n_actions),
        )
        .into());
    }

    let device = B::Device::default();
    let mut rng = fastrand::Rng::with_seed(config.seed);
    let mut action_counts = vec![0u64; n_actions];
    let mut frames = 0u64;
    let mut return_sum = 0.0;

    for episode in 0..config.episodes {
        let mut env = ClosingEnv(env_factory(&config.difficulty).map_err(EpisodeError::from)?);
        let mut observation = env
            .0
            .reset(config.seed.wrapping_add(episode as u64))
            .map_err(EpisodeError::from)?;
        let mut episode_return = 0.0f64;
        loop {
            let (features, mask) = action_space.split(&observation).map_err(EpisodeError::from)?;
            let action = epsilon_greedy(&mut rng, config.epsilon, n_actions, mask, || {
                action_values::<B, M>(model, features, &device).map_err(EpisodeError::Inference)
            })?
            .ok_or(EpisodeError::NoLegalAction)?;

            let step = env.0.step(action).map_err(EpisodeError::from)?;
            action_counts[action] += 1;
            frames += 1;
            episode_return += f64::from(step.reward);
            observation = step.observation;
            if step.done {
                break;
            }
        }
        return_sum += episode_return;
    }

    let mean_return = if config.episodes > 0 {
        return_sum / config.episodes as f64
    } else {
        0.0
    };
    let report = EvaluationReport {
        episodes: config.episodes,
        frames,
        mean_return,
        win_rate: win_rate(mean_return),
        action_counts,
    };
    info!(
        episodes = report.episodes,
        difficulty = %config.difficulty,
        mean_return = report.mean_return,
        win_rate = report.win_rate,
        "evaluation finished"
    );
    Ok(report)
}
