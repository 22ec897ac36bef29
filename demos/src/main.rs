//! Coin race: train a Q-network to win a take-one-or-two coin game.
//!
//! Two players alternately remove one or two coins from a pile; whoever
//! takes the last coin wins. The opponent plays uniformly at random. The
//! pile grows with the difficulty, so the curriculum moves from short games
//! to long ones.
//!
//! ```text
//! cargo run --release -p mc_learner_demos -- [config.json]
//! ```
//!
//! Set `RUST_LOG=mc_learner=debug` for per-episode logs.

use std::env;
use std::error::Error;

use burn::backend::{Autodiff, NdArray};
use burn::module::{AutodiffModule, Module};
use burn::nn::{Linear, LinearConfig, Relu};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use mc_learner::{
    evaluate, ActionSpace, CurriculumConfig, EnvError, EnvStep, Environment, EvaluationConfig, ExplorationConfig,
    OptimizerConfig, Pipeline, ScheduleKind, ShutdownSignal, TracingSink, TrainingConfig, ValueModel,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

type TrainBackend = Autodiff<NdArray<f32>>;
type EvalBackend = NdArray<f32>;

const DIFFICULTIES: [&str; 3] = ["easy", "medium", "hard"];
const MAX_PILE: usize = 15;
const N_ACTIONS: usize = 2;

// ============================================================================
// Environment
// ============================================================================

fn pile_for(difficulty: &str) -> Result<usize, EnvError> {
    match difficulty {
        "easy" => Ok(4),
        "medium" => Ok(8),
        "hard" => Ok(MAX_PILE),
        other => Err(EnvError::new(format!("unknown difficulty `{other}`"))),
    }
}

/// Observation: `[coins / MAX_PILE, parity]` followed by a two-action mask.
struct CoinRace {
    start: usize,
    coins: usize,
    rng: SmallRng,
}

impl CoinRace {
    fn new(difficulty: &str) -> Result<Self, EnvError> {
        let start = pile_for(difficulty)?;
        Ok(Self {
            start,
            coins: start,
            rng: SmallRng::seed_from_u64(0),
        })
    }

    fn observation(&self) -> Vec<f32> {
        vec![
            self.coins as f32 / MAX_PILE as f32,
            (self.coins % 3) as f32 / 2.0,
            1.0,
            if self.coins >= 2 { 1.0 } else { 0.0 },
        ]
    }
}

impl Environment for CoinRace {
    fn reset(&mut self, seed: u64) -> Result<Vec<f32>, EnvError> {
        self.rng = SmallRng::seed_from_u64(seed);
        self.coins = self.start;
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<EnvStep, EnvError> {
        let take = action + 1;
        if take > self.coins {
            return Err(EnvError::new(format!("cannot take {take} of {} coins", self.coins)));
        }
        self.coins -= take;
        if self.coins == 0 {
            return Ok(EnvStep::new(self.observation(), 1.0, true));
        }

        let reply = if self.coins >= 2 { self.rng.gen_range(1..=2) } else { 1 };
        self.coins -= reply;
        if self.coins == 0 {
            return Ok(EnvStep::new(self.observation(), -1.0, true));
        }
        Ok(EnvStep::new(self.observation(), 0.0, false))
    }
}

// ============================================================================
// Model
// ============================================================================

#[derive(Module, Debug)]
struct QNet<B: Backend> {
    hidden: Linear<B>,
    output: Linear<B>,
    activation: Relu,
}

impl<B: Backend> QNet<B> {
    fn new(device: &B::Device) -> Self {
        Self {
            hidden: LinearConfig::new(2, 64).init(device),
            output: LinearConfig::new(64, N_ACTIONS).init(device),
            activation: Relu::new(),
        }
    }
}

impl<B: Backend> ValueModel<B> for QNet<B> {
    fn forward(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        self.output.forward(self.activation.forward(self.hidden.forward(observations)))
    }

    fn obs_size(&self) -> usize {
        2
    }

    fn n_actions(&self) -> usize {
        N_ACTIONS
    }
}

// ============================================================================
// Main
// ============================================================================

fn default_config() -> TrainingConfig {
    TrainingConfig::default()
        .with_optimizer(OptimizerConfig::adam(1e-3))
        .with_batch_size(64)
        .with_discount(1.0)
        .with_memory(20_000, 1_000)
        .with_exploration(ExplorationConfig {
            kind: ScheduleKind::Linear,
            start: 1.0,
            end: 0.1,
            decay: 1_000.0,
            decay2: 4_000.0,
        })
        .with_curriculum(CurriculumConfig {
            enabled: true,
            win_rate_threshold: 0.8,
            window_size: 200,
            difficulties: DIFFICULTIES.iter().map(|d| d.to_string()).collect(),
        })
        .with_target_update_interval(100)
        .with_report_interval(250)
        .with_n_actors(2)
        .with_n_assemblers(2)
        .with_max_train_steps(5_000)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match env::args().nth(1) {
        Some(path) => TrainingConfig::from_json_file(path)?,
        None => default_config(),
    };
    let action_space = ActionSpace::MaskedDiscrete { n: N_ACTIONS };
    let pipeline = Pipeline::new(config, action_space)?;

    let outcome = pipeline.run::<TrainBackend, _, _, _, _>(
        QNet::<TrainBackend>::new,
        CoinRace::new,
        Box::new(TracingSink),
        ShutdownSignal::new(),
    )?;
    info!(
        steps = outcome.steps(),
        difficulty = %outcome.final_difficulty,
        "training finished"
    );

    let model = outcome.model.valid();
    for difficulty in DIFFICULTIES {
        let report = evaluate::<EvalBackend, _, _, _>(
            &model,
            action_space,
            CoinRace::new,
            &EvaluationConfig::new(200, difficulty).with_epsilon(0.0).with_seed(42),
        )?;
        println!(
            "{difficulty:>6}: win rate {:.3} over {} episodes ({} moves)",
            report.win_rate, report.episodes, report.frames
        );
    }
    Ok(())
}
