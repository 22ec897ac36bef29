//! Shared fixtures for unit tests: backends, a tiny Q-network and scripted
//! environments.

use burn::backend::{Autodiff, NdArray};
use burn::module::Module;
use burn::nn::{Linear, LinearConfig, Relu};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::environment::{EnvError, EnvStep, Environment};
use crate::model::ValueModel;

pub type InferenceBackend = NdArray<f32>;
pub type TrainBackend = Autodiff<NdArray<f32>>;

#[derive(Module, Debug)]
pub struct TinyQNet<B: Backend> {
    hidden: Linear<B>,
    head: Linear<B>,
    activation: Relu,
    obs_size: usize,
    n_actions: usize,
}

impl<B: Backend> TinyQNet<B> {
    pub fn new(obs_size: usize, n_actions: usize, device: &B::Device) -> Self {
        Self {
            hidden: LinearConfig::new(obs_size, 16).init(device),
            head: LinearConfig::new(16, n_actions).init(device),
            activation: Relu::new(),
            obs_size,
            n_actions,
        }
    }

    /// Every weight and bias, flattened in declaration order.
    pub fn parameters(&self) -> Vec<f32> {
        let mut values = Vec::new();
        for linear in [&self.hidden, &self.head] {
            values.extend(linear.weight.val().into_data().to_vec::<f32>().unwrap());
            if let Some(bias) = &linear.bias {
                values.extend(bias.val().into_data().to_vec::<f32>().unwrap());
            }
        }
        values
    }
}

impl<B: Backend> ValueModel<B> for TinyQNet<B> {
    fn forward(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.hidden.forward(observations));
        self.head.forward(x)
    }

    fn obs_size(&self) -> usize {
        self.obs_size
    }

    fn n_actions(&self) -> usize {
        self.n_actions
    }
}

/// Fixed-length episodes: observation `[t / len, level]`, reward 0 until the
/// last step, which pays `+1` when the last action was 1 and `-1` otherwise.
///
/// With `masked` set, two mask values follow the features and only action 1
/// is legal.
pub struct ScriptedEnv {
    pub len: usize,
    pub level: f32,
    pub masked: bool,
    t: usize,
    pub closed: Arc<AtomicUsize>,
}

impl ScriptedEnv {
    pub fn new(len: usize, level: f32) -> Self {
        Self {
            len,
            level,
            masked: false,
            t: 0,
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn with_close_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.closed = counter;
        self
    }

    fn observation(&self) -> Vec<f32> {
        let mut obs = vec![self.t as f32 / self.len as f32, self.level];
        if self.masked {
            obs.extend([0.0, 1.0]);
        }
        obs
    }
}

impl Environment for ScriptedEnv {
    fn reset(&mut self, _seed: u64) -> Result<Vec<f32>, EnvError> {
        self.t = 0;
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<EnvStep, EnvError> {
        self.t += 1;
        let done = self.t >= self.len;
        let reward = match (done, action) {
            (false, _) => 0.0,
            (true, 1) => 1.0,
            (true, _) => -1.0,
        };
        Ok(EnvStep::new(self.observation(), reward, done))
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// How a [`FaultyEnv`] misbehaves.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Error,
    Panic,
}

/// Fails every other episode, either with an error or a panic, on its
/// second step.
pub struct FaultyEnv {
    inner: ScriptedEnv,
    fault: Option<Fault>,
}

impl FaultyEnv {
    /// `episode` is the factory call count; odd episodes fault.
    pub fn new(episode: usize, fault: Fault) -> Self {
        Self {
            inner: ScriptedEnv::new(3, 0.0),
            fault: (episode % 2 == 1).then_some(fault),
        }
    }
}

impl Environment for FaultyEnv {
    fn reset(&mut self, seed: u64) -> Result<Vec<f32>, EnvError> {
        self.inner.reset(seed)
    }

    fn step(&mut self, action: usize) -> Result<EnvStep, EnvError> {
        if self.inner.t == 1 {
            match self.fault {
                Some(Fault::Error) => return Err(EnvError::new("scripted failure")),
                Some(Fault::Panic) => panic!("scripted panic"),
                None => {}
            }
        }
        self.inner.step(action)
    }
}
