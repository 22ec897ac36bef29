//! Optimizer selection for the value model.
//!
//! burn's optimizers are distinct types, so the configured kind is erased
//! behind a boxed step function. Every kind clips each gradient component
//! to `[-clip, clip]` before the update.

use burn::grad_clipping::GradientClippingConfig;
use burn::module::AutodiffModule;
use burn::optim::momentum::MomentumConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer, RmsPropConfig, SgdConfig};
use burn::tensor::backend::AutodiffBackend;

use crate::config::{OptimizerConfig, OptimizerKind};

type StepFn<M> = Box<dyn FnMut(f64, M, GradientsParams) -> M>;

/// The configured optimizer with its learning rate.
pub struct ValueOptimizer<M> {
    kind: OptimizerKind,
    learning_rate: f64,
    step: StepFn<M>,
}

impl<M: 'static> ValueOptimizer<M> {
    pub fn new<B>(config: &OptimizerConfig, gradient_clipping: f64) -> Self
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
    {
        let clipping = Some(GradientClippingConfig::Value(gradient_clipping as f32));
        let step = match config.kind {
            OptimizerKind::Adam => boxed::<B, M, _>(
                AdamConfig::new()
                    .with_epsilon(config.adam_epsilon as f32)
                    .with_grad_clipping(clipping)
                    .init::<B, M>(),
            ),
            OptimizerKind::RmsProp => boxed::<B, M, _>(
                RmsPropConfig::new()
                    .with_momentum(config.momentum as f32)
                    .with_grad_clipping(clipping)
                    .init::<B, M>(),
            ),
            OptimizerKind::Sgd => {
                let momentum = (config.momentum > 0.0).then(|| {
                    MomentumConfig::new()
                        .with_momentum(config.momentum)
                        .with_dampening(0.0)
                });
                boxed::<B, M, _>(
                    SgdConfig::new()
                        .with_momentum(momentum)
                        .with_gradient_clipping(clipping)
                        .init::<B, M>(),
                )
            }
        };
        Self {
            kind: config.kind,
            learning_rate: config.learning_rate,
            step,
        }
    }

    pub fn kind(&self) -> OptimizerKind {
        self.kind
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Apply one update to `model`.
    pub fn step(&mut self, model: M, grads: GradientsParams) -> M {
        (self.step)(self.learning_rate, model, grads)
    }
}

fn boxed<B, M, O>(mut optimizer: O) -> StepFn<M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + 'static,
    O: Optimizer<M, B> + 'static,
{
    Box::new(move |lr, model, grads| optimizer.step(lr, model, grads))
}
