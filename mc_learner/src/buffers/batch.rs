//! Column-major training batches.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use thiserror::Error;

use crate::core::transition::Transition;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("cannot build a batch from zero transitions")]
    Empty,
    #[error("transition {index} has {actual} observation values, expected {expected}")]
    ObservationSize { index: usize, expected: usize, actual: usize },
}

/// Fixed-size group of transitions laid out as columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// `[len * obs_size]` observation features, row-major.
    pub observations: Vec<f32>,
    pub obs_size: usize,
    pub actions: Vec<u32>,
    pub returns: Vec<f32>,
}

/// A batch moved onto a device.
pub struct BatchTensors<B: Backend> {
    /// `[len, obs_size]`
    pub observations: Tensor<B, 2>,
    /// `[len, 1]`, ready for `gather` along dim 1.
    pub actions: Tensor<B, 2, Int>,
    /// `[len]`
    pub returns: Tensor<B, 1>,
}

impl Batch {
    pub fn from_transitions<'a, I>(transitions: I) -> Result<Self, BatchError>
    where
        I: IntoIterator<Item = &'a Transition>,
    {
        let mut iter = transitions.into_iter().peekable();
        let obs_size = iter.peek().ok_or(BatchError::Empty)?.obs_size();

        let (lower, _) = iter.size_hint();
        let mut batch = Batch {
            observations: Vec::with_capacity(lower * obs_size),
            obs_size,
            actions: Vec::with_capacity(lower),
            returns: Vec::with_capacity(lower),
        };
        for (index, t) in iter.enumerate() {
            if t.obs_size() != obs_size {
                return Err(BatchError::ObservationSize {
                    index,
                    expected: obs_size,
                    actual: t.obs_size(),
                });
            }
            batch.observations.extend_from_slice(&t.observation);
            batch.actions.push(t.action);
            batch.returns.push(t.target_return);
        }
        Ok(batch)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Features per row.
    pub fn obs_size(&self) -> usize {
        self.obs_size
    }

    /// Row `i` as a transition.
    pub fn transition(&self, i: usize) -> Option<Transition> {
        if i >= self.len() {
            return None;
        }
        let start = i * self.obs_size;
        Some(Transition::new(
            self.observations[start..start + self.obs_size].to_vec(),
            self.actions[i],
            self.returns[i],
        ))
    }

    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> BatchTensors<B> {
        let n = self.len();
        let actions: Vec<i32> = self.actions.iter().map(|&a| a as i32).collect();
        BatchTensors {
            observations: Tensor::<B, 1>::from_floats(self.observations.as_slice(), device)
                .reshape([n, self.obs_size]),
            actions: Tensor::<B, 1, Int>::from_ints(actions.as_slice(), device).reshape([n, 1]),
            returns: Tensor::<B, 1>::from_floats(self.returns.as_slice(), device),
        }
    }
}
