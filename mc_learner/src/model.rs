//! Action-value model contract and weight serialization.
//!
//! The learner trains a `ValueModel` on an autodiff backend; actors run the
//! inference half (`AutodiffModule::valid()`) of a copy rebuilt from the
//! latest target snapshot. Weights travel as bytes produced by burn's
//! binary recorder, which keeps the snapshot `Send + Sync` on every backend.

use burn::module::Module;
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use thiserror::Error;

/// Maps a batch of observation features to one value per action.
pub trait ValueModel<B: Backend> {
    /// `[batch, obs_size]` features to `[batch, n_actions]` action values.
    fn forward(&self, observations: Tensor<B, 2>) -> Tensor<B, 2>;

    /// Number of observation features the model consumes.
    fn obs_size(&self) -> usize;

    /// Number of discrete actions the model scores.
    fn n_actions(&self) -> usize;
}

/// Weight (de)serialization failure.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode model weights: {0}")]
    Encode(String),
    #[error("failed to decode model weights: {0}")]
    Decode(String),
    #[error("no target snapshot has been published")]
    Missing,
}

/// Serialize a module's weights into bytes.
pub fn encode_weights<B: Backend, M: Module<B>>(model: &M) -> Result<Vec<u8>, SnapshotError> {
    let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
    recorder
        .record(model.clone().into_record(), ())
        .map_err(|e| SnapshotError::Encode(e.to_string()))
}

/// Load bytes from [`encode_weights`] into `template`.
pub fn decode_weights<B: Backend, M: Module<B>>(
    template: M,
    bytes: &[u8],
    device: &B::Device,
) -> Result<M, SnapshotError> {
    let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
    let record = recorder
        .load(bytes.to_vec(), device)
        .map_err(|e| SnapshotError::Decode(e.to_string()))?;
    Ok(template.load_record(record))
}

/// Action values for a single observation.
pub fn action_values<B: Backend, M: ValueModel<B>>(
    model: &M,
    features: &[f32],
    device: &B::Device,
) -> Result<Vec<f32>, String> {
    let input = Tensor::<B, 1>::from_floats(features, device).reshape([1, features.len()]);
    model
        .forward(input)
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| format!("{e:?}"))
}
