//! Replay storage and batch assembly.
//!
//! - `ReplayBuffer`: fixed-capacity ring owned by one assembler
//! - `Batch`: column-major training batch
//! - `BatchAssembler`: drains transitions, warms up, samples batches

pub mod batch;
pub mod batch_assembler;
pub mod replay_buffer;

pub use batch::{Batch, BatchError, BatchTensors};
pub use batch_assembler::{AssemblerConfig, AssemblerLinks, AssemblerStats, BatchAssembler, DrainPolicy};
pub use replay_buffer::{ReplayAllocError, ReplayBuffer};
