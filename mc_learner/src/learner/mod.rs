//! Learner: the single sequential loop that trains the value model.
//!
//! - [`Learner`]: consumes batches, applies gradient steps, refreshes the
//!   target snapshot, publishes the exploration rate and drives the
//!   curriculum
//! - [`value_loss`]: MSE or smoothed-L1 regression loss
//! - [`ValueOptimizer`]: Adam, RMSProp or SGD with component-wise clipping

pub mod learner;
pub mod loss;
pub mod optimizer;


pub use learner::{Learner, LearnerError, LearnerLinks, StepOutcome};
pub use loss::value_loss;
pub use optimizer::ValueOptimizer;
