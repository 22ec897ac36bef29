//! Regression losses between predicted action values and labeled returns.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::config::LossKind;

/// Scalar loss over `[batch]` predictions and targets.
pub fn value_loss<B: Backend>(predicted: Tensor<B, 1>, target: Tensor<B, 1>, kind: LossKind) -> Tensor<B, 1> {
    let diff = predicted - target;
    match kind {
        LossKind::Mse => diff.powf_scalar(2.0).mean(),
        LossKind::SmoothL1 => {
            // 0.5 d^2 inside |d| < 1, |d| - 0.5 outside
            let abs = diff.clone().abs();
            let quadratic = diff.powf_scalar(2.0).mul_scalar(0.5);
            let linear = abs.clone().sub_scalar(0.5);
            linear.mask_where(abs.lower_elem(1.0), quadratic).mean()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::InferenceBackend;
    use burn::tensor::ElementConversion;

    fn loss(predicted: &[f32], target: &[f32], kind: LossKind) -> f32 {
        let device = Default::default();
        let p = Tensor::<InferenceBackend, 1>::from_floats(predicted, &device);
        let t = Tensor::<InferenceBackend, 1>::from_floats(target, &device);
        value_loss(p, t, kind).into_scalar().elem::<f32>()
    }

    #[test]
    fn test_mse() {
        let l = loss(&[1.0, 2.0, 0.0], &[0.0, 0.0, 0.0], LossKind::Mse);
        assert!((l - 5.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_smooth_l1_regions() {
        // |d| = 0.5 -> 0.125, |d| = 3 -> 2.5
        let l = loss(&[0.5, -3.0], &[0.0, 0.0], LossKind::SmoothL1);
        assert!((l - (0.125 + 2.5) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_when_exact() {
        for kind in [LossKind::Mse, LossKind::SmoothL1] {
            assert_eq!(loss(&[0.3, -0.7], &[0.3, -0.7], kind), 0.0);
        }
    }
}
