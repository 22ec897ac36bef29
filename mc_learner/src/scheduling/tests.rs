//! Behavioral tests for the exploration schedules.

use super::*;
use crate::config::{ExplorationConfig, ScheduleKind};

// ============================================================================
// TWO-PHASE LINEAR
// ============================================================================

mod linear_tests {
    use super::*;

    fn schedule() -> TwoPhaseLinearDecay {
        TwoPhaseLinearDecay::new(1.0, 0.1, 100.0, 200.0)
    }

    #[test]
    fn should_hit_phase_boundaries_exactly() {
        let s = schedule();
        assert_eq!(s.epsilon(0), 1.0);
        assert!((s.epsilon(100) - 0.1).abs() < 1e-12);
        assert_eq!(s.epsilon(200), EPSILON_FLOOR);
    }

    #[test]
    fn should_clamp_to_floor_after_second_phase() {
        let s = schedule();
        for step in [200, 201, 1_000, 1_000_000, u64::MAX] {
            assert_eq!(s.epsilon(step), EPSILON_FLOOR);
        }
    }

    #[test]
    fn should_strictly_decrease_in_first_phase() {
        let s = schedule();
        for step in 0..100 {
            assert!(s.epsilon(step + 1) < s.epsilon(step), "not decreasing at {step}");
        }
    }

    #[test]
    fn should_strictly_decrease_in_second_phase() {
        let s = schedule();
        for step in 100..200 {
            assert!(s.epsilon(step + 1) < s.epsilon(step), "not decreasing at {step}");
        }
    }

    #[test]
    fn should_interpolate_second_phase_over_decay2() {
        let s = schedule();
        let expected = 0.1 - (0.1 - EPSILON_FLOOR) * 50.0 / 200.0;
        assert!((s.epsilon(150) - expected).abs() < 1e-12);
    }
}

// ============================================================================
// EXPONENTIAL
// ============================================================================

mod exponential_tests {
    use super::*;

    #[test]
    fn should_start_at_start() {
        let s = ExponentialDecay::new(1.0, 0.05, 1000.0);
        assert_eq!(s.epsilon(0), 1.0);
    }

    #[test]
    fn should_follow_formula() {
        let s = ExponentialDecay::new(1.0, 0.05, 1000.0);
        let expected = 0.05 + 0.95 * (-1.0f64).exp();
        assert!((s.epsilon(1000) - expected).abs() < 1e-12);
    }

    #[test]
    fn should_approach_end_monotonically() {
        let s = ExponentialDecay::new(0.9, 0.1, 50.0);
        let mut prev = s.epsilon(0);
        for step in (10..2_000).step_by(10) {
            let eps = s.epsilon(step);
            assert!(eps < prev);
            assert!(eps > 0.1);
            prev = eps;
        }
        assert!((s.epsilon(100_000) - 0.1).abs() < 1e-9);
    }
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn should_build_from_config() {
    let linear = build_schedule(&ExplorationConfig {
        kind: ScheduleKind::Linear,
        start: 1.0,
        end: 0.1,
        decay: 100.0,
        decay2: 200.0,
    });
    assert_eq!(linear.epsilon(500), EPSILON_FLOOR);

    let exponential = build_schedule(&ExplorationConfig {
        kind: ScheduleKind::Exponential,
        start: 1.0,
        end: 0.1,
        decay: 100.0,
        decay2: 0.0,
    });
    assert!(exponential.epsilon(500) > 0.1);
}

#[test]
fn should_be_shareable_across_threads() {
    let schedule: std::sync::Arc<dyn ExplorationSchedule> = std::sync::Arc::new(TwoPhaseLinearDecay::new(1.0, 0.1, 100.0, 200.0));
    let handles: Vec<_> = (0..4u64)
        .map(|i| {
            let schedule = std::sync::Arc::clone(&schedule);
            std::thread::spawn(move || schedule.epsilon(i * 50))
        })
        .collect();
    let values: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(values[0], 1.0);
    assert!(values.windows(2).all(|w| w[1] < w[0]));
}
