//! Sliding-window curriculum controller.
//!
//! Every invocation drains the outcome channel into a fixed-size window.
//! When new outcomes arrived and the window is full, its win rate
//! `(mean + 1) / 2` is compared against the threshold; meeting it moves the
//! difficulty index up one level and empties the window, so every advance
//! is judged on outcomes played entirely at the previous level or later.
//!
//! Outcomes are expected in `[-1, 1]`. Values outside that range are
//! clamped on absorption and counted. With the curriculum disabled the
//! controller still drains the outcome channel so actors never block on
//! it, but discards what it reads.

use std::collections::VecDeque;
use tracing::{info, warn};

use crate::config::CurriculumConfig;
use crate::core::channel::ChannelReceiver;
use crate::core::control::DifficultyWriter;

/// Map a mean outcome in `[-1, 1]` to a win rate in `[0, 1]`.
pub fn win_rate(mean_outcome: f64) -> f64 {
    ((mean_outcome + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// What one [`CurriculumController::update`] call did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurriculumUpdate {
    /// No new outcomes were available.
    Idle,
    /// Curriculum disabled; outcomes were drained and dropped.
    Discarded { absorbed: usize },
    /// Outcomes were absorbed but the window is not full yet.
    Filling { absorbed: usize, window_len: usize },
    /// The full window was evaluated.
    Evaluated {
        absorbed: usize,
        win_rate: f64,
        /// New difficulty index if the evaluation advanced it.
        advanced_to: Option<usize>,
    },
}

pub struct CurriculumController {
    outcomes: ChannelReceiver<f64>,
    difficulty: DifficultyWriter,
    difficulties: Vec<String>,
    enabled: bool,
    window: VecDeque<f64>,
    window_size: usize,
    threshold: f64,
    last_win_rate: Option<f64>,
    clamped: u64,
}

impl CurriculumController {
    /// # Panics
    ///
    /// Panics if `config.window_size` is zero or the ladder length differs
    /// from the difficulty cell's level count; both are rejected by
    /// configuration validation.
    pub fn new(config: &CurriculumConfig, outcomes: ChannelReceiver<f64>, difficulty: DifficultyWriter) -> Self {
        assert!(config.window_size > 0, "outcome window must be non-empty");
        assert_eq!(
            config.difficulties.len(),
            difficulty.n_levels(),
            "difficulty cell does not match the ladder"
        );
        Self {
            outcomes,
            difficulty,
            difficulties: config.difficulties.clone(),
            enabled: config.enabled,
            window: VecDeque::with_capacity(config.window_size),
            window_size: config.window_size,
            threshold: config.win_rate_threshold,
            last_win_rate: None,
            clamped: 0,
        }
    }

    /// Drain pending outcomes and maybe advance the difficulty.
    pub fn update(&mut self) -> CurriculumUpdate {
        let pending = self.outcomes.drain();
        if pending.is_empty() {
            return CurriculumUpdate::Idle;
        }
        let absorbed = pending.len();
        if !self.enabled {
            return CurriculumUpdate::Discarded { absorbed };
        }
        for outcome in pending {
            self.absorb(outcome);
        }

        if self.window.len() < self.window_size {
            return CurriculumUpdate::Filling {
                absorbed,
                window_len: self.window.len(),
            };
        }

        let rate = win_rate(self.window.iter().sum::<f64>() / self.window.len() as f64);
        self.last_win_rate = Some(rate);
        let mut advanced_to = None;
        if rate >= self.threshold {
            if let Some(next) = self.difficulty.advance() {
                self.window.clear();
                advanced_to = Some(next);
                info!(
                    win_rate = rate,
                    difficulty = %self.difficulties[next],
                    level = next,
                    "curriculum advanced"
                );
            }
        }

        CurriculumUpdate::Evaluated {
            absorbed,
            win_rate: rate,
            advanced_to,
        }
    }

    /// Push one outcome into the window, evicting the oldest when full.
    pub fn absorb(&mut self, outcome: f64) {
        let value = if outcome.is_nan() {
            0.0
        } else {
            outcome.clamp(-1.0, 1.0)
        };
        if value != outcome {
            self.clamped += 1;
            if self.clamped.is_power_of_two() {
                warn!(outcome, clamped_total = self.clamped, "outcome outside [-1, 1] clamped");
            }
        }
        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(value);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn level(&self) -> usize {
        self.difficulty.current()
    }

    pub fn current_difficulty(&self) -> &str {
        &self.difficulties[self.level()]
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Win rate of the most recent full-window evaluation.
    pub fn last_win_rate(&self) -> Option<f64> {
        self.last_win_rate
    }

    /// Outcomes clamped into `[-1, 1]` so far.
    pub fn clamped_outcomes(&self) -> u64 {
        self.clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::channel::{bounded, ChannelSender};
    use crate::core::control::{difficulty_index, DifficultyReader};
    use crate::core::shutdown::ShutdownSignal;

    fn controller(window: usize, threshold: f64, levels: &[&str]) -> (CurriculumController, ChannelSender<f64>, DifficultyReader) {
        let shutdown = ShutdownSignal::new();
        let (tx, rx) = bounded(1024, &shutdown);
        let (writer, reader) = difficulty_index(levels.len());
        let config = CurriculumConfig {
            enabled: true,
            win_rate_threshold: threshold,
            window_size: window,
            difficulties: levels.iter().map(|s| s.to_string()).collect(),
        };
        (CurriculumController::new(&config, rx, writer), tx, reader)
    }

    fn feed(tx: &ChannelSender<f64>, outcomes: &[f64]) {
        for &o in outcomes {
            tx.put(o).unwrap();
        }
    }

    #[test]
    fn test_win_rate_mapping() {
        assert_eq!(win_rate(-1.0), 0.0);
        assert_eq!(win_rate(0.0), 0.5);
        assert_eq!(win_rate(1.0), 1.0);
        assert_eq!(win_rate(3.0), 1.0);
    }

    #[test]
    fn test_idle_without_outcomes() {
        let (mut c, _tx, _reader) = controller(4, 0.5, &["a", "b"]);
        assert_eq!(c.update(), CurriculumUpdate::Idle);
    }

    #[test]
    fn test_no_evaluation_until_window_full() {
        let (mut c, tx, reader) = controller(4, 0.5, &["a", "b"]);
        feed(&tx, &[1.0, 1.0, 1.0]);
        assert_eq!(c.update(), CurriculumUpdate::Filling { absorbed: 3, window_len: 3 });
        assert_eq!(reader.get(), 0);
    }

    #[test]
    fn test_advance_clears_window() {
        let (mut c, tx, reader) = controller(4, 0.75, &["a", "b", "c"]);
        feed(&tx, &[1.0, 1.0, 1.0, -1.0]);

        let update = c.update();
        assert_eq!(
            update,
            CurriculumUpdate::Evaluated { absorbed: 4, win_rate: 0.75, advanced_to: Some(1) }
        );
        assert_eq!(reader.get(), 1);
        assert_eq!(c.window_len(), 0);
        assert_eq!(c.current_difficulty(), "b");
    }

    #[test]
    fn test_below_threshold_keeps_sliding() {
        let (mut c, tx, reader) = controller(4, 0.9, &["a", "b"]);
        feed(&tx, &[-1.0, -1.0, 1.0, 1.0]);
        assert!(matches!(c.update(), CurriculumUpdate::Evaluated { advanced_to: None, .. }));
        assert_eq!(c.window_len(), 4);

        // Sliding the losses out of the window eventually crosses the bar.
        feed(&tx, &[1.0, 1.0]);
        assert!(matches!(c.update(), CurriculumUpdate::Evaluated { advanced_to: Some(1), .. }));
        assert_eq!(reader.get(), 1);
    }

    #[test]
    fn test_one_advance_per_full_window() {
        let (mut c, tx, reader) = controller(3, 0.5, &["a", "b", "c", "d"]);
        feed(&tx, &[1.0; 5]);
        c.update();
        assert_eq!(reader.get(), 1);
        assert_eq!(c.window_len(), 0);

        feed(&tx, &[1.0; 2]);
        c.update();
        assert_eq!(reader.get(), 1);

        feed(&tx, &[1.0]);
        c.update();
        assert_eq!(reader.get(), 2);
    }

    #[test]
    fn test_never_exceeds_hardest_level() {
        let (mut c, tx, reader) = controller(2, 0.0, &["a", "b"]);
        for _ in 0..10 {
            feed(&tx, &[1.0, 1.0]);
            c.update();
            assert!(reader.get() <= 1);
        }
        assert_eq!(reader.get(), 1);
        // At the top level the window keeps sliding instead of clearing.
        assert_eq!(c.window_len(), 2);
    }

    #[test]
    fn test_disabled_drains_without_advancing() {
        let shutdown = ShutdownSignal::new();
        let (tx, rx) = bounded(16, &shutdown);
        let (writer, reader) = difficulty_index(2);
        let config = CurriculumConfig {
            enabled: false,
            win_rate_threshold: 0.0,
            window_size: 1,
            difficulties: vec!["a".into(), "b".into()],
        };
        let mut c = CurriculumController::new(&config, rx, writer);

        feed(&tx, &[1.0, 1.0, 1.0]);
        assert_eq!(c.update(), CurriculumUpdate::Discarded { absorbed: 3 });
        assert!(tx.is_empty());
        assert_eq!(reader.get(), 0);
        assert_eq!(c.window_len(), 0);
    }

    #[test]
    fn test_out_of_range_outcomes_are_clamped() {
        let (mut c, tx, _reader) = controller(2, 1.1, &["a"]);
        feed(&tx, &[5.0, -3.0]);
        let update = c.update();
        assert_eq!(update, CurriculumUpdate::Evaluated { absorbed: 2, win_rate: 0.5, advanced_to: None });
        assert_eq!(c.clamped_outcomes(), 2);
        assert_eq!(c.last_win_rate(), Some(0.5));
    }
}
