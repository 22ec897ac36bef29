//! Episode records and Monte Carlo return labelling.
//!
//! - `Step`: one raw (observation, action, reward) record collected while
//!   an episode runs
//! - `Trajectory`: the ordered steps of one episode
//! - `Transition`: an (observation, action, return) training example, the
//!   unit that flows from actors to batch assemblers

/// One environment step as observed by an actor.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Observation features (action mask already stripped).
    pub observation: Vec<f32>,
    /// Index of the action taken.
    pub action: u32,
    /// Reward received after the action.
    pub reward: f32,
}

/// Labelled training example.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation features the action was chosen from.
    pub observation: Vec<f32>,
    /// Index of the action taken.
    pub action: u32,
    /// Discounted return from this step to the end of the episode.
    pub target_return: f32,
}

impl Transition {
    pub fn new(observation: Vec<f32>, action: u32, target_return: f32) -> Self {
        Self {
            observation,
            action,
            target_return,
        }
    }

    pub fn obs_size(&self) -> usize {
        self.observation.len()
    }
}

/// Discounted return at every step: `G_t = r_t + discount * G_{t+1}`,
/// with `G` past the last step equal to zero.
///
/// Accumulates in `f64` regardless of the reward type.
pub fn discounted_returns(rewards: &[f32], discount: f64) -> Vec<f64> {
    let mut returns = vec![0.0; rewards.len()];
    let mut running = 0.0f64;
    for (slot, &reward) in returns.iter_mut().zip(rewards).rev() {
        running = running * discount + f64::from(reward);
        *slot = running;
    }
    returns
}

/// Steps of a single episode, in the order they happened.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    steps: Vec<Step>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            steps: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Sum of rewards, undiscounted.
    pub fn total_reward(&self) -> f64 {
        self.steps.iter().map(|s| f64::from(s.reward)).sum()
    }

    /// Label every step with its discounted return.
    ///
    /// Returns the transitions in episode order together with the episode
    /// outcome, the discounted return from the first step (0 for an empty
    /// episode).
    pub fn into_transitions(self, discount: f64) -> (Vec<Transition>, f64) {
        let rewards: Vec<f32> = self.steps.iter().map(|s| s.reward).collect();
        let returns = discounted_returns(&rewards, discount);
        let outcome = returns.first().copied().unwrap_or(0.0);

        let transitions = self
            .steps
            .into_iter()
            .zip(returns)
            .map(|(step, g)| Transition::new(step.observation, step.action, g as f32))
            .collect();

        (transitions, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(reward: f32, action: u32) -> Step {
        Step {
            observation: vec![action as f32],
            action,
            reward,
        }
    }

    #[test]
    fn test_discounted_returns_terminal_reward() {
        let returns = discounted_returns(&[1.0, 0.0, 0.0, -1.0], 0.9);
        let expected = [0.271, -0.81, -0.9, -1.0];
        for (got, want) in returns.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_discounted_returns_zero_discount() {
        let returns = discounted_returns(&[0.5, 2.0, -1.0], 0.0);
        assert_eq!(returns, vec![0.5, 2.0, -1.0]);
    }

    #[test]
    fn test_discounted_returns_empty() {
        assert!(discounted_returns(&[], 0.99).is_empty());
    }

    #[test]
    fn test_trajectory_labels_in_order() {
        let mut trajectory = Trajectory::with_capacity(3);
        trajectory.push(step(0.0, 2));
        trajectory.push(step(0.0, 0));
        trajectory.push(step(1.0, 1));
        assert_eq!(trajectory.len(), 3);
        assert_eq!(trajectory.total_reward(), 1.0);

        let (transitions, outcome) = trajectory.into_transitions(0.5);

        let actions: Vec<u32> = transitions.iter().map(|t| t.action).collect();
        assert_eq!(actions, vec![2, 0, 1]);
        let returns: Vec<f32> = transitions.iter().map(|t| t.target_return).collect();
        assert_eq!(returns, vec![0.25, 0.5, 1.0]);
        assert_eq!(outcome, 0.25);
        assert_eq!(transitions[0].observation, vec![2.0]);
    }

    #[test]
    fn test_empty_trajectory_outcome_is_zero() {
        let (transitions, outcome) = Trajectory::new().into_transitions(0.9);
        assert!(transitions.is_empty());
        assert_eq!(outcome, 0.0);
    }
}
