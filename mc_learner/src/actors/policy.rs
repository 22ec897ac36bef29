//! Epsilon-greedy action selection over (optionally masked) discrete actions.

/// Whether action `i` is legal under `mask`.
#[inline]
fn is_legal(mask: Option<&[f32]>, i: usize) -> bool {
    mask.map_or(true, |m| m.get(i).is_some_and(|&v| v != 0.0))
}

/// Index of the highest-valued legal action.
///
/// Illegal actions are treated as negative infinity; ties go to the lowest
/// index. Returns `None` when no action is legal.
pub fn greedy_action(values: &[f32], mask: Option<&[f32]>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if !is_legal(mask, i) {
            continue;
        }
        let v = if v.is_nan() { f32::NEG_INFINITY } else { v };
        match best {
            Some((_, b)) if b >= v => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Uniformly random legal action among `n_actions`.
pub fn random_action(rng: &mut fastrand::Rng, n_actions: usize, mask: Option<&[f32]>) -> Option<usize> {
    match mask {
        None if n_actions > 0 => Some(rng.usize(0..n_actions)),
        None => None,
        Some(_) => {
            let legal: Vec<usize> = (0..n_actions).filter(|&i| is_legal(mask, i)).collect();
            if legal.is_empty() {
                None
            } else {
                Some(legal[rng.usize(0..legal.len())])
            }
        }
    }
}

/// Epsilon-greedy choice.
///
/// Draws `u ~ U[0, 1)`; acts greedily on the values from `values` when
/// `u >= epsilon`, otherwise uniformly at random among legal actions. The
/// value function is only evaluated on the greedy branch.
pub fn epsilon_greedy<F, E>(
    rng: &mut fastrand::Rng,
    epsilon: f64,
    n_actions: usize,
    mask: Option<&[f32]>,
    values: F,
) -> Result<Option<usize>, E>
where
    F: FnOnce() -> Result<Vec<f32>, E>,
{
    if rng.f64() >= epsilon {
        let q = values()?;
        Ok(greedy_action(&q, mask))
    } else {
        Ok(random_action(rng, n_actions, mask))
    }
}
