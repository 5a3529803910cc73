use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};
use serde::{Serialize, Deserialize};

use crate::error::{Result, SubgoalError};
use super::key::GoalKey;
use super::pool::GoalPool;
use super::stats::GoalStats;

/// How binary entropy is turned into a sampling distribution over the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GoalWeighting {
    /// `p(g) ∝ exp(alpha · H(g))`
    #[default]
    Entropy,
    /// `p(g) ∝ exp(exp(alpha · H(g)))`: the weights are themselves used as logits.
    DoubleExponential,
}

impl GoalWeighting {
    fn logit(&self, alpha: f64, entropy: f64) -> f64 {
        match self {
            GoalWeighting::Entropy => alpha * entropy,
            GoalWeighting::DoubleExponential => (alpha * entropy).exp(),
        }
    }
}

/// Binary entropy `-x ln x - (1 - x) ln(1 - x)` in nats.
///
/// `0 · ln 0` terms contribute 0, so `H(0) = H(1) = 0`. Inputs are clamped to `[0, 1]`.
pub fn binary_entropy(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    let term = |p: f64| if p > 0.0 { -p * p.ln() } else { 0.0 };
    term(x) + term(1.0 - x)
}

/// Normalized sampling probabilities of every goal in `pool`, in pool order.
pub fn goal_probabilities(pool: &GoalPool, stats: &GoalStats, alpha: f64, weighting: GoalWeighting) -> Vec<f64> {
    let logits: Vec<f64> = pool
        .iter()
        .map(|goal| weighting.logit(alpha, binary_entropy(stats.success_rate(goal))))
        .collect();
    // Softmax with the max subtracted; the unnormalized weights overflow for large alpha.
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = if max == f64::INFINITY {
        // Overflowed logits share the whole mass.
        logits.iter().map(|&l| if l == f64::INFINITY { 1.0 } else { 0.0 }).collect()
    } else {
        logits.iter().map(|&l| (l - max).exp()).collect()
    };
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Draw one goal from `pool`, favouring goals whose success rate is near 0.5.
pub fn sample_goal<R: Rng + ?Sized>(
    pool: &GoalPool,
    stats: &GoalStats,
    alpha: f64,
    weighting: GoalWeighting,
    rng: &mut R,
) -> Result<GoalKey> {
    if pool.is_empty() {
        return Err(SubgoalError::EmptyGoalPool);
    }
    if !alpha.is_finite() {
        return Err(SubgoalError::invalid_parameter("alpha".to_string(), format!("{} is not finite", alpha)));
    }

    let probabilities = goal_probabilities(pool, stats, alpha, weighting);
    let distribution = WeightedIndex::new(&probabilities)
        .map_err(|e| SubgoalError::Numerical(format!("goal weights {:?}: {}", probabilities, e)))?;
    let index = distribution.sample(rng);

    pool.get(index)
        .cloned()
        .ok_or_else(|| SubgoalError::Numerical(format!("sampled index {} outside pool of {}", index, pool.len())))
}
