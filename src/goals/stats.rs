use serde::{Serialize, Deserialize};
use std::collections::HashMap;

use crate::error::{Result, SubgoalError};
use super::key::GoalKey;
use super::pool::GoalPool;
use super::sampler::binary_entropy;

/// Per-goal attempt (`N`) and success (`V`) counters. Unseen goals count 0.
#[derive(Clone, Debug, Default)]
pub struct GoalStats {
    attempts: HashMap<GoalKey, u32>,
    successes: HashMap<GoalKey, u32>,
}

/// One row of a goal-pool snapshot, written next to checkpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoalRecord {
    pub goal: Vec<f32>,
    pub attempts: u32,
    pub successes: u32,
    pub success_rate: f64,
    pub entropy: f64,
}

impl GoalStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one attempt at `goal`, and one success if it was achieved.
    pub fn record_attempt(&mut self, goal: &GoalKey, achieved: bool) {
        *self.attempts.entry(goal.clone()).or_insert(0) += 1;
        if achieved {
            *self.successes.entry(goal.clone()).or_insert(0) += 1;
        }
    }

    /// Overwrite the counters of `goal`. Fails if `successes > attempts`.
    pub fn set_counts(&mut self, goal: &GoalKey, attempts: u32, successes: u32) -> Result<()> {
        if successes > attempts {
            return Err(SubgoalError::invalid_parameter(
                "successes".to_string(),
                format!("{} successes exceed {} attempts", successes, attempts),
            ));
        }
        self.attempts.insert(goal.clone(), attempts);
        self.successes.insert(goal.clone(), successes);
        Ok(())
    }

    pub fn attempts(&self, goal: &GoalKey) -> u32 {
        self.attempts.get(goal).copied().unwrap_or(0)
    }

    pub fn successes(&self, goal: &GoalKey) -> u32 {
        self.successes.get(goal).copied().unwrap_or(0)
    }

    /// `V[g] / max(N[g], 1)`
    pub fn success_rate(&self, goal: &GoalKey) -> f64 {
        self.successes(goal) as f64 / self.attempts(goal).max(1) as f64
    }

    pub fn total_attempts(&self) -> u64 {
        self.attempts.values().map(|&n| n as u64).sum()
    }

    pub fn total_successes(&self) -> u64 {
        self.successes.values().map(|&v| v as u64).sum()
    }

    /// Counters of every goal currently in `pool`, in pool order.
    pub fn snapshot(&self, pool: &GoalPool) -> Vec<GoalRecord> {
        pool.iter()
            .map(|goal| {
                let success_rate = self.success_rate(goal);
                GoalRecord {
                    goal: goal.view().to_vec(),
                    attempts: self.attempts(goal),
                    successes: self.successes(goal),
                    success_rate,
                    entropy: binary_entropy(success_rate),
                }
            })
            .collect()
    }
}
