use ndarray::ArrayView1;
use serde::{Serialize, Deserialize};
use std::collections::VecDeque;

use super::key::GoalKey;

/// Default number of goals kept in the pool.
pub const DEFAULT_POOL_CAPACITY: usize = 10;

/// Bounded history of reached states used as intermediate goals (`G`).
///
/// Insertion appends at the back and evicts from the front once full.
/// A vector equal to a goal already in the pool is never inserted twice.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoalPool {
    goals: VecDeque<GoalKey>,
    capacity: usize,
}

impl GoalPool {
    pub fn new(capacity: usize) -> Self {
        GoalPool {
            goals: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Whether `candidate` equals some pool member element-wise.
    pub fn contains(&self, candidate: ArrayView1<f32>) -> bool {
        self.goals.iter().any(|goal| goal.matches(candidate))
    }

    /// Append `candidate` unless it is already present.
    /// Returns `true` when the pool changed.
    pub fn insert(&mut self, candidate: ArrayView1<f32>) -> bool {
        if self.capacity == 0 || self.contains(candidate) {
            return false;
        }
        if self.goals.len() == self.capacity {
            self.goals.pop_front();
        }
        self.goals.push_back(GoalKey::new(candidate));
        true
    }

    pub fn get(&self, index: usize) -> Option<&GoalKey> {
        self.goals.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GoalKey> {
        self.goals.iter()
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for GoalPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}
