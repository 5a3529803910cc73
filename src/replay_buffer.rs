use ndarray::Array1;
use rand::Rng;
use rand::seq::index;
use serde::{Serialize, Deserialize};

use crate::error::{Result, SubgoalError};

/// A goal-conditioned transition. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub phi: Array1<f32>,
    pub action: usize,
    pub phi_next: Array1<f32>,
    pub reward: f32,
    pub done: bool,
    pub goal: Array1<f32>,
}

/// Fixed-capacity transition store with ring-buffer overwrite.
///
/// Slots are filled in order until `capacity` is reached; after that each
/// store overwrites the oldest transition. Only written slots are ever sampled.
#[derive(Clone, Debug)]
pub struct ReplayMemory {
    slots: Vec<Transition>,
    capacity: usize,
    next: usize,
}

impl ReplayMemory {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SubgoalError::invalid_parameter(
                "capacity",
                "replay memory capacity must be greater than 0",
            ));
        }
        Ok(ReplayMemory {
            slots: Vec::new(),
            capacity,
            next: 0,
        })
    }

    pub fn store(&mut self, transition: Transition) {
        if self.slots.len() < self.capacity {
            self.slots.push(transition);
        } else {
            self.slots[self.next] = transition;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    /// Uniformly sample `batch_size` distinct stored transitions.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Transition>> {
        if batch_size > self.slots.len() {
            return Err(SubgoalError::ReplayUnderflow {
                requested: batch_size,
                available: self.slots.len(),
            });
        }
        Ok(index::sample(rng, self.slots.len(), batch_size)
            .into_iter()
            .map(|i| &self.slots[i])
            .collect())
    }

    /// Number of occupied slots.
    pub fn nentities(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.slots.iter()
    }
}
