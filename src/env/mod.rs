//! # Environment Module
//!
//! The contract the episode loop expects from an environment, and the grid
//! world it is evaluated on. Rewards and termination flags reported by
//! [`Environment::step`] are informational; the loop recomputes both from
//! feature vectors and goals.

pub mod gridworld;

use ndarray::Array2;
use rand::Rng;
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

use crate::error::{Result, SubgoalError};

pub use gridworld::{GridWorld, DEFAULT_PLAN};

/// Raw observation: the grid as a matrix of cell codes.
pub type Observation = Array2<f32>;

/// Reward per cell code, as used by `set_plan`.
pub type CellRewards = BTreeMap<u8, f32>;

/// A discrete action space `{0, .., n - 1}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpace {
    pub n: usize,
}

impl ActionSpace {
    pub fn new(n: usize) -> Self {
        ActionSpace { n }
    }

    /// Uniformly random action.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.n)
    }

    pub fn contains(&self, action: usize) -> bool {
        action < self.n
    }
}

/// Result of one environment step.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f32,
    pub done: bool,
}

pub trait Environment {
    fn reset(&mut self) -> Observation;

    fn step(&mut self, action: usize) -> Result<StepOutcome>;

    /// Draw a goal from the environment's goal distribution.
    /// Returns the goal observation and the goal cell.
    fn sample_goal(&mut self) -> (Observation, (usize, usize));

    fn seed(&mut self, seed: u64);

    fn set_plan(&mut self, plan: &str, rewards: &CellRewards) -> Result<()>;

    /// Text rendering of the current state.
    fn render(&self) -> String;

    fn close(&mut self) {}

    fn action_space(&self) -> ActionSpace;
}

/// Build the environment registered under `name`.
pub fn make_env(name: &str, plan: &str, rewards: &CellRewards, slip: f32) -> Result<Box<dyn Environment>> {
    match name {
        "gridworld-v0" | "gridworld" => Ok(Box::new(GridWorld::from_plan(plan, rewards.clone(), slip)?)),
        other => Err(SubgoalError::invalid_config("env".to_string(), format!("unknown environment '{}'", other))),
    }
}
