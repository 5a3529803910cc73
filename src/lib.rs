//! # Subgoal - Goal-Conditioned DQN with Intermediate Subgoal Sampling
//!
//! Subgoal trains a goal-conditioned Deep Q-Network on grid-world navigation.
//! Goals come from two sources: the environment, and a pool of states the
//! agent has already reached. Pool goals are drawn with a preference for
//! those the agent reaches about half of the time, which yields a curriculum
//! of goals of increasing difficulty. Hindsight relabeling can additionally
//! store every trajectory as a success toward the state it actually reached.
//!
//! ## Key Features
//!
//! - **Neural Networks**: dense layers with manual backpropagation and Adam
//! - **Goal Curriculum**: bounded goal pool with entropy-weighted sampling
//! - **Hindsight Replay**: optional relabeled copies of every transition
//! - **Reproducible Runs**: one seeded RNG per run, YAML configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use subgoal::config::ExperimentConfig;
//! use subgoal::tensorboard::MemorySink;
//! use subgoal::trainer::IgsTrainer;
//!
//! let mut config = ExperimentConfig::default();
//! config.nb_episodes = 50;
//! config.agent.hidden = vec![32, 32];
//!
//! let mut trainer = IgsTrainer::new(config, MemorySink::new()).unwrap();
//! let summary = trainer.run().unwrap();
//! println!("{} goals in the pool", summary.pool_size);
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions (ReLU, Linear, Tanh, HardTanh)
//! - [`agent`] - Goal-conditioned DQN agent
//! - [`config`] - YAML experiment configuration
//! - [`env`] - Environment contract and the grid world
//! - [`error`] - Error types and result handling
//! - [`experiment`] - Run directories and checkpoint paths
//! - [`features`] - Feature extractors
//! - [`goals`] - Goal pool, statistics and the subgoal sampler
//! - [`hindsight`] - Trajectory buffering and hindsight relabeling
//! - [`layers`] - Dense layers and weight initialization
//! - [`loss`] - Loss functions for training
//! - [`network`] - Feed-forward network
//! - [`optimizer`] - Optimization algorithms
//! - [`replay_buffer`] - Replay memory
//! - [`tensorboard`] - Scalar logging
//! - [`trainer`] - The episode loop

pub mod activations;
pub mod agent;
pub mod config;
pub mod env;
pub mod error;
pub mod experiment;
pub mod features;
pub mod goals;
pub mod hindsight;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod tensorboard;
pub mod trainer;

#[cfg(test)]
mod tests;
