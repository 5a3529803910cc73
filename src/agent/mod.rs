//! # Goal-Conditioned Agents Module
//!
//! A DQN agent whose value network is conditioned on a goal: the input is the
//! concatenation of the current feature vector and the goal feature vector.
//!
//! ## Core Concepts
//!
//! - **Target network**: a frozen copy of the Q network, synchronised by hard copy
//! - **ε-greedy**: a constant exploration rate, switched off for evaluation
//! - **Terminal gating**: transitions that reach their goal do not bootstrap
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use subgoal::agent::GoalDqnAgentBuilder;
//! use subgoal::replay_buffer::ReplayMemory;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut agent = GoalDqnAgentBuilder::new()
//!     .feature_size(2)
//!     .num_actions(4)
//!     .build(&mut rng)
//!     .unwrap();
//!
//! let memory = ReplayMemory::new(10_000).unwrap();
//! if memory.nentities() > 32 {
//!     let batch = memory.sample(32, &mut rng).unwrap();
//!     let stats = agent.train(&batch).unwrap();
//!     println!("loss {}", stats.loss);
//! }
//! agent.update_target().unwrap();
//! ```

mod dqn;
pub use dqn::{argmax, GoalDqnAgent, GoalDqnAgentBuilder, TrainStats};
