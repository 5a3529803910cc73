//! # Goal Curriculum Module
//!
//! Intermediate subgoal sampling: a bounded pool `G` of states the agent has
//! reached, attempt/success counters `N`/`V` per goal, and an entropy-weighted
//! sampler that prefers goals the agent reaches about half of the time.
//!
//! ```rust
//! use subgoal::goals::{sample_goal, GoalPool, GoalStats, GoalWeighting, GoalKey};
//! use ndarray::array;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut pool = GoalPool::new(10);
//! pool.insert(array![1.0, 2.0].view());
//! pool.insert(array![3.0, 1.0].view());
//!
//! let mut stats = GoalStats::new();
//! stats.record_attempt(&GoalKey::from(array![1.0, 2.0]), true);
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let goal = sample_goal(&pool, &stats, 0.1, GoalWeighting::Entropy, &mut rng).unwrap();
//! assert!(pool.contains(goal.view()));
//! ```

pub mod key;
pub mod pool;
pub mod sampler;
pub mod stats;

pub use key::GoalKey;
pub use pool::{GoalPool, DEFAULT_POOL_CAPACITY};
pub use sampler::{binary_entropy, goal_probabilities, sample_goal, GoalWeighting};
pub use stats::{GoalRecord, GoalStats};
