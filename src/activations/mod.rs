//! # Activation Functions Module
//!
//! Element-wise non-linearities applied by the dense layers of the Q-network.
//!
//! ## Available Activations
//!
//! - **ReLU**: `max(0, x)`
//! - **Linear**: identity, used on the action-value output layer
//! - **Tanh**: hyperbolic tangent
//! - **HardTanh**: `clamp(x, -1, 1)`, the default for hidden layers
//!
//! ## Usage Example
//!
//! ```rust
//! use subgoal::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.5, -0.5, 0.0, -2.0]];
//! Activation::HardTanh.apply_batch(&mut data);
//! assert_eq!(data, array![[1.0, -0.5, 0.0, -1.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
