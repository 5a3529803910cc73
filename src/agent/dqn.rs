use crate::network::NeuralNetwork;
use crate::activations::Activation;
use crate::optimizer::{Adam, OptimizerWrapper};
use crate::replay_buffer::Transition;
use crate::env::ActionSpace;
use crate::loss::MSE;
use crate::error::{Result, SubgoalError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;

/// Statistics of one optimization step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrainStats {
    /// Mean squared TD error over the batch, before the update.
    pub loss: f32,
    /// Mean of `max(r, 0)` over the batch: the fraction of successful transitions.
    pub mean_reward: f32,
}

/// Goal-conditioned Deep Q-Network agent with a target network
///
/// Both networks take `concat(phi, goal)` as input and output one value per
/// action. The target network only changes through [`GoalDqnAgent::update_target`].
///
/// # Example
///
/// ```rust
/// use subgoal::agent::GoalDqnAgentBuilder;
/// use ndarray::array;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let agent = GoalDqnAgentBuilder::new()
///     .feature_size(2)
///     .num_actions(4)
///     .hidden(&[16, 16])
///     .epsilon(0.2)
///     .build(&mut rng)
///     .unwrap();
///
/// let action = agent.act(array![1.0, 1.0].view(), array![3.0, 2.0].view(), &mut rng).unwrap();
/// assert!(action < 4);
/// ```
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GoalDqnAgent {
    /// Network being trained
    pub q_network: NeuralNetwork,

    /// Target network used for bootstrapped targets
    pub target_network: NeuralNetwork,

    /// Exploration rate
    pub epsilon: f32,

    pub gamma: f32,

    pub learning_rate: f32,

    /// Target synchronisation interval in environment steps
    pub freq_update_target: usize,

    /// Number of optimization steps performed
    pub iteration: usize,

    /// Number of outer episodes completed
    pub epoch: usize,

    num_actions: usize,

    feature_size: usize,

    #[serde(skip)]
    greedy: bool,

    #[serde(skip)]
    loss: MSE,
}

impl GoalDqnAgent {
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    pub fn action_space(&self) -> ActionSpace {
        ActionSpace::new(self.num_actions)
    }

    /// Disable exploration (evaluation episodes) or re-enable it.
    pub fn set_greedy(&mut self, greedy: bool) {
        self.greedy = greedy;
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    /// Exploration rate currently in effect.
    pub fn current_epsilon(&self) -> f32 {
        if self.greedy {
            0.0
        } else {
            self.epsilon
        }
    }

    fn joint_input(&self, phi: ArrayView1<f32>, goal: ArrayView1<f32>) -> Result<Array1<f32>> {
        if phi.len() != self.feature_size || goal.len() != self.feature_size {
            return Err(SubgoalError::dimension_mismatch(
                format!("state and goal of {} features", self.feature_size),
                format!("state of {} and goal of {} features", phi.len(), goal.len()),
            ));
        }
        Ok(phi.iter().chain(goal.iter()).copied().collect())
    }

    /// Action values of `phi` under `goal`.
    pub fn q_values(&self, phi: ArrayView1<f32>, goal: ArrayView1<f32>) -> Result<Array1<f32>> {
        let input = self.joint_input(phi, goal)?;
        self.q_network.predict(input.view())
    }

    /// Select an action with the ε-greedy policy
    pub fn act<R: Rng + ?Sized>(&self, phi: ArrayView1<f32>, goal: ArrayView1<f32>, rng: &mut R) -> Result<usize> {
        if rng.gen::<f32>() < self.current_epsilon() {
            // Check shapes on the exploration path too
            self.joint_input(phi, goal)?;
            return Ok(self.action_space().sample(rng));
        }

        let q_values = self.q_values(phi, goal)?;
        argmax(q_values.view())
    }

    /// Copy the trained network's parameters into the target network.
    pub fn update_target(&mut self) -> Result<()> {
        self.target_network.copy_parameters_from(&self.q_network)
    }

    /// Sync the target network when `global_step` falls on the sync interval.
    /// Returns whether a sync happened.
    pub fn maybe_update_target(&mut self, global_step: usize) -> Result<bool> {
        if self.freq_update_target == 0 || global_step % self.freq_update_target != 0 {
            return Ok(false);
        }
        self.update_target()?;
        Ok(true)
    }

    /// One optimization step on a batch of transitions
    ///
    /// The target of a transition is `r + gamma * (1 - done) * max_a Q_target(s', g)[a]`
    /// and only the value of the taken action is regressed toward it.
    pub fn train(&mut self, batch: &[&Transition]) -> Result<TrainStats> {
        if batch.is_empty() {
            return Err(SubgoalError::invalid_parameter("batch", "cannot train on an empty batch"));
        }

        let batch_size = batch.len();
        let input_size = 2 * self.feature_size;
        let mut states = Array2::zeros((batch_size, input_size));
        let mut next_states = Array2::zeros((batch_size, input_size));

        for (i, transition) in batch.iter().enumerate() {
            if transition.action >= self.num_actions {
                return Err(SubgoalError::InvalidAction {
                    action: transition.action,
                    max_actions: self.num_actions,
                });
            }
            let goal = transition.goal.view();
            states.row_mut(i).assign(&self.joint_input(transition.phi.view(), goal)?);
            next_states.row_mut(i).assign(&self.joint_input(transition.phi_next.view(), goal)?);
        }

        let next_q_values = self.target_network.predict_batch(next_states.view())?;
        let mut targets = self.q_network.predict_batch(states.view())?;

        for (i, transition) in batch.iter().enumerate() {
            let bootstrap = if transition.done {
                0.0
            } else {
                next_q_values.row(i).iter().fold(f32::NEG_INFINITY, |max, &val| max.max(val))
            };
            targets[[i, transition.action]] = transition.reward + self.gamma * bootstrap;
        }

        let loss = self
            .q_network
            .train_minibatch(states.view(), targets.view(), &self.loss, self.learning_rate)?;
        self.iteration += 1;

        let mean_reward = batch.iter().map(|t| t.reward.max(0.0)).sum::<f32>() / batch_size as f32;
        Ok(TrainStats { loss, mean_reward })
    }

    /// Save the agent to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Load agent from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(path)?;
        let agent: Self = bincode::deserialize(&data)?;
        Ok(agent)
    }
}

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax(values: ArrayView1<f32>) -> Result<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (idx, &val)| match best {
            Some((_, best_val)) if best_val >= val => best,
            _ if val.is_nan() => best,
            _ => Some((idx, val)),
        })
        .map(|(idx, _)| idx)
        .ok_or_else(|| SubgoalError::Numerical("No valid Q-values".to_string()))
}

/// Builder pattern for GoalDqnAgent
pub struct GoalDqnAgentBuilder {
    feature_size: usize,
    num_actions: usize,
    hidden: Vec<usize>,
    activation: Activation,
    epsilon: f32,
    gamma: f32,
    learning_rate: f32,
    freq_update_target: usize,
    optimizer: Option<OptimizerWrapper>,
}

impl GoalDqnAgentBuilder {
    pub fn new() -> Self {
        GoalDqnAgentBuilder {
            feature_size: 0,
            num_actions: 0,
            hidden: vec![200, 200],
            activation: Activation::HardTanh,
            epsilon: 0.2,
            gamma: 0.99,
            learning_rate: 1e-3,
            freq_update_target: 1000,
            optimizer: None,
        }
    }

    /// Size of one feature vector; the network input is twice this.
    pub fn feature_size(mut self, size: usize) -> Self {
        self.feature_size = size;
        self
    }

    pub fn num_actions(mut self, n: usize) -> Self {
        self.num_actions = n;
        self
    }

    pub fn hidden(mut self, sizes: &[usize]) -> Self {
        self.hidden = sizes.to_vec();
        self
    }

    /// Activation of the hidden layers; the output layer is linear.
    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn freq_update_target(mut self, freq: usize) -> Self {
        self.freq_update_target = freq;
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerWrapper) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    /// Build the agent. The target network starts as an exact copy of the Q network.
    pub fn build<R: Rng + ?Sized>(self, rng: &mut R) -> Result<GoalDqnAgent> {
        if self.feature_size == 0 {
            return Err(SubgoalError::invalid_parameter("feature_size", "must be positive"));
        }
        if self.num_actions == 0 {
            return Err(SubgoalError::invalid_parameter("num_actions", "must be positive"));
        }
        if self.freq_update_target == 0 {
            return Err(SubgoalError::invalid_parameter("freq_update_target", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(SubgoalError::invalid_parameter("epsilon".to_string(), format!("{} is outside [0, 1]", self.epsilon)));
        }

        let mut layer_sizes = Vec::with_capacity(self.hidden.len() + 2);
        layer_sizes.push(2 * self.feature_size);
        layer_sizes.extend_from_slice(&self.hidden);
        layer_sizes.push(self.num_actions);

        let mut activations = vec![self.activation; self.hidden.len()];
        activations.push(Activation::Linear);

        let optimizer = self.optimizer.unwrap_or_else(|| OptimizerWrapper::Adam(Adam::default()));
        let q_network = NeuralNetwork::new(&layer_sizes, &activations, optimizer, rng)?;
        let target_network = q_network.clone();

        Ok(GoalDqnAgent {
            q_network,
            target_network,
            epsilon: self.epsilon,
            gamma: self.gamma,
            learning_rate: self.learning_rate,
            freq_update_target: self.freq_update_target,
            iteration: 0,
            epoch: 0,
            num_actions: self.num_actions,
            feature_size: self.feature_size,
            greedy: false,
            loss: MSE,
        })
    }
}

impl Default for GoalDqnAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
