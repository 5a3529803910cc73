//! YAML configuration of an experiment run.
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

use crate::activations::Activation;
use crate::env::{CellRewards, DEFAULT_PLAN};
use crate::error::{Result, SubgoalError};
use crate::features::FeatureKind;
use crate::goals::{GoalWeighting, DEFAULT_POOL_CAPACITY};

/// Hyperparameters of the agent and of the subgoal curriculum.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct AgentConfig {
    /// Hidden layer widths of the Q network.
    pub hidden: Vec<usize>,

    /// Adam learning rate.
    pub lr: f32,

    /// Discount factor.
    pub gamma: f32,

    /// Exploration rate of the ε-greedy policy.
    pub eps0: f32,

    /// Interval of target network synchronisation in environment steps.
    pub freq_update_target: usize,

    /// Replay memory capacity.
    pub mem_size: usize,

    /// Batch size of one optimization step.
    pub mini_batch: usize,

    /// Interval of optimization in environment steps.
    pub freq_optim: usize,

    /// Probability of drawing a subgoal from the pool instead of a direct goal.
    pub beta: f64,

    /// Entropy temperature of the subgoal sampler.
    pub alpha: f64,

    /// Store hindsight copies relabeled against the reached state.
    pub her: bool,

    pub goal_weighting: GoalWeighting,

    /// Step budget of one outer episode.
    pub max_steps: usize,

    pub goal_pool_size: usize,

    /// Activation of the hidden layers.
    pub activation: Activation,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            hidden: vec![200, 200],
            lr: 1e-3,
            gamma: 0.99,
            eps0: 0.2,
            freq_update_target: 1000,
            mem_size: 1_000_000,
            mini_batch: 1000,
            freq_optim: 10,
            beta: 0.5,
            alpha: 0.1,
            her: false,
            goal_weighting: GoalWeighting::Entropy,
            max_steps: 100,
            goal_pool_size: DEFAULT_POOL_CAPACITY,
            activation: Activation::HardTanh,
        }
    }
}

/// Configuration of a whole run.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Registered environment name.
    pub env: String,

    /// Inline plan text, or a path to a plan file.
    pub map: Option<String>,

    /// Reward per cell code.
    pub rewards: CellRewards,

    pub seed: u64,

    pub nb_episodes: usize,

    /// Interval of evaluation phases in episodes.
    pub freq_test: usize,

    /// Number of greedy episodes per evaluation phase.
    pub nb_test: usize,

    /// Interval of checkpoints in episodes.
    pub freq_save: usize,

    /// Interval of debug renders in episodes.
    pub freq_verbose: usize,

    pub feat_extractor: FeatureKind,

    /// Probability that a move is replaced by a random other move.
    pub slip: f32,

    /// Root directory of run logs.
    pub xp_root: PathBuf,

    /// Root directory of checkpoints.
    pub models_root: PathBuf,

    pub agent: AgentConfig,
}

fn default_rewards() -> CellRewards {
    BTreeMap::from([(0, -0.001), (3, 1.0), (4, 1.0), (5, -1.0), (6, -1.0)])
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            env: "gridworld-v0".to_string(),
            map: None,
            rewards: default_rewards(),
            seed: 0,
            nb_episodes: 1000,
            freq_test: 100,
            nb_test: 10,
            freq_save: 1000,
            freq_verbose: 100,
            feat_extractor: FeatureKind::Position,
            slip: 0.0,
            xp_root: PathBuf::from("XP"),
            models_root: PathBuf::from("models"),
            agent: AgentConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Constructs [`ExperimentConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(rdr)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves [`ExperimentConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    /// Plan text of the grid. `map` is read as a file path when it names an
    /// existing file, as inline plan text otherwise.
    pub fn plan_text(&self) -> Result<String> {
        match &self.map {
            None => Ok(DEFAULT_PLAN.to_string()),
            Some(map) if Path::new(map.trim()).is_file() => Ok(fs::read_to_string(map.trim())?),
            Some(map) => Ok(map.clone()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let agent = &self.agent;
        let positive = [
            ("nb_test", self.nb_test),
            ("freq_test", self.freq_test),
            ("freq_save", self.freq_save),
            ("freq_verbose", self.freq_verbose),
            ("agent.mem_size", agent.mem_size),
            ("agent.mini_batch", agent.mini_batch),
            ("agent.freq_optim", agent.freq_optim),
            ("agent.freq_update_target", agent.freq_update_target),
            ("agent.max_steps", agent.max_steps),
            ("agent.goal_pool_size", agent.goal_pool_size),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(SubgoalError::invalid_config(name, "must be positive"));
            }
        }

        if agent.hidden.iter().any(|&width| width == 0) {
            return Err(SubgoalError::invalid_config("agent.hidden", "layer widths must be positive"));
        }

        let unit = [
            ("agent.gamma", agent.gamma as f64),
            ("agent.eps0", agent.eps0 as f64),
            ("agent.beta", agent.beta),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(SubgoalError::invalid_config(name.to_string(), format!("{} is outside [0, 1]", value)));
            }
        }
        if !(0.0..1.0).contains(&self.slip) {
            return Err(SubgoalError::invalid_config("slip".to_string(), format!("{} is outside [0, 1)", self.slip)));
        }
        if !(agent.lr.is_finite() && agent.lr > 0.0) {
            return Err(SubgoalError::invalid_config("agent.lr".to_string(), format!("{} is not a positive learning rate", agent.lr)));
        }
        if !agent.alpha.is_finite() {
            return Err(SubgoalError::invalid_config("agent.alpha".to_string(), format!("{} is not finite", agent.alpha)));
        }
        // Training starts once the replay holds more than one batch.
        if agent.mini_batch >= agent.mem_size {
            return Err(SubgoalError::invalid_config(
                "agent.mini_batch".to_string(),
                format!("{} must be below mem_size {}", agent.mini_batch, agent.mem_size),
            ));
        }
        Ok(())
    }
}
