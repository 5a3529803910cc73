//! Episode loop of intermediate subgoal sampling.
//!
//! An outer episode is a sequence of attempts sharing one step budget. Each
//! attempt pursues a goal: with probability `beta` a goal drawn from the pool
//! of previously reached states (a subgoal), otherwise a goal proposed by the
//! environment (a direct goal). Subgoal attempts update the pool statistics and
//! hand over to the next attempt from wherever the agent stands; the first
//! direct attempt to finish ends the outer episode. The state the episode ends
//! in joins the pool.
use log::{debug, info, log_enabled, trace, Level};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::agent::{GoalDqnAgent, GoalDqnAgentBuilder, TrainStats};
use crate::config::ExperimentConfig;
use crate::env::{make_env, Environment, Observation};
use crate::error::{Result, SubgoalError};
use crate::experiment::goals_path;
use crate::features::{build_extractor, FeatureExtractor};
use crate::goals::{sample_goal, GoalKey, GoalPool, GoalStats};
use crate::hindsight::{goal_reached, reward_for, TrajectoryBuffer};
use crate::optimizer::{Adam, OptimizerWrapper};
use crate::replay_buffer::ReplayMemory;
use crate::tensorboard::ScalarSink;

/// Outcome of the direct attempt that closed an outer episode.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectOutcome {
    pub reached: bool,
    /// Return of the direct attempt alone.
    pub reward_goal: f32,
    /// Return of every attempt of the episode.
    pub reward_isg: f32,
}

/// What happened during one outer episode.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeReport {
    pub steps: usize,
    pub subgoal_attempts: usize,
    pub subgoal_successes: usize,
    /// `None` when the budget ran out during a subgoal attempt.
    pub direct: Option<DirectOutcome>,
    pub train_steps: usize,
    pub final_phi: Array1<f32>,
}

/// Totals of a finished run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub episodes: usize,
    pub global_steps: usize,
    pub optimization_steps: usize,
    pub pool_size: usize,
    pub subgoal_attempts: u64,
    pub subgoal_successes: u64,
    /// Mean direct-goal return of each evaluation phase, in order.
    pub test_rewards: Vec<f32>,
}

/// Owner of every piece of mutable training state.
pub struct IgsTrainer<S: ScalarSink> {
    config: ExperimentConfig,
    env: Box<dyn Environment>,
    extractor: Box<dyn FeatureExtractor>,
    agent: GoalDqnAgent,
    replay: ReplayMemory,
    pool: GoalPool,
    stats: GoalStats,
    trajectory: TrajectoryBuffer,
    rng: StdRng,
    sink: S,
    checkpoint: Option<PathBuf>,
    observation: Observation,
    global_step: usize,
    itest: usize,
    test_rewards: Vec<f32>,
}

impl<S: ScalarSink> IgsTrainer<S> {
    /// Build the environment named in `config` and a fresh agent.
    pub fn new(config: ExperimentConfig, sink: S) -> Result<Self> {
        let plan = config.plan_text()?;
        let env = make_env(&config.env, &plan, &config.rewards, config.slip)?;
        Self::with_environment(config, env, sink)
    }

    /// Build a trainer around an already constructed environment.
    pub fn with_environment(config: ExperimentConfig, mut env: Box<dyn Environment>, sink: S) -> Result<Self> {
        config.validate()?;
        env.seed(config.seed);
        let observation = env.reset();
        let extractor = build_extractor(config.feat_extractor, &observation);
        info!("feature size {}", extractor.out_size());

        let mut rng = StdRng::seed_from_u64(config.seed);
        let agent_config = &config.agent;
        let agent = GoalDqnAgentBuilder::new()
            .feature_size(extractor.out_size())
            .num_actions(env.action_space().n)
            .hidden(&agent_config.hidden)
            .activation(agent_config.activation)
            .epsilon(agent_config.eps0)
            .gamma(agent_config.gamma)
            .learning_rate(agent_config.lr)
            .freq_update_target(agent_config.freq_update_target)
            .optimizer(OptimizerWrapper::Adam(Adam::default()))
            .build(&mut rng)?;

        Ok(IgsTrainer {
            replay: ReplayMemory::new(agent_config.mem_size)?,
            pool: GoalPool::new(agent_config.goal_pool_size),
            stats: GoalStats::new(),
            trajectory: TrajectoryBuffer::new(),
            config,
            env,
            extractor,
            agent,
            rng,
            sink,
            checkpoint: None,
            observation,
            global_step: 0,
            itest: 0,
            test_rewards: Vec::new(),
        })
    }

    /// Save checkpoints to `path` during and at the end of [`IgsTrainer::run`].
    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(path.into());
        self
    }

    /// Replace the agent with one loaded from a checkpoint.
    pub fn load_agent(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let agent = GoalDqnAgent::load(path.as_ref())?;
        if agent.feature_size() != self.agent.feature_size() || agent.num_actions() != self.agent.num_actions() {
            return Err(SubgoalError::dimension_mismatch(
                format!("{} features, {} actions", self.agent.feature_size(), self.agent.num_actions()),
                format!("{} features, {} actions", agent.feature_size(), agent.num_actions()),
            ));
        }
        info!("Loaded agent from {} ({} optimization steps)", path.as_ref().display(), agent.iteration);
        self.agent = agent;
        Ok(())
    }

    pub fn agent(&self) -> &GoalDqnAgent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut GoalDqnAgent {
        &mut self.agent
    }

    pub fn pool(&self) -> &GoalPool {
        &self.pool
    }

    pub fn stats(&self) -> &GoalStats {
        &self.stats
    }

    pub fn replay(&self) -> &ReplayMemory {
        &self.replay
    }

    pub fn global_step(&self) -> usize {
        self.global_step
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn features(&self, observation: &Observation) -> Result<Array1<f32>> {
        let phi = self.extractor.features(observation)?;
        if phi.len() != self.extractor.out_size() {
            return Err(SubgoalError::EnvContract(format!(
                "extractor produced {} features, declared {}",
                phi.len(),
                self.extractor.out_size()
            )));
        }
        Ok(phi)
    }

    fn direct_goal(&mut self) -> Result<Array1<f32>> {
        let (goal_observation, _) = self.env.sample_goal();
        self.features(&goal_observation)
    }

    /// Goal of the next attempt, with its pool key when it is a subgoal.
    pub fn select_goal(&mut self) -> Result<(Array1<f32>, Option<GoalKey>)> {
        let subgoal = self.rng.gen::<f64>() < self.config.agent.beta && !self.pool.is_empty();
        if subgoal {
            let key = sample_goal(
                &self.pool,
                &self.stats,
                self.config.agent.alpha,
                self.config.agent.goal_weighting,
                &mut self.rng,
            )?;
            Ok((key.to_array(), Some(key)))
        } else {
            Ok((self.direct_goal()?, None))
        }
    }

    fn optimize(&mut self) -> Result<TrainStats> {
        let batch = self.replay.sample(self.config.agent.mini_batch, &mut self.rng)?;
        self.agent.train(&batch)
    }

    /// Run one outer episode, training as it goes.
    pub fn run_episode(&mut self, episode: usize, verbose: bool) -> Result<EpisodeReport> {
        let agent_config = self.config.agent.clone();
        self.observation = self.env.reset();
        let mut phi = self.features(&self.observation)?;

        let mut steps = 0;
        let mut rsum = 0.0;
        let mut loss_sum = 0.0;
        let mut mean_sum = 0.0;
        let mut train_steps = 0;
        let mut subgoal_attempts = 0;
        let mut subgoal_successes = 0;
        let mut direct = None;

        while steps < agent_config.max_steps {
            let (goal, key) = self.select_goal()?;

            let achieved = loop {
                let action = self.agent.act(phi.view(), goal.view(), &mut self.rng)?;
                let outcome = self.env.step(action)?;
                let phi_next = self.features(&outcome.observation)?;
                let achieved = goal_reached(phi_next.view(), goal.view());
                rsum += reward_for(achieved);

                self.trajectory.push(phi, action, phi_next.clone());
                self.observation = outcome.observation;
                phi = phi_next;
                self.global_step += 1;
                steps += 1;

                if self.global_step % agent_config.freq_optim == 0 && self.replay.nentities() > agent_config.mini_batch {
                    let stats = self.optimize()?;
                    loss_sum += stats.loss;
                    mean_sum += stats.mean_reward;
                    train_steps += 1;
                }
                if self.agent.maybe_update_target(self.global_step)? {
                    trace!("target network synchronised at step {}", self.global_step);
                }

                if achieved || steps >= agent_config.max_steps {
                    break achieved;
                }
            };

            if verbose {
                debug!("episode {} attempt end:\n{}", episode, self.env.render());
            }

            let attempt_steps = self.trajectory.len();
            let reward_goal = self.trajectory.reward_sum(goal.view());
            for transition in self.trajectory.commit(goal.view(), agent_config.her) {
                self.replay.store(transition);
            }
            trace!(
                "{} attempt on {}: achieved={} after {} steps",
                if key.is_some() { "subgoal" } else { "direct" },
                goal,
                achieved,
                attempt_steps
            );

            match key {
                Some(key) => {
                    self.stats.record_attempt(&key, achieved);
                    subgoal_attempts += 1;
                    if achieved {
                        subgoal_successes += 1;
                    }
                }
                None => {
                    let loss = loss_sum / train_steps.max(1) as f32;
                    let mean = mean_sum / train_steps.max(1) as f32;
                    if episode % 10 == 0 {
                        info!("{} rsum={}, {} actions", episode, rsum, steps);
                    }
                    self.sink.direct_write("reward/isg", rsum, episode)?;
                    self.sink.direct_write("reward/goal", reward_goal, episode)?;
                    self.sink.direct_write("train/loss", loss, episode)?;
                    self.sink.direct_write("train/mean", mean, episode)?;
                    if phi.len() >= 2 {
                        self.sink.direct_write("finalposition/x", phi[0], episode)?;
                        self.sink.direct_write("finalposition/y", phi[1], episode)?;
                    }
                    direct = Some(DirectOutcome {
                        reached: achieved,
                        reward_goal,
                        reward_isg: rsum,
                    });
                    break;
                }
            }
        }

        if self.pool.insert(phi.view()) {
            trace!("pool now holds {} goals", self.pool.len());
        }
        self.agent.epoch += 1;

        Ok(EpisodeReport {
            steps,
            subgoal_attempts,
            subgoal_successes,
            direct,
            train_steps,
            final_phi: phi,
        })
    }

    /// One greedy episode toward a direct goal, without learning.
    /// Returns the direct-goal return.
    pub fn run_test_episode(&mut self) -> Result<f32> {
        let was_greedy = self.agent.is_greedy();
        self.agent.set_greedy(true);
        let result = self.greedy_rollout();
        self.agent.set_greedy(was_greedy);
        result
    }

    fn greedy_rollout(&mut self) -> Result<f32> {
        self.observation = self.env.reset();
        let mut phi = self.features(&self.observation)?;
        let goal = self.direct_goal()?;

        let mut rsum = 0.0;
        for _ in 0..self.config.agent.max_steps {
            let action = self.agent.act(phi.view(), goal.view(), &mut self.rng)?;
            let outcome = self.env.step(action)?;
            phi = self.features(&outcome.observation)?;
            self.observation = outcome.observation;

            let achieved = goal_reached(phi.view(), goal.view());
            rsum += reward_for(achieved);
            if achieved {
                break;
            }
        }
        Ok(rsum)
    }

    /// Run `nb_test` evaluation episodes and log their mean return as `rewardTest`.
    pub fn run_test_phase(&mut self) -> Result<f32> {
        let nb_test = self.config.nb_test;
        let mut total = 0.0;
        for _ in 0..nb_test {
            total += self.run_test_episode()?;
        }
        let mean = total / nb_test.max(1) as f32;
        self.itest += 1;
        info!("End of test, mean reward={}", mean);
        self.sink.direct_write("rewardTest", mean, self.itest)?;
        self.test_rewards.push(mean);
        Ok(mean)
    }

    /// Write the agent and a JSON snapshot of the goal pool to the checkpoint path.
    pub fn save_checkpoint(&self) -> Result<()> {
        let path = match &self.checkpoint {
            Some(path) => path,
            None => return Ok(()),
        };
        self.agent.save(path)?;
        let writer = BufWriter::new(File::create(goals_path(path))?);
        serde_json::to_writer_pretty(writer, &self.stats.snapshot(&self.pool))?;
        debug!("checkpoint written to {}", path.display());
        Ok(())
    }

    /// Train for `nb_episodes` outer episodes.
    pub fn run(&mut self) -> Result<RunSummary> {
        let nb_episodes = self.config.nb_episodes;
        info!(
            "training for {} episodes (her={}, beta={}, alpha={})",
            nb_episodes, self.config.agent.her, self.config.agent.beta, self.config.agent.alpha
        );

        for episode in 0..nb_episodes {
            if episode > 0 && episode % self.config.freq_test == 0 {
                self.run_test_phase()?;
            }

            let verbose = episode % self.config.freq_verbose == 0 && log_enabled!(Level::Debug);
            self.run_episode(episode, verbose)?;

            if (episode + 1) % self.config.freq_save == 0 {
                self.save_checkpoint()?;
            }
        }

        self.save_checkpoint()?;
        self.sink.flush()?;
        self.env.close();

        Ok(RunSummary {
            episodes: nb_episodes,
            global_steps: self.global_step,
            optimization_steps: self.agent.iteration,
            pool_size: self.pool.len(),
            subgoal_attempts: self.stats.total_attempts(),
            subgoal_successes: self.stats.total_successes(),
            test_rewards: self.test_rewards.clone(),
        })
    }
}
