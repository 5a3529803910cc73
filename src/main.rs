use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use subgoal::config::ExperimentConfig;
use subgoal::experiment::Experiment;
use subgoal::tensorboard::TensorboardWriter;
use subgoal::trainer::IgsTrainer;

/// Train a goal-conditioned DQN agent with intermediate subgoal sampling.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML configuration file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Root directory of run logs
    #[arg(long)]
    out: Option<PathBuf>,

    /// Store hindsight copies of every transition
    #[arg(long)]
    her: bool,

    /// Agent checkpoint to resume from
    #[arg(long)]
    from_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ExperimentConfig::default(),
    };
    if let Some(episodes) = args.episodes {
        config.nb_episodes = episodes;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(out) = args.out {
        config.xp_root = out;
    }
    if args.her {
        config.agent.her = true;
    }
    config.validate()?;

    let experiment = Experiment::create(&config)?;
    let writer = TensorboardWriter::new(&experiment.run_dir)?;
    let mut trainer = IgsTrainer::new(config, writer)?.with_checkpoint(experiment.checkpoint.clone());
    if let Some(path) = &args.from_file {
        trainer
            .load_agent(path)
            .with_context(|| format!("loading agent from {}", path.display()))?;
    }

    let summary = trainer.run()?;
    info!(
        "done: {} episodes, {} steps, {} optimization steps, {} goals in pool, {}/{} subgoals reached",
        summary.episodes,
        summary.global_steps,
        summary.optimization_steps,
        summary.pool_size,
        summary.subgoal_successes,
        summary.subgoal_attempts
    );
    if let Some(last) = summary.test_rewards.last() {
        info!("last test reward {}", last);
    }
    info!("checkpoint at {}", experiment.checkpoint.display());
    Ok(())
}
