//! On-disk layout of a run: the log directory with its `info.yaml` and the
//! checkpoint location shared by all runs of the same agent configuration.
use chrono::Local;
use log::info;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use crate::config::ExperimentConfig;
use crate::error::Result;

/// Identifier of an agent configuration, used in directory and checkpoint names.
pub fn agent_id(config: &ExperimentConfig) -> String {
    let agent = &config.agent;
    let hidden = agent
        .hidden
        .iter()
        .map(|width| width.to_string())
        .collect::<Vec<_>>()
        .join("x");
    format!(
        "IGS_h{}_lr{}_g{}_eps0{}_clear{}_freqOptim{}_memsize{}",
        hidden, agent.lr, agent.gamma, agent.eps0, agent.freq_update_target, agent.freq_optim, agent.mem_size
    )
}

/// `{xp_root}/{env}/dqn-{agent_id}-{timestamp}`
pub fn run_dir(config: &ExperimentConfig, timestamp: &str) -> PathBuf {
    config
        .xp_root
        .join(&config.env)
        .join(format!("dqn-{}-{}", agent_id(config), timestamp))
}

/// `{models_root}/{env}/{agent_id}.bin`
pub fn checkpoint_path(config: &ExperimentConfig) -> PathBuf {
    config
        .models_root
        .join(&config.env)
        .join(format!("{}.bin", agent_id(config)))
}

/// Goal pool snapshot written next to a checkpoint.
pub fn goals_path(checkpoint: &Path) -> PathBuf {
    checkpoint.with_extension("goals.json")
}

/// Directories of one run, created on disk.
#[derive(Clone, Debug)]
pub struct Experiment {
    pub run_dir: PathBuf,
    pub checkpoint: PathBuf,
}

impl Experiment {
    /// Create the run and checkpoint directories and record the effective
    /// configuration in `info.yaml`.
    pub fn create(config: &ExperimentConfig) -> Result<Self> {
        let timestamp = Local::now().format("%Y%m%d-%H%M%S%.3f").to_string();
        let run_dir = run_dir(config, &timestamp);
        create_dir_all(&run_dir)?;

        let checkpoint = checkpoint_path(config);
        if let Some(parent) = checkpoint.parent() {
            create_dir_all(parent)?;
        }

        config.save(run_dir.join("info.yaml"))?;
        info!("Saving in {}", run_dir.display());
        Ok(Experiment { run_dir, checkpoint })
    }
}
