use ndarray::Array2;
use crate::config::ExperimentConfig;
use crate::env::{ActionSpace, CellRewards, Environment, Observation, StepOutcome};
use crate::error::{Result, SubgoalError};
use crate::goals::GoalRecord;
use crate::experiment::goals_path;
use crate::tensorboard::MemorySink;
use crate::trainer::IgsTrainer;

const ROOM: &str = "\
1 1 1 1 1
1 2 0 0 1
1 0 0 0 1
1 0 0 3 1
1 1 1 1 1";

fn small_config(seed: u64) -> ExperimentConfig {
    let mut config = ExperimentConfig::default();
    config.map = Some(ROOM.to_string());
    config.seed = seed;
    config.nb_episodes = 30;
    config.freq_test = 10;
    config.nb_test = 2;
    config.freq_verbose = 10;
    config.agent.hidden = vec![16];
    config.agent.mem_size = 2000;
    config.agent.mini_batch = 8;
    config.agent.freq_optim = 2;
    config.agent.freq_update_target = 10;
    config.agent.max_steps = 20;
    config
}

#[test]
fn test_run_summary() {
    let mut trainer = IgsTrainer::new(small_config(1), MemorySink::new()).unwrap();
    let summary = trainer.run().unwrap();

    assert_eq!(summary.episodes, 30);
    assert!(summary.global_steps <= 30 * 20);
    assert_eq!(summary.global_steps, trainer.global_step());
    assert!(summary.optimization_steps > 0);
    assert!(summary.pool_size >= 1 && summary.pool_size <= 10);
    assert!(summary.subgoal_successes <= summary.subgoal_attempts);
    assert_eq!(summary.test_rewards.len(), 2);
    assert_eq!(trainer.agent().epoch, 30);

    let sink = trainer.sink();
    assert_eq!(sink.values("rewardTest").len(), 2);
    let test_steps: Vec<usize> = sink.records.iter().filter(|r| r.tag == "rewardTest").map(|r| r.step).collect();
    assert_eq!(test_steps, vec![1, 2]);
    let logged = sink.values("reward/goal").len();
    assert!(logged > 0);
    for tag in ["reward/isg", "train/loss", "train/mean", "finalposition/x", "finalposition/y"] {
        assert_eq!(sink.values(tag).len(), logged, "{}", tag);
    }
}

#[test]
fn test_every_step_is_committed() {
    let mut trainer = IgsTrainer::new(small_config(2), MemorySink::new()).unwrap();
    let mut total_steps = 0;
    for episode in 0..5 {
        let report = trainer.run_episode(episode, false).unwrap();
        assert!(report.steps <= 20);
        assert!(report.steps >= 1);
        assert!(report.subgoal_successes <= report.subgoal_attempts);
        total_steps += report.steps;
    }
    assert_eq!(trainer.replay().nentities(), total_steps);
    assert_eq!(trainer.global_step(), total_steps);
}

#[test]
fn test_her_doubles_stored_transitions() {
    let mut config = small_config(3);
    config.agent.her = true;
    let mut trainer = IgsTrainer::new(config, MemorySink::new()).unwrap();
    let report = trainer.run_episode(0, false).unwrap();
    assert_eq!(trainer.replay().nentities(), 2 * report.steps);

    let last = &report.final_phi;
    let relabeled = trainer.replay().iter().filter(|t| t.goal == *last).count();
    assert!(relabeled >= report.steps);
}

#[test]
fn test_direct_only_when_beta_zero() {
    let mut config = small_config(4);
    config.agent.beta = 0.0;
    let mut trainer = IgsTrainer::new(config, MemorySink::new()).unwrap();
    for episode in 0..10 {
        let report = trainer.run_episode(episode, false).unwrap();
        assert_eq!(report.subgoal_attempts, 0);
        assert!(report.direct.is_some());
    }
    assert_eq!(trainer.stats().total_attempts(), 0);
    assert!(!trainer.pool().is_empty());
}

#[test]
fn test_subgoals_only_when_beta_one() {
    let mut config = small_config(5);
    config.agent.beta = 1.0;
    let mut trainer = IgsTrainer::new(config, MemorySink::new()).unwrap();

    // The pool is empty on the first episode, so its goal is a direct one
    let first = trainer.run_episode(0, false).unwrap();
    assert!(first.direct.is_some());
    assert_eq!(first.subgoal_attempts, 0);
    assert_eq!(trainer.pool().len(), 1);

    let second = trainer.run_episode(1, false).unwrap();
    assert!(second.direct.is_none());
    assert_eq!(second.steps, 20);
    assert!(second.subgoal_attempts >= 1);
    assert_eq!(trainer.stats().total_attempts(), second.subgoal_attempts as u64);
    for goal in trainer.pool().iter() {
        assert!(trainer.stats().successes(goal) <= trainer.stats().attempts(goal));
    }
}

#[test]
fn test_pool_holds_final_states_without_duplicates() {
    let mut trainer = IgsTrainer::new(small_config(6), MemorySink::new()).unwrap();
    for episode in 0..15 {
        let report = trainer.run_episode(episode, false).unwrap();
        assert!(trainer.pool().contains(report.final_phi.view()));
    }
    let goals: Vec<_> = trainer.pool().iter().collect();
    for (i, a) in goals.iter().enumerate() {
        for b in &goals[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_test_phase_does_not_learn() {
    let mut trainer = IgsTrainer::new(small_config(7), MemorySink::new()).unwrap();
    for episode in 0..3 {
        trainer.run_episode(episode, false).unwrap();
    }
    let stored = trainer.replay().nentities();
    let steps = trainer.global_step();
    let iterations = trainer.agent().iteration;

    let mean = trainer.run_test_phase().unwrap();
    assert!(mean <= 1.0);
    assert_eq!(trainer.replay().nentities(), stored);
    assert_eq!(trainer.global_step(), steps);
    assert_eq!(trainer.agent().iteration, iterations);
    assert!(!trainer.agent().is_greedy());
    assert_eq!(trainer.sink().values("rewardTest"), vec![mean]);
}

#[test]
fn test_runs_are_reproducible() {
    let run = |seed| {
        let mut trainer = IgsTrainer::new(small_config(seed), MemorySink::new()).unwrap();
        let summary = trainer.run().unwrap();
        (summary, trainer.into_sink().records)
    };
    let (first_summary, first_records) = run(8);
    let (second_summary, second_records) = run(8);
    assert_eq!(first_summary, second_summary);
    assert_eq!(first_records, second_records);
}

#[test]
fn test_checkpoint_and_resume() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.bin");
    let mut config = small_config(9);
    config.nb_episodes = 5;
    config.freq_save = 2;

    let mut trainer = IgsTrainer::new(config.clone(), MemorySink::new()).unwrap().with_checkpoint(&path);
    let summary = trainer.run().unwrap();
    assert!(path.is_file());

    let goals: Vec<GoalRecord> = serde_json::from_str(&std::fs::read_to_string(goals_path(&path)).unwrap()).unwrap();
    assert_eq!(goals.len(), summary.pool_size);

    let mut resumed = IgsTrainer::new(config, MemorySink::new()).unwrap();
    resumed.load_agent(&path).unwrap();
    assert_eq!(resumed.agent().iteration, summary.optimization_steps);
    assert_eq!(resumed.agent().epoch, 5);
}

#[test]
fn test_load_agent_rejects_other_shapes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.bin");
    let trainer = IgsTrainer::new(small_config(10), MemorySink::new()).unwrap();
    trainer.agent().save(&path).unwrap();

    let mut config = small_config(10);
    config.feat_extractor = crate::features::FeatureKind::OneHot;
    let mut other = IgsTrainer::new(config, MemorySink::new()).unwrap();
    assert!(other.load_agent(&path).is_err());
}

/// Environment whose observations never show the agent.
struct BlindEnv;

impl Environment for BlindEnv {
    fn reset(&mut self) -> Observation {
        Array2::zeros((3, 3))
    }

    fn step(&mut self, _action: usize) -> Result<StepOutcome> {
        Ok(StepOutcome {
            observation: Array2::zeros((3, 3)),
            reward: 0.0,
            done: false,
        })
    }

    fn sample_goal(&mut self) -> (Observation, (usize, usize)) {
        (Array2::zeros((3, 3)), (0, 0))
    }

    fn seed(&mut self, _seed: u64) {}

    fn set_plan(&mut self, _plan: &str, _rewards: &CellRewards) -> Result<()> {
        Ok(())
    }

    fn render(&self) -> String {
        String::new()
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::new(2)
    }
}

#[test]
fn test_env_contract_violation_surfaces() {
    let mut trainer = IgsTrainer::with_environment(small_config(11), Box::new(BlindEnv), MemorySink::new()).unwrap();
    match trainer.run_episode(0, false) {
        Err(SubgoalError::EnvContract(_)) => {}
        other => panic!("expected EnvContract, got {:?}", other.map(|r| r.steps)),
    }
}
