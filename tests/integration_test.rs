use subgoal::{
    agent::GoalDqnAgent,
    config::ExperimentConfig,
    experiment::{goals_path, Experiment},
    goals::GoalRecord,
    tensorboard::{ScalarSink, TensorboardWriter},
    trainer::IgsTrainer,
};
use std::fs;

const CORRIDOR_ROOM: &str = "\
1 1 1 1 1 1
1 2 0 0 0 1
1 1 1 1 0 1
1 3 0 0 0 1
1 1 1 1 1 1";

fn config_in(root: &std::path::Path) -> ExperimentConfig {
    let mut config = ExperimentConfig::default();
    config.map = Some(CORRIDOR_ROOM.to_string());
    config.seed = 3;
    config.nb_episodes = 40;
    config.freq_test = 20;
    config.nb_test = 3;
    config.freq_save = 20;
    config.xp_root = root.join("XP");
    config.models_root = root.join("models");
    config.agent.hidden = vec![32, 32];
    config.agent.mem_size = 5000;
    config.agent.mini_batch = 32;
    config.agent.freq_optim = 4;
    config.agent.freq_update_target = 50;
    config.agent.max_steps = 30;
    config.agent.her = true;
    config
}

#[test]
fn test_end_to_end_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let experiment = Experiment::create(&config).unwrap();
    let writer = TensorboardWriter::new(&experiment.run_dir).unwrap();
    let mut trainer = IgsTrainer::new(config.clone(), writer)
        .unwrap()
        .with_checkpoint(experiment.checkpoint.clone());
    let summary = trainer.run().unwrap();
    drop(trainer);

    assert_eq!(summary.episodes, 40);
    assert_eq!(summary.test_rewards.len(), 1);
    assert!(summary.optimization_steps > 0);

    let info: ExperimentConfig = ExperimentConfig::load(experiment.run_dir.join("info.yaml")).unwrap();
    assert_eq!(info, config);

    let scalars = fs::read_to_string(experiment.run_dir.join("scalars.csv")).unwrap();
    let mut lines = scalars.lines();
    assert_eq!(lines.next(), Some("step,tag,value,wall_time"));
    let rows: Vec<Vec<&str>> = lines.map(|line| line.split(',').collect()).collect();
    assert!(rows.iter().all(|row| row.len() == 4));
    assert!(rows.iter().any(|row| row[1] == "rewardTest" && row[0] == "1"));
    assert!(rows.iter().any(|row| row[1] == "reward/goal"));
    assert!(rows.iter().any(|row| row[1] == "finalposition/x"));

    let agent = GoalDqnAgent::load(&experiment.checkpoint).unwrap();
    assert_eq!(agent.epoch, 40);
    assert_eq!(agent.iteration, summary.optimization_steps);

    let goals: Vec<GoalRecord> =
        serde_json::from_str(&fs::read_to_string(goals_path(&experiment.checkpoint)).unwrap()).unwrap();
    assert_eq!(goals.len(), summary.pool_size);
    for record in &goals {
        assert!(record.successes <= record.attempts);
        assert!(record.entropy >= 0.0 && record.entropy <= std::f64::consts::LN_2 + 1e-12);
    }
}

#[test]
fn test_resume_from_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.nb_episodes = 10;
    let checkpoint = dir.path().join("agent.bin");

    let mut first = IgsTrainer::new(config.clone(), subgoal::tensorboard::MemorySink::new())
        .unwrap()
        .with_checkpoint(&checkpoint);
    let first_summary = first.run().unwrap();

    let mut second = IgsTrainer::new(config, subgoal::tensorboard::MemorySink::new()).unwrap();
    second.load_agent(&checkpoint).unwrap();
    let second_summary = second.run().unwrap();

    assert_eq!(second.agent().epoch, 20);
    assert!(second.agent().iteration >= first_summary.optimization_steps);
    assert_eq!(second_summary.episodes, 10);
}

#[test]
fn test_writer_flushes_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut writer = TensorboardWriter::new(dir.path().join("run")).unwrap();
        writer.direct_write("reward/goal", -0.5, 3).unwrap();
        writer.direct_write("rewardTest", 0.25, 1).unwrap();
    }
    let contents = fs::read_to_string(dir.path().join("run").join("scalars.csv")).unwrap();
    let rows: Vec<&str> = contents.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("3,reward/goal,-0.5,"));
    assert!(rows[2].starts_with("1,rewardTest,0.25,"));
}
