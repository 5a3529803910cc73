use ndarray::array;
use crate::env::{make_env, CellRewards, Environment, GridWorld, DEFAULT_PLAN};
use crate::env::gridworld::parse_plan;
use crate::features::{build_extractor, FeatureExtractor, FeatureKind, MapDumpExtractor, OneHotExtractor, PositionExtractor};
use crate::error::SubgoalError;

const CORRIDOR: &str = "1 1 1 1 1\n1 2 0 3 1\n1 1 1 1 1";

fn corridor() -> GridWorld {
    let rewards = CellRewards::from([(0, -0.001), (3, 1.0)]);
    GridWorld::from_plan(CORRIDOR, rewards, 0.0).unwrap()
}

#[test]
fn test_parse_plan_formats() {
    let (spaced, start) = parse_plan(CORRIDOR).unwrap();
    let (packed, packed_start) = parse_plan("11111\n12031\n11111\n").unwrap();
    assert_eq!(spaced, packed);
    assert_eq!(start, (1, 1));
    assert_eq!(packed_start, start);
    assert_eq!(spaced[[1, 1]], 0);
}

#[test]
fn test_parse_plan_rejects_bad_plans() {
    for plan in ["", "1 1\n1", "1 0 0\n0 0 0", "1 2\n2 0", "1 9 2"] {
        match parse_plan(plan) {
            Err(SubgoalError::EnvContract(_)) => {}
            other => panic!("plan {:?} should be rejected, got {:?}", plan, other.map(|p| p.1)),
        }
    }
}

#[test]
fn test_moves_and_walls() {
    let mut env = corridor();
    let observation = env.reset();
    assert_eq!(observation[[1, 1]], 2.0);

    // up is a wall
    let outcome = env.step(0).unwrap();
    assert_eq!(env.position(), (1, 1));
    assert!(!outcome.done);

    env.step(3).unwrap();
    assert_eq!(env.position(), (1, 2));
    let outcome = env.step(3).unwrap();
    assert_eq!(env.position(), (1, 3));
    assert!(outcome.done);
    assert_eq!(outcome.reward, 1.0);
    assert_eq!(outcome.observation[[1, 3]], 2.0);

    env.step(2).unwrap();
    assert_eq!(env.position(), (1, 2));
    assert_eq!(env.reset()[[1, 1]], 2.0);
}

#[test]
fn test_invalid_action() {
    let mut env = corridor();
    env.reset();
    match env.step(4) {
        Err(SubgoalError::InvalidAction { action: 4, max_actions: 4 }) => {}
        other => panic!("expected InvalidAction, got {:?}", other.map(|o| o.reward)),
    }
}

#[test]
fn test_slip_changes_some_moves() {
    let mut env = GridWorld::from_plan("0 0 0\n0 2 0\n0 0 0", CellRewards::new(), 0.9).unwrap();
    env.seed(3);
    let mut slipped = 0;
    for _ in 0..100 {
        env.reset();
        env.step(0).unwrap();
        if env.position() != (0, 1) {
            slipped += 1;
        }
    }
    assert!(slipped > 50, "only {} slips", slipped);
    assert!(GridWorld::from_plan(CORRIDOR, CellRewards::new(), 1.0).is_err());
}

#[test]
fn test_sample_goal_is_free_cell_and_seeded() {
    let mut first = GridWorld::from_plan(DEFAULT_PLAN, CellRewards::new(), 0.0).unwrap();
    let mut second = GridWorld::from_plan(DEFAULT_PLAN, CellRewards::new(), 0.0).unwrap();
    first.seed(42);
    second.seed(42);
    let free = first.free_cells();
    for _ in 0..50 {
        let (observation, cell) = first.sample_goal();
        assert!(free.contains(&cell));
        assert_eq!(observation[cell], 2.0);
        assert_eq!(second.sample_goal().1, cell);
    }
}

#[test]
fn test_render_and_set_plan() {
    let mut env = corridor();
    env.reset();
    assert_eq!(env.render(), "#####\n#A.G#\n#####\n");

    env.set_plan("1 1 1\n1 2 1\n1 1 1", &CellRewards::new()).unwrap();
    assert_eq!(env.shape(), (3, 3));
    assert_eq!(env.render(), "###\n#A#\n###\n");
}

#[test]
fn test_make_env() {
    let rewards = CellRewards::new();
    let env = make_env("gridworld-v0", DEFAULT_PLAN, &rewards, 0.0).unwrap();
    assert_eq!(env.action_space().n, 4);
    assert!(make_env("cartpole", DEFAULT_PLAN, &rewards, 0.0).is_err());
}

#[test]
fn test_position_extractor() {
    let mut env = corridor();
    let observation = env.reset();
    let phi = PositionExtractor.features(&observation).unwrap();
    assert_eq!(phi, array![1.0, 1.0]);
    assert_eq!(PositionExtractor.out_size(), 2);

    let no_agent = observation.mapv(|v| if v == 2.0 { 0.0 } else { v });
    assert!(PositionExtractor.features(&no_agent).is_err());
}

#[test]
fn test_one_hot_and_map_dump() {
    let mut env = corridor();
    let observation = env.reset();

    let one_hot = OneHotExtractor::new(3, 5);
    let phi = one_hot.features(&observation).unwrap();
    assert_eq!(phi.len(), 15);
    assert_eq!(phi.sum(), 1.0);
    assert_eq!(phi[6], 1.0);

    let dump = MapDumpExtractor::new(3, 5);
    let phi = dump.features(&observation).unwrap();
    assert_eq!(phi.len(), dump.out_size());
    assert_eq!(phi[6], 2.0);
    assert_eq!(phi[8], 3.0);

    assert!(MapDumpExtractor::new(4, 4).features(&observation).is_err());
}

#[test]
fn test_build_extractor_sizes() {
    let mut env = GridWorld::from_plan(DEFAULT_PLAN, CellRewards::new(), 0.0).unwrap();
    let observation = env.reset();
    let (rows, cols) = env.shape();
    assert_eq!(build_extractor(FeatureKind::Position, &observation).out_size(), 2);
    assert_eq!(build_extractor(FeatureKind::OneHot, &observation).out_size(), rows * cols);
    assert_eq!(build_extractor(FeatureKind::MapDump, &observation).out_size(), rows * cols);
}
