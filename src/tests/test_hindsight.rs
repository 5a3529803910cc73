use ndarray::array;
use crate::hindsight::{finalize, goal_reached, reward_for, TrajectoryBuffer, STEP_PENALTY, SUCCESS_REWARD};

fn three_step_buffer() -> TrajectoryBuffer {
    let mut buffer = TrajectoryBuffer::new();
    buffer.push(array![0.0, 0.0], 3, array![0.0, 1.0]);
    buffer.push(array![0.0, 1.0], 1, array![1.0, 1.0]);
    buffer.push(array![1.0, 1.0], 3, array![1.0, 2.0]);
    buffer
}

#[test]
fn test_goal_reached_is_elementwise() {
    assert!(goal_reached(array![1.0, 2.0].view(), array![1.0, 2.0].view()));
    assert!(!goal_reached(array![1.0, 2.0].view(), array![2.0, 1.0].view()));
    assert!(!goal_reached(array![1.0].view(), array![1.0, 0.0].view()));
    assert_eq!(reward_for(true), SUCCESS_REWARD);
    assert_eq!(reward_for(false), STEP_PENALTY);
}

#[test]
fn test_commit_without_her() {
    let mut buffer = three_step_buffer();
    let goal = array![1.0, 1.0];
    let transitions = buffer.commit(goal.view(), false);

    assert!(buffer.is_empty());
    assert_eq!(transitions.len(), 3);
    assert!(transitions.iter().all(|t| t.goal == goal));
    assert_eq!(transitions.iter().map(|t| t.done).collect::<Vec<_>>(), vec![false, true, false]);
    assert_eq!(transitions[1].reward, 1.0);
    assert_eq!(transitions[0].reward, -0.1);
}

#[test]
fn test_her_copies_follow_each_transition() {
    let buffer = three_step_buffer();
    let goal = array![5.0, 5.0];
    let transitions = finalize(buffer.steps(), goal.view(), true);
    assert_eq!(transitions.len(), 6);

    let last = array![1.0, 2.0];
    for pair in transitions.chunks(2) {
        assert_eq!(pair[0].goal, goal);
        assert_eq!(pair[1].goal, last);
        assert_eq!(pair[0].phi, pair[1].phi);
        assert_eq!(pair[0].action, pair[1].action);
    }

    let copies: Vec<_> = transitions.iter().skip(1).step_by(2).collect();
    for copy in &copies[..2] {
        assert!(!copy.done);
        assert_eq!(copy.reward, -0.1);
    }
    assert!(copies[2].done);
    assert_eq!(copies[2].reward, 1.0);
}

#[test]
fn test_her_copy_of_revisited_final_state() {
    let mut buffer = TrajectoryBuffer::new();
    buffer.push(array![0.0, 0.0], 3, array![0.0, 1.0]);
    buffer.push(array![0.0, 1.0], 2, array![0.0, 0.0]);
    buffer.push(array![0.0, 0.0], 3, array![0.0, 1.0]);

    let transitions = buffer.commit(array![9.0, 9.0].view(), true);
    let copies: Vec<_> = transitions.iter().skip(1).step_by(2).collect();
    assert_eq!(copies.iter().map(|t| t.done).collect::<Vec<_>>(), vec![true, false, true]);
    assert!(transitions.iter().step_by(2).all(|t| !t.done && t.reward == -0.1));
}

#[test]
fn test_reward_sum_and_empty_commit() {
    let buffer = three_step_buffer();
    assert_eq!(buffer.last_state(), Some(&array![1.0, 2.0]));
    let total = buffer.reward_sum(array![1.0, 2.0].view());
    assert!((total - (1.0 - 0.2)).abs() < 1e-6);

    let mut empty = TrajectoryBuffer::new();
    assert!(empty.commit(array![0.0].view(), true).is_empty());
}
