//! Per-attempt trajectory buffering and hindsight relabeling.
//!
//! During an attempt only `(phi, action, phi_next)` is known; reward and
//! termination depend on the goal the attempt is finally judged against.
//! [`TrajectoryBuffer`] accumulates those partial steps and [`finalize`]
//! turns them into stored [`Transition`]s, optionally adding a copy of each
//! step relabeled against the state the trajectory actually ended in.

use ndarray::{Array1, ArrayView1};

use crate::replay_buffer::Transition;

/// Reward for a transition that lands on its goal.
pub const SUCCESS_REWARD: f32 = 1.0;

/// Reward for every other transition.
pub const STEP_PENALTY: f32 = -0.1;

/// Element-wise equality between a reached feature vector and a goal.
pub fn goal_reached(phi: ArrayView1<f32>, goal: ArrayView1<f32>) -> bool {
    phi.len() == goal.len() && phi.iter().zip(goal.iter()).all(|(a, b)| a == b)
}

pub fn reward_for(achieved: bool) -> f32 {
    if achieved {
        SUCCESS_REWARD
    } else {
        STEP_PENALTY
    }
}

/// A step whose reward and termination are not yet known.
#[derive(Clone, Debug, PartialEq)]
pub struct PartialTransition {
    pub phi: Array1<f32>,
    pub action: usize,
    pub phi_next: Array1<f32>,
}

impl PartialTransition {
    /// Complete this step against `goal`.
    pub fn label(&self, goal: ArrayView1<f32>) -> Transition {
        let done = goal_reached(self.phi_next.view(), goal);
        Transition {
            phi: self.phi.clone(),
            action: self.action,
            phi_next: self.phi_next.clone(),
            reward: reward_for(done),
            done,
            goal: goal.to_owned(),
        }
    }
}

/// Accumulate-then-commit buffer for the steps of one attempt.
#[derive(Clone, Debug, Default)]
pub struct TrajectoryBuffer {
    steps: Vec<PartialTransition>,
}

impl TrajectoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, phi: Array1<f32>, action: usize, phi_next: Array1<f32>) {
        self.steps.push(PartialTransition { phi, action, phi_next });
    }

    /// State reached by the last step, the hindsight goal.
    pub fn last_state(&self) -> Option<&Array1<f32>> {
        self.steps.last().map(|step| &step.phi_next)
    }

    /// Undiscounted return of the buffered steps judged against `goal`.
    pub fn reward_sum(&self, goal: ArrayView1<f32>) -> f32 {
        self.steps
            .iter()
            .map(|step| reward_for(goal_reached(step.phi_next.view(), goal)))
            .sum()
    }

    pub fn steps(&self) -> &[PartialTransition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Finalize the buffered steps against `goal` and empty the buffer.
    pub fn commit(&mut self, goal: ArrayView1<f32>, her: bool) -> Vec<Transition> {
        let transitions = finalize(&self.steps, goal, her);
        self.steps.clear();
        transitions
    }
}

/// Label every step against `goal`; with `her`, follow each one with a copy
/// labeled against the trajectory's final state.
pub fn finalize(steps: &[PartialTransition], goal: ArrayView1<f32>, her: bool) -> Vec<Transition> {
    let hindsight_goal = match (her, steps.last()) {
        (true, Some(last)) => Some(last.phi_next.clone()),
        _ => None,
    };

    let mut transitions = Vec::with_capacity(steps.len() * if her { 2 } else { 1 });
    for step in steps {
        transitions.push(step.label(goal));
        if let Some(achieved) = &hindsight_goal {
            transitions.push(step.label(achieved.view()));
        }
    }
    transitions
}
