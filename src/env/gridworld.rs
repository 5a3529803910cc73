use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SubgoalError};
use super::{ActionSpace, CellRewards, Environment, Observation, StepOutcome};

pub const EMPTY: u8 = 0;
pub const WALL: u8 = 1;
pub const AGENT: u8 = 2;
pub const GREEN: u8 = 3;
pub const YELLOW: u8 = 4;
pub const RED: u8 = 5;
pub const PINK: u8 = 6;

/// Moves in action order: up, down, left, right.
const MOVES: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Plan used when the configuration does not supply one.
pub const DEFAULT_PLAN: &str = "\
1 1 1 1 1 1 1
1 0 0 0 0 3 1
1 0 1 1 0 0 1
1 0 0 1 0 5 1
1 2 0 0 0 0 1
1 1 1 1 1 1 1";

/// Grid-world navigation task.
///
/// The plan is a rectangle of cell codes (`0` empty, `1` wall, `2` agent start,
/// `3`..`6` coloured reward cells). Walls and the grid border block movement.
/// With probability `slip` the intended move is replaced by one of the other three.
pub struct GridWorld {
    plan: Array2<u8>,
    start: (usize, usize),
    agent: (usize, usize),
    rewards: CellRewards,
    slip: f32,
    rng: StdRng,
}

/// Parse a plan into its cell matrix (agent cell cleared) and the agent start.
///
/// Rows are either whitespace-separated codes (`1 0 2`) or packed digits (`102`).
pub fn parse_plan(text: &str) -> Result<(Array2<u8>, (usize, usize))> {
    let mut rows: Vec<Vec<u8>> = Vec::new();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let row = if tokens.len() == 1 {
            line.chars().map(|c| cell_code(&c.to_string())).collect::<Result<Vec<_>>>()?
        } else {
            tokens.iter().map(|token| cell_code(token)).collect::<Result<Vec<_>>>()?
        };
        rows.push(row);
    }

    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    if height == 0 || width == 0 {
        return Err(SubgoalError::EnvContract("plan is empty".to_string()));
    }
    if let Some(bad) = rows.iter().position(|row| row.len() != width) {
        return Err(SubgoalError::EnvContract(format!(
            "plan row {} has {} cells, expected {}",
            bad,
            rows[bad].len(),
            width
        )));
    }

    let mut plan = Array2::from_shape_vec((height, width), rows.into_iter().flatten().collect())
        .map_err(|e| SubgoalError::EnvContract(e.to_string()))?;

    let agents: Vec<(usize, usize)> = plan
        .indexed_iter()
        .filter(|(_, &code)| code == AGENT)
        .map(|(pos, _)| pos)
        .collect();
    let start = match agents.as_slice() {
        [single] => *single,
        _ => {
            return Err(SubgoalError::EnvContract(format!(
                "plan must contain exactly one agent cell, found {}",
                agents.len()
            )))
        }
    };
    plan[start] = EMPTY;
    Ok((plan, start))
}

fn cell_code(token: &str) -> Result<u8> {
    match token.parse::<u8>() {
        Ok(code) if code <= PINK => Ok(code),
        _ => Err(SubgoalError::EnvContract(format!("invalid cell code '{}'", token))),
    }
}

impl GridWorld {
    pub fn from_plan(text: &str, rewards: CellRewards, slip: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&slip) {
            return Err(SubgoalError::invalid_parameter("slip".to_string(), format!("{} is outside [0, 1)", slip)));
        }
        let (plan, start) = parse_plan(text)?;
        Ok(GridWorld {
            plan,
            start,
            agent: start,
            rewards,
            slip,
            rng: StdRng::seed_from_u64(0),
        })
    }

    pub fn position(&self) -> (usize, usize) {
        self.agent
    }

    pub fn shape(&self) -> (usize, usize) {
        self.plan.dim()
    }

    /// Every cell the agent can stand on.
    pub fn free_cells(&self) -> Vec<(usize, usize)> {
        self.plan
            .indexed_iter()
            .filter(|(_, &code)| code != WALL)
            .map(|(pos, _)| pos)
            .collect()
    }

    fn observation_at(&self, position: (usize, usize)) -> Observation {
        let mut observation = self.plan.mapv(f32::from);
        observation[position] = f32::from(AGENT);
        observation
    }

    fn destination(&self, action: usize) -> (usize, usize) {
        let (dr, dc) = MOVES[action];
        let (rows, cols) = self.plan.dim();
        let row = self.agent.0 as isize + dr;
        let col = self.agent.1 as isize + dc;
        if row < 0 || col < 0 || row as usize >= rows || col as usize >= cols {
            return self.agent;
        }
        let target = (row as usize, col as usize);
        if self.plan[target] == WALL {
            self.agent
        } else {
            target
        }
    }
}

impl Environment for GridWorld {
    fn reset(&mut self) -> Observation {
        self.agent = self.start;
        self.observation_at(self.agent)
    }

    fn step(&mut self, action: usize) -> Result<StepOutcome> {
        if !self.action_space().contains(action) {
            return Err(SubgoalError::InvalidAction {
                action,
                max_actions: MOVES.len(),
            });
        }

        let action = if self.slip > 0.0 && self.rng.gen::<f32>() < self.slip {
            (action + self.rng.gen_range(1..MOVES.len())) % MOVES.len()
        } else {
            action
        };

        self.agent = self.destination(action);
        let code = self.plan[self.agent];
        Ok(StepOutcome {
            observation: self.observation_at(self.agent),
            reward: self.rewards.get(&code).copied().unwrap_or(0.0),
            done: code == GREEN || code == RED,
        })
    }

    fn sample_goal(&mut self) -> (Observation, (usize, usize)) {
        let cells = self.free_cells();
        // parse_plan guarantees the start cell, so `cells` is never empty
        let cell = cells[self.rng.gen_range(0..cells.len())];
        (self.observation_at(cell), cell)
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn set_plan(&mut self, plan: &str, rewards: &CellRewards) -> Result<()> {
        let (plan, start) = parse_plan(plan)?;
        self.plan = plan;
        self.start = start;
        self.agent = start;
        self.rewards = rewards.clone();
        Ok(())
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for (row, line) in self.plan.outer_iter().enumerate() {
            for (col, &code) in line.iter().enumerate() {
                let symbol = if (row, col) == self.agent {
                    'A'
                } else {
                    match code {
                        EMPTY => '.',
                        WALL => '#',
                        GREEN => 'G',
                        YELLOW => 'Y',
                        RED => 'R',
                        PINK => 'P',
                        _ => '?',
                    }
                };
                out.push(symbol);
            }
            out.push('\n');
        }
        out
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::new(MOVES.len())
    }
}
