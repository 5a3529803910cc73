//! Feature extractors turning raw grid observations into the vectors the
//! agent, the goal pool and the replay memory work with.

use ndarray::Array1;
use serde::{Serialize, Deserialize};

use crate::env::Observation;
use crate::env::gridworld::AGENT;
use crate::error::{Result, SubgoalError};

pub trait FeatureExtractor {
    fn features(&self, observation: &Observation) -> Result<Array1<f32>>;

    fn out_size(&self) -> usize;
}

/// Extractor selection, as written in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    #[default]
    Position,
    OneHot,
    MapDump,
}

fn agent_cell(observation: &Observation) -> Result<(usize, usize)> {
    let agent = f32::from(AGENT);
    observation
        .indexed_iter()
        .find(|(_, &code)| code == agent)
        .map(|(pos, _)| pos)
        .ok_or_else(|| SubgoalError::EnvContract("observation has no agent cell".to_string()))
}

fn check_shape(observation: &Observation, rows: usize, cols: usize) -> Result<()> {
    if observation.dim() != (rows, cols) {
        return Err(SubgoalError::EnvContract(format!(
            "observation shape {:?} does not match extractor shape {:?}",
            observation.dim(),
            (rows, cols)
        )));
    }
    Ok(())
}

/// `[row, col]` of the agent.
#[derive(Clone, Copy, Debug, Default)]
pub struct PositionExtractor;

impl FeatureExtractor for PositionExtractor {
    fn features(&self, observation: &Observation) -> Result<Array1<f32>> {
        let (row, col) = agent_cell(observation)?;
        Ok(Array1::from(vec![row as f32, col as f32]))
    }

    fn out_size(&self) -> usize {
        2
    }
}

/// One-hot encoding of the agent cell over the whole grid.
#[derive(Clone, Copy, Debug)]
pub struct OneHotExtractor {
    rows: usize,
    cols: usize,
}

impl OneHotExtractor {
    pub fn new(rows: usize, cols: usize) -> Self {
        OneHotExtractor { rows, cols }
    }
}

impl FeatureExtractor for OneHotExtractor {
    fn features(&self, observation: &Observation) -> Result<Array1<f32>> {
        check_shape(observation, self.rows, self.cols)?;
        let (row, col) = agent_cell(observation)?;
        let mut encoded = Array1::zeros(self.out_size());
        encoded[row * self.cols + col] = 1.0;
        Ok(encoded)
    }

    fn out_size(&self) -> usize {
        self.rows * self.cols
    }
}

/// Row-major dump of every cell code.
#[derive(Clone, Copy, Debug)]
pub struct MapDumpExtractor {
    rows: usize,
    cols: usize,
}

impl MapDumpExtractor {
    pub fn new(rows: usize, cols: usize) -> Self {
        MapDumpExtractor { rows, cols }
    }
}

impl FeatureExtractor for MapDumpExtractor {
    fn features(&self, observation: &Observation) -> Result<Array1<f32>> {
        check_shape(observation, self.rows, self.cols)?;
        Ok(observation.iter().copied().collect())
    }

    fn out_size(&self) -> usize {
        self.rows * self.cols
    }
}

/// Build the extractor for `kind`, sized from a sample observation.
pub fn build_extractor(kind: FeatureKind, sample: &Observation) -> Box<dyn FeatureExtractor> {
    let (rows, cols) = sample.dim();
    match kind {
        FeatureKind::Position => Box::new(PositionExtractor),
        FeatureKind::OneHot => Box::new(OneHotExtractor::new(rows, cols)),
        FeatureKind::MapDump => Box::new(MapDumpExtractor::new(rows, cols)),
    }
}
