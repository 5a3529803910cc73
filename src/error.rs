use thiserror::Error;

/// Result type for subgoal operations
pub type Result<T> = std::result::Result<T, SubgoalError>;

/// Main error type for the subgoal crate
#[derive(Debug, Error)]
pub enum SubgoalError {
    /// Missing or out-of-range configuration value
    #[error("Invalid configuration '{name}': {reason}")]
    InvalidConfig {
        name: String,
        reason: String,
    },

    /// Invalid argument passed to a library call
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// The environment or feature extractor returned something unexpected
    #[error("Environment contract violated: {0}")]
    EnvContract(String),

    /// A batch larger than the stored transitions was requested
    #[error("Replay memory underflow: requested {requested} transitions but only {available} stored")]
    ReplayUnderflow {
        requested: usize,
        available: usize,
    },

    /// Goal sampling on an empty pool
    #[error("Goal pool is empty")]
    EmptyGoalPool,

    /// Invalid dimensions for operations
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid action
    #[error("Invalid action {action}: must be less than {max_actions}")]
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Numerical computation errors (NaN losses, degenerate weights)
    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

// Helper functions for common error patterns
impl SubgoalError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        SubgoalError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_config<S: Into<String>>(name: S, reason: S) -> Self {
        SubgoalError::InvalidConfig {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        SubgoalError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
