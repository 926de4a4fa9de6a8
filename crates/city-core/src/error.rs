//! Error taxonomy for the simulation core.

use crate::{GameStatus, Role};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while loading the catalog or resolving a turn.
///
/// Selection-phase errors never mutate state: the caller re-prompts for a
/// valid selection. [`SimError::InvalidDistribution`] and
/// [`SimError::DuplicateOperator`] only occur while a registry is built.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// The operator is not currently eligible for the acting role.
    #[error("precondition failed for '{operator}': {reason}")]
    Precondition { operator: String, reason: String },
    /// The operator's cost exceeds the role's available budget.
    #[error("insufficient budget for '{operator}': {role} has {available}k, needs {needed}k")]
    InsufficientBudget {
        role: Role,
        operator: String,
        needed: Decimal,
        available: Decimal,
    },
    /// The selection does not refer to an operator offered this turn.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    /// Outcome or event probabilities are malformed.
    #[error("invalid distribution for '{name}': {reason}")]
    InvalidDistribution { name: String, reason: String },
    /// Two catalog entries share a name.
    #[error("duplicate operator name: {0}")]
    DuplicateOperator(String),
    /// The game already reached a terminal status.
    #[error("game is over: {0}")]
    GameOver(GameStatus),
}

impl SimError {
    /// Whether the turn can continue by prompting for another selection.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SimError::Precondition { .. }
                | SimError::InsufficientBudget { .. }
                | SimError::InvalidSelection(_)
        )
    }
}

/// Violations of the invariants every reachable state must satisfy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("sheltered {sheltered} + unsheltered {unsheltered} != homeless total {total}")]
    PopulationMismatch {
        sheltered: u64,
        unsheltered: u64,
        total: u64,
    },
    #[error("sheltered {sheltered} exceeds bed capacity {capacity}")]
    OverCapacity { sheltered: u64, capacity: u64 },
    #[error("{0} is out of range")]
    OutOfRange(&'static str),
    #[error("negative budget for {0}")]
    NegativeBudget(Role),
}

/// Errors produced while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}
