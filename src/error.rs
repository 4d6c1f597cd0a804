//! Error types.
//!
//! - [`ModelError`]: malformed input, found by validation before search.
//! - [`DomainError`]: misuse of the domain store; a solver bug, never a
//!   user error.
//! - [`SolveError`]: everything that can stop a solve from producing an
//!   outcome. Infeasibility is *not* an error; it is a
//!   [`SolveOutcome`](crate::solver::SolveOutcome).

use thiserror::Error;

use crate::models::{ModeId, TaskId};
use crate::solver::VarId;

/// A problem with the input model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Horizon must be non-negative, got {0}")]
    NegativeHorizon(i64),

    #[error("Horizon {horizon} exceeds the supported maximum {max}")]
    HorizonTooLarge { horizon: i64, max: i64 },

    #[error("Task ids must be positive, got {0}")]
    InvalidTaskId(TaskId),

    #[error("Task {0} has no modes")]
    EmptyTask(TaskId),

    #[error("Task {task} mode {mode} has negative duration {duration}")]
    NegativeDuration {
        task: TaskId,
        mode: ModeId,
        duration: i64,
    },

    #[error("Task {task} mode {mode} has negative demand {amount} for resource '{resource}'")]
    NegativeDemand {
        task: TaskId,
        mode: ModeId,
        resource: String,
        amount: i64,
    },

    #[error("Resource '{resource}' has negative capacity {capacity}")]
    NegativeCapacity { resource: String, capacity: i64 },

    #[error("Task {task} mode {mode} references unknown resource '{resource}'")]
    UnknownResource {
        task: TaskId,
        mode: ModeId,
        resource: String,
    },

    #[error("Precedence {predecessor} -> {successor} references unknown task {missing}")]
    DanglingPrecedence {
        predecessor: TaskId,
        successor: TaskId,
        missing: TaskId,
    },

    #[error("Circular precedence detected involving task {0}")]
    CyclicPrecedence(TaskId),
}

/// Contract violation in domain store usage.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DomainError {
    #[error("Variable {0:?} is not in the domain store")]
    InvalidVariable(VarId),
}

/// Failure to run a solve.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("Invalid model: {}", summarize(.0))]
    InvalidModel(Vec<ModelError>),

    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal solver error: {0}")]
    Internal(#[from] DomainError),
}

fn summarize(errors: &[ModelError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}
