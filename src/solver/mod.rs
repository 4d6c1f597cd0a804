//! Complete backtracking solver for RCPSP / MRCPSP.
//!
//! # Pipeline
//!
//! ```text
//! ProjectModel ──validate──▶ Instance ──prepare──▶ DomainStore
//!                                                     │
//!                               Engine (DFS + forward checking)
//!                                                     │
//!                              SolveOutcome::{Solved, Infeasible, Unknown}
//! ```
//!
//! # Variables
//!
//! One variable per (task, mode) pair whose value is the start time.
//! Binding a task fixes one of its mode variables and empties the others,
//! so every schedule picks exactly one mode per task.
//!
//! # Guarantees
//!
//! - **Soundness**: a `Solved` schedule satisfies every precedence,
//!   resource capacity, and horizon constraint; the complete assignment is
//!   re-checked from scratch before it is accepted.
//! - **Completeness**: `Infeasible` is only returned after the whole search
//!   space was exhausted. Cutoffs give `Unknown`.
//! - **Determinism**: the same model and configuration always yield the
//!   same schedule, also with the `parallel` feature.
//!
//! # Reference
//! Brucker et al. (1999), "Resource-constrained project scheduling:
//! Notation, classification, models, and methods", EJOR 112(1)

mod config;
mod constraints;
mod domain;
mod extract;
mod instance;
#[cfg(feature = "parallel")]
mod parallel;
mod runner;
mod search;
mod types;

pub use config::{SolverConfig, VariableOrder};
pub use domain::{Checkpoint, Domain, DomainStore, Snapshot, VarId};
pub use runner::{solve, RcpspSolver};
pub use types::{
    CutoffReason, NodeState, NoopMonitor, SearchMonitor, SearchStats, SolveOutcome, SolveReport,
};
