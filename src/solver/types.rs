//! Solve results, statistics, and the search monitor hook.

use serde::{Deserialize, Serialize};

use crate::models::Schedule;

/// Why a search stopped before reaching a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutoffReason {
    /// `node_limit` was reached.
    NodeLimit,
    /// `time_limit_ms` elapsed.
    TimeLimit,
    /// The cancellation flag was raised.
    Cancelled,
}

/// Verdict of a solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveOutcome {
    /// A schedule satisfying every constraint.
    Solved(Schedule),
    /// The search space was exhausted: no feasible schedule exists.
    Infeasible,
    /// The search was cut off before a verdict.
    Unknown(CutoffReason),
}

impl SolveOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved(_))
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, Self::Infeasible)
    }

    /// The schedule, if solved.
    pub fn schedule(&self) -> Option<&Schedule> {
        match self {
            Self::Solved(s) => Some(s),
            _ => None,
        }
    }

    /// Consumes the outcome, returning the schedule if solved.
    pub fn into_schedule(self) -> Option<Schedule> {
        match self {
            Self::Solved(s) => Some(s),
            _ => None,
        }
    }
}

/// Counters collected during one solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Tentative bindings tried.
    pub nodes: u64,
    /// Bindings that passed checks and propagation.
    pub consistent: u64,
    /// Bindings rejected by checks or propagation.
    pub dead_ends: u64,
    /// Propagations that emptied every mode of some task.
    pub wipeouts: u64,
    /// Bindings rejected because the resource profile overflowed.
    pub resource_conflicts: u64,
    /// Consistent bindings later undone.
    pub backtracks: u64,
    /// Deepest number of bound tasks reached.
    pub max_depth: usize,
    /// Wall-clock time of the solve.
    pub solve_time_ms: u64,
}

impl SearchStats {
    /// Adds the counters of another worker.
    pub fn merge(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.consistent += other.consistent;
        self.dead_ends += other.dead_ends;
        self.wipeouts += other.wipeouts;
        self.resource_conflicts += other.resource_conflicts;
        self.backtracks += other.backtracks;
        self.max_depth = self.max_depth.max(other.max_depth);
    }
}

/// Outcome of a solve together with its statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    pub stats: SearchStats,
}

/// States of a search node.
///
/// A node is `Unexplored` until its task is picked, `Expanding` while its
/// values are tried, and ends `Solved` or `Exhausted`. Each tried value is
/// reported as `Consistent` or `Dead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    Unexplored,
    Expanding,
    Consistent,
    Dead,
    Solved,
    Exhausted,
}

/// Receives node-state transitions during a sequential search.
///
/// `depth` is the number of tasks bound when the transition happens.
pub trait SearchMonitor {
    fn on_node(&mut self, state: NodeState, depth: usize) {
        let _ = (state, depth);
    }
}

/// Monitor that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl SearchMonitor for NoopMonitor {}
