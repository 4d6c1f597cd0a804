//! Execution mode model.
//!
//! A mode is one way of carrying out a task: a duration paired with a
//! constant per-resource demand held for that whole duration. Single-mode
//! projects simply give every task exactly one mode.
//!
//! # Reference
//! Sprecher, Hartmann & Drexl (1997), "An exact algorithm for project
//! scheduling with multiple modes"

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a mode within its task.
pub type ModeId = u32;

/// An execution mode of a task.
///
/// # Time Representation
/// Durations are integral time units relative to the project start (t=0).
/// A zero duration marks a milestone: it occupies no time and consumes no
/// resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    /// Processing time in time units.
    pub duration: i64,
    /// Units consumed per resource name while the mode is active.
    pub resource_demand: BTreeMap<String, i64>,
}

impl Mode {
    /// Creates a mode with the given duration and no resource demand.
    pub fn new(duration: i64) -> Self {
        Self {
            duration,
            resource_demand: BTreeMap::new(),
        }
    }

    /// Creates a zero-duration milestone mode.
    pub fn milestone() -> Self {
        Self::new(0)
    }

    /// Adds (or replaces) the demand for a resource.
    pub fn with_demand(mut self, resource: impl Into<String>, amount: i64) -> Self {
        self.resource_demand.insert(resource.into(), amount);
        self
    }

    /// Demand for a resource (0 if the mode does not use it).
    pub fn demand(&self, resource: &str) -> i64 {
        self.resource_demand.get(resource).copied().unwrap_or(0)
    }

    /// Whether this mode is a milestone (zero duration).
    #[inline]
    pub fn is_milestone(&self) -> bool {
        self.duration == 0
    }

    /// Whether the mode is active at instant `t` when started at `start`.
    ///
    /// Active means `start <= t < start + duration`, so milestones are never
    /// active.
    #[inline]
    pub fn is_active_at(&self, start: i64, t: i64) -> bool {
        start <= t && t < start + self.duration
    }
}
