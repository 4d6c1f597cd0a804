//! Schedule (solution) model.
//!
//! A schedule is the final mapping from each task to its selected mode and
//! start time. It is produced once by the solver and never mutated by it
//! afterwards; rendering and reporting collaborators read it together with
//! the [`ProjectModel`] for duration and resource lookups.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{ModeId, ProjectModel, TaskId};
use crate::validation::MAX_HORIZON;

/// A complete schedule, ordered by task id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    entries: Vec<ScheduledTask>,
}

/// One scheduled task: the selected mode and its time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Task id.
    pub task: TaskId,
    /// Selected mode.
    pub mode: ModeId,
    /// Start time.
    pub start: i64,
    /// Finish time (`start + duration`).
    pub finish: i64,
}

/// A constraint violation found by [`Schedule::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity (task id or resource name).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Successor started before its predecessor finished.
    PrecedenceViolation,
    /// Summed demand exceeded a resource capacity at some instant.
    CapacityExceeded,
    /// Task started before 0 or ran past the horizon.
    HorizonExceeded,
    /// Entry refers to a task or mode not in the model.
    UnknownEntity,
    /// Entry window length differs from the selected mode's duration.
    DurationMismatch,
    /// A model task has no entry.
    MissingTask,
    /// A task has more than one entry.
    DuplicateTask,
}

impl ScheduledTask {
    /// Duration of the scheduled window.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.finish - self.start
    }

    /// Whether the task occupies instant `t` (`start <= t < finish`).
    #[inline]
    pub fn is_active_at(&self, t: i64) -> bool {
        self.start <= t && t < self.finish
    }
}

impl Violation {
    fn new(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
        severity: i32,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            message: message.into(),
            severity,
        }
    }

    /// Creates a precedence violation.
    pub fn precedence_violation(task: TaskId, message: impl Into<String>) -> Self {
        Self::new(
            ViolationType::PrecedenceViolation,
            task.to_string(),
            message,
            95,
        )
    }

    /// Creates a capacity exceeded violation.
    pub fn capacity_exceeded(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::CapacityExceeded, resource, message, 90)
    }

    /// Creates a horizon violation.
    pub fn horizon_exceeded(task: TaskId, message: impl Into<String>) -> Self {
        Self::new(ViolationType::HorizonExceeded, task.to_string(), message, 85)
    }

    /// Creates a duration mismatch violation.
    pub fn duration_mismatch(task: TaskId, message: impl Into<String>) -> Self {
        Self::new(ViolationType::DurationMismatch, task.to_string(), message, 100)
    }

    fn structural(violation_type: ViolationType, task: TaskId, message: impl Into<String>) -> Self {
        Self::new(violation_type, task.to_string(), message, 100)
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a schedule from entries, ordering them by (task, mode).
    pub fn from_entries(mut entries: Vec<ScheduledTask>) -> Self {
        entries.sort_by_key(|e| (e.task, e.mode));
        Self { entries }
    }

    /// Entries in task order.
    pub fn entries(&self) -> &[ScheduledTask] {
        &self.entries
    }

    /// Iterates over entries in task order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.entries.iter()
    }

    /// Finds the entry for a task.
    pub fn entry(&self, task: TaskId) -> Option<&ScheduledTask> {
        self.entries
            .binary_search_by_key(&task, |e| e.task)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Start time of a task.
    pub fn start_of(&self, task: TaskId) -> Option<i64> {
        self.entry(task).map(|e| e.start)
    }

    /// `task -> start` map, the shape most reports print.
    pub fn start_times(&self) -> BTreeMap<TaskId, i64> {
        self.entries.iter().map(|e| (e.task, e.start)).collect()
    }

    /// Makespan: latest finish time (0 for an empty schedule).
    pub fn makespan(&self) -> i64 {
        self.entries.iter().map(|e| e.finish).max().unwrap_or(0)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the schedule has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Summed demand for `resource` at instant `t`, saturating at `i64::MAX`.
    pub fn resource_usage(&self, model: &ProjectModel, resource: &str, t: i64) -> i64 {
        self.checked_usage(model, resource, t).unwrap_or(i64::MAX)
    }

    /// Summed demand, or `None` if the sum does not fit in an `i64`.
    fn checked_usage(&self, model: &ProjectModel, resource: &str, t: i64) -> Option<i64> {
        self.entries
            .iter()
            .filter(|e| e.is_active_at(t))
            .filter_map(|e| model.mode(e.task, e.mode))
            .try_fold(0_i64, |total, m| total.checked_add(m.demand(resource)))
    }

    /// Usage of `resource` at every instant `0..=horizon`.
    ///
    /// The horizon is capped at [`MAX_HORIZON`] and sums saturate.
    pub fn resource_profile(&self, model: &ProjectModel, resource: &str) -> Vec<i64> {
        let len = (model.horizon.clamp(0, MAX_HORIZON) + 1) as usize;
        let mut profile = vec![0_i64; len];
        for e in &self.entries {
            let Some(mode) = model.mode(e.task, e.mode) else {
                continue;
            };
            let demand = mode.demand(resource);
            if demand == 0 {
                continue;
            }
            for t in e.start.max(0)..e.finish.min(len as i64) {
                profile[t as usize] = profile[t as usize].saturating_add(demand);
            }
        }
        profile
    }

    /// Checks the schedule against every constraint of `model`.
    ///
    /// Returns all detected violations; an empty vector means the schedule
    /// is feasible. Capacity is checked at every instant from 0 to
    /// `max(horizon, makespan)` and reported once per resource, at the
    /// first overloaded instant.
    pub fn verify(&self, model: &ProjectModel) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut seen = BTreeSet::new();

        for e in &self.entries {
            if !seen.insert(e.task) {
                violations.push(Violation::structural(
                    ViolationType::DuplicateTask,
                    e.task,
                    format!("Task {} is scheduled more than once", e.task),
                ));
            }
            match model.mode(e.task, e.mode) {
                None => violations.push(Violation::structural(
                    ViolationType::UnknownEntity,
                    e.task,
                    format!("Task {} mode {} is not in the model", e.task, e.mode),
                )),
                Some(mode) if e.finish.checked_sub(e.start) != Some(mode.duration) => {
                    violations.push(Violation::duration_mismatch(
                        e.task,
                        format!(
                            "Task {} window [{}, {}) does not match mode duration {}",
                            e.task, e.start, e.finish, mode.duration
                        ),
                    ))
                }
                Some(_) => {}
            }
            if e.start < 0 || e.start > model.horizon || e.finish > model.horizon {
                violations.push(Violation::horizon_exceeded(
                    e.task,
                    format!(
                        "Task {} window [{}, {}) leaves horizon [0, {}]",
                        e.task, e.start, e.finish, model.horizon
                    ),
                ));
            }
        }

        for &id in model.tasks.keys() {
            if !seen.contains(&id) {
                violations.push(Violation::structural(
                    ViolationType::MissingTask,
                    id,
                    format!("Task {id} is not scheduled"),
                ));
            }
        }

        for edge in model.precedence_edges() {
            if let (Some(pred), Some(succ)) = (self.entry(edge.predecessor), self.entry(edge.successor))
            {
                if pred.finish > succ.start {
                    violations.push(Violation::precedence_violation(
                        succ.task,
                        format!(
                            "Task {} starts at {} before predecessor {} finishes at {}",
                            succ.task, succ.start, pred.task, pred.finish
                        ),
                    ));
                }
            }
        }

        let last = model.horizon.max(self.makespan());
        for (name, &capacity) in &model.resources {
            let overloaded = (0..=last)
                .map(|t| (t, self.checked_usage(model, name, t)))
                .find(|&(_, usage)| usage.map_or(true, |u| u > capacity));
            if let Some((t, usage)) = overloaded {
                let usage = usage
                    .map_or_else(|| "more than i64::MAX".to_string(), |u| u.to_string());
                violations.push(Violation::capacity_exceeded(
                    name.clone(),
                    format!("Resource {name} uses {usage} of {capacity} at t={t}"),
                ));
            }
        }

        violations
    }

    /// Whether [`verify`](Self::verify) finds no violations.
    pub fn is_feasible(&self, model: &ProjectModel) -> bool {
        self.verify(model).is_empty()
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a ScheduledTask;
    type IntoIter = std::slice::Iter<'a, ScheduledTask>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
