//! Project model.
//!
//! The complete, read-only description of a scheduling problem: tasks with
//! their modes, renewable resources with capacities, precedence relations,
//! and the planning horizon. Built once and passed explicitly to the solver.
//!
//! # Serialized Form
//!
//! ```json
//! {
//!   "horizon": 10,
//!   "tasks": { "1": { "1": { "duration": 2, "resource_demand": { "R1": 1 } } } },
//!   "precedences": { "1": [2, 3] },
//!   "resources": { "R1": 1 }
//! }
//! ```
//!
//! # Reference
//! Brucker et al. (1999), "Resource-constrained project scheduling:
//! Notation, classification, models, and methods"

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Mode, ModeId, Task, TaskId};

/// A precedence edge: `predecessor` must finish before `successor` starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Precedence {
    /// Task that must come first.
    pub predecessor: TaskId,
    /// Task that must come after.
    pub successor: TaskId,
}

/// A resource-constrained project scheduling problem.
///
/// # Examples
///
/// ```
/// use u_rcpsp::models::{Mode, ProjectModel, Task};
///
/// let model = ProjectModel::new(5)
///     .with_resource("R1", 1)
///     .with_task(1, Task::single(Mode::new(2).with_demand("R1", 1)))
///     .with_task(2, Task::single(Mode::new(1).with_demand("R1", 1)))
///     .with_precedence(1, 2);
///
/// assert_eq!(model.task_count(), 2);
/// assert_eq!(model.successors(1), &[2]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectModel {
    /// Inclusive upper bound on start times.
    pub horizon: i64,
    /// Tasks keyed by id.
    pub tasks: BTreeMap<TaskId, Task>,
    /// Successor lists keyed by predecessor id.
    pub precedences: BTreeMap<TaskId, Vec<TaskId>>,
    /// Resource capacities keyed by resource name.
    pub resources: BTreeMap<String, i64>,
}

impl ProjectModel {
    /// Creates an empty project with the given horizon.
    pub fn new(horizon: i64) -> Self {
        Self {
            horizon,
            ..Self::default()
        }
    }

    /// Adds (or replaces) a task.
    pub fn with_task(mut self, id: TaskId, task: Task) -> Self {
        self.tasks.insert(id, task);
        self
    }

    /// Adds (or replaces) a renewable resource.
    pub fn with_resource(mut self, name: impl Into<String>, capacity: i64) -> Self {
        self.resources.insert(name.into(), capacity);
        self
    }

    /// Adds one precedence edge.
    pub fn with_precedence(mut self, predecessor: TaskId, successor: TaskId) -> Self {
        self.precedences
            .entry(predecessor)
            .or_default()
            .push(successor);
        self
    }

    /// Adds several successors of one task.
    pub fn with_successors(mut self, predecessor: TaskId, successors: &[TaskId]) -> Self {
        self.precedences
            .entry(predecessor)
            .or_default()
            .extend_from_slice(successors);
        self
    }

    /// Looks up a task.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Looks up a mode of a task.
    pub fn mode(&self, task: TaskId, mode: ModeId) -> Option<&Mode> {
        self.tasks.get(&task).and_then(|t| t.mode(mode))
    }

    /// Capacity of a resource.
    pub fn capacity(&self, resource: &str) -> Option<i64> {
        self.resources.get(resource).copied()
    }

    /// Successors listed for a task (empty if none).
    pub fn successors(&self, id: TaskId) -> &[TaskId] {
        self.precedences
            .get(&id)
            .map(|s| s.as_slice())
            .unwrap_or(&[])
    }

    /// All distinct precedence edges, ordered by (predecessor, successor).
    ///
    /// A successor listed twice for the same predecessor yields one edge.
    pub fn precedence_edges(&self) -> Vec<Precedence> {
        let edges: BTreeSet<Precedence> = self
            .precedences
            .iter()
            .flat_map(|(&predecessor, succs)| {
                succs.iter().map(move |&successor| Precedence {
                    predecessor,
                    successor,
                })
            })
            .collect();
        edges.into_iter().collect()
    }

    /// Number of tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Number of (task, mode) variables.
    pub fn variable_count(&self) -> usize {
        self.tasks.values().map(|t| t.mode_count()).sum()
    }

    /// Whether any task offers more than one mode.
    pub fn is_multi_mode(&self) -> bool {
        self.tasks.values().any(|t| t.mode_count() > 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> ProjectModel {
        ProjectModel::new(5)
            .with_resource("R1", 1)
            .with_task(1, Task::single(Mode::new(2).with_demand("R1", 1)))
            .with_task(2, Task::single(Mode::new(1).with_demand("R1", 1)))
            .with_precedence(1, 2)
    }

    #[test]
    fn test_model_builder() {
        let m = chain();
        assert_eq!(m.horizon, 5);
        assert_eq!(m.task_count(), 2);
        assert_eq!(m.variable_count(), 2);
        assert_eq!(m.capacity("R1"), Some(1));
        assert_eq!(m.capacity("R9"), None);
        assert_eq!(m.mode(1, 1).map(|md| md.duration), Some(2));
        assert!(m.mode(1, 2).is_none());
        assert!(!m.is_multi_mode());
    }

    #[test]
    fn test_successors() {
        let m = chain().with_successors(2, &[3, 4]);
        assert_eq!(m.successors(1), &[2]);
        assert_eq!(m.successors(2), &[3, 4]);
        assert!(m.successors(9).is_empty());
    }

    #[test]
    fn test_precedence_edges_dedup_and_order() {
        let m = ProjectModel::new(10)
            .with_successors(2, &[5, 3, 5])
            .with_precedence(1, 2);
        let edges = m.precedence_edges();
        assert_eq!(
            edges,
            vec![
                Precedence { predecessor: 1, successor: 2 },
                Precedence { predecessor: 2, successor: 3 },
                Precedence { predecessor: 2, successor: 5 },
            ]
        );
    }

    #[test]
    fn test_multi_mode_detection() {
        let m = chain().with_task(
            3,
            Task::new().with_mode(1, Mode::new(1)).with_mode(2, Mode::new(2)),
        );
        assert!(m.is_multi_mode());
        assert_eq!(m.variable_count(), 4);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "horizon": 5,
            "tasks": {
                "1": { "1": { "duration": 2, "resource_demand": { "R1": 1 } } },
                "2": { "1": { "duration": 1, "resource_demand": { "R1": 1 } } }
            },
            "precedences": { "1": [2] },
            "resources": { "R1": 1 }
        }"#;
        let parsed: ProjectModel = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, chain());
    }

    #[test]
    fn test_json_missing_field_rejected() {
        let json = r#"{ "horizon": 5, "tasks": {}, "resources": {} }"#;
        assert!(serde_json::from_str::<ProjectModel>(json).is_err());
    }
}
