//! Input validation for project models.
//!
//! Checks structural integrity of a [`ProjectModel`] before solving.
//! Detects:
//! - Negative horizon, durations, demands, or capacities
//! - Non-positive task ids and tasks without modes
//! - Demands on resources that do not exist
//! - Precedences that reference unknown tasks
//! - Circular precedence dependencies (DAG validation)
//!
//! All problems are collected so a caller can fix them in one pass.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ModelError;
use crate::models::{ProjectModel, TaskId};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ModelError>>;

/// Largest accepted horizon.
///
/// The solver keeps one bit per time instant for every (task, mode)
/// variable and one counter per instant for every resource, so memory
/// grows linearly with the horizon. At this bound a variable's domain is
/// about 122 KiB and a resource profile about 7.6 MiB.
pub const MAX_HORIZON: i64 = 1_000_000;

/// Validates a project model.
///
/// Checks:
/// 1. Horizon is non-negative and at most [`MAX_HORIZON`]
/// 2. Task ids are positive and every task has at least one mode
/// 3. Durations and demands are non-negative
/// 4. Every demanded resource exists and capacities are non-negative
/// 5. Every task referenced by a precedence exists
/// 6. The precedence graph has no cycles
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_model(model: &ProjectModel) -> ValidationResult {
    let mut errors = Vec::new();

    if model.horizon < 0 {
        errors.push(ModelError::NegativeHorizon(model.horizon));
    } else if model.horizon > MAX_HORIZON {
        errors.push(ModelError::HorizonTooLarge {
            horizon: model.horizon,
            max: MAX_HORIZON,
        });
    }

    for (name, &capacity) in &model.resources {
        if capacity < 0 {
            errors.push(ModelError::NegativeCapacity {
                resource: name.clone(),
                capacity,
            });
        }
    }

    for (&id, task) in &model.tasks {
        if id == 0 {
            errors.push(ModelError::InvalidTaskId(id));
        }
        if task.modes.is_empty() {
            errors.push(ModelError::EmptyTask(id));
        }

        for (&mode_id, mode) in &task.modes {
            if mode.duration < 0 {
                errors.push(ModelError::NegativeDuration {
                    task: id,
                    mode: mode_id,
                    duration: mode.duration,
                });
            }
            for (resource, &amount) in &mode.resource_demand {
                if !model.resources.contains_key(resource) {
                    errors.push(ModelError::UnknownResource {
                        task: id,
                        mode: mode_id,
                        resource: resource.clone(),
                    });
                }
                if amount < 0 {
                    errors.push(ModelError::NegativeDemand {
                        task: id,
                        mode: mode_id,
                        resource: resource.clone(),
                        amount,
                    });
                }
            }
        }
    }

    for edge in model.precedence_edges() {
        for missing in [edge.predecessor, edge.successor] {
            if !model.tasks.contains_key(&missing) {
                errors.push(ModelError::DanglingPrecedence {
                    predecessor: edge.predecessor,
                    successor: edge.successor,
                    missing,
                });
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(model) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in the precedence graph using DFS.
///
/// Only edges between existing tasks are considered; dangling edges are
/// reported separately. Tasks are visited in ascending id order so the
/// reported task is deterministic.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
fn detect_cycles(model: &ProjectModel) -> Option<ModelError> {
    let mut adj: BTreeMap<TaskId, Vec<TaskId>> = BTreeMap::new();
    for edge in model.precedence_edges() {
        if model.tasks.contains_key(&edge.predecessor) && model.tasks.contains_key(&edge.successor)
        {
            adj.entry(edge.predecessor).or_default().push(edge.successor);
        }
    }

    let mut visited = BTreeSet::new();
    let mut in_stack = BTreeSet::new();

    for &node in model.tasks.keys() {
        if !visited.contains(&node) {
            if let Some(at) = find_back_edge(node, &adj, &mut visited, &mut in_stack) {
                return Some(ModelError::CyclicPrecedence(at));
            }
        }
    }

    None
}

fn find_back_edge(
    node: TaskId,
    adj: &BTreeMap<TaskId, Vec<TaskId>>,
    visited: &mut BTreeSet<TaskId>,
    in_stack: &mut BTreeSet<TaskId>,
) -> Option<TaskId> {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(&node) {
        for &next in neighbors {
            if in_stack.contains(&next) {
                return Some(next); // Back edge → cycle
            }
            if !visited.contains(&next) {
                if let Some(at) = find_back_edge(next, adj, visited, in_stack) {
                    return Some(at);
                }
            }
        }
    }

    in_stack.remove(&node);
    None
}
