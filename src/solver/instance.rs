//! Index-based view of a validated [`ProjectModel`].
//!
//! The search works on dense indices: tasks in ascending id order,
//! resources in ascending name order, and one variable per (task, mode)
//! pair laid out contiguously per task in ascending mode id order.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::ops::Range;

use super::domain::VarId;
use crate::models::{ModeId, ProjectModel, TaskId};

/// One (task, mode) variable.
#[derive(Debug, Clone)]
pub(crate) struct VarInfo {
    pub mode: ModeId,
    pub duration: i64,
    /// Demand per resource index.
    pub demand: Vec<i64>,
}

impl VarInfo {
    /// Whether the variable consumes any resource while active.
    pub fn consumes(&self) -> bool {
        self.duration > 0 && self.demand.iter().any(|&d| d > 0)
    }

    /// Whether two variables compete for at least one resource.
    pub fn shares_resource_with(&self, other: &VarInfo) -> bool {
        self.duration > 0
            && other.duration > 0
            && self
                .demand
                .iter()
                .zip(&other.demand)
                .any(|(&a, &b)| a > 0 && b > 0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TaskInfo {
    pub id: TaskId,
    pub vars: Range<usize>,
    pub successors: Vec<usize>,
    pub predecessors: Vec<usize>,
}

impl TaskInfo {
    pub fn var_ids(&self) -> impl Iterator<Item = VarId> {
        self.vars.clone().map(VarId)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Instance {
    pub horizon: i64,
    pub tasks: Vec<TaskInfo>,
    pub vars: Vec<VarInfo>,
    pub capacities: Vec<i64>,
}

impl Instance {
    /// Compiles a model that already passed validation.
    pub fn compile(model: &ProjectModel) -> Self {
        let resource_index: BTreeMap<&str, usize> = model
            .resources
            .keys()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let capacities: Vec<i64> = model.resources.values().copied().collect();
        let task_index: BTreeMap<TaskId, usize> = model
            .tasks
            .keys()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();

        let mut tasks = Vec::with_capacity(model.tasks.len());
        let mut vars = Vec::with_capacity(model.variable_count());

        for (&id, task) in &model.tasks {
            let first = vars.len();
            for (&mode_id, mode) in &task.modes {
                let mut demand = vec![0_i64; capacities.len()];
                for (name, &amount) in &mode.resource_demand {
                    if let Some(&r) = resource_index.get(name.as_str()) {
                        demand[r] = amount;
                    }
                }
                vars.push(VarInfo {
                    mode: mode_id,
                    duration: mode.duration,
                    demand,
                });
            }
            tasks.push(TaskInfo {
                id,
                vars: first..vars.len(),
                successors: Vec::new(),
                predecessors: Vec::new(),
            });
        }

        for edge in model.precedence_edges() {
            if let (Some(&p), Some(&s)) = (
                task_index.get(&edge.predecessor),
                task_index.get(&edge.successor),
            ) {
                tasks[p].successors.push(s);
                tasks[s].predecessors.push(p);
            }
        }

        Self {
            horizon: model.horizon,
            tasks,
            vars,
            capacities,
        }
    }

    #[inline]
    pub fn var(&self, var: VarId) -> &VarInfo {
        &self.vars[var.0]
    }

    pub fn resource_count(&self) -> usize {
        self.capacities.len()
    }

    /// Task indices in precedence order, ties broken by ascending task id
    /// (Kahn's algorithm with a min-heap).
    pub fn topological_order(&self) -> Vec<usize> {
        let mut in_degree: Vec<usize> = self.tasks.iter().map(|t| t.predecessors.len()).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(self.tasks.len());
        while let Some(Reverse(t)) = ready.pop() {
            order.push(t);
            for &s in &self.tasks[t].successors {
                in_degree[s] -= 1;
                if in_degree[s] == 0 {
                    ready.push(Reverse(s));
                }
            }
        }

        // Only reachable for cyclic graphs, which validation rejects.
        if order.len() < self.tasks.len() {
            let placed: Vec<bool> = (0..self.tasks.len()).map(|t| order.contains(&t)).collect();
            order.extend((0..self.tasks.len()).filter(|&t| !placed[t]));
        }
        order
    }
}
