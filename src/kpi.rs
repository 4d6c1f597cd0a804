//! Schedule quality metrics (KPIs).
//!
//! Computes standard project scheduling indicators from a finished
//! schedule and its model.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest finish time |
//! | Critical path | Longest precedence chain using each task's shortest mode |
//! | Utilization | Consumed resource-time / (capacity × makespan) |
//! | Peak usage | Highest demand at any instant |
//!
//! The critical path is a lower bound on the makespan of any schedule, so
//! `makespan - critical_path` bounds how far a first-feasible schedule can
//! be from optimal.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures;
//! Kelley & Walker (1959), Critical Path Method

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::models::{ProjectModel, Schedule, TaskId};

/// Schedule performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Latest finish time.
    pub makespan: i64,
    /// Precedence-only lower bound on the makespan.
    pub critical_path: i64,
    /// Average utilization over resources with positive capacity (0.0..1.0).
    pub avg_utilization: f64,
    /// Per-resource utilization.
    pub utilization_by_resource: BTreeMap<String, f64>,
    /// Per-resource peak usage.
    pub peak_usage_by_resource: BTreeMap<String, i64>,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its model.
    pub fn calculate(schedule: &Schedule, model: &ProjectModel) -> Self {
        let makespan = schedule.makespan();

        let mut utilization_by_resource = BTreeMap::new();
        let mut peak_usage_by_resource = BTreeMap::new();
        for (name, &capacity) in &model.resources {
            // Demand-time products can exceed i64, so they are summed as f64.
            let consumed: f64 = schedule
                .iter()
                .filter_map(|e| model.mode(e.task, e.mode).map(|m| (m, e.duration())))
                .map(|(mode, duration)| mode.demand(name) as f64 * duration as f64)
                .sum();
            let peak = (0..makespan)
                .map(|t| schedule.resource_usage(model, name, t))
                .max()
                .unwrap_or(0);
            peak_usage_by_resource.insert(name.clone(), peak);

            if capacity > 0 {
                let available = capacity as f64 * makespan as f64;
                let utilization = if available == 0.0 {
                    0.0
                } else {
                    consumed / available
                };
                utilization_by_resource.insert(name.clone(), utilization);
            }
        }

        let avg_utilization = if utilization_by_resource.is_empty() {
            0.0
        } else {
            let sum: f64 = utilization_by_resource.values().sum();
            sum / utilization_by_resource.len() as f64
        };

        Self {
            makespan,
            critical_path: critical_path_length(model),
            avg_utilization,
            utilization_by_resource,
            peak_usage_by_resource,
        }
    }

    /// Gap between the makespan and the critical-path bound.
    pub fn slack(&self) -> i64 {
        self.makespan.saturating_sub(self.critical_path)
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_makespan: i64, min_utilization: f64) -> bool {
        self.makespan <= max_makespan && self.avg_utilization >= min_utilization
    }
}

/// Longest path through the precedence graph with each task at its
/// shortest mode duration.
///
/// Edges to unknown tasks are ignored; tasks on a cycle are skipped.
pub fn critical_path_length(model: &ProjectModel) -> i64 {
    let mut in_degree: BTreeMap<TaskId, usize> = model.tasks.keys().map(|&id| (id, 0)).collect();
    let mut adj: BTreeMap<TaskId, Vec<TaskId>> = BTreeMap::new();
    for edge in model.precedence_edges() {
        if !model.tasks.contains_key(&edge.predecessor) {
            continue;
        }
        if let Some(d) = in_degree.get_mut(&edge.successor) {
            *d += 1;
            adj.entry(edge.predecessor).or_default().push(edge.successor);
        }
    }

    let mut earliest_start: BTreeMap<TaskId, i64> = BTreeMap::new();
    let mut queue: VecDeque<TaskId> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut longest = 0;
    while let Some(id) = queue.pop_front() {
        let start = earliest_start.get(&id).copied().unwrap_or(0);
        let finish = start.saturating_add(
            model
                .task(id)
                .and_then(|t| t.min_duration())
                .unwrap_or(0),
        );
        longest = longest.max(finish);

        for &next in adj.get(&id).map(Vec::as_slice).unwrap_or(&[]) {
            let es = earliest_start.entry(next).or_insert(0);
            *es = (*es).max(finish);
            if let Some(d) = in_degree.get_mut(&next) {
                *d -= 1;
                if *d == 0 {
                    queue.push_back(next);
                }
            }
        }
    }
    longest
}
