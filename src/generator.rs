//! Seeded random project generator.
//!
//! Produces reproducible RCPSP / MRCPSP instances for tests and
//! benchmarks. Precedences only point from lower to higher task ids, so
//! the graph is always acyclic, and every mode demands at most the full
//! capacity of each resource.
//!
//! Without an explicit horizon the generator uses the serial bound (the
//! sum of each task's longest mode), under which running the tasks one
//! after another in id order is always feasible.
//!
//! # Reference
//! Kolisch, Sprecher & Drexl (1995), "Characterization and Generation of a
//! General Class of Resource-Constrained Project Scheduling Problems",
//! Management Science 41(10)
//!
//! # Usage
//!
//! ```
//! use u_rcpsp::generator::InstanceGenerator;
//!
//! let model = InstanceGenerator::new(7)
//!     .with_task_count(6)
//!     .with_max_modes(2)
//!     .generate();
//! assert_eq!(model.task_count(), 6);
//! ```

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::models::{Mode, ProjectModel, Task, TaskId};

/// Builder for random project instances.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceGenerator {
    pub seed: u64,
    pub task_count: usize,
    pub max_modes: u32,
    pub max_duration: i64,
    pub resource_count: usize,
    pub max_capacity: i64,
    /// Probability of an edge between any two tasks `i < j`.
    pub precedence_density: f64,
    /// Fixed horizon; `None` = serial bound.
    pub horizon: Option<i64>,
}

impl InstanceGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            task_count: 8,
            max_modes: 1,
            max_duration: 5,
            resource_count: 2,
            max_capacity: 4,
            precedence_density: 0.25,
            horizon: None,
        }
    }

    pub fn with_task_count(mut self, n: usize) -> Self {
        self.task_count = n;
        self
    }

    pub fn with_max_modes(mut self, n: u32) -> Self {
        self.max_modes = n.max(1);
        self
    }

    pub fn with_max_duration(mut self, d: i64) -> Self {
        self.max_duration = d.max(0);
        self
    }

    pub fn with_resource_count(mut self, n: usize) -> Self {
        self.resource_count = n;
        self
    }

    pub fn with_max_capacity(mut self, c: i64) -> Self {
        self.max_capacity = c.max(0);
        self
    }

    pub fn with_precedence_density(mut self, p: f64) -> Self {
        self.precedence_density = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_horizon(mut self, horizon: i64) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// Builds the instance. The same settings always give the same model.
    pub fn generate(&self) -> ProjectModel {
        let mut rng = SmallRng::seed_from_u64(self.seed);

        let capacities: Vec<(String, i64)> = (1..=self.resource_count)
            .map(|r| (format!("R{r}"), rng.random_range(0..=self.max_capacity)))
            .collect();

        let mut model = ProjectModel::new(0);
        for (name, capacity) in &capacities {
            model = model.with_resource(name.clone(), *capacity);
        }

        let mut serial_bound = 0;
        for id in 1..=self.task_count as TaskId {
            let mode_count = rng.random_range(1..=self.max_modes);
            let mut task = Task::new();
            let mut longest = 0;
            for mode_id in 1..=mode_count {
                let mut mode = Mode::new(rng.random_range(0..=self.max_duration));
                for (name, capacity) in &capacities {
                    let amount = rng.random_range(0..=*capacity);
                    if amount > 0 {
                        mode = mode.with_demand(name.clone(), amount);
                    }
                }
                longest = longest.max(mode.duration);
                task = task.with_mode(mode_id, mode);
            }
            serial_bound += longest;
            model = model.with_task(id, task);
        }

        for pred in 1..=self.task_count as TaskId {
            for succ in pred + 1..=self.task_count as TaskId {
                if rng.random_bool(self.precedence_density) {
                    model = model.with_precedence(pred, succ);
                }
            }
        }

        model.horizon = self.horizon.unwrap_or(serial_bound);
        model
    }
}

impl Default for InstanceGenerator {
    fn default() -> Self {
        Self::new(42)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solve;
    use crate::validation::validate_model;

    #[test]
    fn test_reproducible() {
        let generator = InstanceGenerator::new(11).with_max_modes(3);
        assert_eq!(generator.generate(), generator.generate());
    }

    #[test]
    fn test_seeds_differ() {
        let a = InstanceGenerator::new(1).with_task_count(12).generate();
        let b = InstanceGenerator::new(2).with_task_count(12).generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generated_models_are_valid() {
        for seed in 0..20 {
            let model = InstanceGenerator::new(seed).with_max_modes(2).generate();
            assert!(validate_model(&model).is_ok(), "seed {seed}");
            assert_eq!(model.task_count(), 8);
            for edge in model.precedence_edges() {
                assert!(edge.predecessor < edge.successor);
            }
        }
    }

    #[test]
    fn test_serial_horizon_is_feasible() {
        for seed in 0..10 {
            let model = InstanceGenerator::new(seed)
                .with_task_count(6)
                .with_max_modes(2)
                .generate();
            let report = solve(&model).unwrap();
            let schedule = report.outcome.schedule().expect("serial bound is feasible");
            assert!(schedule.is_feasible(&model), "seed {seed}");
        }
    }

    #[test]
    fn test_fixed_horizon() {
        let model = InstanceGenerator::new(3).with_horizon(17).generate();
        assert_eq!(model.horizon, 17);
    }
}
