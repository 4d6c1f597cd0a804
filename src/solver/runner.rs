//! Solver entry point.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use super::config::SolverConfig;
use super::instance::Instance;
use super::search::{prepare, Engine};
use super::types::{NoopMonitor, SearchMonitor, SearchStats, SolveOutcome, SolveReport};
use crate::error::{DomainError, SolveError};
use crate::models::ProjectModel;
use crate::validation::validate_model;

/// Complete backtracking solver for RCPSP / MRCPSP.
///
/// Returns the first feasible schedule in the deterministic search order,
/// or proves that none exists.
///
/// # Examples
/// ```
/// use u_rcpsp::models::{Mode, ProjectModel, Task};
/// use u_rcpsp::solver::RcpspSolver;
///
/// let model = ProjectModel::new(5)
///     .with_resource("R1", 1)
///     .with_task(1, Task::single(Mode::new(2).with_demand("R1", 1)))
///     .with_task(2, Task::single(Mode::new(1).with_demand("R1", 1)))
///     .with_precedence(1, 2);
///
/// let report = RcpspSolver::new().solve(&model).unwrap();
/// let schedule = report.outcome.schedule().unwrap();
/// assert_eq!(schedule.start_of(1), Some(0));
/// assert_eq!(schedule.start_of(2), Some(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RcpspSolver {
    config: SolverConfig,
}

impl RcpspSolver {
    /// Creates a solver with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a solver with the given configuration.
    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Returns the solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Validates `model` and searches for a schedule.
    pub fn solve(&self, model: &ProjectModel) -> Result<SolveReport, SolveError> {
        self.run(model, None, None)
    }

    /// Solves with an optional cancellation token.
    ///
    /// Raising the flag stops the search at its next node with
    /// [`SolveOutcome::Unknown`].
    pub fn solve_with_cancel(
        &self,
        model: &ProjectModel,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SolveReport, SolveError> {
        self.run(model, cancel, None)
    }

    /// Solves sequentially, reporting every node transition to `monitor`.
    pub fn solve_with_monitor(
        &self,
        model: &ProjectModel,
        monitor: &mut dyn SearchMonitor,
    ) -> Result<SolveReport, SolveError> {
        self.run(model, None, Some(monitor))
    }

    fn run(
        &self,
        model: &ProjectModel,
        cancel: Option<Arc<AtomicBool>>,
        monitor: Option<&mut dyn SearchMonitor>,
    ) -> Result<SolveReport, SolveError> {
        self.config.validate().map_err(SolveError::InvalidConfig)?;
        validate_model(model).map_err(SolveError::InvalidModel)?;

        let started = Instant::now();
        let instance = Instance::compile(model);

        let (outcome, mut stats) = match prepare(&instance, &self.config)? {
            None => (SolveOutcome::Infeasible, SearchStats::default()),
            Some(store) => self.search(&instance, store, cancel.as_deref(), monitor, started)?,
        };
        stats.solve_time_ms = started.elapsed().as_millis() as u64;

        Ok(SolveReport { outcome, stats })
    }

    #[cfg(feature = "parallel")]
    fn search(
        &self,
        instance: &Instance,
        store: super::domain::DomainStore,
        cancel: Option<&AtomicBool>,
        monitor: Option<&mut dyn SearchMonitor>,
        started: Instant,
    ) -> Result<(SolveOutcome, SearchStats), DomainError> {
        match monitor {
            None if self.config.num_workers > 1 => {
                super::parallel::search(instance, &self.config, store, cancel, started)
            }
            monitor => sequential(instance, &self.config, store, cancel, monitor, started),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn search(
        &self,
        instance: &Instance,
        store: super::domain::DomainStore,
        cancel: Option<&AtomicBool>,
        monitor: Option<&mut dyn SearchMonitor>,
        started: Instant,
    ) -> Result<(SolveOutcome, SearchStats), DomainError> {
        sequential(instance, &self.config, store, cancel, monitor, started)
    }
}

fn sequential(
    instance: &Instance,
    config: &SolverConfig,
    mut store: super::domain::DomainStore,
    cancel: Option<&AtomicBool>,
    monitor: Option<&mut dyn SearchMonitor>,
    started: Instant,
) -> Result<(SolveOutcome, SearchStats), DomainError> {
    let mut noop = NoopMonitor;
    let monitor: &mut dyn SearchMonitor = match monitor {
        Some(m) => m,
        None => &mut noop,
    };
    let mut engine = Engine::new(instance, config, monitor, cancel, started);
    let step = engine.run(&mut store)?;
    Ok(engine.finish(step))
}

/// Solves `model` with the default configuration.
pub fn solve(model: &ProjectModel) -> Result<SolveReport, SolveError> {
    RcpspSolver::new().solve(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::models::{Mode, Task};
    use crate::solver::types::{CutoffReason, NodeState};
    use crate::solver::VariableOrder;

    #[test]
    fn test_invalid_model_is_error() {
        let model = ProjectModel::new(5)
            .with_task(1, Task::single(Mode::new(1)))
            .with_precedence(1, 9);
        let err = solve(&model).unwrap_err();
        assert_eq!(
            err,
            SolveError::InvalidModel(vec![ModelError::DanglingPrecedence {
                predecessor: 1,
                successor: 9,
                missing: 9
            }])
        );
    }

    #[test]
    fn test_oversized_horizon_is_error() {
        let model = ProjectModel::new(i64::MAX).with_task(1, Task::single(Mode::milestone()));
        let err = solve(&model).unwrap_err();
        assert_eq!(
            err,
            SolveError::InvalidModel(vec![ModelError::HorizonTooLarge {
                horizon: i64::MAX,
                max: crate::validation::MAX_HORIZON
            }])
        );
    }

    #[test]
    fn test_saturated_capacity_is_solved() {
        let model = ProjectModel::new(4)
            .with_resource("R1", i64::MAX)
            .with_task(1, Task::single(Mode::new(2).with_demand("R1", i64::MAX)))
            .with_task(2, Task::single(Mode::new(2).with_demand("R1", i64::MAX)));
        let report = solve(&model).unwrap();
        let schedule = report.outcome.schedule().unwrap();
        assert_eq!(schedule.start_of(1), Some(0));
        assert_eq!(schedule.start_of(2), Some(2));
        assert!(schedule.is_feasible(&model));
    }

    #[test]
    fn test_invalid_config_is_error() {
        let solver = RcpspSolver::with_config(SolverConfig::default().with_num_workers(0));
        let model = ProjectModel::new(1).with_task(1, Task::single(Mode::milestone()));
        assert!(matches!(solver.solve(&model), Err(SolveError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_project_is_solved() {
        let report = solve(&ProjectModel::new(0)).unwrap();
        assert_eq!(report.outcome.schedule().map(|s| s.len()), Some(0));
    }

    #[test]
    fn test_horizon_infeasible_without_search() {
        let model = ProjectModel::new(3).with_task(1, Task::single(Mode::new(5)));
        let report = solve(&model).unwrap();
        assert!(report.outcome.is_infeasible());
        assert_eq!(report.stats.nodes, 0);
    }

    #[test]
    fn test_cancelled_before_start() {
        let model = ProjectModel::new(5).with_task(1, Task::single(Mode::new(1)));
        let flag = Arc::new(AtomicBool::new(true));
        let report = RcpspSolver::new()
            .solve_with_cancel(&model, Some(flag))
            .unwrap();
        assert_eq!(report.outcome, SolveOutcome::Unknown(CutoffReason::Cancelled));
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<(NodeState, usize)>,
    }

    impl SearchMonitor for Recorder {
        fn on_node(&mut self, state: NodeState, depth: usize) {
            self.events.push((state, depth));
        }
    }

    #[test]
    fn test_monitor_sees_transitions() {
        let model = ProjectModel::new(2).with_task(1, Task::single(Mode::new(1)));
        let mut recorder = Recorder::default();
        let report = RcpspSolver::new()
            .solve_with_monitor(&model, &mut recorder)
            .unwrap();
        assert!(report.outcome.is_solved());
        assert_eq!(
            recorder.events,
            vec![
                (NodeState::Unexplored, 0),
                (NodeState::Expanding, 0),
                (NodeState::Consistent, 1),
                (NodeState::Unexplored, 1),
                (NodeState::Solved, 1),
            ]
        );
    }

    #[test]
    fn test_all_orders_agree_on_feasibility() {
        let model = ProjectModel::new(8)
            .with_resource("R1", 1)
            .with_task(1, Task::single(Mode::new(2).with_demand("R1", 1)))
            .with_task(2, Task::single(Mode::new(2).with_demand("R1", 1)))
            .with_task(3, Task::single(Mode::new(2).with_demand("R1", 1)))
            .with_successors(3, &[1]);
        for order in [
            VariableOrder::Lexicographic,
            VariableOrder::Topological,
            VariableOrder::SmallestDomain,
        ] {
            let solver =
                RcpspSolver::with_config(SolverConfig::default().with_variable_order(order));
            let report = solver.solve(&model).unwrap();
            let schedule = report.outcome.schedule().unwrap();
            assert!(schedule.is_feasible(&model), "{order:?}");
        }
    }
}
