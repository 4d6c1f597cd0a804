//! Backtracking search with forward checking.
//!
//! # Algorithm
//!
//! 1. Pick the next unbound task by the configured [`VariableOrder`].
//! 2. Try its values in order: ascending mode id, then ascending start.
//! 3. Reject a value that conflicts with a bound neighbour or overflows the
//!    resource profile.
//! 4. Otherwise bind it inside a domain checkpoint and forward-check the
//!    unbound tasks. A wipeout rejects the value; else recurse.
//! 5. When every task is bound, re-check the complete assignment from
//!    scratch and accept it.
//!
//! Leaving the checkpoint scope rolls the domains back, so a failed branch
//! leaves no trace on its siblings.
//!
//! # Reference
//! Haralick & Elliott (1980), "Increasing Tree Search Efficiency for
//! Constraint Satisfaction Problems", Artificial Intelligence 14(3)

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use super::config::{SolverConfig, VariableOrder};
use super::constraints::{Binding, Conflict, ConstraintEngine, Propagation, ResourceProfile};
use super::domain::DomainStore;
use super::extract::extract;
use super::instance::Instance;
use super::types::{CutoffReason, NodeState, SearchMonitor, SearchStats, SolveOutcome};
use crate::error::DomainError;

/// Terminal result of a (sub)search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Solved,
    Exhausted,
    Cutoff(CutoffReason),
}

/// Builds the root domain store: horizon bounds plus, when enabled, the
/// precedence bound fixpoint.
///
/// Returns `None` when some task has no candidate value left, which proves
/// infeasibility before any branching.
pub(crate) fn prepare(
    instance: &Instance,
    config: &SolverConfig,
) -> Result<Option<DomainStore>, DomainError> {
    let checks = ConstraintEngine::new(instance, config.resource_forward_checking);
    let mut store = DomainStore::initialize(instance.vars.len(), instance.horizon);

    if checks.apply_horizon(&mut store)? == Propagation::Wipeout {
        return Ok(None);
    }
    if config.initial_propagation && checks.propagate_bounds(&mut store)? == Propagation::Wipeout {
        return Ok(None);
    }
    Ok(Some(store))
}

/// Depth-first search over one domain store.
pub(crate) struct Engine<'a> {
    instance: &'a Instance,
    config: &'a SolverConfig,
    checks: ConstraintEngine<'a>,
    order: Vec<usize>,
    assignment: Vec<Option<Binding>>,
    profile: ResourceProfile,
    depth: usize,
    stats: SearchStats,
    monitor: &'a mut dyn SearchMonitor,
    cancel: Option<&'a AtomicBool>,
    superseded: Option<(&'a AtomicUsize, usize)>,
    started: Instant,
    solution: Option<Vec<Binding>>,
}

impl<'a> Engine<'a> {
    pub fn new(
        instance: &'a Instance,
        config: &'a SolverConfig,
        monitor: &'a mut dyn SearchMonitor,
        cancel: Option<&'a AtomicBool>,
        started: Instant,
    ) -> Self {
        let order = match config.variable_order {
            VariableOrder::Topological => instance.topological_order(),
            VariableOrder::Lexicographic | VariableOrder::SmallestDomain => {
                (0..instance.tasks.len()).collect()
            }
        };
        Self {
            instance,
            config,
            checks: ConstraintEngine::new(instance, config.resource_forward_checking),
            order,
            assignment: vec![None; instance.tasks.len()],
            profile: ResourceProfile::new(instance),
            depth: 0,
            stats: SearchStats::default(),
            monitor,
            cancel,
            superseded: None,
            started,
            solution: None,
        }
    }

    /// Stops this engine once a worker with a lower index than `index`
    /// publishes a solution in `best`.
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    pub fn superseded_by(mut self, best: &'a AtomicUsize, index: usize) -> Self {
        self.superseded = Some((best, index));
        self
    }

    /// Runs the search from the store's current state.
    pub fn run(&mut self, store: &mut DomainStore) -> Result<Step, DomainError> {
        self.expand(store)
    }

    /// Turns a terminal step into an outcome.
    pub fn finish(self, step: Step) -> (SolveOutcome, SearchStats) {
        let outcome = match (step, self.solution) {
            (Step::Solved, Some(bindings)) => SolveOutcome::Solved(extract(self.instance, &bindings)),
            (Step::Cutoff(reason), _) => SolveOutcome::Unknown(reason),
            _ => SolveOutcome::Infeasible,
        };
        (outcome, self.stats)
    }

    /// Next task to branch on, or `None` when every task is bound.
    pub fn select_task(&self, store: &DomainStore) -> Result<Option<usize>, DomainError> {
        if self.config.variable_order != VariableOrder::SmallestDomain {
            return Ok(self
                .order
                .iter()
                .copied()
                .find(|&t| self.assignment[t].is_none()));
        }

        let mut best: Option<(usize, usize)> = None;
        for &t in &self.order {
            if self.assignment[t].is_some() {
                continue;
            }
            let mut size = 0;
            for var in self.instance.tasks[t].var_ids() {
                size += store.domain(var)?.len();
            }
            match best {
                Some((s, _)) if s <= size => {}
                _ => best = Some((size, t)),
            }
        }
        Ok(best.map(|(_, t)| t))
    }

    /// Candidate values of a task: modes ascending, then starts ascending.
    pub fn candidates(&self, store: &DomainStore, task: usize) -> Result<Vec<Binding>, DomainError> {
        let mut out = Vec::new();
        for var in self.instance.tasks[task].var_ids() {
            out.extend(store.domain(var)?.values().map(|start| Binding { var, start }));
        }
        Ok(out)
    }

    /// Whether a limit or cancellation has fired.
    pub fn cutoff(&self) -> Option<CutoffReason> {
        if self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Some(CutoffReason::Cancelled);
        }
        if let Some((best, index)) = self.superseded {
            if best.load(Ordering::Relaxed) < index {
                return Some(CutoffReason::Cancelled);
            }
        }
        if self.config.node_limit.is_some_and(|limit| self.stats.nodes >= limit) {
            return Some(CutoffReason::NodeLimit);
        }
        if let Some(ms) = self.config.time_limit_ms {
            if self.started.elapsed().as_millis() >= ms as u128 {
                return Some(CutoffReason::TimeLimit);
            }
        }
        None
    }

    fn expand(&mut self, store: &mut DomainStore) -> Result<Step, DomainError> {
        self.notify(NodeState::Unexplored);
        let Some(task) = self.select_task(store)? else {
            return Ok(self.accept());
        };
        self.notify(NodeState::Expanding);

        for binding in self.candidates(store, task)? {
            if let Some(reason) = self.cutoff() {
                return Ok(Step::Cutoff(reason));
            }
            match self.branch(store, task, binding)? {
                Step::Exhausted => {}
                step => return Ok(step),
            }
        }

        self.notify(NodeState::Exhausted);
        Ok(Step::Exhausted)
    }

    /// Tries one value of `task` and searches below it.
    ///
    /// A rejected value counts as `Exhausted`. The binding stays in place
    /// only when the step is `Solved`.
    pub fn branch(
        &mut self,
        store: &mut DomainStore,
        task: usize,
        binding: Binding,
    ) -> Result<Step, DomainError> {
        self.stats.nodes += 1;

        if let Some(conflict) = self
            .checks
            .admits(&self.assignment, &self.profile, task, binding)
        {
            self.stats.dead_ends += 1;
            if conflict == Conflict::Resource {
                self.stats.resource_conflicts += 1;
            }
            self.notify(NodeState::Dead);
            return Ok(Step::Exhausted);
        }

        self.bind(task, binding);
        let step = {
            let mut scope = store.checkpoint();
            let propagation = self.checks.forward_check(
                &mut scope,
                &self.assignment,
                &self.profile,
                task,
                binding,
            )?;
            match propagation {
                Propagation::Wipeout => {
                    self.stats.wipeouts += 1;
                    self.stats.dead_ends += 1;
                    self.notify(NodeState::Dead);
                    Step::Exhausted
                }
                Propagation::Consistent => {
                    self.stats.consistent += 1;
                    self.notify(NodeState::Consistent);
                    let step = self.expand(&mut scope)?;
                    if step == Step::Exhausted {
                        self.stats.backtracks += 1;
                    }
                    step
                }
            }
        };

        if step != Step::Solved {
            self.unbind(task, binding);
        }
        Ok(step)
    }

    fn accept(&mut self) -> Step {
        let bindings: Vec<Binding> = self.assignment.iter().flatten().copied().collect();
        if self.checks.check_complete(&bindings) {
            self.solution = Some(bindings);
            self.notify(NodeState::Solved);
            Step::Solved
        } else {
            self.stats.dead_ends += 1;
            self.notify(NodeState::Dead);
            Step::Exhausted
        }
    }

    fn bind(&mut self, task: usize, binding: Binding) {
        self.assignment[task] = Some(binding);
        self.profile.add(self.instance.var(binding.var), binding.start);
        self.depth += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.depth);
    }

    fn unbind(&mut self, task: usize, binding: Binding) {
        self.assignment[task] = None;
        self.profile.remove(self.instance.var(binding.var), binding.start);
        self.depth -= 1;
    }

    fn notify(&mut self, state: NodeState) {
        self.monitor.on_node(state, self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mode, ProjectModel, Task};
    use crate::solver::types::NoopMonitor;
    use std::time::Duration;

    fn run(model: &ProjectModel, config: &SolverConfig) -> (SolveOutcome, SearchStats) {
        let instance = Instance::compile(model);
        let Some(mut store) = prepare(&instance, config).unwrap() else {
            return (SolveOutcome::Infeasible, SearchStats::default());
        };
        let mut monitor = NoopMonitor;
        let mut engine = Engine::new(&instance, config, &mut monitor, None, Instant::now());
        let step = engine.run(&mut store).unwrap();
        engine.finish(step)
    }

    fn two_on_one_machine() -> ProjectModel {
        ProjectModel::new(10)
            .with_resource("R1", 1)
            .with_task(1, Task::single(Mode::new(3).with_demand("R1", 1)))
            .with_task(2, Task::single(Mode::new(3).with_demand("R1", 1)))
    }

    #[test]
    fn test_prepare_detects_horizon_infeasibility() {
        let model = ProjectModel::new(3).with_task(1, Task::single(Mode::new(5)));
        let instance = Instance::compile(&model);
        assert!(prepare(&instance, &SolverConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_prepare_detects_chain_too_long() {
        let model = ProjectModel::new(4)
            .with_task(1, Task::single(Mode::new(3)))
            .with_task(2, Task::single(Mode::new(3)))
            .with_precedence(1, 2);
        let instance = Instance::compile(&model);
        assert!(prepare(&instance, &SolverConfig::default()).unwrap().is_none());
        let lazy = SolverConfig::default().with_initial_propagation(false);
        assert!(prepare(&instance, &lazy).unwrap().is_some());
        // still infeasible, found by search instead
        assert_eq!(run(&model, &lazy).0, SolveOutcome::Infeasible);
    }

    #[test]
    fn test_no_overlap_on_unit_resource() {
        let (outcome, stats) = run(&two_on_one_machine(), &SolverConfig::default());
        let schedule = outcome.schedule().unwrap();
        assert_eq!(schedule.start_of(1), Some(0));
        assert_eq!(schedule.start_of(2), Some(3));
        assert_eq!(stats.max_depth, 2);
    }

    #[test]
    fn test_without_resource_forward_checking_same_answer() {
        let config = SolverConfig::default().with_resource_forward_checking(false);
        let (outcome, stats) = run(&two_on_one_machine(), &config);
        assert_eq!(outcome.schedule().unwrap().start_of(2), Some(3));
        // starts 0, 1, 2 of task 2 collide with task 1 at [0, 3)
        assert_eq!(stats.resource_conflicts, 3);
    }

    #[test]
    fn test_backtracks_over_mode_choice() {
        // Task 1 mode 1 is fast but leaves no room for task 2 on R1.
        let model = ProjectModel::new(4)
            .with_resource("R1", 2)
            .with_task(
                1,
                Task::new()
                    .with_mode(1, Mode::new(4).with_demand("R1", 2))
                    .with_mode(2, Mode::new(4).with_demand("R1", 1)),
            )
            .with_task(2, Task::single(Mode::new(4).with_demand("R1", 1)));
        let (outcome, stats) = run(&model, &SolverConfig::default());
        let schedule = outcome.schedule().unwrap();
        assert_eq!(schedule.entry(1).unwrap().mode, 2);
        assert_eq!(schedule.start_of(2), Some(0));
        assert!(stats.wipeouts >= 1);
        assert!(schedule.is_feasible(&model));
    }

    #[test]
    fn test_node_limit_gives_unknown() {
        let model = ProjectModel::new(6)
            .with_resource("R1", 1)
            .with_task(1, Task::single(Mode::new(3).with_demand("R1", 1)))
            .with_task(2, Task::single(Mode::new(3).with_demand("R1", 1)))
            .with_task(3, Task::single(Mode::new(3).with_demand("R1", 1)));
        let config = SolverConfig::default()
            .with_initial_propagation(false)
            .with_resource_forward_checking(false)
            .with_node_limit(2);
        let (outcome, stats) = run(&model, &config);
        assert_eq!(outcome, SolveOutcome::Unknown(CutoffReason::NodeLimit));
        assert_eq!(stats.nodes, 2);
    }

    #[test]
    fn test_time_limit_gives_unknown() {
        let model = two_on_one_machine();
        let instance = Instance::compile(&model);
        let config = SolverConfig::default().with_time_limit_ms(1);
        let mut store = prepare(&instance, &config).unwrap().unwrap();
        let started = Instant::now() - Duration::from_millis(10);
        let mut monitor = NoopMonitor;
        let mut engine = Engine::new(&instance, &config, &mut monitor, None, started);
        let step = engine.run(&mut store).unwrap();
        assert_eq!(step, Step::Cutoff(CutoffReason::TimeLimit));
        let (outcome, _) = engine.finish(step);
        assert_eq!(outcome, SolveOutcome::Unknown(CutoffReason::TimeLimit));
    }

    #[test]
    fn test_cancel_flag() {
        let model = two_on_one_machine();
        let instance = Instance::compile(&model);
        let config = SolverConfig::default();
        let mut store = prepare(&instance, &config).unwrap().unwrap();
        let flag = AtomicBool::new(true);
        let mut monitor = NoopMonitor;
        let mut engine = Engine::new(&instance, &config, &mut monitor, Some(&flag), Instant::now());
        let step = engine.run(&mut store).unwrap();
        assert_eq!(step, Step::Cutoff(CutoffReason::Cancelled));
    }

    #[test]
    fn test_superseded_worker_stops() {
        let model = two_on_one_machine();
        let instance = Instance::compile(&model);
        let config = SolverConfig::default();
        let mut store = prepare(&instance, &config).unwrap().unwrap();
        let best = AtomicUsize::new(0);
        let mut monitor = NoopMonitor;
        let mut engine = Engine::new(&instance, &config, &mut monitor, None, Instant::now())
            .superseded_by(&best, 3);
        assert_eq!(engine.run(&mut store).unwrap(), Step::Cutoff(CutoffReason::Cancelled));
    }

    #[test]
    fn test_variable_orders_select_differently() {
        // 2 -> 1: topological order branches on task 2 first.
        let model = ProjectModel::new(5)
            .with_task(1, Task::single(Mode::new(1)))
            .with_task(2, Task::single(Mode::new(1)))
            .with_task(3, Task::single(Mode::new(5)))
            .with_precedence(2, 1);
        let instance = Instance::compile(&model);
        let store = DomainStore::initialize(instance.vars.len(), instance.horizon);
        let mut monitor = NoopMonitor;

        let config = SolverConfig::default();
        let engine = Engine::new(&instance, &config, &mut monitor, None, Instant::now());
        assert_eq!(engine.select_task(&store).unwrap(), Some(0));
        drop(engine);

        let config = SolverConfig::default().with_variable_order(VariableOrder::Topological);
        let engine = Engine::new(&instance, &config, &mut monitor, None, Instant::now());
        assert_eq!(engine.select_task(&store).unwrap(), Some(1));
        drop(engine);

        let config = SolverConfig::default().with_variable_order(VariableOrder::SmallestDomain);
        let store = prepare(&instance, &config).unwrap().unwrap();
        let engine = Engine::new(&instance, &config, &mut monitor, None, Instant::now());
        // task 3 (d5, horizon 5) can only start at 0
        assert_eq!(engine.select_task(&store).unwrap(), Some(2));
    }

    #[test]
    fn test_candidates_order() {
        let model = ProjectModel::new(2).with_task(
            1,
            Task::new()
                .with_mode(2, Mode::new(1))
                .with_mode(1, Mode::new(2)),
        );
        let instance = Instance::compile(&model);
        let config = SolverConfig::default();
        let store = prepare(&instance, &config).unwrap().unwrap();
        let mut monitor = NoopMonitor;
        let engine = Engine::new(&instance, &config, &mut monitor, None, Instant::now());
        let got: Vec<(i64, i64)> = engine
            .candidates(&store, 0)
            .unwrap()
            .iter()
            .map(|b| (instance.var(b.var).duration, b.start))
            .collect();
        // mode 1 (d2) first: start 0 only; then mode 2 (d1): 0, 1
        assert_eq!(got, vec![(2, 0), (1, 0), (1, 1)]);
    }
}
