//! Constraint engine: horizon, precedence, and resource capacity.
//!
//! # Constraint Families
//!
//! - **Horizon** (unary): `start + duration <= horizon`.
//! - **Precedence** (binary, per edge × mode pair):
//!   `start(pred) + duration(pred mode) <= start(succ)`. Enforced by forward
//!   checking in both directions whenever either end is bound.
//! - **Resource capacity** (global): at every instant the summed demand of
//!   all active bound variables stays within capacity. Kept as a
//!   time-indexed usage profile over the whole partial assignment, since
//!   joint occupancy cannot be decomposed into pairwise constraints.
//!
//! Milestones (zero duration) never occupy an instant, so they never
//! touch the profile; they still bound their neighbours through
//! precedence.
//!
//! # Reference
//! Baptiste, Le Pape & Nuijten (2001), "Constraint-Based Scheduling", Ch. 2

use super::domain::{DomainStore, VarId};
use super::instance::{Instance, VarInfo};
use crate::error::DomainError;

/// A tentative or final value of one task: its mode variable and start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Binding {
    pub var: VarId,
    pub start: i64,
}

/// Why a tentative binding was rejected before propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Conflict {
    Precedence,
    Resource,
}

/// Outcome of propagating a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Propagation {
    Consistent,
    /// Every mode of some unbound task lost all its values.
    Wipeout,
}

/// Resource usage of the bound variables at each instant `0..horizon`.
#[derive(Debug, Clone)]
pub(crate) struct ResourceProfile {
    usage: Vec<Vec<i64>>,
}

impl ResourceProfile {
    pub fn new(instance: &Instance) -> Self {
        let len = instance.horizon.max(0) as usize;
        Self {
            usage: vec![vec![0; len]; instance.resource_count()],
        }
    }

    /// Whether `info` started at `start` fits on top of the current usage.
    pub fn fits(&self, instance: &Instance, info: &VarInfo, start: i64) -> bool {
        if info.duration == 0 {
            return true;
        }
        info.demand.iter().enumerate().all(|(r, &d)| {
            d == 0
                || (start..start + info.duration).all(|t| {
                    usize::try_from(t)
                        .ok()
                        .and_then(|t| self.usage[r].get(t))
                        .and_then(|&used| used.checked_add(d))
                        .is_some_and(|total| total <= instance.capacities[r])
                })
        })
    }

    pub fn add(&mut self, info: &VarInfo, start: i64) {
        self.apply(info, start, 1);
    }

    pub fn remove(&mut self, info: &VarInfo, start: i64) {
        self.apply(info, start, -1);
    }

    fn apply(&mut self, info: &VarInfo, start: i64, sign: i64) {
        for (r, &d) in info.demand.iter().enumerate() {
            if d == 0 {
                continue;
            }
            for t in start.max(0)..(start + info.duration).min(self.usage[r].len() as i64) {
                let used = &mut self.usage[r][t as usize];
                *used = used.saturating_add(sign * d);
            }
        }
    }
}

/// Checks and propagates constraints against a domain store.
pub(crate) struct ConstraintEngine<'a> {
    instance: &'a Instance,
    resource_forward_checking: bool,
}

impl<'a> ConstraintEngine<'a> {
    pub fn new(instance: &'a Instance, resource_forward_checking: bool) -> Self {
        Self {
            instance,
            resource_forward_checking,
        }
    }

    /// Whether some mode of `task` still has a candidate start.
    pub fn task_alive(&self, store: &DomainStore, task: usize) -> Result<bool, DomainError> {
        for var in self.instance.tasks[task].var_ids() {
            if !store.domain(var)?.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Applies the horizon constraint to every variable.
    pub fn apply_horizon(&self, store: &mut DomainStore) -> Result<Propagation, DomainError> {
        for (i, info) in self.instance.vars.iter().enumerate() {
            store.restrict_max(VarId(i), self.instance.horizon - info.duration)?;
        }
        self.all_alive(store)
    }

    /// Propagates precedence bounds over the whole graph to a fixpoint.
    ///
    /// Successors lose starts earlier than the earliest possible finish of
    /// their predecessor; predecessors lose starts that leave no room before
    /// the latest possible start of their successor.
    pub fn propagate_bounds(&self, store: &mut DomainStore) -> Result<Propagation, DomainError> {
        loop {
            let before = store.snapshot();
            for (p, task) in self.instance.tasks.iter().enumerate() {
                for &s in &task.successors {
                    let Some(earliest_finish) = self.earliest_finish(store, p)? else {
                        return Ok(Propagation::Wipeout);
                    };
                    for var in self.instance.tasks[s].var_ids() {
                        store.restrict_min(var, earliest_finish)?;
                    }
                    let Some(latest_start) = self.latest_start(store, s)? else {
                        return Ok(Propagation::Wipeout);
                    };
                    for var in task.var_ids() {
                        store.restrict_max(var, latest_start - self.instance.var(var).duration)?;
                    }
                }
            }
            if store.snapshot() == before {
                break;
            }
        }
        self.all_alive(store)
    }

    /// Checks a tentative binding against the bound part of the assignment.
    pub fn admits(
        &self,
        assignment: &[Option<Binding>],
        profile: &ResourceProfile,
        task: usize,
        binding: Binding,
    ) -> Option<Conflict> {
        let info = self.instance.var(binding.var);
        let finish = binding.start + info.duration;
        let info_task = &self.instance.tasks[task];

        let succ_ok = info_task.successors.iter().all(|&s| match assignment[s] {
            Some(b) => finish <= b.start,
            None => true,
        });
        let pred_ok = info_task.predecessors.iter().all(|&p| match assignment[p] {
            Some(b) => b.start + self.instance.var(b.var).duration <= binding.start,
            None => true,
        });
        if !succ_ok || !pred_ok {
            return Some(Conflict::Precedence);
        }
        if !profile.fits(self.instance, info, binding.start) {
            return Some(Conflict::Resource);
        }
        None
    }

    /// Forward checking after `task` was bound (assignment and profile
    /// already updated).
    pub fn forward_check(
        &self,
        store: &mut DomainStore,
        assignment: &[Option<Binding>],
        profile: &ResourceProfile,
        task: usize,
        binding: Binding,
    ) -> Result<Propagation, DomainError> {
        let instance = self.instance;
        let info = instance.var(binding.var);
        let finish = binding.start + info.duration;

        for var in instance.tasks[task].var_ids() {
            if var == binding.var {
                store.fix(var, binding.start)?;
            } else {
                store.clear(var)?;
            }
        }

        for &s in &instance.tasks[task].successors {
            if assignment[s].is_some() {
                continue;
            }
            for var in instance.tasks[s].var_ids() {
                store.restrict_min(var, finish)?;
            }
            if !self.task_alive(store, s)? {
                return Ok(Propagation::Wipeout);
            }
        }

        for &p in &instance.tasks[task].predecessors {
            if assignment[p].is_some() {
                continue;
            }
            for var in instance.tasks[p].var_ids() {
                store.restrict_max(var, binding.start - instance.var(var).duration)?;
            }
            if !self.task_alive(store, p)? {
                return Ok(Propagation::Wipeout);
            }
        }

        if self.resource_forward_checking && info.consumes() {
            for (u, other) in instance.tasks.iter().enumerate() {
                if assignment[u].is_some() {
                    continue;
                }
                for var in other.var_ids() {
                    let candidate = instance.var(var);
                    if !candidate.shares_resource_with(info) {
                        continue;
                    }
                    store.restrict(var, |start| {
                        let overlaps = start < finish && binding.start < start + candidate.duration;
                        !overlaps || profile.fits(instance, candidate, start)
                    })?;
                }
                if !self.task_alive(store, u)? {
                    return Ok(Propagation::Wipeout);
                }
            }
        }

        Ok(Propagation::Consistent)
    }

    /// Full re-validation of a complete assignment (one binding per task).
    pub fn check_complete(&self, bindings: &[Binding]) -> bool {
        let instance = self.instance;
        if bindings.len() != instance.tasks.len() {
            return false;
        }

        let within_horizon = bindings.iter().all(|b| {
            let finish = b.start.saturating_add(instance.var(b.var).duration);
            b.start >= 0 && finish <= instance.horizon
        });
        if !within_horizon {
            return false;
        }

        let precedence_ok = instance.tasks.iter().enumerate().all(|(p, task)| {
            let finish = bindings[p].start + instance.var(bindings[p].var).duration;
            task.successors.iter().all(|&s| finish <= bindings[s].start)
        });
        if !precedence_ok {
            return false;
        }

        let instants = (instance.horizon + 1) as usize;
        let mut usage = vec![vec![0_i64; instants]; instance.resource_count()];
        for b in bindings {
            let info = instance.var(b.var);
            for (r, &d) in info.demand.iter().enumerate() {
                if d == 0 {
                    continue;
                }
                for t in b.start..b.start + info.duration {
                    // A sum past i64::MAX is above any capacity.
                    match usage[r][t as usize].checked_add(d) {
                        Some(total) => usage[r][t as usize] = total,
                        None => return false,
                    }
                }
            }
        }
        usage
            .iter()
            .zip(&instance.capacities)
            .all(|(profile, &capacity)| profile.iter().all(|&u| u <= capacity))
    }

    fn all_alive(&self, store: &DomainStore) -> Result<Propagation, DomainError> {
        for t in 0..self.instance.tasks.len() {
            if !self.task_alive(store, t)? {
                return Ok(Propagation::Wipeout);
            }
        }
        Ok(Propagation::Consistent)
    }

    fn earliest_finish(&self, store: &DomainStore, task: usize) -> Result<Option<i64>, DomainError> {
        let mut best = None;
        for var in self.instance.tasks[task].var_ids() {
            if let Some(min) = store.domain(var)?.min() {
                let finish = min + self.instance.var(var).duration;
                best = Some(best.map_or(finish, |b: i64| b.min(finish)));
            }
        }
        Ok(best)
    }

    fn latest_start(&self, store: &DomainStore, task: usize) -> Result<Option<i64>, DomainError> {
        let mut best = None;
        for var in self.instance.tasks[task].var_ids() {
            if let Some(max) = store.domain(var)?.max() {
                best = Some(best.map_or(max, |b: i64| b.max(max)));
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mode, ProjectModel, Task};

    fn chain() -> Instance {
        Instance::compile(
            &ProjectModel::new(5)
                .with_resource("R1", 1)
                .with_task(1, Task::single(Mode::new(2).with_demand("R1", 1)))
                .with_task(2, Task::single(Mode::new(1).with_demand("R1", 1)))
                .with_precedence(1, 2),
        )
    }

    fn values(store: &DomainStore, var: usize) -> Vec<i64> {
        store.domain(VarId(var)).unwrap().values().collect()
    }

    #[test]
    fn test_horizon_trims_late_starts() {
        let inst = chain();
        let engine = ConstraintEngine::new(&inst, true);
        let mut store = DomainStore::initialize(inst.vars.len(), inst.horizon);
        assert_eq!(engine.apply_horizon(&mut store).unwrap(), Propagation::Consistent);
        assert_eq!(values(&store, 0), vec![0, 1, 2, 3]);
        assert_eq!(values(&store, 1), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_horizon_wipeout() {
        let inst = Instance::compile(
            &ProjectModel::new(3).with_task(1, Task::single(Mode::new(5))),
        );
        let engine = ConstraintEngine::new(&inst, true);
        let mut store = DomainStore::initialize(inst.vars.len(), inst.horizon);
        assert_eq!(engine.apply_horizon(&mut store).unwrap(), Propagation::Wipeout);
    }

    #[test]
    fn test_bounds_propagation() {
        let inst = chain();
        let engine = ConstraintEngine::new(&inst, true);
        let mut store = DomainStore::initialize(inst.vars.len(), inst.horizon);
        engine.apply_horizon(&mut store).unwrap();
        assert_eq!(engine.propagate_bounds(&mut store).unwrap(), Propagation::Consistent);
        assert_eq!(values(&store, 0), vec![0, 1, 2]);
        assert_eq!(values(&store, 1), vec![2, 3, 4]);
    }

    #[test]
    fn test_forward_check_prunes_successor() {
        let inst = chain();
        let engine = ConstraintEngine::new(&inst, false);
        let mut store = DomainStore::initialize(inst.vars.len(), inst.horizon);
        let mut profile = ResourceProfile::new(&inst);
        let binding = Binding { var: VarId(0), start: 1 };
        let assignment = vec![Some(binding), None];
        profile.add(inst.var(binding.var), binding.start);

        let result = engine
            .forward_check(&mut store, &assignment, &profile, 0, binding)
            .unwrap();
        assert_eq!(result, Propagation::Consistent);
        assert_eq!(values(&store, 0), vec![1]);
        assert_eq!(values(&store, 1), vec![3, 4, 5]);
    }

    #[test]
    fn test_forward_check_prunes_predecessor() {
        let inst = chain();
        let engine = ConstraintEngine::new(&inst, false);
        let mut store = DomainStore::initialize(inst.vars.len(), inst.horizon);
        let profile = ResourceProfile::new(&inst);
        let binding = Binding { var: VarId(1), start: 3 };
        let assignment = vec![None, Some(binding)];

        engine
            .forward_check(&mut store, &assignment, &profile, 1, binding)
            .unwrap();
        assert_eq!(values(&store, 0), vec![0, 1]);
    }

    #[test]
    fn test_resource_forward_check() {
        let inst = Instance::compile(
            &ProjectModel::new(10)
                .with_resource("R1", 1)
                .with_task(1, Task::single(Mode::new(3).with_demand("R1", 1)))
                .with_task(2, Task::single(Mode::new(3).with_demand("R1", 1))),
        );
        let engine = ConstraintEngine::new(&inst, true);
        let mut store = DomainStore::initialize(inst.vars.len(), inst.horizon);
        engine.apply_horizon(&mut store).unwrap();
        let mut profile = ResourceProfile::new(&inst);
        let binding = Binding { var: VarId(0), start: 2 };
        let assignment = vec![Some(binding), None];
        profile.add(inst.var(binding.var), binding.start);

        engine
            .forward_check(&mut store, &assignment, &profile, 0, binding)
            .unwrap();
        // [0,3) .. [4,7) would overlap [2,5)
        assert_eq!(values(&store, 1), vec![5, 6, 7]);
    }

    #[test]
    fn test_admits_detects_conflicts() {
        let inst = chain();
        let engine = ConstraintEngine::new(&inst, true);
        let mut profile = ResourceProfile::new(&inst);
        let first = Binding { var: VarId(0), start: 0 };
        profile.add(inst.var(first.var), first.start);
        let assignment = vec![Some(first), None];

        let early = Binding { var: VarId(1), start: 1 };
        assert_eq!(
            engine.admits(&assignment, &profile, 1, early),
            Some(Conflict::Precedence)
        );
        let ok = Binding { var: VarId(1), start: 2 };
        assert_eq!(engine.admits(&assignment, &profile, 1, ok), None);

        let unordered = vec![None, None];
        assert_eq!(
            engine.admits(&unordered, &profile, 1, early),
            Some(Conflict::Resource)
        );
    }

    #[test]
    fn test_profile_add_remove() {
        let inst = chain();
        let mut profile = ResourceProfile::new(&inst);
        let info = inst.var(VarId(0));
        assert!(profile.fits(&inst, info, 0));
        profile.add(info, 0);
        assert!(!profile.fits(&inst, inst.var(VarId(1)), 1));
        assert!(profile.fits(&inst, inst.var(VarId(1)), 2));
        profile.remove(info, 0);
        assert!(profile.fits(&inst, inst.var(VarId(1)), 1));
        // runs past the horizon
        assert!(!profile.fits(&inst, info, 4));
    }

    #[test]
    fn test_demand_at_capacity_limit() {
        let inst = Instance::compile(
            &ProjectModel::new(4)
                .with_resource("R1", i64::MAX)
                .with_task(1, Task::single(Mode::new(2).with_demand("R1", i64::MAX)))
                .with_task(2, Task::single(Mode::new(2).with_demand("R1", i64::MAX))),
        );
        let engine = ConstraintEngine::new(&inst, true);
        let mut profile = ResourceProfile::new(&inst);
        profile.add(inst.var(VarId(0)), 0);
        assert!(!profile.fits(&inst, inst.var(VarId(1)), 0));
        assert!(!profile.fits(&inst, inst.var(VarId(1)), 1));
        assert!(profile.fits(&inst, inst.var(VarId(1)), 2));
        profile.remove(inst.var(VarId(0)), 0);
        assert!(profile.fits(&inst, inst.var(VarId(1)), 0));

        let overlap = [Binding { var: VarId(0), start: 0 }, Binding { var: VarId(1), start: 1 }];
        assert!(!engine.check_complete(&overlap));
        let apart = [Binding { var: VarId(0), start: 0 }, Binding { var: VarId(1), start: 2 }];
        assert!(engine.check_complete(&apart));
    }

    #[test]
    fn test_check_complete() {
        let inst = chain();
        let engine = ConstraintEngine::new(&inst, true);
        let good = [Binding { var: VarId(0), start: 0 }, Binding { var: VarId(1), start: 2 }];
        assert!(engine.check_complete(&good));
        let overlap = [Binding { var: VarId(0), start: 2 }, Binding { var: VarId(1), start: 3 }];
        assert!(!engine.check_complete(&overlap));
        let late = [Binding { var: VarId(0), start: 0 }, Binding { var: VarId(1), start: 5 }];
        assert!(!engine.check_complete(&late));
        let reversed = [Binding { var: VarId(0), start: 2 }, Binding { var: VarId(1), start: 0 }];
        assert!(!engine.check_complete(&reversed));
    }

    #[test]
    fn test_milestone_ignores_resources() {
        let inst = Instance::compile(
            &ProjectModel::new(0)
                .with_resource("R1", 0)
                .with_task(1, Task::single(Mode::milestone().with_demand("R1", 3))),
        );
        let engine = ConstraintEngine::new(&inst, true);
        let profile = ResourceProfile::new(&inst);
        let b = Binding { var: VarId(0), start: 0 };
        assert_eq!(engine.admits(&[None], &profile, 0, b), None);
        assert!(engine.check_complete(&[b]));
    }
}
