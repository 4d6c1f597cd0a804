//! Parallel root splitting (feature `parallel`).
//!
//! The values of the first branching task are distributed over a rayon
//! pool; every worker searches below its root value with its own copy of
//! the domain store. Workers publish the index of their root value when
//! they solve, and any worker with a higher index stops at its next node.
//!
//! The verdict is taken in root-value order: the first value whose search
//! did not exhaust decides. This makes the schedule identical to the
//! sequential one.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use super::config::SolverConfig;
use super::domain::DomainStore;
use super::instance::Instance;
use super::search::{Engine, Step};
use super::types::{NoopMonitor, SearchStats, SolveOutcome};
use crate::error::DomainError;

pub(crate) fn search(
    instance: &Instance,
    config: &SolverConfig,
    mut store: DomainStore,
    cancel: Option<&AtomicBool>,
    started: Instant,
) -> Result<(SolveOutcome, SearchStats), DomainError> {
    let mut noop = NoopMonitor;
    let mut root = Engine::new(instance, config, &mut noop, cancel, started);
    let Some(task) = root.select_task(&store)? else {
        let step = root.run(&mut store)?;
        return Ok(root.finish(step));
    };
    let candidates = root.candidates(&store, task)?;
    drop(root);

    let best = AtomicUsize::new(usize::MAX);
    let work = || {
        candidates
            .into_par_iter()
            .enumerate()
            .map(|(index, binding)| -> Result<(SolveOutcome, SearchStats), DomainError> {
                let mut store = store.clone();
                let mut monitor = NoopMonitor;
                let mut engine = Engine::new(instance, config, &mut monitor, cancel, started)
                    .superseded_by(&best, index);
                let step = match engine.cutoff() {
                    Some(reason) => Step::Cutoff(reason),
                    None => engine.branch(&mut store, task, binding)?,
                };
                if step == Step::Solved {
                    best.fetch_min(index, Ordering::SeqCst);
                }
                Ok(engine.finish(step))
            })
            .collect::<Vec<_>>()
    };

    let results = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_workers)
        .build()
    {
        Ok(pool) => pool.install(work),
        Err(_) => work(),
    };

    let mut stats = SearchStats::default();
    let mut verdict = None;
    for result in results {
        let (outcome, worker_stats) = result?;
        stats.merge(&worker_stats);
        if verdict.is_none() && !outcome.is_infeasible() {
            verdict = Some(outcome);
        }
    }
    Ok((verdict.unwrap_or(SolveOutcome::Infeasible), stats))
}
