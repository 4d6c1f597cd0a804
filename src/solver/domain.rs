//! Domain store: candidate start times per (task, mode) variable.
//!
//! Each variable owns a finite domain over `0..=horizon`, stored as a
//! bitset. Narrowing is recorded on a trail so that a search branch can be
//! rolled back exactly to the checkpoint it started from.
//!
//! # Scoped Rollback
//!
//! [`DomainStore::checkpoint`] returns a [`Checkpoint`] guard that derefs to
//! the store and restores the recorded state when dropped, so every exit
//! from a branch (success, failure, early return, `?`) rolls back. The
//! explicit [`snapshot`](DomainStore::snapshot) /
//! [`restore`](DomainStore::restore) pair is available when a guard is
//! inconvenient.
//!
//! # Reference
//! Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming",
//! Ch. 4 (Backtracking Search Algorithms)

use std::ops::{Deref, DerefMut};

use crate::error::DomainError;
use crate::validation::MAX_HORIZON;

/// Identifier of a (task, mode) variable inside one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

const WORD_BITS: usize = 64;

/// A finite set of candidate start times within `0..=horizon`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    words: Vec<u64>,
    universe: usize,
    len: usize,
}

impl Domain {
    /// Creates the full domain `{0, 1, …, horizon}`.
    ///
    /// The horizon is clamped to `0..=MAX_HORIZON`; validated models never
    /// reach the clamp.
    pub fn full(horizon: i64) -> Self {
        let universe = (horizon.clamp(0, MAX_HORIZON) + 1) as usize;
        let mut words = vec![u64::MAX; universe.div_ceil(WORD_BITS)];
        let tail = universe % WORD_BITS;
        if tail != 0 {
            if let Some(last) = words.last_mut() {
                *last = (1_u64 << tail) - 1;
            }
        }
        Self {
            words,
            universe,
            len: universe,
        }
    }

    /// Number of values left.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no value is left (a wipeout).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `value` is still a candidate.
    pub fn contains(&self, value: i64) -> bool {
        if value < 0 || value as usize >= self.universe {
            return false;
        }
        let v = value as usize;
        self.words[v / WORD_BITS] & (1_u64 << (v % WORD_BITS)) != 0
    }

    /// Smallest remaining value.
    pub fn min(&self) -> Option<i64> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| (i * WORD_BITS + w.trailing_zeros() as usize) as i64)
    }

    /// Largest remaining value.
    pub fn max(&self) -> Option<i64> {
        self.words
            .iter()
            .enumerate()
            .rev()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| (i * WORD_BITS + (WORD_BITS - 1 - w.leading_zeros() as usize)) as i64)
    }

    /// Remaining values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                Some((i * WORD_BITS + bit) as i64)
            })
        })
    }

    /// Keeps only values satisfying `keep`. Returns whether anything changed.
    fn retain(&mut self, mut keep: impl FnMut(i64) -> bool) -> bool {
        let mut changed = false;
        for i in 0..self.words.len() {
            let mut w = self.words[i];
            let mut remaining = w;
            while remaining != 0 {
                let bit = remaining.trailing_zeros() as usize;
                remaining &= remaining - 1;
                if !keep((i * WORD_BITS + bit) as i64) {
                    w &= !(1_u64 << bit);
                    self.len -= 1;
                    changed = true;
                }
            }
            self.words[i] = w;
        }
        changed
    }

    fn clear(&mut self) -> bool {
        let changed = self.len > 0;
        self.words.iter_mut().for_each(|w| *w = 0);
        self.len = 0;
        changed
    }
}

/// Opaque restriction checkpoint (a trail position).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot(usize);

/// Domains of all variables of one search, with a rollback trail.
///
/// Owned by exactly one search; parallel workers each clone their own.
#[derive(Debug, Clone)]
pub struct DomainStore {
    domains: Vec<Domain>,
    trail: Vec<(VarId, Domain)>,
}

impl DomainStore {
    /// Creates `variable_count` variables, each with domain `{0, …, horizon}`.
    pub fn initialize(variable_count: usize, horizon: i64) -> Self {
        Self {
            domains: vec![Domain::full(horizon); variable_count],
            trail: Vec::new(),
        }
    }

    /// Number of variables.
    pub fn variable_count(&self) -> usize {
        self.domains.len()
    }

    /// Current domain of a variable.
    pub fn domain(&self, var: VarId) -> Result<&Domain, DomainError> {
        self.domains
            .get(var.0)
            .ok_or(DomainError::InvalidVariable(var))
    }

    /// Removes every value failing `predicate`.
    ///
    /// Returns `true` when the domain is empty afterwards (a wipeout).
    pub fn restrict(
        &mut self,
        var: VarId,
        predicate: impl FnMut(i64) -> bool,
    ) -> Result<bool, DomainError> {
        let domain = self
            .domains
            .get_mut(var.0)
            .ok_or(DomainError::InvalidVariable(var))?;
        let before = domain.clone();
        if domain.retain(predicate) {
            self.trail.push((var, before));
        }
        Ok(self.domains[var.0].is_empty())
    }

    /// Removes values below `lo`. Returns `true` on wipeout.
    pub fn restrict_min(&mut self, var: VarId, lo: i64) -> Result<bool, DomainError> {
        match self.domain(var)?.min() {
            Some(min) if min < lo => self.restrict(var, |v| v >= lo),
            Some(_) => Ok(false),
            None => Ok(true),
        }
    }

    /// Removes values above `hi`. Returns `true` on wipeout.
    pub fn restrict_max(&mut self, var: VarId, hi: i64) -> Result<bool, DomainError> {
        match self.domain(var)?.max() {
            Some(max) if max > hi => self.restrict(var, |v| v <= hi),
            Some(_) => Ok(false),
            None => Ok(true),
        }
    }

    /// Narrows a variable to the single value `value`.
    ///
    /// Returns `true` on wipeout (the value was not a candidate).
    pub fn fix(&mut self, var: VarId, value: i64) -> Result<bool, DomainError> {
        self.restrict(var, |v| v == value)
    }

    /// Removes every value of a variable.
    pub fn clear(&mut self, var: VarId) -> Result<(), DomainError> {
        let domain = self
            .domains
            .get_mut(var.0)
            .ok_or(DomainError::InvalidVariable(var))?;
        let before = domain.clone();
        if domain.clear() {
            self.trail.push((var, before));
        }
        Ok(())
    }

    /// Records the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.trail.len())
    }

    /// Rolls back every restriction made after `snapshot`.
    pub fn restore(&mut self, snapshot: Snapshot) {
        while self.trail.len() > snapshot.0 {
            if let Some((var, domain)) = self.trail.pop() {
                self.domains[var.0] = domain;
            }
        }
    }

    /// Opens a scope that rolls back to the current state when dropped.
    pub fn checkpoint(&mut self) -> Checkpoint<'_> {
        let snapshot = self.snapshot();
        Checkpoint {
            store: self,
            snapshot,
        }
    }
}

/// Scope guard returned by [`DomainStore::checkpoint`].
pub struct Checkpoint<'a> {
    store: &'a mut DomainStore,
    snapshot: Snapshot,
}

impl Deref for Checkpoint<'_> {
    type Target = DomainStore;

    fn deref(&self) -> &DomainStore {
        self.store
    }
}

impl DerefMut for Checkpoint<'_> {
    fn deref_mut(&mut self) -> &mut DomainStore {
        self.store
    }
}

impl Drop for Checkpoint<'_> {
    fn drop(&mut self) {
        self.store.restore(self.snapshot);
    }
}
