//! Task model.
//!
//! A task is a unit of project work with one or more alternative execution
//! modes. Exactly one mode is selected per task in a finished schedule.
//!
//! # Reference
//! Kolisch & Sprecher (1997), "PSPLIB - A project scheduling problem library"

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Mode, ModeId};

/// Identifier of a task. Valid identifiers are positive.
pub type TaskId = u32;

/// A task to be scheduled.
///
/// Serialized as a plain map of mode id to mode, which is the shape of
/// the `tasks` entries in a serialized [`ProjectModel`](super::ProjectModel).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Task {
    /// Alternative execution modes, ordered by mode id.
    pub modes: BTreeMap<ModeId, Mode>,
}

impl Task {
    /// Creates a task without modes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a single-mode task (mode id 1).
    pub fn single(mode: Mode) -> Self {
        Self::new().with_mode(1, mode)
    }

    /// Adds (or replaces) a mode.
    pub fn with_mode(mut self, id: ModeId, mode: Mode) -> Self {
        self.modes.insert(id, mode);
        self
    }

    /// Looks up a mode.
    pub fn mode(&self, id: ModeId) -> Option<&Mode> {
        self.modes.get(&id)
    }

    /// Number of modes.
    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    /// Shortest duration over all modes (`None` without modes).
    pub fn min_duration(&self) -> Option<i64> {
        self.modes.values().map(|m| m.duration).min()
    }
}
