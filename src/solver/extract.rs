//! Schedule extraction from a solved assignment.

use super::constraints::Binding;
use super::instance::Instance;
use crate::models::{Schedule, ScheduledTask};

/// Builds the caller-facing schedule from one binding per task index.
///
/// Entries come out sorted by task id since task indices follow ascending
/// id order.
pub(crate) fn extract(instance: &Instance, bindings: &[Binding]) -> Schedule {
    let entries = instance
        .tasks
        .iter()
        .zip(bindings)
        .map(|(task, binding)| {
            let info = instance.var(binding.var);
            ScheduledTask {
                task: task.id,
                mode: info.mode,
                start: binding.start,
                finish: binding.start + info.duration,
            }
        })
        .collect();
    Schedule::from_entries(entries)
}
