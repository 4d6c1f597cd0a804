//! Reference project instances.
//!
//! Two small single-mode projects used by tests, benchmarks, and
//! documentation:
//!
//! - [`small_project`]: two independent chains of four tasks competing for
//!   a unit resource and a two-unit resource.
//! - [`medium_project`]: twelve tasks between a start and an end
//!   milestone, on two resources (capacity 6 and 4).

use crate::models::{Mode, ProjectModel, Task, TaskId};

fn unit(duration: i64, demands: &[(&str, i64)]) -> Task {
    let mode = demands
        .iter()
        .fold(Mode::new(duration), |mode, &(resource, amount)| {
            mode.with_demand(resource, amount)
        });
    Task::single(mode)
}

fn with_tasks(model: ProjectModel, tasks: Vec<(TaskId, Task)>) -> ProjectModel {
    tasks
        .into_iter()
        .fold(model, |model, (id, task)| model.with_task(id, task))
}

/// Eight tasks, horizon 20.
///
/// Chains `1 → {2, 3} → 4` and `5 → {6, 7} → 8`; tasks 1 and 5 share the
/// unit resource `R1`, all others draw one unit of `R2` (capacity 2).
pub fn small_project() -> ProjectModel {
    let model = ProjectModel::new(20)
        .with_resource("R1", 1)
        .with_resource("R2", 2);
    with_tasks(
        model,
        vec![
            (1, unit(2, &[("R1", 1), ("R2", 0)])),
            (2, unit(3, &[("R2", 1)])),
            (3, unit(4, &[("R2", 1)])),
            (4, unit(1, &[("R2", 1)])),
            (5, unit(2, &[("R1", 1)])),
            (6, unit(3, &[("R2", 1)])),
            (7, unit(4, &[("R2", 1)])),
            (8, unit(1, &[("R2", 1)])),
        ],
    )
    .with_successors(1, &[2, 3])
    .with_successors(2, &[4])
    .with_successors(3, &[4])
    .with_successors(5, &[6, 7])
    .with_successors(6, &[8])
    .with_successors(7, &[8])
}

/// Twelve tasks, horizon 46. Tasks 1 and 12 are milestones.
pub fn medium_project() -> ProjectModel {
    let model = ProjectModel::new(46)
        .with_resource("R1", 6)
        .with_resource("R2", 4);
    with_tasks(
        model,
        vec![
            (1, unit(0, &[("R1", 0), ("R2", 0)])),
            (2, unit(3, &[("R1", 6), ("R2", 2)])),
            (3, unit(1, &[("R1", 0), ("R2", 0)])),
            (4, unit(8, &[("R1", 4), ("R2", 0)])),
            (5, unit(4, &[("R1", 0), ("R2", 4)])),
            (6, unit(4, &[("R1", 0), ("R2", 4)])),
            (7, unit(6, &[("R1", 2), ("R2", 0)])),
            (8, unit(4, &[("R1", 4), ("R2", 2)])),
            (9, unit(5, &[("R1", 3), ("R2", 0)])),
            (10, unit(7, &[("R1", 2), ("R2", 1)])),
            (11, unit(4, &[("R1", 0), ("R2", 3)])),
            (12, unit(0, &[("R1", 0), ("R2", 0)])),
        ],
    )
    .with_successors(1, &[2, 3, 4])
    .with_successors(2, &[5, 6])
    .with_successors(3, &[10, 11])
    .with_successors(4, &[9])
    .with_successors(5, &[7, 8])
    .with_successors(6, &[10, 11])
    .with_successors(7, &[9, 10])
    .with_successors(8, &[9])
    .with_successors(9, &[12])
    .with_successors(10, &[12])
    .with_successors(11, &[12])
}
