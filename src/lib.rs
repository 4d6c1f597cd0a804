//! Resource-constrained project scheduling for the U-Engine ecosystem.
//!
//! Models, validation, and a complete backtracking solver for the
//! Resource-Constrained Project Scheduling Problem (RCPSP) and its
//! multi-mode variant (MRCPSP). The solver returns the first feasible
//! schedule in a deterministic search order, or proves that none exists.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `ProjectModel`, `Task`, `Mode`, `Schedule`
//! - **`validation`**: Input integrity checks (dangling references, negative
//!   values, DAG cycles)
//! - **`solver`**: Domain store, constraint engine, search, and schedule
//!   extraction behind [`RcpspSolver`]
//! - **`kpi`**: Makespan, critical path, and resource utilization
//! - **`generator`**: Seeded random instances
//! - **`instances`**: Reference projects
//!
//! # Example
//!
//! ```
//! use u_rcpsp::{solve, Mode, ProjectModel, SolveOutcome, Task};
//!
//! let model = ProjectModel::new(10)
//!     .with_resource("R1", 1)
//!     .with_task(1, Task::single(Mode::new(3).with_demand("R1", 1)))
//!     .with_task(2, Task::single(Mode::new(3).with_demand("R1", 1)));
//!
//! match solve(&model).unwrap().outcome {
//!     SolveOutcome::Solved(schedule) => {
//!         assert_eq!(schedule.start_of(1), Some(0));
//!         assert_eq!(schedule.start_of(2), Some(3));
//!     }
//!     other => panic!("expected a schedule, got {other:?}"),
//! }
//! ```
//!
//! # Features
//!
//! - `parallel`: split the first branching decision across a rayon pool
//!   (`SolverConfig::num_workers`). Results are identical to sequential runs.
//!
//! # References
//!
//! - Brucker et al. (1999), "Resource-constrained project scheduling:
//!   Notation, classification, models, and methods"
//! - Kolisch & Hartmann (2006), "Experimental investigation of heuristics
//!   for resource-constrained project scheduling: An update"
//! - Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"

pub mod error;
pub mod generator;
pub mod instances;
pub mod kpi;
pub mod models;
pub mod solver;
pub mod validation;

pub use error::{DomainError, ModelError, SolveError};
pub use kpi::ScheduleKpi;
pub use models::{Mode, ModeId, ProjectModel, Schedule, ScheduledTask, Task, TaskId};
pub use solver::{
    solve, CutoffReason, RcpspSolver, SearchStats, SolveOutcome, SolveReport, SolverConfig,
    VariableOrder,
};
pub use validation::{validate_model, MAX_HORIZON};
