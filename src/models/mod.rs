//! Project scheduling domain models.
//!
//! Provides the data types for describing resource-constrained project
//! scheduling problems and their solutions. A single-mode project is the
//! special case where every task has exactly one mode.
//!
//! # Domain Mappings
//!
//! | u-rcpsp | Construction | Software | Manufacturing |
//! |---------|--------------|----------|---------------|
//! | Task | Work package | Ticket | Order step |
//! | Mode | Crew option | Staffing option | Routing alternative |
//! | Resource | Crew/Crane | Team | Machine pool |
//! | Schedule | Site plan | Sprint plan | Production plan |

mod mode;
mod project;
mod schedule;
mod task;

pub use mode::{Mode, ModeId};
pub use project::{Precedence, ProjectModel};
pub use schedule::{Schedule, ScheduledTask, Violation, ViolationType};
pub use task::{Task, TaskId};
