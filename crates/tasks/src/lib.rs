//! `taskdesk-tasks` — the task domain: entity + lifecycle, the access policy
//! engine, and the listing query model.
//!
//! Everything here is pure: no IO, no clock reads, no store handles. The
//! store and HTTP layers feed these functions their inputs.

pub mod policy;
pub mod query;
pub mod task;

pub use policy::{AccessOp, TaskAccess, authorize, can_delete, can_modify, can_view};
pub use query::{DEFAULT_PAGE_SIZE, ListTasksQuery, TaskPage};
pub use task::{NewTask, Task, TaskPriority, TaskStatus, TaskUpdate};
