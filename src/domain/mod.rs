//! Task entity, identity, time and ordering.
//!
//! - [`task`] - [`Task`], [`TaskPatch`] and the create/update templates
//! - [`clock`] - [`Clock`] abstraction over "now" ([`SystemClock`], [`ManualClock`])
//! - [`identity`] - identifier generation
//! - [`ordering`] - the newest-first total order over tasks
//! - [`stats`] - filters and completion statistics

pub mod clock;
pub mod identity;
pub mod ordering;
pub mod stats;
pub mod task;

pub use clock::{format_instant, now, Clock, ManualClock, SystemClock};
pub use identity::generate_id;
pub use ordering::{compare, sort_tasks};
pub use stats::{completed_tasks, incomplete_tasks, TaskStats};
pub use task::{apply_update, build_new, find_task, find_task_index, NewTask, Task, TaskPatch};
