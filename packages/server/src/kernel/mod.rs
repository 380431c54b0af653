//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod scheduled_tasks;
pub mod store;
pub mod test_dependencies;
pub mod traits;

pub use deps::{ServerDeps, SlackAdapter};
pub use scheduled_tasks::start_scheduler;
pub use test_dependencies::{MockNotifier, TestDependencies};
pub use traits::*;
