//! Embassy async tasks
//!
//! Tasks share state only through the statics in [`crate::node`].

pub mod command_link;
pub mod dispatch;
pub mod monitor;
pub mod timer;

pub use command_link::command_link_task;
pub use dispatch::dispatch_task;
pub use monitor::monitor_task;
pub use timer::timer_task;
