//! Process-wide asynchronous delivery
//!
//! Every [`Topic`](crate::Topic) hands its deliveries to one
//! [`DispatchEngine`]: two bounded FIFO queues (normal and high priority)
//! drained by a single worker. Producers never block; a full queue rejects
//! the delivery and counts it.

pub mod context;
pub mod engine;
pub mod stats;

pub use context::{ExecContext, InterruptContext, TaskContext};
pub use engine::{
    Context, DeliveryRecord, DispatchConfig, DispatchEngine, DispatchError, Erased, ErrorHook,
    Priority, DEFAULT_NORMAL_WAIT_MS, HIGH_QUEUE_SIZE, NORMAL_QUEUE_SIZE,
};
pub use stats::{DispatchStats, LevelStats};
