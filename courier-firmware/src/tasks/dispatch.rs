//! Dispatch worker task
//!
//! The single consumer of the dispatch queues. Every topic's deliveries
//! run here, so subscriber callbacks execute on this task.

use defmt::*;
use embassy_time::Delay;

use crate::node::ENGINE;

#[embassy_executor::task]
pub async fn dispatch_task() {
    info!(
        "Dispatch worker started (normal wait {}ms)",
        ENGINE.config().normal_wait_ms
    );
    ENGINE.run(Delay).await;
    error!("Dispatch worker already running, second worker exits");
}
