//! Timer tick task
//!
//! Drives the timer service at the configured period.

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::config::TIMER_PERIOD_MS;
use crate::node::{TIMER, UPTIME};

#[embassy_executor::task]
pub async fn timer_task() {
    info!("Timer task started ({}ms)", TIMER_PERIOD_MS);

    let mut ticker = Ticker::every(Duration::from_millis(TIMER_PERIOD_MS as u64));

    loop {
        ticker.next().await;

        if !TIMER.tick(&UPTIME) {
            trace!("Tick {} skipped, dispatch queue busy", TIMER.tick_count());
        }
    }
}
