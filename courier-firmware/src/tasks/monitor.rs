//! Statistics monitor task
//!
//! Periodically logs the dispatch statistics and the service state.

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::config::STATS_INTERVAL_MS;
use crate::node::{overflow_count, CLOCK_DISPLAY, COUNTER, ENGINE};

#[embassy_executor::task]
pub async fn monitor_task() {
    info!("Monitor task started");

    let mut ticker = Ticker::every(Duration::from_millis(STATS_INTERVAL_MS as u64));

    loop {
        ticker.next().await;

        let stats = ENGINE.stats();
        info!(
            "Uptime {} | ticks counted {} | overflows {}",
            CLOCK_DISPLAY.time_string().as_str(),
            COUNTER.count(),
            overflow_count()
        );
        debug!("Normal queue: {}", stats.normal);
        debug!("High queue: {}", stats.high);

        if stats.total_overflows() > 0 {
            warn!("{} deliveries dropped since boot", stats.total_overflows());
        }
    }
}
