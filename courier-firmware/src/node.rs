//! Process-wide instances shared by the tasks
//!
//! Everything here is constructed at compile time; `main` only wires
//! subscriptions and the error hook before spawning tasks.

use defmt::*;
use portable_atomic::{AtomicU32, Ordering};

use courier_core::{
    Clock, ClockDisplay, Context, CounterService, DispatchConfig, DispatchEngine, DispatchError,
    EventSlot, ResponseEvent, TimerEvent, TimerService, Topic,
};

use crate::config::{NORMAL_WAIT_MS, TIMER_PERIOD_MS};

/// Milliseconds since boot from the embassy time driver
pub struct UptimeClock;

impl Clock for UptimeClock {
    fn now_ms(&self) -> u32 {
        embassy_time::Instant::now().as_millis() as u32
    }
}

pub static UPTIME: UptimeClock = UptimeClock;

pub static ENGINE: DispatchEngine = DispatchEngine::with_config(DispatchConfig {
    normal_wait_ms: NORMAL_WAIT_MS,
});

pub static TIMER_TOPIC: Topic<TimerEvent> = Topic::new("timer", &ENGINE);
static TIMER_SLOT: EventSlot<TimerEvent> = EventSlot::new(TimerEvent::new());
pub static TIMER: TimerService = TimerService::new(&TIMER_TOPIC, &TIMER_SLOT, TIMER_PERIOD_MS);

pub static RESPONSE_TOPIC: Topic<ResponseEvent> = Topic::new("command", &ENGINE);
pub static RESPONSE_SLOT: EventSlot<ResponseEvent> = EventSlot::new(ResponseEvent::new());

pub static COUNTER: CounterService = CounterService::new();
pub static CLOCK_DISPLAY: ClockDisplay = ClockDisplay::new();

/// Deliveries dropped because a queue was full
static OVERFLOWS: AtomicU32 = AtomicU32::new(0);

/// Error hook for task-context enqueue failures
pub fn on_dispatch_error(error: DispatchError, topic_name: &'static str, _context: Context) {
    match error {
        DispatchError::QueueFull => {
            OVERFLOWS.fetch_add(1, Ordering::Relaxed);
            warn!("Dispatch queue full, dropped '{}' delivery", topic_name);
        }
        DispatchError::QueueNotReady => {
            // Publishing before the engine is started is a wiring bug
            error!("Dispatch engine not started, '{}' delivery rejected", topic_name);
        }
    }
}

pub fn overflow_count() -> u32 {
    OVERFLOWS.load(Ordering::Relaxed)
}
