//! Tick counter fed by the timer topic

use portable_atomic::{AtomicU32, Ordering};

use super::timer::TimerEvent;
use crate::dispatch::Context;
use crate::topic::Topic;

/// Counts timer ticks delivered to it
pub struct CounterService {
    count: AtomicU32,
}

impl Default for CounterService {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterService {
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Subscribe to `timer`; returns `false` if the topic is full
    pub fn attach(&'static self, timer: &Topic<TimerEvent>) -> bool {
        timer.subscribe(Self::on_timer, Some(self))
    }

    pub fn detach(&'static self, timer: &Topic<TimerEvent>) -> bool {
        timer.unsubscribe(Self::on_timer)
    }

    fn on_timer(_event: &TimerEvent, context: Context) {
        if let Some(counter) = context.and_then(|c| c.downcast_ref::<CounterService>()) {
            counter.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}
