//! Elapsed-time display fed by the timer topic

use core::cell::Cell;
use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::String;

use super::timer::TimerEvent;
use crate::dispatch::Context;
use crate::topic::Topic;

/// Rendered length of `HH:MM:SS.mmm`
pub const TIME_STRING_LEN: usize = 12;

#[derive(Debug, Clone, Copy, Default)]
struct Elapsed {
    total_seconds: u32,
    millis: u16,
}

impl Elapsed {
    fn add_ms(&mut self, ms: u32) {
        // Both parts stay below 1000, so their sum cannot overflow
        let millis = self.millis as u32 + ms % 1000;
        self.total_seconds = self
            .total_seconds
            .wrapping_add(ms / 1000)
            .wrapping_add(millis / 1000);
        self.millis = (millis % 1000) as u16;
    }
}

/// Accumulates tick periods into a wall-clock style elapsed time
pub struct ClockDisplay {
    elapsed: Mutex<CriticalSectionRawMutex, Cell<Elapsed>>,
}

impl Default for ClockDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockDisplay {
    pub const fn new() -> Self {
        Self {
            elapsed: Mutex::new(Cell::new(Elapsed {
                total_seconds: 0,
                millis: 0,
            })),
        }
    }

    /// Subscribe to `timer`; returns `false` if the topic is full
    pub fn attach(&'static self, timer: &Topic<TimerEvent>) -> bool {
        timer.subscribe(Self::on_timer, Some(self))
    }

    fn on_timer(event: &TimerEvent, context: Context) {
        if let Some(display) = context.and_then(|c| c.downcast_ref::<ClockDisplay>()) {
            display.advance(event.period_ms as u32);
        }
    }

    /// Add `ms` milliseconds of elapsed time
    pub fn advance(&self, ms: u32) {
        self.elapsed.lock(|elapsed| {
            let mut value = elapsed.get();
            value.add_ms(ms);
            elapsed.set(value);
        });
    }

    pub fn reset(&self) {
        self.elapsed.lock(|elapsed| elapsed.set(Elapsed::default()));
    }

    fn snapshot(&self) -> Elapsed {
        self.elapsed.lock(|elapsed| elapsed.get())
    }

    pub fn total_seconds(&self) -> u32 {
        self.snapshot().total_seconds
    }

    /// Hours, wrapping at 24
    pub fn hours(&self) -> u8 {
        ((self.total_seconds() / 3600) % 24) as u8
    }

    pub fn minutes(&self) -> u8 {
        ((self.total_seconds() / 60) % 60) as u8
    }

    pub fn seconds(&self) -> u8 {
        (self.total_seconds() % 60) as u8
    }

    pub fn millis(&self) -> u16 {
        self.snapshot().millis
    }

    /// Elapsed time as `HH:MM:SS.mmm`
    pub fn time_string(&self) -> String<16> {
        let elapsed = self.snapshot();
        let total = elapsed.total_seconds;

        let mut out = String::new();
        // 12 characters always fit
        let _ = write!(
            out,
            "{:02}:{:02}:{:02}.{:03}",
            (total / 3600) % 24,
            (total / 60) % 60,
            total % 60,
            elapsed.millis
        );
        out
    }
}
