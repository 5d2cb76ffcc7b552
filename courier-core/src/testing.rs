//! Shared helpers for unit tests

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use crate::event::Clock;

/// Append-only record of callback invocations, usable as a `static`
pub struct Log {
    entries: Mutex<CriticalSectionRawMutex, RefCell<Vec<u32, 32>>>,
}

impl Log {
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    pub fn push(&self, entry: u32) {
        self.entries.lock(|entries| {
            let _ = entries.borrow_mut().push(entry);
        });
    }

    pub fn entries(&self) -> Vec<u32, 32> {
        self.entries.lock(|entries| entries.borrow().clone())
    }
}

/// Delay that completes immediately
pub struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

/// Clock frozen at a given millisecond
pub struct FixedClock(pub u32);

impl Clock for FixedClock {
    fn now_ms(&self) -> u32 {
        self.0
    }
}
