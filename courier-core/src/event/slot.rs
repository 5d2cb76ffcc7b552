//! Producer-owned storage for published values

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Storage a producer publishes from
///
/// A [`Topic`](crate::Topic) never owns event storage: a queued delivery
/// only references the slot, and subscribers see the value it holds at
/// delivery time. Reads and writes are short critical sections, so a slot
/// may be updated from interrupt handlers.
pub struct EventSlot<V> {
    value: Mutex<CriticalSectionRawMutex, Cell<V>>,
}

impl<V: Copy> EventSlot<V> {
    /// Create a slot holding `initial`
    pub const fn new(initial: V) -> Self {
        Self {
            value: Mutex::new(Cell::new(initial)),
        }
    }

    /// Copy of the current value
    pub fn get(&self) -> V {
        self.value.lock(|cell| cell.get())
    }

    /// Replace the value
    pub fn set(&self, value: V) {
        self.value.lock(|cell| cell.set(value));
    }

    /// Mutate the value in place and return the result
    pub fn update(&self, f: impl FnOnce(&mut V)) -> V {
        self.value.lock(|cell| {
            let mut value = cell.get();
            f(&mut value);
            cell.set(value);
            value
        })
    }
}
