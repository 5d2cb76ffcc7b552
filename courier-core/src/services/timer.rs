//! Periodic tick producer

use crate::dispatch::Priority;
use crate::event::{Clock, Envelope, Event, EventKind, EventSlot};
use crate::topic::Topic;

/// Published on every timer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimerEvent {
    pub envelope: Envelope,
    /// Ticks since boot
    pub tick_count: u32,
    /// Tick period in milliseconds
    pub period_ms: u16,
}

impl TimerEvent {
    pub const fn new() -> Self {
        Self {
            envelope: Envelope::new(EventKind::Timer),
            tick_count: 0,
            period_ms: 0,
        }
    }

    /// Record one more tick
    pub fn advance(&mut self, now_ms: u32, period_ms: u16) {
        self.touch(now_ms);
        self.tick_count = self.tick_count.wrapping_add(1);
        self.period_ms = period_ms;
    }
}

impl Default for TimerEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl Event for TimerEvent {
    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }
}

/// Advances a [`TimerEvent`] and publishes it on each tick
///
/// The caller drives the period (a ticker task on target, direct calls
/// in tests).
pub struct TimerService {
    topic: &'static Topic<TimerEvent>,
    slot: &'static EventSlot<TimerEvent>,
    period_ms: u16,
}

impl TimerService {
    pub const fn new(
        topic: &'static Topic<TimerEvent>,
        slot: &'static EventSlot<TimerEvent>,
        period_ms: u16,
    ) -> Self {
        Self {
            topic,
            slot,
            period_ms,
        }
    }

    pub fn period_ms(&self) -> u16 {
        self.period_ms
    }

    /// Ticks recorded so far, including skipped publications
    pub fn tick_count(&self) -> u32 {
        self.slot.get().tick_count
    }

    /// Advance the event and publish it
    ///
    /// The publication is skipped when the normal queue has no free slot.
    /// Returns whether the tick was queued.
    pub fn tick(&self, clock: &dyn Clock) -> bool {
        let now = clock.now_ms();
        let period_ms = self.period_ms;
        self.slot.update(|event| event.advance(now, period_ms));

        if !self.topic.engine().has_space(Priority::Normal) {
            return false;
        }
        self.topic.publish(self.slot)
    }
}
