//! Common event header

/// Type tag carried by every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EventKind {
    #[default]
    Base = 0,
    /// Periodic timer tick
    Timer = 1,
    /// Counter update
    Counter = 2,
    /// Command response
    Command = 3,
}

/// Header embedded in every published value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Envelope {
    /// Milliseconds since boot when the value was last mutated
    pub timestamp: u32,
    /// What kind of event this is
    pub kind: EventKind,
}

impl Envelope {
    pub const fn new(kind: EventKind) -> Self {
        Self { timestamp: 0, kind }
    }

    /// Refresh the timestamp
    pub fn touch(&mut self, now_ms: u32) {
        self.timestamp = now_ms;
    }
}

/// A value that can be published through a [`Topic`](crate::Topic)
///
/// Values are copied out of their [`EventSlot`](crate::EventSlot) at
/// delivery time, so they must be `Copy`.
pub trait Event: Copy + Send + 'static {
    fn envelope(&self) -> &Envelope;

    fn envelope_mut(&mut self) -> &mut Envelope;

    /// Refresh the envelope timestamp before publication
    fn touch(&mut self, now_ms: u32) {
        self.envelope_mut().touch(now_ms);
    }
}

/// Millisecond time source
///
/// Injected wherever timestamps are taken so host tests can control time.
pub trait Clock {
    /// Milliseconds since boot (wraps after ~49 days)
    fn now_ms(&self) -> u32;
}
