//! Response value published after each dispatch

use courier_protocol::{Cluster, CommandKey, CommandResponse};

use crate::event::{Envelope, Event, EventKind};

/// A [`CommandResponse`] carried as an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResponseEvent {
    pub envelope: Envelope,
    pub response: CommandResponse,
}

impl ResponseEvent {
    pub const fn new() -> Self {
        Self {
            envelope: Envelope::new(EventKind::Command),
            response: CommandResponse::new(CommandKey::new(Cluster::System, 0)),
        }
    }

    /// Prepare for a new command: fresh timestamp, `Success`, no data
    pub fn reset(&mut self, key: CommandKey, now_ms: u32) {
        self.envelope.touch(now_ms);
        self.response = CommandResponse::new(key);
    }
}

impl Default for ResponseEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl Event for ResponseEvent {
    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_protocol::CommandStatus;

    #[test]
    fn test_reset_clears_previous_result() {
        let mut event = ResponseEvent::new();
        event.response.status = CommandStatus::Busy;
        event.response.set_u32(7);

        let key = CommandKey::new(Cluster::Sensor, 3);
        event.reset(key, 500);

        assert_eq!(event.envelope.timestamp, 500);
        assert_eq!(event.envelope.kind, EventKind::Command);
        assert_eq!(event.response.key, key);
        assert_eq!(event.response.status, CommandStatus::Success);
        assert!(event.response.data().is_empty());
    }
}
